//! MangaDex through a Consumet instance.
//!
//! Search takes the query as a hyphenated path segment, and chapter counts are
//! often missing from search results.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::{MangaProvider, Provider};
use crate::api::http::{Fetch, encode_component, get_json, slugify};
use crate::api::json::{
    f64_field, non_empty_str, rejection_message, require_array, str_field, string_list,
};
use crate::api::models::{
    Chapter, ChapterPages, MangaInfo, SearchResult, SearchResultItem, format_chapter_number,
};
use crate::api::{ContentType, ProviderId};
use crate::error::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://consumet.thuanc177.me/manga/mangadex";

pub struct MangaDex {
    fetcher: Arc<dyn Fetch>,
    base_url: String,
}

impl MangaDex {
    pub fn new(fetcher: Arc<dyn Fetch>) -> Self {
        Self {
            fetcher,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

impl Provider for MangaDex {
    fn id(&self) -> ProviderId {
        ProviderId::MangaDex
    }

    fn as_manga(&self) -> Option<&dyn MangaProvider> {
        Some(self)
    }
}

#[async_trait::async_trait]
impl MangaProvider for MangaDex {
    async fn search(&self, query: &str) -> Result<SearchResult> {
        // Slug first, then escape whatever reserved characters remain.
        let url = format!("{}/{}", self.base_url, encode_component(&slugify(query)));
        let root = get_json(self.fetcher.as_ref(), &url).await?;
        map_search(root)
    }

    async fn get_details(&self, id: &str) -> Result<MangaInfo> {
        let url = format!("{}/info/{}", self.base_url, encode_component(id));
        let root = get_json(self.fetcher.as_ref(), &url).await?;
        map_details(root)
    }

    async fn get_chapter_pages(&self, chapter_id: &str) -> Result<ChapterPages> {
        let url = format!("{}/read/{}", self.base_url, encode_component(chapter_id));
        let root = get_json(self.fetcher.as_ref(), &url).await?;
        map_pages(root)
    }
}

/// Titles arrive either as a plain string or as a language map.
fn title_of(value: &Value) -> Option<String> {
    match value.get("title")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Object(map) => map
            .get("en")
            .and_then(Value::as_str)
            .or_else(|| map.values().find_map(Value::as_str))
            .map(str::to_string),
        _ => None,
    }
}

/// Descriptions use the same string-or-language-map shape as titles.
fn description_of(value: &Value) -> Option<String> {
    match value.get("description")? {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map
            .get("en")
            .and_then(Value::as_str)
            .or_else(|| map.values().find_map(Value::as_str))
            .map(str::to_string),
        _ => None,
    }
}

/// Chapter count for a search entry.
///
/// A non-empty `lastChapter` decides on its own: its leading digits, or 0
/// when there are none ("Oneshot"). Only without it does any `lastVolume` or
/// a completed/finished status mean at least one chapter exists.
pub(crate) fn chapter_count(entry: &Value) -> u32 {
    if let Some(last) = non_empty_str(entry, "lastChapter") {
        let trimmed = last.trim();
        let digits = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .map_or(trimmed, |end| &trimmed[..end]);
        return digits.parse().unwrap_or(0);
    }

    if non_empty_str(entry, "lastVolume").is_some() {
        return 1;
    }

    match non_empty_str(entry, "status") {
        Some(status)
            if status.eq_ignore_ascii_case("completed")
                || status.eq_ignore_ascii_case("finished") =>
        {
            1
        }
        _ => 0,
    }
}

fn map_search(root: Value) -> Result<SearchResult> {
    if let Some(message) = rejection_message(&root, "results") {
        return Err(Error::UpstreamRejected(message));
    }
    let entries = require_array(&root, "results")?;

    let results = entries
        .iter()
        .map(|entry| SearchResultItem {
            id: str_field(entry, "id").unwrap_or_default(),
            title: title_of(entry).unwrap_or_else(|| "Unknown".to_string()),
            image: non_empty_str(entry, "image"),
            count: chapter_count(entry),
            content_type: ContentType::Manga,
        })
        .collect::<Vec<_>>();

    debug!(count = results.len(), "MangaDex search mapped");
    Ok(SearchResult { results })
}

fn map_details(root: Value) -> Result<MangaInfo> {
    if let Some(message) = rejection_message(&root, "id") {
        return Err(Error::UpstreamRejected(message));
    }
    let id = str_field(&root, "id")
        .ok_or_else(|| Error::SchemaMismatch("manga info has no id".to_string()))?;

    let chapters: Vec<Chapter> = root
        .get("chapters")
        .and_then(Value::as_array)
        .map(|chs| {
            chs.iter()
                .enumerate()
                .map(|(i, ch)| {
                    let number = f64_field(ch, "chapterNumber")
                        .or_else(|| f64_field(ch, "chapter"))
                        .unwrap_or((i + 1) as f64);
                    Chapter {
                        id: str_field(ch, "id").unwrap_or_default(),
                        number,
                        title: non_empty_str(ch, "title").unwrap_or_else(|| {
                            format!("Chapter {}", format_chapter_number(number))
                        }),
                        volume: non_empty_str(ch, "volumeNumber"),
                        release_date: non_empty_str(ch, "releaseDate"),
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    if let Some(reported) = f64_field(&root, "totalChapters") {
        if reported as usize != chapters.len() {
            warn!(
                reported,
                actual = chapters.len(),
                "MangaDex total disagrees with chapter list, using list length"
            );
        }
    }

    Ok(MangaInfo {
        title: title_of(&root).unwrap_or_else(|| id.clone()),
        url: Some(format!("https://mangadex.org/title/{}", id)),
        id,
        image: non_empty_str(&root, "image"),
        description: description_of(&root),
        release_date: non_empty_str(&root, "releaseDate"),
        status: non_empty_str(&root, "status"),
        genres: string_list(&root, "genres"),
        chapters,
    })
}

fn map_pages(root: Value) -> Result<ChapterPages> {
    let pages = match root {
        Value::Array(pages) => pages,
        other => {
            return Err(match rejection_message(&other, "img") {
                Some(message) => Error::UpstreamRejected(message),
                None => Error::SchemaMismatch("chapter pages are not an array".to_string()),
            });
        }
    };

    // Constant across the chapter, so the first page is enough.
    let referer = pages.first().and_then(|first| {
        first
            .get("headerForImage")
            .and_then(|h| h.get("Referer"))
            .and_then(Value::as_str)
            .map(str::to_string)
    });

    let page_urls = pages
        .iter()
        .filter_map(|page| non_empty_str(page, "img"))
        .collect::<Vec<_>>();

    debug!(pages = page_urls.len(), "MangaDex pages mapped");
    Ok(ChapterPages {
        page_urls,
        referer,
        base_url: None,
    })
}
