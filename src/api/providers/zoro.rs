//! Zoro through a Consumet instance. Flat JSON objects, no envelope.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::{AnimeProvider, Provider, is_thumbnail_track};
use crate::api::http::{Fetch, encode_component, get_json};
use crate::api::json::{
    array, bool_field, non_empty_str, object, rejection_message, require_array, str_field,
    string_list, u32_field,
};
use crate::api::models::{
    AnimeInfo, Episode, SearchResult, SearchResultItem, Source, StreamInfo, Subtitle,
};
use crate::api::{ContentType, ProviderId};
use crate::error::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://consumet.thuanc177.me/anime/zoro";
pub const DEFAULT_SERVER: &str = "vidstreaming";

pub struct Zoro {
    fetcher: Arc<dyn Fetch>,
    base_url: String,
}

impl Zoro {
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

impl Provider for Zoro {
    fn id(&self) -> ProviderId {
        ProviderId::Zoro
    }

    fn as_anime(&self) -> Option<&dyn AnimeProvider> {
        Some(self)
    }
}

#[async_trait::async_trait]
impl AnimeProvider for Zoro {
    async fn search(&self, query: &str) -> Result<SearchResult> {
        let url = format!("{}/search?query={}", self.base_url, encode_component(query));
        let root = get_json(self.fetcher.as_ref(), &url).await?;
        map_search(root)
    }

    async fn get_details(&self, id: &str) -> Result<AnimeInfo> {
        let url = format!("{}/info/{}", self.base_url, encode_component(id));
        let root = get_json(self.fetcher.as_ref(), &url).await?;
        map_details(root)
    }

    async fn get_stream(&self, episode_id: &str, server: Option<&str>) -> Result<StreamInfo> {
        let url = format!(
            "{}/watch/{}?server={}",
            self.base_url,
            encode_component(episode_id),
            encode_component(server.unwrap_or(DEFAULT_SERVER)),
        );
        let root = get_json(self.fetcher.as_ref(), &url).await?;
        map_stream(root)
    }
}

fn reject_bare_message(root: &Value, payload_key: &str) -> Result<()> {
    match rejection_message(root, payload_key) {
        Some(message) => Err(Error::UpstreamRejected(message)),
        None => Ok(()),
    }
}

fn map_search(root: Value) -> Result<SearchResult> {
    reject_bare_message(&root, "results")?;
    let entries = require_array(&root, "results")?;

    let results = entries
        .iter()
        .map(|entry| {
            let count = u32_field(entry, "episodes").unwrap_or_else(|| {
                let sub = u32_field(entry, "sub").unwrap_or(0);
                let dub = u32_field(entry, "dub").unwrap_or(0);
                sub.max(dub)
            });

            SearchResultItem {
                id: str_field(entry, "id").unwrap_or_default(),
                title: non_empty_str(entry, "title").unwrap_or_else(|| "Unknown".to_string()),
                image: non_empty_str(entry, "image"),
                count,
                content_type: ContentType::Anime,
            }
        })
        .collect::<Vec<_>>();

    debug!(count = results.len(), "Zoro search mapped");
    Ok(SearchResult { results })
}

fn map_details(root: Value) -> Result<AnimeInfo> {
    reject_bare_message(&root, "id")?;
    let id = str_field(&root, "id")
        .ok_or_else(|| Error::SchemaMismatch("anime info has no id".to_string()))?;

    let episodes: Vec<Episode> = array(&root, "episodes")
        .map(|eps| {
            eps.iter()
                .enumerate()
                .map(|(i, ep)| Episode {
                    id: str_field(ep, "id").unwrap_or_default(),
                    number: u32_field(ep, "number").unwrap_or(i as u32 + 1),
                    title: non_empty_str(ep, "title"),
                    url: non_empty_str(ep, "url"),
                    is_filler: bool_field(ep, "isFiller").unwrap_or(false),
                })
                .collect()
        })
        .unwrap_or_default();

    if let Some(reported) = u32_field(&root, "totalEpisodes") {
        if reported as usize != episodes.len() {
            warn!(
                reported,
                actual = episodes.len(),
                "Zoro total disagrees with episode list, using list length"
            );
        }
    }

    Ok(AnimeInfo {
        title: non_empty_str(&root, "title").unwrap_or_else(|| id.clone()),
        id,
        url: non_empty_str(&root, "url"),
        image: non_empty_str(&root, "image"),
        description: str_field(&root, "description"),
        release_date: non_empty_str(&root, "releaseDate"),
        status: non_empty_str(&root, "status"),
        genres: string_list(&root, "genres"),
        sub_or_dub: non_empty_str(&root, "type").or_else(|| non_empty_str(&root, "subOrDub")),
        episodes,
    })
}

fn map_stream(root: Value) -> Result<StreamInfo> {
    reject_bare_message(&root, "sources")?;

    let sources = require_array(&root, "sources")?
        .iter()
        .filter_map(|src| {
            let url = non_empty_str(src, "url")?;
            let source = Source::classify(url, non_empty_str(src, "quality"));
            Some(match bool_field(src, "isM3U8") {
                Some(explicit) => Source {
                    is_m3u8: explicit,
                    ..source
                },
                None => source,
            })
        })
        .collect::<Vec<_>>();

    let subtitles = array(&root, "subtitles")
        .map(|subs| {
            subs.iter()
                .filter(|s| !is_thumbnail_track(s.get("lang").and_then(Value::as_str)))
                .filter_map(|s| {
                    Some(Subtitle {
                        url: non_empty_str(s, "url")?,
                        lang: non_empty_str(s, "lang").unwrap_or_else(|| "Unknown".to_string()),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let headers = object(&root, "headers");
    let header = |key: &str| {
        headers
            .and_then(|h| h.get(key))
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    debug!(sources = sources.len(), "Zoro stream mapped");
    Ok(StreamInfo {
        referer: header("Referer"),
        user_agent: header("User-Agent"),
        sources,
        subtitles,
    })
}
