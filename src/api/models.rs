//! Normalized content model shared by every provider.
//!
//! Sequences carry their own length: counts such as "total results" or
//! "total episodes" are derived from the vectors and cannot drift from them.

use serde::{Deserialize, Serialize};

use super::ContentType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultItem {
    pub id: String,
    pub title: String,
    pub image: Option<String>,
    /// Episodes for anime, chapters for manga. Meaning of zero depends on the
    /// provider: usually "unknown".
    pub count: u32,
    pub content_type: ContentType,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// API order, which is also display order.
    pub results: Vec<SearchResultItem>,
}

impl SearchResult {
    pub fn total_results(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub id: String,
    /// 1-based.
    pub number: u32,
    pub title: Option<String>,
    pub url: Option<String>,
    #[serde(default)]
    pub is_filler: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimeInfo {
    pub id: String,
    pub title: String,
    pub url: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
    pub release_date: Option<String>,
    pub status: Option<String>,
    pub genres: Vec<String>,
    pub sub_or_dub: Option<String>,
    pub episodes: Vec<Episode>,
}

impl AnimeInfo {
    pub fn total_episodes(&self) -> usize {
        self.episodes.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: String,
    /// Fractional chapters ("10.5") are common.
    pub number: f64,
    pub title: String,
    pub volume: Option<String>,
    pub release_date: Option<String>,
}

impl Chapter {
    pub fn number_label(&self) -> String {
        format_chapter_number(self.number)
    }
}

/// Render a chapter number without a trailing ".0" for whole chapters.
pub fn format_chapter_number(number: f64) -> String {
    if number.fract() == 0.0 {
        format!("{}", number as i64)
    } else {
        format!("{}", number)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MangaInfo {
    pub id: String,
    pub title: String,
    pub url: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
    pub release_date: Option<String>,
    pub status: Option<String>,
    pub genres: Vec<String>,
    pub chapters: Vec<Chapter>,
}

impl MangaInfo {
    pub fn total_chapters(&self) -> usize {
        self.chapters.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub url: String,
    pub quality: Option<String>,
    pub is_m3u8: bool,
}

impl Source {
    /// HLS when labelled "hls" (case-sensitive) or when the URL ends in ".m3u8".
    pub fn classify(url: String, quality: Option<String>) -> Self {
        let is_m3u8 = quality.as_deref() == Some("hls") || url.ends_with(".m3u8");
        Self {
            url,
            quality,
            is_m3u8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtitle {
    pub url: String,
    pub lang: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamInfo {
    pub referer: Option<String>,
    pub user_agent: Option<String>,
    pub sources: Vec<Source>,
    pub subtitles: Vec<Subtitle>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChapterPages {
    /// Reading order.
    pub page_urls: Vec<String>,
    pub referer: Option<String>,
    pub base_url: Option<String>,
}

impl ChapterPages {
    pub fn page_count(&self) -> usize {
        self.page_urls.len()
    }

    /// Page URLs with relative links joined onto `base_url`.
    pub fn resolved_urls(&self) -> Vec<String> {
        self.page_urls
            .iter()
            .map(|url| match &self.base_url {
                Some(base) if !url.starts_with("http://") && !url.starts_with("https://") => {
                    format!(
                        "{}/{}",
                        base.trim_end_matches('/'),
                        url.trim_start_matches('/')
                    )
                }
                _ => url.clone(),
            })
            .collect()
    }
}
