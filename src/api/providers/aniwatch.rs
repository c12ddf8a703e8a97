//! AniWatch (hianime scraper API). Every payload is wrapped in a
//! `{success, data}` envelope.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::{AnimeProvider, Provider, is_thumbnail_track};
use crate::api::http::{Fetch, encode_component, get_json};
use crate::api::json::{
    array, bool_field, non_empty_str, object, require_array, str_field, u32_field,
    unwrap_envelope,
};
use crate::api::models::{
    AnimeInfo, Episode, SearchResult, SearchResultItem, Source, StreamInfo, Subtitle,
};
use crate::api::{ContentType, ProviderId};
use crate::error::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://aniwatch-api-2.thuanc177.me";
pub const DEFAULT_SERVER: &str = "hd-1";
pub const DEFAULT_CATEGORY: &str = "sub";

const DEFAULT_REFERER: &str = "https://aniwatch.to/";
const DEFAULT_PLAYER_AGENT: &str = "Mozilla/5.0";

pub struct AniWatch {
    fetcher: Arc<dyn Fetch>,
    base_url: String,
    category: String,
}

impl AniWatch {
    pub fn new(fetcher: Arc<dyn Fetch>) -> Self {
        Self {
            fetcher,
            base_url: DEFAULT_BASE_URL.to_string(),
            category: DEFAULT_CATEGORY.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// "sub" or "dub" audio track requested from the sources endpoint.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/v2/hianime/{}", self.base_url, path)
    }
}

impl Provider for AniWatch {
    fn id(&self) -> ProviderId {
        ProviderId::AniWatch
    }

    fn as_anime(&self) -> Option<&dyn AnimeProvider> {
        Some(self)
    }
}

#[async_trait::async_trait]
impl AnimeProvider for AniWatch {
    async fn search(&self, query: &str) -> Result<SearchResult> {
        let url = self.endpoint(&format!("search?q={}", encode_component(query)));
        let root = get_json(self.fetcher.as_ref(), &url).await?;
        map_search(root)
    }

    async fn get_details(&self, id: &str) -> Result<AnimeInfo> {
        let url = self.endpoint(&format!("anime/{}/episodes", encode_component(id)));
        let root = get_json(self.fetcher.as_ref(), &url).await?;
        map_details(id, root)
    }

    async fn get_stream(&self, episode_id: &str, server: Option<&str>) -> Result<StreamInfo> {
        let server = server.unwrap_or(DEFAULT_SERVER);
        let url = self.endpoint(&format!(
            "episode/sources?animeEpisodeId={}&server={}&category={}",
            encode_component(episode_id),
            encode_component(server),
            encode_component(&self.category),
        ));
        let root = get_json(self.fetcher.as_ref(), &url).await?;
        map_stream(root)
    }
}

fn map_search(root: Value) -> Result<SearchResult> {
    let data = unwrap_envelope(root)?;
    let animes = require_array(&data, "animes")?;

    let results = animes
        .iter()
        .map(|entry| {
            // Sub and dub count the same episodes; summing would double count.
            let count = entry
                .get("episodes")
                .map(|eps| {
                    let sub = u32_field(eps, "sub").unwrap_or(0);
                    let dub = u32_field(eps, "dub").unwrap_or(0);
                    sub.max(dub)
                })
                .unwrap_or(0);

            SearchResultItem {
                id: str_field(entry, "id").unwrap_or_default(),
                title: non_empty_str(entry, "name").unwrap_or_else(|| "Unknown".to_string()),
                image: non_empty_str(entry, "poster"),
                count,
                content_type: ContentType::Anime,
            }
        })
        .collect::<Vec<_>>();

    debug!(count = results.len(), "AniWatch search mapped");
    Ok(SearchResult { results })
}

fn map_details(id: &str, root: Value) -> Result<AnimeInfo> {
    let data = unwrap_envelope(root)?;

    let episodes: Vec<Episode> = array(&data, "episodes")
        .map(|eps| {
            eps.iter()
                .enumerate()
                .map(|(i, ep)| Episode {
                    id: str_field(ep, "episodeId").unwrap_or_default(),
                    number: u32_field(ep, "number").unwrap_or(i as u32 + 1),
                    title: non_empty_str(ep, "title"),
                    url: non_empty_str(ep, "url"),
                    is_filler: bool_field(ep, "isFiller").unwrap_or(false),
                })
                .collect()
        })
        .unwrap_or_default();

    if let Some(reported) = u32_field(&data, "totalEpisodes") {
        if reported as usize != episodes.len() {
            warn!(
                reported,
                actual = episodes.len(),
                "AniWatch total disagrees with episode list, using list length"
            );
        }
    }

    // The episodes endpoint has no metadata; the id stands in for the title.
    Ok(AnimeInfo {
        id: id.to_string(),
        title: id.to_string(),
        episodes,
        ..Default::default()
    })
}

fn map_stream(root: Value) -> Result<StreamInfo> {
    let data = unwrap_envelope(root)?;

    let sources_json = require_array(&data, "sources")?;
    if sources_json.is_empty() {
        return Err(Error::SchemaMismatch(
            "no streaming sources available".to_string(),
        ));
    }

    let sources = sources_json
        .iter()
        .filter_map(|src| {
            let url = non_empty_str(src, "url")?;
            let source = Source::classify(url, non_empty_str(src, "type"));
            Some(match bool_field(src, "isM3U8") {
                Some(explicit) => Source {
                    is_m3u8: explicit,
                    ..source
                },
                None => source,
            })
        })
        .collect::<Vec<_>>();

    if sources.is_empty() {
        return Err(Error::SchemaMismatch("sources carry no urls".to_string()));
    }

    let subtitles = array(&data, "tracks")
        .map(|tracks| {
            tracks
                .iter()
                .filter(|t| {
                    !is_thumbnail_track(t.get("kind").and_then(Value::as_str))
                        && !is_thumbnail_track(t.get("label").and_then(Value::as_str))
                })
                .filter_map(|t| {
                    Some(Subtitle {
                        url: non_empty_str(t, "file")?,
                        lang: non_empty_str(t, "label").unwrap_or_else(|| "Unknown".to_string()),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let headers = object(&data, "headers");
    let header = |key: &str| {
        headers
            .and_then(|h| h.get(key))
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    debug!(sources = sources.len(), "AniWatch stream mapped");
    Ok(StreamInfo {
        referer: header("Referer").or_else(|| Some(DEFAULT_REFERER.to_string())),
        user_agent: header("User-Agent").or_else(|| Some(DEFAULT_PLAYER_AGENT.to_string())),
        sources,
        subtitles,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::api::http::stub::StubFetch;

    const BASE: &str = "http://aniwatch.test";

    fn provider(stub: StubFetch) -> (Arc<StubFetch>, AniWatch) {
        let stub = Arc::new(stub);
        let provider = AniWatch::new(stub.clone()).with_base_url(BASE);
        (stub, provider)
    }

    #[test]
    fn test_search_uses_max_of_sub_and_dub() {
        let body = json!({
            "success": true,
            "data": {"animes": [
                {"id": "naruto-677", "name": "Naruto", "poster": "n.jpg", "episodes": {"sub": 220, "dub": 220}},
                {"id": "bleach-806", "name": "Bleach", "episodes": {"sub": 366, "dub": 300}},
                {"id": "x-1", "name": "X", "episodes": {"sub": null, "dub": 12}},
                {"id": "y-2"}
            ]}
        });
        let result = map_search(body).unwrap();
        assert_eq!(result.total_results(), 4);
        assert_eq!(result.results[0].count, 220);
        assert_eq!(result.results[1].count, 366);
        assert_eq!(result.results[2].count, 12);
        assert_eq!(result.results[3].count, 0);
        assert_eq!(result.results[3].title, "Unknown");
        assert_eq!(result.results[0].image.as_deref(), Some("n.jpg"));
        assert!(result.results.iter().all(|r| r.content_type == ContentType::Anime));
    }

    #[test]
    fn test_search_success_false_is_rejected() {
        let body = json!({"success": false, "data": {"animes": [{"id": "a", "name": "A"}]}});
        assert!(matches!(map_search(body), Err(Error::UpstreamRejected(_))));
    }

    #[test]
    fn test_search_missing_animes_is_schema_mismatch() {
        let body = json!({"success": true, "data": {}});
        assert!(matches!(map_search(body), Err(Error::SchemaMismatch(_))));
    }

    #[test]
    fn test_details_number_defaults_to_position() {
        let body = json!({
            "success": true,
            "data": {
                "totalEpisodes": 5,
                "episodes": [
                    {"episodeId": "e1", "title": "Start"},
                    {"episodeId": "e2", "number": 2, "isFiller": true},
                    {"episodeId": "e3"}
                ]
            }
        });
        let info = map_details("show-1", body).unwrap();
        assert_eq!(info.total_episodes(), 3);
        let numbers: Vec<u32> = info.episodes.iter().map(|e| e.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(info.title, "show-1");
        assert!(info.episodes[1].is_filler);
        assert_eq!(info.episodes[0].title.as_deref(), Some("Start"));
    }

    #[test]
    fn test_stream_filters_thumbnail_tracks() {
        let body = json!({
            "success": true,
            "data": {
                "sources": [{"url": "http://x/y", "type": "hls"}],
                "tracks": [
                    {"kind": "captions", "label": "English", "file": "a.vtt"},
                    {"kind": "thumbnails", "file": "thumb.vtt"}
                ]
            }
        });
        let stream = map_stream(body).unwrap();
        assert_eq!(
            stream.subtitles,
            vec![Subtitle {
                url: "a.vtt".to_string(),
                lang: "English".to_string()
            }]
        );
        assert!(stream.sources[0].is_m3u8);
        assert_eq!(stream.referer.as_deref(), Some(DEFAULT_REFERER));
        assert_eq!(stream.user_agent.as_deref(), Some(DEFAULT_PLAYER_AGENT));
    }

    #[test]
    fn test_stream_source_classification() {
        let body = json!({
            "success": true,
            "data": {
                "sources": [
                    {"url": "http://x/master.m3u8"},
                    {"url": "http://x/video.mp4", "type": "mp4"}
                ],
                "headers": {"Referer": "https://megacloud.test/"}
            }
        });
        let stream = map_stream(body).unwrap();
        assert!(stream.sources[0].is_m3u8);
        assert!(!stream.sources[1].is_m3u8);
        assert_eq!(stream.referer.as_deref(), Some("https://megacloud.test/"));
    }

    #[test]
    fn test_stream_without_sources_fails() {
        let body = json!({"success": true, "data": {"sources": []}});
        assert!(matches!(map_stream(body), Err(Error::SchemaMismatch(_))));
        let body = json!({"success": true, "data": {"tracks": []}});
        assert!(matches!(map_stream(body), Err(Error::SchemaMismatch(_))));
    }

    #[tokio::test]
    async fn test_get_stream_encodes_episode_id_and_defaults_server() {
        let url = format!(
            "{}/api/v2/hianime/episode/sources?animeEpisodeId=steinsgate-3%3Fep%3D230&server=hd-1&category=sub",
            BASE
        );
        let (stub, provider) = provider(StubFetch::new().with_json(
            &url,
            json!({"success": true, "data": {"sources": [{"url": "http://x/a.m3u8"}]}}),
        ));
        let stream = provider.get_stream("steinsgate-3?ep=230", None).await.unwrap();
        assert_eq!(stream.sources.len(), 1);
        assert_eq!(stub.requested(), vec![url]);
    }

    #[tokio::test]
    async fn test_search_percent_encodes_query() {
        let url = format!("{}/api/v2/hianime/search?q=one%20piece", BASE);
        let (stub, provider) = provider(
            StubFetch::new().with_json(&url, json!({"success": true, "data": {"animes": []}})),
        );
        let result = provider.search("one piece").await.unwrap();
        assert!(result.is_empty());
        assert_eq!(stub.requested(), vec![url]);
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let (_, provider) = provider(StubFetch::new());
        let err = provider.search("anything").await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }
}
