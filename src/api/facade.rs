//! Provider-agnostic entry point for the UI.
//!
//! The caller owns the active provider and passes it on every call; the facade
//! resolves it through the registry and hands the adapter's result back
//! untouched. A provider that lacks the interface for the requested content
//! type yields `CapabilityUnavailable` before any request is made.

use tracing::{debug, warn};

use super::models::{AnimeInfo, ChapterPages, MangaInfo, SearchResult, StreamInfo};
use super::providers::{AnimeProvider, MangaProvider};
use super::{ContentType, ProviderId, Registry};
use crate::error::{Error, Result};

pub struct ContentFacade {
    registry: Registry,
}

impl ContentFacade {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    fn anime(&self, provider: ProviderId) -> Result<&dyn AnimeProvider> {
        self.registry
            .get(provider)
            .and_then(|p| p.as_anime())
            .ok_or(Error::CapabilityUnavailable {
                provider,
                content: ContentType::Anime,
            })
    }

    fn manga(&self, provider: ProviderId) -> Result<&dyn MangaProvider> {
        self.registry
            .get(provider)
            .and_then(|p| p.as_manga())
            .ok_or(Error::CapabilityUnavailable {
                provider,
                content: ContentType::Manga,
            })
    }

    pub async fn search(
        &self,
        provider: ProviderId,
        content: ContentType,
        query: &str,
    ) -> Result<SearchResult> {
        debug!(%provider, %content, query = %query, "search");
        let result = match content {
            ContentType::Anime => self.anime(provider)?.search(query).await,
            ContentType::Manga => self.manga(provider)?.search(query).await,
        };
        log_failure(provider, "search", result)
    }

    pub async fn anime_details(&self, provider: ProviderId, id: &str) -> Result<AnimeInfo> {
        debug!(%provider, id = %id, "anime details");
        let result = self.anime(provider)?.get_details(id).await;
        log_failure(provider, "anime details", result)
    }

    pub async fn episode_stream(
        &self,
        provider: ProviderId,
        episode_id: &str,
        server: Option<&str>,
    ) -> Result<StreamInfo> {
        debug!(%provider, episode = %episode_id, server = ?server, "episode stream");
        let result = self.anime(provider)?.get_stream(episode_id, server).await;
        log_failure(provider, "episode stream", result)
    }

    pub async fn manga_details(&self, provider: ProviderId, id: &str) -> Result<MangaInfo> {
        debug!(%provider, id = %id, "manga details");
        let result = self.manga(provider)?.get_details(id).await;
        log_failure(provider, "manga details", result)
    }

    pub async fn chapter_pages(&self, provider: ProviderId, chapter_id: &str) -> Result<ChapterPages> {
        debug!(%provider, chapter = %chapter_id, "chapter pages");
        let result = self.manga(provider)?.get_chapter_pages(chapter_id).await;
        log_failure(provider, "chapter pages", result)
    }
}

fn log_failure<T>(provider: ProviderId, operation: &str, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        warn!(%provider, operation, error = %e, "Provider operation failed");
    }
    result
}
