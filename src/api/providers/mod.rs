use crate::api::ProviderId;
use crate::api::models::{AnimeInfo, ChapterPages, MangaInfo, SearchResult, StreamInfo};
use crate::error::Result;

pub mod aniwatch;
pub mod mangadex;
pub mod zoro;

pub use aniwatch::AniWatch;
pub use mangadex::MangaDex;
pub use zoro::Zoro;

/// A registered upstream. Each one exposes the content interfaces it implements.
pub trait Provider: Send + Sync {
    fn id(&self) -> ProviderId;

    fn as_anime(&self) -> Option<&dyn AnimeProvider> {
        None
    }

    fn as_manga(&self) -> Option<&dyn MangaProvider> {
        None
    }
}

#[async_trait::async_trait]
pub trait AnimeProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<SearchResult>;

    async fn get_details(&self, id: &str) -> Result<AnimeInfo>;

    /// `server` of `None` uses the provider's own default.
    async fn get_stream(&self, episode_id: &str, server: Option<&str>) -> Result<StreamInfo>;
}

#[async_trait::async_trait]
pub trait MangaProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<SearchResult>;

    async fn get_details(&self, id: &str) -> Result<MangaInfo>;

    async fn get_chapter_pages(&self, chapter_id: &str) -> Result<ChapterPages>;
}

/// Subtitle tracks labelled "thumbnails" are seek-preview sprites.
pub(crate) fn is_thumbnail_track(label: Option<&str>) -> bool {
    label.is_some_and(|l| l.eq_ignore_ascii_case("thumbnails"))
}
