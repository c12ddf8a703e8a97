use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

mod facade;
pub mod http;
mod json;
pub mod models;
pub mod providers;
mod registry;

pub use facade::ContentFacade;
pub use models::{
    AnimeInfo, Chapter, ChapterPages, Episode, MangaInfo, SearchResult, SearchResultItem,
    StreamInfo,
};
pub use registry::Registry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
    Anime,
    Manga,
}

impl ContentType {
    pub const ALL: [ContentType; 2] = [ContentType::Anime, ContentType::Manga];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Anime => "Anime",
            ContentType::Manga => "Manga",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    AniWatch,
    Zoro,
    MangaDex,
}

impl ProviderId {
    /// Table order. Registry lookups and the provider picker follow it.
    pub const ALL: [ProviderId; 3] = [ProviderId::AniWatch, ProviderId::Zoro, ProviderId::MangaDex];

    pub fn index(&self) -> usize {
        match self {
            ProviderId::AniWatch => 0,
            ProviderId::Zoro => 1,
            ProviderId::MangaDex => 2,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            ProviderId::AniWatch => "aniwatch",
            ProviderId::Zoro => "zoro",
            ProviderId::MangaDex => "mangadex",
        }
    }

    pub fn as_display(&self) -> &'static str {
        match self {
            ProviderId::AniWatch => "AniWatch",
            ProviderId::Zoro => "Zoro",
            ProviderId::MangaDex => "MangaDex",
        }
    }

    /// Fixed capability matrix.
    pub fn supports(&self, content: ContentType) -> bool {
        matches!(
            (self, content),
            (ProviderId::AniWatch, ContentType::Anime)
                | (ProviderId::Zoro, ContentType::Anime)
                | (ProviderId::MangaDex, ContentType::Manga)
        )
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_display())
    }
}

impl FromStr for ProviderId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProviderId::ALL
            .into_iter()
            .find(|p| p.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownProvider(s.to_string()))
    }
}

impl Serialize for ProviderId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

impl<'de> Deserialize<'de> for ProviderId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        key.parse().map_err(serde::de::Error::custom)
    }
}
