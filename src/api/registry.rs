use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use super::http::HttpClient;
use super::providers::{AniWatch, MangaDex, Provider, Zoro};
use super::{ContentType, ProviderId};
use crate::config::ProvidersConfig;
use crate::error::Result;

/// Fixed provider table, built once at startup.
pub struct Registry {
    providers: Vec<Box<dyn Provider>>,
}

impl Registry {
    /// Providers are stored in `ProviderId::ALL` order regardless of input order.
    pub fn new(mut providers: Vec<Box<dyn Provider>>) -> Self {
        providers.sort_by_key(|p| p.id().index());
        providers.dedup_by_key(|p| p.id());
        Self { providers }
    }

    pub fn from_config(config: &ProvidersConfig) -> Result<Self> {
        let timeout = |secs: Option<u64>| secs.map(Duration::from_secs);

        let aniwatch = AniWatch::new(Arc::new(HttpClient::new(timeout(
            config.aniwatch.timeout_secs,
        ))?))
        .with_base_url(&config.aniwatch.base_url)
        .with_category(&config.aniwatch.category);

        let zoro = Zoro::new(Arc::new(HttpClient::new(timeout(config.zoro.timeout_secs))?))
            .with_base_url(&config.zoro.base_url);

        let mangadex = MangaDex::new(Arc::new(HttpClient::new(timeout(
            config.mangadex.timeout_secs,
        ))?))
        .with_base_url(&config.mangadex.base_url);

        let registry = Self::new(vec![
            Box::new(aniwatch),
            Box::new(zoro),
            Box::new(mangadex),
        ]);
        info!(providers = registry.providers.len(), "Provider registry built");
        Ok(registry)
    }

    pub fn get(&self, id: ProviderId) -> Option<&dyn Provider> {
        self.providers
            .iter()
            .find(|p| p.id() == id)
            .map(|p| p.as_ref())
    }

    /// Registered providers that support `content`, in table order.
    pub fn available(&self, content: ContentType) -> Vec<ProviderId> {
        self.providers
            .iter()
            .map(|p| p.id())
            .filter(|id| id.supports(content))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::http::stub::StubFetch;
    use crate::config::ProvidersConfig;

    fn stub_registry() -> Registry {
        let stub = Arc::new(StubFetch::new());
        Registry::new(vec![
            Box::new(MangaDex::new(stub.clone())),
            Box::new(AniWatch::new(stub.clone())),
            Box::new(Zoro::new(stub)),
        ])
    }

    #[test]
    fn test_table_order() {
        let registry = stub_registry();
        assert_eq!(
            registry.available(ContentType::Anime),
            vec![ProviderId::AniWatch, ProviderId::Zoro]
        );
        assert_eq!(
            registry.available(ContentType::Manga),
            vec![ProviderId::MangaDex]
        );
    }

    #[test]
    fn test_interfaces_match_capability_matrix() {
        let registry = stub_registry();
        for id in ProviderId::ALL {
            let provider = registry.get(id).unwrap();
            assert_eq!(provider.as_anime().is_some(), id.supports(ContentType::Anime));
            assert_eq!(provider.as_manga().is_some(), id.supports(ContentType::Manga));
        }
    }

    #[test]
    fn test_missing_provider_is_none() {
        let stub = Arc::new(StubFetch::new());
        let registry = Registry::new(vec![Box::new(Zoro::new(stub))]);
        assert!(registry.get(ProviderId::AniWatch).is_none());
        assert!(registry.available(ContentType::Manga).is_empty());
    }

    #[test]
    fn test_from_config() {
        let registry = Registry::from_config(&ProvidersConfig::default()).unwrap();
        assert!(ProviderId::ALL.iter().all(|id| registry.get(*id).is_some()));
    }
}
