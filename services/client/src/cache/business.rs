//! services/client/src/cache/business.rs
//!
//! The signed-in business's company profile.

use std::sync::Arc;

use async_trait::async_trait;
use talent_core::domain::{Business, BusinessUpdate};
use talent_core::ports::{PortResult, RemoteGateway};

use crate::cache::{CacheState, EntityCache, FetchOrigin, SyncTarget};

pub struct BusinessProfileCache {
    gateway: Arc<dyn RemoteGateway>,
    cache: EntityCache<Option<Business>>,
}

impl BusinessProfileCache {
    pub fn new(gateway: Arc<dyn RemoteGateway>) -> Self {
        Self {
            gateway,
            cache: EntityCache::new("business_profile"),
        }
    }

    pub async fn snapshot(&self) -> CacheState<Option<Business>> {
        self.cache.snapshot().await
    }

    pub async fn profile(&self) -> Option<Business> {
        self.cache.data().await
    }

    pub async fn fetch(&self) -> PortResult<()> {
        self.fetch_with(&FetchOrigin::Interactive).await
    }

    async fn fetch_with(&self, origin: &FetchOrigin) -> PortResult<()> {
        let fetch = async { self.gateway.fetch_business_profile().await.map(Some) };
        self.cache.load(origin, fetch).await
    }

    pub async fn update(&self, partial: &BusinessUpdate) -> PortResult<Business> {
        let business = self.gateway.update_business_profile(partial).await?;
        let cached = business.clone();
        self.cache.patch(|profile| *profile = Some(cached)).await;
        Ok(business)
    }
}

#[async_trait]
impl SyncTarget for BusinessProfileCache {
    fn name(&self) -> &'static str {
        self.cache.name()
    }

    async fn refresh(&self, origin: FetchOrigin) -> PortResult<()> {
        self.fetch_with(&origin).await
    }

    async fn reset(&self) {
        self.cache.reset().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStatus;
    use crate::testing::{business, FakeGateway};
    use talent_core::ports::PortError;

    #[tokio::test]
    async fn test_fetch_failure_keeps_stale_profile() {
        let gateway = FakeGateway::new();
        gateway.set_business(Ok(business("b1")));
        let cache = BusinessProfileCache::new(gateway.clone());
        cache.fetch().await.unwrap();

        gateway.set_business(Err(PortError::Network("offline".into())));
        assert!(cache.fetch().await.is_err());

        let state = cache.snapshot().await;
        assert_eq!(state.status, CacheStatus::Failed);
        assert_eq!(state.data.map(|b| b.id).as_deref(), Some("b1"));
    }

    #[tokio::test]
    async fn test_update_caches_server_copy() {
        let gateway = FakeGateway::new();
        gateway.set_business(Ok(business("b1")));
        let cache = BusinessProfileCache::new(gateway.clone());

        let update = BusinessUpdate {
            website: Some("https://acme.test".into()),
            ..BusinessUpdate::default()
        };
        cache.update(&update).await.unwrap();
        assert_eq!(
            cache.profile().await.and_then(|b| b.website).as_deref(),
            Some("https://acme.test")
        );
    }
}
