//! services/client/src/cache/talents.rs
//!
//! The student's talents list.

use std::sync::Arc;

use async_trait::async_trait;
use talent_core::domain::{Talent, TalentInput};
use talent_core::ports::{PortResult, RemoteGateway};

use crate::cache::{upsert_by_id, CacheState, EntityCache, FetchOrigin, SyncTarget};

pub struct TalentsCache {
    gateway: Arc<dyn RemoteGateway>,
    cache: EntityCache<Vec<Talent>>,
}

impl TalentsCache {
    pub fn new(gateway: Arc<dyn RemoteGateway>) -> Self {
        Self {
            gateway,
            cache: EntityCache::new("talents"),
        }
    }

    pub async fn snapshot(&self) -> CacheState<Vec<Talent>> {
        self.cache.snapshot().await
    }

    pub async fn talents(&self) -> Vec<Talent> {
        self.cache.data().await
    }

    pub async fn fetch(&self) -> PortResult<()> {
        self.fetch_with(&FetchOrigin::Interactive).await
    }

    async fn fetch_with(&self, origin: &FetchOrigin) -> PortResult<()> {
        self.cache.load(origin, self.gateway.fetch_talents()).await
    }

    pub async fn add(&self, input: &TalentInput) -> PortResult<Talent> {
        let talent = self.gateway.add_talent(input).await?;
        self.upsert(talent.clone()).await;
        Ok(talent)
    }

    pub async fn update(&self, id: &str, input: &TalentInput) -> PortResult<Talent> {
        let talent = self.gateway.update_talent(id, input).await?;
        self.upsert(talent.clone()).await;
        Ok(talent)
    }

    pub async fn delete(&self, id: &str) -> PortResult<()> {
        self.gateway.delete_talent(id).await?;
        self.cache
            .patch(|talents| talents.retain(|t| t.id != id))
            .await;
        Ok(())
    }

    pub async fn upsert(&self, talent: Talent) {
        self.cache
            .patch(|talents| upsert_by_id(talents, talent, |t| t.id.as_str()))
            .await;
    }
}

#[async_trait]
impl SyncTarget for TalentsCache {
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
