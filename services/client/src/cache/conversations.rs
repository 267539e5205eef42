//! services/client/src/cache/conversations.rs
//!
//! The conversation list. It is the collection the session-bound poll keeps
//! fresh, since the backend has no push channel.

use std::sync::Arc;

use async_trait::async_trait;
use talent_core::domain::Conversation;
use talent_core::ports::{PortResult, RemoteGateway};
use talent_core::views;

use crate::cache::{CacheState, EntityCache, FetchOrigin, SyncTarget};

pub struct ConversationsCache {
    gateway: Arc<dyn RemoteGateway>,
    cache: EntityCache<Vec<Conversation>>,
}

impl ConversationsCache {
    pub fn new(gateway: Arc<dyn RemoteGateway>) -> Self {
        Self {
            gateway,
            cache: EntityCache::new("conversations"),
        }
    }

    pub async fn snapshot(&self) -> CacheState<Vec<Conversation>> {
        self.cache.snapshot().await
    }

    pub async fn conversations(&self) -> Vec<Conversation> {
        self.cache.data().await
    }

    pub async fn fetch(&self) -> PortResult<()> {
        self.fetch_with(&FetchOrigin::Interactive).await
    }

    async fn fetch_with(&self, origin: &FetchOrigin) -> PortResult<()> {
        self.cache
            .load(origin, self.gateway.fetch_conversations())
            .await
    }

    pub async fn unread_count(&self, user_id: &str) -> usize {
        self.cache
            .read(|conversations| views::unread_conversation_count(conversations, user_id))
            .await
    }
}

#[async_trait]
impl SyncTarget for ConversationsCache {
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
