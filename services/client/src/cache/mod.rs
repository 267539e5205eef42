//! services/client/src/cache/mod.rs
//!
//! The entity caches: one asynchronously-refreshed holder per server-owned
//! collection. `EntityCache<T>` is the shared state machine
//! (`idle -> loading -> ready | failed`); the submodules wrap it with the
//! collection-specific fetches and narrow mutators.

pub mod business;
pub mod conversations;
pub mod jobs;
pub mod student;
pub mod talents;

pub use business::BusinessProfileCache;
pub use conversations::ConversationsCache;
pub use jobs::JobsCache;
pub use student::StudentProfileCache;
pub use talents::TalentsCache;

use std::future::Future;

use async_trait::async_trait;
use talent_core::ports::{PortError, PortResult};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::session::SessionSignal;

//=========================================================================================
// Cache State
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Idle,
    Loading,
    Ready,
    Failed,
}

/// A read-only snapshot of one cache.
#[derive(Debug, Clone)]
pub struct CacheState<T> {
    pub status: CacheStatus,
    pub data: T,
    pub error: Option<PortError>,
    in_flight: usize,
    settled: CacheStatus,
    generation: u64,
}

impl<T: Default> Default for CacheState<T> {
    fn default() -> Self {
        Self {
            status: CacheStatus::Idle,
            data: T::default(),
            error: None,
            in_flight: 0,
            settled: CacheStatus::Idle,
            generation: 0,
        }
    }
}

impl<T> CacheState<T> {
    /// True while at least one fetch against this cache is unresolved.
    pub fn is_fetching(&self) -> bool {
        self.in_flight > 0
    }

    fn refresh_status(&mut self) {
        self.status = if self.in_flight > 0 {
            CacheStatus::Loading
        } else {
            self.settled
        };
    }
}

/// Who asked for a fetch. Background fetches carry the signal of the session
/// they were issued for, so a result that lands after logout is dropped.
#[derive(Clone)]
pub enum FetchOrigin {
    Interactive,
    Background(SessionSignal),
}

impl FetchOrigin {
    fn invalidated(&self) -> bool {
        match self {
            FetchOrigin::Interactive => false,
            FetchOrigin::Background(signal) => signal.is_invalidated(),
        }
    }
}

//=========================================================================================
// EntityCache
//=========================================================================================

pub struct EntityCache<T> {
    name: &'static str,
    state: RwLock<CacheState<T>>,
}

impl<T: Clone + Default + Send + Sync> EntityCache<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: RwLock::new(CacheState::default()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub async fn snapshot(&self) -> CacheState<T> {
        self.state.read().await.clone()
    }

    pub async fn data(&self) -> T {
        self.state.read().await.data.clone()
    }

    /// Runs one fetch and settles its outcome into the cache.
    ///
    /// Concurrent loads are not coalesced: whichever resolves last overwrites
    /// `data`. A load that resolves after a `reset` belongs to a previous
    /// generation and is discarded.
    pub async fn load<F>(&self, origin: &FetchOrigin, fetch: F) -> PortResult<()>
    where
        F: Future<Output = PortResult<T>> + Send,
    {
        let generation = {
            let mut state = self.state.write().await;
            state.in_flight += 1;
            state.refresh_status();
            state.generation
        };

        let outcome = fetch.await;

        let mut state = self.state.write().await;
        if state.generation != generation {
            debug!(cache = self.name, "Dropping result from before reset");
            return outcome.map(|_| ());
        }
        state.in_flight = state.in_flight.saturating_sub(1);

        if origin.invalidated() {
            debug!(cache = self.name, "Dropping background result for an ended session");
            state.refresh_status();
            return outcome.map(|_| ());
        }

        let result = match outcome {
            Ok(data) => {
                state.data = data;
                state.error = None;
                state.settled = CacheStatus::Ready;
                Ok(())
            }
            Err(e) => {
                // A rejected token on a background refresh is handled by
                // expiring the session, never shown as a cache error.
                let surface = !(matches!(origin, FetchOrigin::Background(_)) && e.is_auth());
                if surface {
                    warn!(cache = self.name, error = %e, "Fetch failed");
                    state.error = Some(e.clone());
                    state.settled = CacheStatus::Failed;
                }
                Err(e)
            }
        };
        state.refresh_status();
        result
    }

    /// Reads the cached data in place.
    pub(crate) async fn read<R, F>(&self, read: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        read(&self.state.read().await.data)
    }

    /// Applies a narrow mutation to the cached data without a refetch.
    pub(crate) async fn patch<F>(&self, mutate: F)
    where
        F: FnOnce(&mut T),
    {
        let mut state = self.state.write().await;
        mutate(&mut state.data);
    }

    /// Drops all data and errors; fetches still in flight will be ignored.
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        let generation = state.generation + 1;
        *state = CacheState {
            generation,
            ..CacheState::default()
        };
    }
}

/// Inserts `item` or replaces the element with the same id.
pub(crate) fn upsert_by_id<T, F>(items: &mut Vec<T>, item: T, id_of: F)
where
    F: Fn(&T) -> &str,
{
    match items.iter().position(|existing| id_of(existing) == id_of(&item)) {
        Some(index) => items[index] = item,
        None => items.push(item),
    }
}

/// A cache the session and the scheduler can drive without knowing its type.
#[async_trait]
pub trait SyncTarget: Send + Sync {
    fn name(&self) -> &'static str;

    /// Re-issues the cache's fetch with its last-used parameters.
    async fn refresh(&self, origin: FetchOrigin) -> PortResult<()>;

    async fn reset(&self);
}
