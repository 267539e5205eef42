//! services/client/src/sync/scheduler.rs
//!
//! Maps UI events onto cache refreshes and owns the per-surface
//! "refreshing" indicators shown during pull-to-refresh.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use talent_core::domain::Role;
use talent_core::ports::{PortResult, RemoteGateway};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::cache::{
    BusinessProfileCache, ConversationsCache, FetchOrigin, JobsCache, StudentProfileCache,
    SyncTarget, TalentsCache,
};
use crate::session::SessionManager;

/// A screen backed by one cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Surface {
    Jobs,
    Conversations,
    StudentProfile,
    BusinessProfile,
    Talents,
}

impl Surface {
    /// Profile surfaces only exist for the matching account kind.
    fn available_to(self, role: Role) -> bool {
        match self {
            Surface::StudentProfile | Surface::Talents => role == Role::Student,
            Surface::BusinessProfile => role == Role::Business,
            Surface::Jobs | Surface::Conversations => true,
        }
    }
}

/// Every cache of the client, built against one gateway.
#[derive(Clone)]
pub struct Caches {
    pub jobs: Arc<JobsCache>,
    pub conversations: Arc<ConversationsCache>,
    pub student: Arc<StudentProfileCache>,
    pub business: Arc<BusinessProfileCache>,
    pub talents: Arc<TalentsCache>,
}

impl Caches {
    pub fn new(gateway: Arc<dyn RemoteGateway>) -> Self {
        Self {
            jobs: Arc::new(JobsCache::new(Arc::clone(&gateway))),
            conversations: Arc::new(ConversationsCache::new(Arc::clone(&gateway))),
            student: Arc::new(StudentProfileCache::new(Arc::clone(&gateway))),
            business: Arc::new(BusinessProfileCache::new(Arc::clone(&gateway))),
            talents: Arc::new(TalentsCache::new(gateway)),
        }
    }

    fn target(&self, surface: Surface) -> Arc<dyn SyncTarget> {
        match surface {
            Surface::Jobs => self.jobs.clone(),
            Surface::Conversations => self.conversations.clone(),
            Surface::StudentProfile => self.student.clone(),
            Surface::BusinessProfile => self.business.clone(),
            Surface::Talents => self.talents.clone(),
        }
    }

    fn all(&self) -> [Arc<dyn SyncTarget>; 5] {
        [
            self.jobs.clone(),
            self.conversations.clone(),
            self.student.clone(),
            self.business.clone(),
            self.talents.clone(),
        ]
    }
}

pub struct SyncScheduler {
    session: Arc<SessionManager>,
    caches: Caches,
    poll_every: Duration,
    refreshing: watch::Sender<BTreeSet<Surface>>,
}

/// Keeps a surface's indicator raised until dropped.
struct RefreshingGuard<'a> {
    refreshing: &'a watch::Sender<BTreeSet<Surface>>,
    surface: Surface,
}

impl Drop for RefreshingGuard<'_> {
    fn drop(&mut self) {
        let surface = self.surface;
        self.refreshing
            .send_if_modified(|surfaces| surfaces.remove(&surface));
    }
}

impl SyncScheduler {
    pub fn new(session: Arc<SessionManager>, caches: Caches, poll_every: Duration) -> Self {
        let (refreshing, _rx) = watch::channel(BTreeSet::new());
        Self {
            session,
            caches,
            poll_every,
            refreshing,
        }
    }

    pub fn caches(&self) -> &Caches {
        &self.caches
    }

    /// Registers the caches with the session manager: all of them are reset
    /// when the session ends, and conversations are polled while it lasts.
    pub async fn install(&self) {
        for target in self.caches.all() {
            self.session.attach_cache(target).await;
        }
        self.session
            .attach_poll(self.caches.conversations.clone(), self.poll_every)
            .await;
    }

    /// Initial fetch for a surface that has just been shown.
    pub async fn on_mount(&self, surface: Surface) -> PortResult<()> {
        debug!(?surface, "Surface mounted");
        self.fetch(surface).await
    }

    /// The jobs list refetches every time it regains focus.
    pub async fn on_focus(&self) -> PortResult<()> {
        self.fetch(Surface::Jobs).await
    }

    /// Pull-to-refresh: one fetch, with the surface flagged until it settles.
    pub async fn manual_refresh(&self, surface: Surface) -> PortResult<()> {
        self.refreshing.send_modify(|surfaces| {
            surfaces.insert(surface);
        });
        let _guard = RefreshingGuard {
            refreshing: &self.refreshing,
            surface,
        };
        self.fetch(surface).await
    }

    pub fn is_refreshing(&self, surface: Surface) -> bool {
        self.refreshing.borrow().contains(&surface)
    }

    pub fn subscribe_refreshing(&self) -> watch::Receiver<BTreeSet<Surface>> {
        self.refreshing.subscribe()
    }

    async fn fetch(&self, surface: Surface) -> PortResult<()> {
        let Some(session) = self.session.current() else {
            debug!(?surface, "No session; skipping fetch");
            return Ok(());
        };
        if !surface.available_to(session.role()) {
            debug!(?surface, role = ?session.role(), "Surface not available to this account");
            return Ok(());
        }
        let epoch = self.session.signal().map(|signal| signal.epoch());

        let result = self
            .caches
            .target(surface)
            .refresh(FetchOrigin::Interactive)
            .await;

        if let Err(e) = &result {
            if e.is_auth() {
                if let Some(epoch) = epoch {
                    info!(?surface, "Token rejected during refresh");
                    self.session.expire(epoch).await;
                }
            } else {
                warn!(?surface, error = %e, "Refresh failed");
            }
        }
        result
    }
}
