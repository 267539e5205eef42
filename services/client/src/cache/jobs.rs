//! services/client/src/cache/jobs.rs
//!
//! The jobs cache and the apply-for-job write flow.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use talent_core::domain::{Application, ApplyRequest, Job, JobFilter, Role, Session};
use talent_core::ports::{PortResult, RemoteGateway};
use talent_core::views;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::cache::{upsert_by_id, CacheState, EntityCache, FetchOrigin, SyncTarget};
use crate::error::ApplyError;

pub struct JobsCache {
    gateway: Arc<dyn RemoteGateway>,
    cache: EntityCache<Vec<Job>>,
    filter: RwLock<JobFilter>,
    applying: Mutex<HashSet<String>>,
    /// Student id learned from the server's copy of a submitted application,
    /// for sessions whose persisted identity carries none.
    learned_student: Mutex<Option<String>>,
}

/// Holds a job id in the in-flight set until dropped.
struct ApplyingGuard<'a> {
    set: &'a Mutex<HashSet<String>>,
    job_id: String,
}

impl Drop for ApplyingGuard<'_> {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.job_id);
    }
}

impl JobsCache {
    pub fn new(gateway: Arc<dyn RemoteGateway>) -> Self {
        Self {
            gateway,
            cache: EntityCache::new("jobs"),
            filter: RwLock::new(JobFilter::default()),
            applying: Mutex::new(HashSet::new()),
            learned_student: Mutex::new(None),
        }
    }

    pub async fn snapshot(&self) -> CacheState<Vec<Job>> {
        self.cache.snapshot().await
    }

    pub async fn jobs(&self) -> Vec<Job> {
        self.cache.data().await
    }

    pub async fn filter(&self) -> JobFilter {
        self.filter.read().await.clone()
    }

    /// Fetches with `filter` and remembers it for later refreshes.
    pub async fn fetch(&self, filter: JobFilter) -> PortResult<()> {
        *self.filter.write().await = filter.clone();
        self.fetch_with(&FetchOrigin::Interactive, filter).await
    }

    async fn fetch_with(&self, origin: &FetchOrigin, filter: JobFilter) -> PortResult<()> {
        self.cache
            .load(origin, self.gateway.fetch_jobs(&filter))
            .await
    }

    fn student_id_for(&self, session: &Session) -> Option<String> {
        session.student_id().map(str::to_string).or_else(|| {
            self.learned_student
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        })
    }

    pub async fn has_applied(&self, job_id: &str, student_id: &str) -> bool {
        self.cache
            .read(|jobs| {
                jobs.iter()
                    .find(|job| job.id == job_id)
                    .is_some_and(|job| views::has_applied(job, student_id))
            })
            .await
    }

    /// Submits an application unless the cache already shows one.
    ///
    /// The local check avoids the round trip in the common case; a conflict
    /// the server still reports is returned as-is, without retry.
    pub async fn apply_for_job(
        &self,
        session: &Session,
        job_id: &str,
        request: &ApplyRequest,
    ) -> Result<Application, ApplyError> {
        if session.role() != Role::Student {
            return Err(ApplyError::NotAStudent);
        }
        if let Some(student_id) = self.student_id_for(session) {
            if self.has_applied(job_id, &student_id).await {
                info!(job_id, "Skipping apply; already applied");
                return Err(ApplyError::AlreadyApplied);
            }
        }

        let _guard = {
            let mut applying = self.applying.lock().unwrap_or_else(PoisonError::into_inner);
            if !applying.insert(job_id.to_string()) {
                return Err(ApplyError::ApplicationInFlight);
            }
            ApplyingGuard {
                set: &self.applying,
                job_id: job_id.to_string(),
            }
        };

        match self.gateway.apply_for_job(job_id, request).await {
            Ok(application) => {
                info!(job_id, application_id = %application.id, "Application submitted");
                if session.student_id().is_none() {
                    *self
                        .learned_student
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner) =
                        Some(application.student.id.clone());
                }
                self.upsert_application(application.clone()).await;
                Ok(application)
            }
            Err(e) => {
                warn!(job_id, error = %e, "Application failed");
                Err(ApplyError::Port(e))
            }
        }
    }

    /// Adds `application` to its job, replacing any entry with the same id.
    pub async fn upsert_application(&self, application: Application) {
        self.cache
            .patch(|jobs| {
                if let Some(job) = jobs.iter_mut().find(|j| j.id == application.job_id) {
                    upsert_by_id(&mut job.applications, application, |a| a.id.as_str());
                }
            })
            .await;
    }
}

#[async_trait]
impl SyncTarget for JobsCache {
    fn name(&self) -> &'static str {
        self.cache.name()
    }

    async fn refresh(&self, origin: FetchOrigin) -> PortResult<()> {
        let filter = self.filter().await;
        self.fetch_with(&origin, filter).await
    }

    async fn reset(&self) {
        *self.filter.write().await = JobFilter::default();
        *self
            .learned_student
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
        self.cache.reset().await;
    }
}
