//! services/client/src/session/manager.rs
//!
//! The session manager owns the authentication lifecycle: login, registration,
//! cold-start restore, logout and expiry. It is the only writer of persisted
//! session storage and it owns every task whose lifetime is bound to a
//! session (the conversation poll).

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use futures::future::join_all;
use talent_core::domain::{
    AuthPayload, BusinessRegistration, Session, StudentRegistration, UserIdentity,
};
use talent_core::ports::{
    BiometricAuthenticator, KeyValueStore, PortError, PortResult, RemoteGateway,
};
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::SyncTarget;
use crate::error::SessionError;
use crate::session::notice::{Notice, NoticeBoard};
use crate::session::signal::{AuthPhase, SessionSignal, SessionStatus};
use crate::sync::poll::poll_loop;

pub const AUTH_TOKEN_KEY: &str = "authToken";
pub const USER_KEY: &str = "user";

//=========================================================================================
// Background Task Registry
//=========================================================================================

struct PollRegistration {
    target: Arc<dyn SyncTarget>,
    every: Duration,
}

#[derive(Default)]
struct Background {
    polls: Vec<PollRegistration>,
    bound: Vec<Arc<dyn SyncTarget>>,
    token: Option<CancellationToken>,
}

//=========================================================================================
// SessionManager
//=========================================================================================

pub struct SessionManager {
    pub(crate) gateway: Arc<dyn RemoteGateway>,
    storage: Arc<dyn KeyValueStore>,
    pub(crate) secure: Arc<dyn KeyValueStore>,
    pub(crate) biometric: Arc<dyn BiometricAuthenticator>,
    status: watch::Sender<SessionStatus>,
    authenticating: AtomicBool,
    notices: NoticeBoard,
    background: Mutex<Background>,
    me: Weak<SessionManager>,
}

/// Marks a login/registration as running for as long as it lives.
struct AuthAttempt<'a> {
    manager: &'a SessionManager,
}

impl Drop for AuthAttempt<'_> {
    fn drop(&mut self) {
        self.manager.authenticating.store(false, Ordering::SeqCst);
        self.manager.status.send_if_modified(|status| {
            if status.phase == AuthPhase::Authenticating {
                status.phase = AuthPhase::Anonymous;
                true
            } else {
                false
            }
        });
    }
}

impl SessionManager {
    pub fn new(
        gateway: Arc<dyn RemoteGateway>,
        storage: Arc<dyn KeyValueStore>,
        secure: Arc<dyn KeyValueStore>,
        biometric: Arc<dyn BiometricAuthenticator>,
        notice_window: Duration,
    ) -> Arc<Self> {
        let (status, _rx) = watch::channel(SessionStatus::anonymous());
        Arc::new_cyclic(|me| Self {
            gateway,
            storage,
            secure,
            biometric,
            status,
            authenticating: AtomicBool::new(false),
            notices: NoticeBoard::new(notice_window),
            background: Mutex::new(Background::default()),
            me: me.clone(),
        })
    }

    // --- Reads ---

    pub fn current(&self) -> Option<Session> {
        self.status.borrow().session.clone()
    }

    pub fn phase(&self) -> AuthPhase {
        self.status.borrow().phase
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status.subscribe()
    }

    /// The invalidation signal for the live session, if any.
    pub fn signal(&self) -> Option<SessionSignal> {
        let epoch = {
            let status = self.status.borrow();
            status.session.as_ref()?;
            status.epoch
        };
        Some(SessionSignal::new(self.status.subscribe(), epoch))
    }

    /// The login/registration error currently on display.
    pub fn notice(&self) -> Option<String> {
        self.notices.current()
    }

    pub fn subscribe_notice(&self) -> watch::Receiver<Option<Notice>> {
        self.notices.subscribe()
    }

    pub fn dismiss_notice(&self) {
        self.notices.clear();
    }

    // --- Background task ownership ---

    /// Polls `target` every `every` while a session is live.
    pub async fn attach_poll(&self, target: Arc<dyn SyncTarget>, every: Duration) {
        let mut background = self.background.lock().await;
        if let (Some(token), Some(signal)) = (&background.token, self.signal()) {
            self.spawn_poll(Arc::clone(&target), every, signal, token.child_token());
        }
        background.polls.push(PollRegistration { target, every });
    }

    /// Resets `target` whenever the session is cleared.
    pub async fn attach_cache(&self, target: Arc<dyn SyncTarget>) {
        self.background.lock().await.bound.push(target);
    }

    fn spawn_poll(
        &self,
        target: Arc<dyn SyncTarget>,
        every: Duration,
        signal: SessionSignal,
        token: CancellationToken,
    ) {
        info!(target = target.name(), ?every, "Starting background poll");
        tokio::spawn(poll_loop(target, every, signal, token, self.me.clone()));
    }

    async fn start_background(&self) {
        let mut background = self.background.lock().await;
        if let Some(previous) = background.token.take() {
            previous.cancel();
        }
        let Some(signal) = self.signal() else {
            return;
        };
        let token = CancellationToken::new();
        for poll in &background.polls {
            self.spawn_poll(
                Arc::clone(&poll.target),
                poll.every,
                signal.clone(),
                token.child_token(),
            );
        }
        background.token = Some(token);
    }

    async fn stop_background(&self) -> Vec<Arc<dyn SyncTarget>> {
        let mut background = self.background.lock().await;
        if let Some(token) = background.token.take() {
            debug!("Cancelling session-bound tasks");
            token.cancel();
        }
        background.bound.clone()
    }

    /// Cancels session-bound tasks without touching the session, for teardown.
    pub async fn shutdown(&self) {
        self.stop_background().await;
    }

    // --- Login & Registration ---

    fn begin_attempt(&self) -> Result<AuthAttempt<'_>, SessionError> {
        if self.authenticating.swap(true, Ordering::SeqCst) {
            return Err(SessionError::Busy);
        }
        self.notices.clear();
        self.status.send_if_modified(|status| {
            if status.phase == AuthPhase::Anonymous {
                status.phase = AuthPhase::Authenticating;
                true
            } else {
                false
            }
        });
        Ok(AuthAttempt { manager: self })
    }

    pub async fn login(&self, identity: &str, secret: &str) -> Result<Session, SessionError> {
        let _attempt = self.begin_attempt()?;
        info!("Logging in");

        let payload = match self.gateway.login(identity, secret).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Login failed");
                return self.fail(SessionError::Port(e));
            }
        };

        let session = match self.adopt(payload).await {
            Ok(session) => session,
            Err(e) => return self.fail(SessionError::Port(e)),
        };
        self.remember_credentials(identity, secret).await;
        Ok(session)
    }

    pub async fn register_student(
        &self,
        fields: &StudentRegistration,
        consent: bool,
    ) -> Result<Session, SessionError> {
        self.register(self.gateway.register_student(fields), consent)
            .await
    }

    pub async fn register_business(
        &self,
        fields: &BusinessRegistration,
        consent: bool,
    ) -> Result<Session, SessionError> {
        self.register(self.gateway.register_business(fields), consent)
            .await
    }

    async fn register<F>(&self, request: F, consent: bool) -> Result<Session, SessionError>
    where
        F: Future<Output = PortResult<AuthPayload>>,
    {
        let _attempt = self.begin_attempt()?;
        info!("Registering account");

        let payload = match request.await {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Registration failed");
                return self.fail(SessionError::Port(e));
            }
        };

        let session = match self.adopt(payload).await {
            Ok(session) => session,
            Err(e) => return self.fail(SessionError::Port(e)),
        };

        if consent {
            if let Err(e) = self.accept_current_agreement().await {
                warn!(error = %e, "Could not record agreement consent");
            }
        }
        Ok(session)
    }

    async fn accept_current_agreement(&self) -> PortResult<()> {
        let agreement = self.gateway.get_current_agreement().await?;
        self.gateway.accept_agreement(&agreement.version).await?;
        info!(version = %agreement.version, "Agreement accepted");
        Ok(())
    }

    /// Persists a fresh session, then makes it the live one.
    async fn adopt(&self, payload: AuthPayload) -> PortResult<Session> {
        let session = payload.into_session();
        self.persist(&session).await?;
        self.establish(session.clone()).await;
        Ok(session)
    }

    pub(crate) fn fail<T>(&self, err: SessionError) -> Result<T, SessionError> {
        if let Some(message) = err.notice() {
            self.notices.post(message);
        }
        Err(err)
    }

    async fn persist(&self, session: &Session) -> PortResult<()> {
        let user = serde_json::to_string(&session.identity)
            .map_err(|e| PortError::Unexpected(format!("Failed to encode session: {}", e)))?;
        self.storage.set(AUTH_TOKEN_KEY, &session.access_token).await?;
        if let Err(e) = self.storage.set(USER_KEY, &user).await {
            // Both keys or neither.
            let _ = self.storage.remove(AUTH_TOKEN_KEY).await;
            return Err(e);
        }
        Ok(())
    }

    async fn establish(&self, session: Session) {
        self.gateway.set_access_token(Some(session.access_token.clone()));
        info!(user_id = %session.user_id(), role = ?session.role(), "Session established");
        self.status.send_modify(|status| {
            status.epoch += 1;
            status.phase = AuthPhase::Authenticated;
            status.session = Some(session);
        });
        self.start_background().await;
    }

    // --- Restore ---

    /// Re-establishes the persisted session without a network round trip.
    pub async fn restore_session(&self) -> Option<Session> {
        let token = match self.storage.get(AUTH_TOKEN_KEY).await {
            Ok(Some(token)) => token,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Failed to read persisted token");
                return None;
            }
        };
        let raw_user = match self.storage.get(USER_KEY).await {
            Ok(Some(user)) => user,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Failed to read persisted user");
                return None;
            }
        };
        let identity: UserIdentity = match serde_json::from_str(&raw_user) {
            Ok(identity) => identity,
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable persisted user");
                return None;
            }
        };

        let session = Session {
            identity,
            access_token: token,
        };
        info!("Restoring persisted session");
        self.establish(session.clone()).await;
        Some(session)
    }

    // --- Logout & Expiry ---

    /// Best-effort remote logout, then an unconditional local clear.
    pub async fn logout(&self) {
        if self.current().is_some() {
            if let Err(e) = self.gateway.logout().await {
                debug!(error = %e, "Remote logout failed; clearing locally anyway");
            }
        }
        self.clear_persisted().await;
        self.clear().await;
        info!("Logged out");
    }

    /// Ends the session issued at `epoch` after the server rejected its token.
    /// Does nothing if that session has already been replaced or cleared.
    pub async fn expire(&self, epoch: u64) {
        let live = {
            let status = self.status.borrow();
            status.session.is_some() && status.epoch == epoch
        };
        if !live {
            debug!(epoch, "Ignoring expiry for a session that is no longer live");
            return;
        }
        warn!("Session rejected by server; signing out");
        self.clear_persisted().await;
        self.clear().await;
    }

    async fn clear_persisted(&self) {
        for key in [AUTH_TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.storage.remove(key).await {
                warn!(key, error = %e, "Failed to clear persisted session key");
            }
        }
    }

    async fn clear(&self) {
        let bound = self.stop_background().await;
        self.gateway.set_access_token(None);
        self.status.send_modify(|status| {
            status.epoch += 1;
            status.phase = AuthPhase::Anonymous;
            status.session = None;
        });
        join_all(bound.iter().map(|target| target.reset())).await;
    }
}
