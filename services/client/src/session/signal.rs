//! services/client/src/session/signal.rs
//!
//! The observable session state and the per-session invalidation signal.

use talent_core::domain::Session;
use tokio::sync::watch;

/// `anonymous -> authenticating -> authenticated`. There is no expired state:
/// expiry is discovered when a request fails and drops back to anonymous.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    Anonymous,
    Authenticating,
    Authenticated,
}

/// What subscribers of the session manager observe.
#[derive(Debug, Clone)]
pub struct SessionStatus {
    pub phase: AuthPhase,
    /// Bumped every time a session is acquired or cleared.
    pub epoch: u64,
    pub session: Option<Session>,
}

impl SessionStatus {
    pub(crate) fn anonymous() -> Self {
        Self {
            phase: AuthPhase::Anonymous,
            epoch: 0,
            session: None,
        }
    }
}

/// Answers "is the session this work was started for still the live one?".
#[derive(Debug, Clone)]
pub struct SessionSignal {
    rx: watch::Receiver<SessionStatus>,
    epoch: u64,
}

impl SessionSignal {
    pub(crate) fn new(rx: watch::Receiver<SessionStatus>, epoch: u64) -> Self {
        Self { rx, epoch }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_invalidated(&self) -> bool {
        let status = self.rx.borrow();
        status.epoch != self.epoch || status.session.is_none()
    }

    /// Resolves once the session this signal was issued for has ended.
    pub async fn invalidated(&mut self) {
        let epoch = self.epoch;
        // An Err means the manager is gone, which also ends the session.
        let _ = self
            .rx
            .wait_for(|status| status.epoch != epoch || status.session.is_none())
            .await;
    }
}
