//! services/client/src/sync/poll.rs
//!
//! The fixed-interval background refresh. One loop runs per attached target
//! for the lifetime of a single session; the session manager spawns it and
//! cancels it through the token.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::{FetchOrigin, SyncTarget};
use crate::session::{SessionManager, SessionSignal};

/// Refreshes `target` every `every` until the token is cancelled or the
/// session behind `signal` ends. The first refresh happens one interval
/// after start.
///
/// A refresh that has already been issued is never aborted; if the session
/// ends while it is in flight, the cache discards its result.
pub(crate) async fn poll_loop(
    target: Arc<dyn SyncTarget>,
    every: Duration,
    signal: SessionSignal,
    token: CancellationToken,
    session: Weak<SessionManager>,
) {
    let mut ticker = interval_at(Instant::now() + every, every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut ended = signal.clone();

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ended.invalidated() => break,
            _ = ticker.tick() => {}
        }

        debug!(target = target.name(), "Background refresh");
        let Err(e) = target
            .refresh(FetchOrigin::Background(signal.clone()))
            .await
        else {
            continue;
        };

        if signal.is_invalidated() {
            debug!(target = target.name(), error = %e, "Suppressing error from an ended session");
            break;
        }
        if e.is_auth() {
            if let Some(manager) = session.upgrade() {
                manager.expire(signal.epoch()).await;
            }
            break;
        }
        warn!(target = target.name(), error = %e, "Background refresh failed");
    }

    info!(target = target.name(), "Background poll stopped");
}
