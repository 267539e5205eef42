//! services/client/src/session/notice.rs
//!
//! Transient authentication notices. A notice stays visible for a fixed
//! window and then clears itself, so the UI needs no timer of its own.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    id: u64,
}

pub(crate) struct NoticeBoard {
    tx: Arc<watch::Sender<Option<Notice>>>,
    next_id: AtomicU64,
    window: Duration,
}

impl NoticeBoard {
    pub(crate) fn new(window: Duration) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            tx: Arc::new(tx),
            next_id: AtomicU64::new(1),
            window,
        }
    }

    pub(crate) fn current(&self) -> Option<String> {
        self.tx.borrow().as_ref().map(|n| n.message.clone())
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Option<Notice>> {
        self.tx.subscribe()
    }

    /// Shows `message` and schedules its removal. Only the notice this call
    /// posted is removed; a newer one keeps its own full window.
    pub(crate) fn post(&self, message: String) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.tx.send_replace(Some(Notice { message, id }));

        let tx = Arc::clone(&self.tx);
        let window = self.window;
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            let cleared = tx.send_if_modified(|current| match current {
                Some(notice) if notice.id == id => {
                    *current = None;
                    true
                }
                _ => false,
            });
            if cleared {
                debug!("Auth notice expired");
            }
        });
    }

    pub(crate) fn clear(&self) {
        self.tx.send_replace(None);
    }
}
