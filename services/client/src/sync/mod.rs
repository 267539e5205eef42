//! services/client/src/sync/mod.rs
//!
//! When caches get refreshed: on mount, on focus, on pull-to-refresh and on
//! the session-bound background poll.

pub mod poll;
pub mod scheduler;

pub use scheduler::{Caches, Surface, SyncScheduler};
