//! services/client/src/bin/sync_agent.rs

use client_lib::{
    adapters::{DbAdapter, HttpGateway, KeyringStore, UnsupportedBiometric},
    config::Config,
    error::ClientError,
    session::SessionManager,
    sync::{Caches, Surface, SyncScheduler},
};
use std::sync::Arc;
use talent_core::domain::Role;
use talent_core::views;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting sync agent...");

    // --- 2. Open Device Storage & Run Migrations ---
    info!("Opening storage at {}", config.storage_url);
    let pool = DbAdapter::connect(&config.storage_url).await?;
    DbAdapter::run_migrations(&pool).await?;
    info!("Storage migrations complete.");
    let storage = Arc::new(DbAdapter::new(pool));
    // Biometric replay credentials go to the OS key store, never to SQLite.
    let secure = Arc::new(KeyringStore::new(&config.keyring_service));

    // --- 3. Build the Gateway, Session Manager & Caches ---
    let gateway = Arc::new(HttpGateway::new(&config.api_base_url, config.request_timeout)?);
    let session = SessionManager::new(
        gateway.clone(),
        storage,
        secure,
        Arc::new(UnsupportedBiometric),
        config.notice_display_window,
    );
    let scheduler = SyncScheduler::new(
        session.clone(),
        Caches::new(gateway),
        config.conversation_poll_interval,
    );
    scheduler.install().await;

    // --- 4. Restore the Persisted Session ---
    let Some(current) = session.restore_session().await else {
        info!("No persisted session. Sign in from the app first.");
        return Ok(());
    };
    info!(user_id = %current.user_id(), "Session restored");

    // --- 5. Mount the Main Surfaces ---
    for surface in [Surface::Jobs, Surface::Conversations] {
        if let Err(e) = scheduler.on_mount(surface).await {
            warn!(?surface, error = %e, "Initial fetch failed");
        }
    }

    let caches = scheduler.caches();
    let unread = caches.conversations.unread_count(current.user_id()).await;
    info!(unread, "Conversations with unread messages");
    if let (Role::Student, Some(student_id)) = (current.role(), current.student_id()) {
        let jobs = caches.jobs.jobs().await;
        let mine = views::my_applications(&jobs, student_id);
        let counts = views::status_counts(&mine);
        info!(
            jobs = jobs.len(),
            applications = counts.all,
            pending = counts.pending,
            interviewing = counts.interviewing,
            "Application summary"
        );
    }

    // --- 6. Keep Polling Until Interrupted ---
    info!("Polling every {:?}. Press Ctrl-C to stop.", config.conversation_poll_interval);
    tokio::signal::ctrl_c().await?;
    info!("Shutting down.");
    session.shutdown().await;

    Ok(())
}
