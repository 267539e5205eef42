//! services/client/src/error.rs
//!
//! Defines the error types of the client service: one per boundary the UI
//! talks to, plus the top-level error of the composition root.

use crate::config::ConfigError;
use talent_core::ports::PortError;

/// The primary error type for wiring up and running the client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying storage database.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents an error while applying the storage migrations.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of the session lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Port(#[from] PortError),

    #[error("Biometric authentication is not available on this device")]
    BiometricUnavailable,

    #[error("No biometric credential is enrolled on this device")]
    BiometricNotEnrolled,

    #[error("Biometric login has not been enabled")]
    BiometricNotEnabled,

    #[error("No saved credentials for biometric login. Sign in with your password first.")]
    NoStoredCredentials,

    #[error("Biometric authentication was cancelled")]
    BiometricCancelled,

    #[error("Biometric authentication failed: {0}")]
    BiometricFailed(String),

    /// A login or registration is already running.
    #[error("Authentication already in progress")]
    Busy,
}

impl SessionError {
    /// The line shown in the transient notice. Cancellation shows nothing.
    pub fn notice(&self) -> Option<String> {
        match self {
            SessionError::Port(e) => Some(e.user_message()),
            SessionError::BiometricCancelled | SessionError::Busy => None,
            other => Some(other.to_string()),
        }
    }
}

/// Failures of the apply-for-job write flow.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApplyError {
    #[error("You have already applied for this job")]
    AlreadyApplied,

    #[error("An application for this job is already being submitted")]
    ApplicationInFlight,

    #[error("Only student accounts can apply for jobs")]
    NotAStudent,

    #[error(transparent)]
    Port(#[from] PortError),
}
