//! crates/talent_core/src/ports.rs
//!
//! Defines the service contracts (traits) the client core depends on.
//! These traits form the boundary of the hexagonal architecture: the remote
//! backend, durable device storage and the platform biometric prompt are all
//! external collaborators reached only through them.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{
    Achievement, AchievementInput, Agreement, Application, ApplyRequest, AuthPayload, Business,
    BusinessRegistration, BusinessUpdate, Conversation, Job, JobFilter, Project, ProjectInput,
    Skill, SkillInput, Student, StudentRegistration, StudentUpdate, Talent, TalentInput,
};

//=========================================================================================
// Classified Port Error and Result Types
//=========================================================================================

/// Structured per-field messages returned by a rejected registration or update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrors {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
    /// Collapses the structured errors into the single line the UI shows.
    pub fn summary(&self) -> String {
        if let Some(message) = &self.message {
            return message.clone();
        }
        self.fields
            .iter()
            .flat_map(|(field, msgs)| msgs.iter().map(move |m| format!("{}: {}", field, m)))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// The error type for all port operations, classified the way the backend
/// answers (or fails to answer).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// Coarse classification used by the scheduler and the notice text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Auth,
    Validation,
    Conflict,
    Network,
    Unknown,
}

impl PortError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PortError::Unauthorized(_) => ErrorKind::Auth,
            PortError::Validation(_) => ErrorKind::Validation,
            PortError::Conflict(_) => ErrorKind::Conflict,
            PortError::Network(_) => ErrorKind::Network,
            PortError::NotFound(_) | PortError::Unexpected(_) => ErrorKind::Unknown,
        }
    }

    pub fn is_auth(&self) -> bool {
        self.kind() == ErrorKind::Auth
    }

    /// The one-line message surfaced to the user.
    pub fn user_message(&self) -> String {
        match self {
            PortError::Unauthorized(msg) if !msg.is_empty() => msg.clone(),
            PortError::Unauthorized(_) => "Invalid email or password".to_string(),
            PortError::Validation(errors) => errors.summary(),
            PortError::Conflict(msg) => msg.clone(),
            PortError::Network(_) => "Unable to reach the server. Check your connection.".to_string(),
            PortError::NotFound(msg) | PortError::Unexpected(msg) => msg.clone(),
        }
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Installs (or removes) the bearer token sent with every request.
    fn set_access_token(&self, token: Option<String>);

    // --- Authentication ---
    async fn login(&self, identity: &str, secret: &str) -> PortResult<AuthPayload>;

    async fn register_student(&self, fields: &StudentRegistration) -> PortResult<AuthPayload>;

    async fn register_business(&self, fields: &BusinessRegistration) -> PortResult<AuthPayload>;

    async fn logout(&self) -> PortResult<()>;

    // --- Agreements ---
    async fn get_current_agreement(&self) -> PortResult<Agreement>;

    async fn accept_agreement(&self, version: &str) -> PortResult<()>;

    // --- Jobs ---
    async fn fetch_jobs(&self, filter: &JobFilter) -> PortResult<Vec<Job>>;

    async fn apply_for_job(&self, job_id: &str, request: &ApplyRequest) -> PortResult<Application>;

    // --- Conversations ---
    async fn fetch_conversations(&self) -> PortResult<Vec<Conversation>>;

    // --- Profiles ---
    async fn fetch_student_profile(&self) -> PortResult<Student>;

    async fn update_student_profile(&self, partial: &StudentUpdate) -> PortResult<Student>;

    async fn fetch_business_profile(&self) -> PortResult<Business>;

    async fn update_business_profile(&self, partial: &BusinessUpdate) -> PortResult<Business>;

    // --- Portfolio ---
    async fn add_skill(&self, input: &SkillInput) -> PortResult<Skill>;

    async fn update_skill(&self, id: &str, input: &SkillInput) -> PortResult<Skill>;

    async fn delete_skill(&self, id: &str) -> PortResult<()>;

    async fn add_project(&self, input: &ProjectInput) -> PortResult<Project>;

    async fn update_project(&self, id: &str, input: &ProjectInput) -> PortResult<Project>;

    async fn delete_project(&self, id: &str) -> PortResult<()>;

    async fn add_achievement(&self, input: &AchievementInput) -> PortResult<Achievement>;

    async fn update_achievement(&self, id: &str, input: &AchievementInput)
        -> PortResult<Achievement>;

    async fn delete_achievement(&self, id: &str) -> PortResult<()>;

    async fn fetch_talents(&self) -> PortResult<Vec<Talent>>;

    async fn add_talent(&self, input: &TalentInput) -> PortResult<Talent>;

    async fn update_talent(&self, id: &str, input: &TalentInput) -> PortResult<Talent>;

    async fn delete_talent(&self, id: &str) -> PortResult<()>;
}

/// Durable device key-value storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> PortResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> PortResult<()>;

    async fn remove(&self, key: &str) -> PortResult<()>;
}

/// Result of a biometric prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BiometricResult {
    /// User successfully authenticated
    Success,
    /// User cancelled the prompt
    Cancelled,
    /// Biometric hardware not available
    NotAvailable,
    /// No biometric enrolled on the device
    NotEnrolled,
    /// Prompt failed
    Failed(String),
}

#[async_trait]
pub trait BiometricAuthenticator: Send + Sync {
    fn is_available(&self) -> bool;

    fn is_enrolled(&self) -> bool;

    async fn authenticate(&self, reason: &str) -> BiometricResult;
}
