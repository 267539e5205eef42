//! services/client/src/adapters/http.rs
//!
//! The HTTP adapter, the concrete implementation of the `RemoteGateway` port.
//! It speaks JSON to the marketplace backend with `reqwest` and classifies
//! every failure into a `PortError`.

use std::collections::BTreeMap;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use talent_core::domain::{
    Achievement, AchievementInput, Agreement, Application, ApplyRequest, AuthPayload, Business,
    BusinessRegistration, BusinessUpdate, Conversation, Job, JobFilter, Project, ProjectInput,
    Skill, SkillInput, Student, StudentRegistration, StudentUpdate, Talent, TalentInput,
};
use talent_core::ports::{FieldErrors, PortError, PortResult, RemoteGateway};
use tracing::{debug, warn};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A gateway adapter that implements the `RemoteGateway` port over HTTP.
pub struct HttpGateway {
    client: Client,
    base_url: String,
    access_token: RwLock<Option<String>>,
}

impl HttpGateway {
    /// Creates a new `HttpGateway`.
    pub fn new(base_url: &str, timeout: Duration) -> PortResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PortError::Unexpected(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: RwLock::new(None),
        })
    }

    fn token(&self) -> Option<String> {
        match self.access_token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let request_id = Uuid::new_v4();
        debug!(%request_id, %method, %url, "Sending request");

        let builder = self
            .client
            .request(method, url)
            .header("X-Request-Id", request_id.to_string());
        match self.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> PortResult<T> {
        let resp = builder.send().await.map_err(transport_error)?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify(status, &body));
        }
        resp.json::<T>().await.map_err(|e| {
            PortError::Unexpected(format!("Invalid response body: {}", e))
        })
    }

    async fn execute_empty(&self, builder: RequestBuilder) -> PortResult<()> {
        let resp = builder.send().await.map_err(transport_error)?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify(status, &body));
        }
        Ok(())
    }
}

//=========================================================================================
// Error Classification
//=========================================================================================

#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Option<BTreeMap<String, Vec<String>>>,
}

/// Maps a non-success response onto the port error taxonomy.
pub(crate) fn classify(status: StatusCode, body: &str) -> PortError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .message
        .clone()
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());

    match status {
        // An empty message lets the caller fall back to its own wording.
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            PortError::Unauthorized(parsed.message.unwrap_or_default())
        }
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            PortError::Validation(FieldErrors {
                message: parsed.message,
                fields: parsed.errors.unwrap_or_default(),
            })
        }
        StatusCode::NOT_FOUND => PortError::NotFound(message),
        StatusCode::CONFLICT => PortError::Conflict(message),
        _ => {
            warn!("Unclassified response {}: {}", status, body);
            PortError::Unexpected(format!("Server error {}: {}", status, message))
        }
    }
}

fn transport_error(e: reqwest::Error) -> PortError {
    if e.is_decode() {
        PortError::Unexpected(e.to_string())
    } else {
        PortError::Network(e.to_string())
    }
}

//=========================================================================================
// Wire-only Request Shapes
//=========================================================================================

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct AcceptAgreementBody<'a> {
    version: &'a str,
}

//=========================================================================================
// `RemoteGateway` Trait Implementation
//=========================================================================================

#[async_trait]
impl RemoteGateway for HttpGateway {
    fn set_access_token(&self, token: Option<String>) {
        match self.access_token.write() {
            Ok(mut guard) => *guard = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
    }

    async fn login(&self, identity: &str, secret: &str) -> PortResult<AuthPayload> {
        let body = LoginBody {
            email: identity,
            password: secret,
        };
        self.execute(self.request(Method::POST, "/auth/login").json(&body))
            .await
    }

    async fn register_student(&self, fields: &StudentRegistration) -> PortResult<AuthPayload> {
        self.execute(self.request(Method::POST, "/auth/register/student").json(fields))
            .await
    }

    async fn register_business(&self, fields: &BusinessRegistration) -> PortResult<AuthPayload> {
        self.execute(self.request(Method::POST, "/auth/register/business").json(fields))
            .await
    }

    async fn logout(&self) -> PortResult<()> {
        self.execute_empty(self.request(Method::POST, "/auth/logout"))
            .await
    }

    async fn get_current_agreement(&self) -> PortResult<Agreement> {
        self.execute(self.request(Method::GET, "/agreements/current"))
            .await
    }

    async fn accept_agreement(&self, version: &str) -> PortResult<()> {
        let body = AcceptAgreementBody { version };
        self.execute_empty(self.request(Method::POST, "/agreements/accept").json(&body))
            .await
    }

    async fn fetch_jobs(&self, filter: &JobFilter) -> PortResult<Vec<Job>> {
        self.execute(self.request(Method::GET, "/jobs").query(filter))
            .await
    }

    async fn apply_for_job(&self, job_id: &str, request: &ApplyRequest) -> PortResult<Application> {
        let path = format!("/jobs/{}/apply", job_id);
        self.execute(self.request(Method::POST, &path).json(request))
            .await
    }

    async fn fetch_conversations(&self) -> PortResult<Vec<Conversation>> {
        self.execute(self.request(Method::GET, "/conversations"))
            .await
    }

    async fn fetch_student_profile(&self) -> PortResult<Student> {
        self.execute(self.request(Method::GET, "/students/me"))
            .await
    }

    async fn update_student_profile(&self, partial: &StudentUpdate) -> PortResult<Student> {
        self.execute(self.request(Method::PUT, "/students/me").json(partial))
            .await
    }

    async fn fetch_business_profile(&self) -> PortResult<Business> {
        self.execute(self.request(Method::GET, "/businesses/me"))
            .await
    }

    async fn update_business_profile(&self, partial: &BusinessUpdate) -> PortResult<Business> {
        self.execute(self.request(Method::PUT, "/businesses/me").json(partial))
            .await
    }

    async fn add_skill(&self, input: &SkillInput) -> PortResult<Skill> {
        self.execute(self.request(Method::POST, "/students/me/skills").json(input))
            .await
    }

    async fn update_skill(&self, id: &str, input: &SkillInput) -> PortResult<Skill> {
        let path = format!("/students/me/skills/{}", id);
        self.execute(self.request(Method::PUT, &path).json(input))
            .await
    }

    async fn delete_skill(&self, id: &str) -> PortResult<()> {
        let path = format!("/students/me/skills/{}", id);
        self.execute_empty(self.request(Method::DELETE, &path))
            .await
    }

    async fn add_project(&self, input: &ProjectInput) -> PortResult<Project> {
        self.execute(self.request(Method::POST, "/students/me/projects").json(input))
            .await
    }

    async fn update_project(&self, id: &str, input: &ProjectInput) -> PortResult<Project> {
        let path = format!("/students/me/projects/{}", id);
        self.execute(self.request(Method::PUT, &path).json(input))
            .await
    }

    async fn delete_project(&self, id: &str) -> PortResult<()> {
        let path = format!("/students/me/projects/{}", id);
        self.execute_empty(self.request(Method::DELETE, &path))
            .await
    }

    async fn add_achievement(&self, input: &AchievementInput) -> PortResult<Achievement> {
        self.execute(self.request(Method::POST, "/students/me/achievements").json(input))
            .await
    }

    async fn update_achievement(
        &self,
        id: &str,
        input: &AchievementInput,
    ) -> PortResult<Achievement> {
        let path = format!("/students/me/achievements/{}", id);
        self.execute(self.request(Method::PUT, &path).json(input))
            .await
    }

    async fn delete_achievement(&self, id: &str) -> PortResult<()> {
        let path = format!("/students/me/achievements/{}", id);
        self.execute_empty(self.request(Method::DELETE, &path))
            .await
    }

    async fn fetch_talents(&self) -> PortResult<Vec<Talent>> {
        self.execute(self.request(Method::GET, "/talents"))
            .await
    }

    async fn add_talent(&self, input: &TalentInput) -> PortResult<Talent> {
        self.execute(self.request(Method::POST, "/talents").json(input))
            .await
    }

    async fn update_talent(&self, id: &str, input: &TalentInput) -> PortResult<Talent> {
        let path = format!("/talents/{}", id);
        self.execute(self.request(Method::PUT, &path).json(input))
            .await
    }

    async fn delete_talent(&self, id: &str) -> PortResult<()> {
        let path = format!("/talents/{}", id);
        self.execute_empty(self.request(Method::DELETE, &path))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_auth_statuses() {
        let err = classify(StatusCode::UNAUTHORIZED, r#"{"message":"Token expired"}"#);
        assert_eq!(err, PortError::Unauthorized("Token expired".to_string()));

        let err = classify(StatusCode::FORBIDDEN, "");
        assert!(err.is_auth());
        assert_eq!(err.user_message(), "Invalid email or password");
    }

    #[test]
    fn test_classify_validation_body() {
        let body = r#"{"errors":{"email":["is already registered"]}}"#;
        match classify(StatusCode::UNPROCESSABLE_ENTITY, body) {
            PortError::Validation(errors) => {
                assert_eq!(errors.message, None);
                assert_eq!(errors.summary(), "email: is already registered");
            }
            other => panic!("unexpected classification: {:?}", other),
        }
    }

    #[test]
    fn test_classify_conflict_and_fallback() {
        let err = classify(StatusCode::CONFLICT, r#"{"message":"Already applied"}"#);
        assert_eq!(err, PortError::Conflict("Already applied".to_string()));

        let err = classify(StatusCode::BAD_GATEWAY, "<html>");
        assert!(matches!(err, PortError::Unexpected(_)));
    }

    #[test]
    fn test_token_is_swappable() {
        let gateway = HttpGateway::new("http://localhost:9/", Duration::from_secs(1)).unwrap();
        assert_eq!(gateway.base_url, "http://localhost:9");
        gateway.set_access_token(Some("t".to_string()));
        assert_eq!(gateway.token().as_deref(), Some("t"));
        gateway.set_access_token(None);
        assert_eq!(gateway.token(), None);
    }
}
