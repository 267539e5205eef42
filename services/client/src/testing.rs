//! Test doubles and fixtures shared by the unit tests of this crate.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use talent_core::domain::{
    AccountUser, Achievement, AchievementInput, Agreement, Application, ApplicationStatus,
    ApplyRequest, AuthPayload, Business, BusinessRegistration, BusinessUpdate, Conversation, Job,
    JobFilter, Message, Project, ProjectInput, Role, Session, Skill, SkillInput, Student,
    StudentRef, StudentRegistration, StudentUpdate, Talent, TalentInput, UserIdentity,
};
use talent_core::ports::{
    BiometricAuthenticator, BiometricResult, PortError, PortResult, RemoteGateway,
};
use tokio::sync::Notify;

use crate::adapters::MemoryStore;
use crate::session::SessionManager;

//=========================================================================================
// Fixtures
//=========================================================================================

pub(crate) fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, 9, 0, 0).unwrap()
}

pub(crate) fn job(id: &str, applications: Vec<Application>) -> Job {
    Job {
        id: id.to_string(),
        title: format!("Job {}", id),
        description: String::new(),
        location: None,
        job_type: None,
        salary: None,
        business: None,
        created_at: at(1),
        applications,
    }
}

pub(crate) fn application(
    id: &str,
    job_id: &str,
    student_id: &str,
    status: ApplicationStatus,
) -> Application {
    Application {
        id: id.to_string(),
        job_id: job_id.to_string(),
        student: StudentRef {
            id: student_id.to_string(),
            first_name: None,
            last_name: None,
        },
        status,
        applied_at: at(2),
        cover_letter: None,
        resume: None,
    }
}

pub(crate) fn student(id: &str) -> Student {
    Student {
        id: id.to_string(),
        user_id: "u1".to_string(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        university: None,
        major: None,
        graduation_year: None,
        bio: None,
        skills: Vec::new(),
        projects: Vec::new(),
        achievements: Vec::new(),
    }
}

pub(crate) fn business(id: &str) -> Business {
    Business {
        id: id.to_string(),
        user_id: "u5".to_string(),
        company_name: "Acme".to_string(),
        industry: None,
        description: None,
        website: None,
        location: None,
    }
}

pub(crate) fn conversation(id: &str, last_sender: Option<&str>) -> Conversation {
    Conversation {
        id: id.to_string(),
        participants: Vec::new(),
        last_message: last_sender.map(|sender| Message {
            id: format!("{}-last", id),
            sender_id: sender.to_string(),
            content: "hello".to_string(),
            sent_at: at(3),
        }),
    }
}

fn session(user_id: &str, role: Role, student_id: Option<&str>, business_id: Option<&str>) -> Session {
    Session {
        identity: UserIdentity {
            id: user_id.to_string(),
            role,
            display_identity: String::new(),
            student_id: student_id.map(str::to_string),
            business_id: business_id.map(str::to_string),
        },
        access_token: format!("token-{}", user_id),
    }
}

pub(crate) fn student_session(user_id: &str, student_id: &str) -> Session {
    session(user_id, Role::Student, Some(student_id), None)
}

pub(crate) fn business_session(user_id: &str, business_id: &str) -> Session {
    session(user_id, Role::Business, None, Some(business_id))
}

pub(crate) fn student_payload(user_id: &str, student_id: &str) -> AuthPayload {
    let mut profile = student(student_id);
    profile.user_id = user_id.to_string();
    AuthPayload {
        access_token: format!("token-{}", user_id),
        user: AccountUser {
            id: user_id.to_string(),
            email: format!("{}@uni.edu", user_id),
            role: Role::Student,
        },
        student_profile: Some(profile),
        business_profile: None,
    }
}

pub(crate) fn business_payload(user_id: &str, business_id: &str) -> AuthPayload {
    let mut profile = business(business_id);
    profile.user_id = user_id.to_string();
    AuthPayload {
        access_token: format!("token-{}", user_id),
        user: AccountUser {
            id: user_id.to_string(),
            email: format!("{}@acme.test", user_id),
            role: Role::Business,
        },
        student_profile: None,
        business_profile: Some(profile),
    }
}

//=========================================================================================
// Stores & Manager
//=========================================================================================

pub(crate) struct StoreFixture {
    pub storage: Arc<MemoryStore>,
    pub secure: Arc<MemoryStore>,
}

impl StoreFixture {
    pub(crate) fn new() -> Self {
        Self {
            storage: Arc::new(MemoryStore::new()),
            secure: Arc::new(MemoryStore::new()),
        }
    }
}

pub(crate) fn manager_with(
    gateway: &Arc<FakeGateway>,
    stores: &StoreFixture,
    biometric: FakeBiometric,
) -> Arc<SessionManager> {
    SessionManager::new(
        gateway.clone(),
        stores.storage.clone(),
        stores.secure.clone(),
        Arc::new(biometric),
        Duration::from_secs(5),
    )
}

//=========================================================================================
// FakeGateway
//=========================================================================================

#[derive(Default)]
struct Script {
    token: Option<String>,
    calls: Vec<&'static str>,
    logins: Vec<(String, String)>,
    job_filters: Vec<JobFilter>,
    accepted: Vec<String>,
    holds: HashMap<&'static str, Arc<Notify>>,
    next_id: u32,
    write_error: Option<PortError>,

    login: Option<PortResult<AuthPayload>>,
    register: Option<PortResult<AuthPayload>>,
    logout: Option<PortResult<()>>,
    agreement: Option<PortResult<Agreement>>,
    jobs: Option<PortResult<Vec<Job>>>,
    apply: Option<PortResult<Application>>,
    conversations: Option<PortResult<Vec<Conversation>>>,
    student: Option<PortResult<Student>>,
    business: Option<PortResult<Business>>,
    talents: Option<PortResult<Vec<Talent>>>,
}

impl Script {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }
}

/// A scripted `RemoteGateway`. Unscripted reads fail with `Unexpected`.
#[derive(Default)]
pub(crate) struct FakeGateway {
    script: Mutex<Script>,
    changed: Notify,
}

fn scripted<T>(slot: Option<PortResult<T>>, name: &str) -> PortResult<T> {
    slot.unwrap_or_else(|| Err(PortError::Unexpected(format!("unscripted call: {}", name))))
}

impl FakeGateway {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap()
    }

    pub(crate) fn set_login(&self, result: PortResult<AuthPayload>) {
        self.script().login = Some(result);
    }

    pub(crate) fn set_register(&self, result: PortResult<AuthPayload>) {
        self.script().register = Some(result);
    }

    pub(crate) fn set_logout(&self, result: PortResult<()>) {
        self.script().logout = Some(result);
    }

    pub(crate) fn set_agreement(&self, result: PortResult<Agreement>) {
        self.script().agreement = Some(result);
    }

    pub(crate) fn set_jobs(&self, result: PortResult<Vec<Job>>) {
        self.script().jobs = Some(result);
    }

    pub(crate) fn set_apply(&self, result: PortResult<Application>) {
        self.script().apply = Some(result);
    }

    pub(crate) fn set_conversations(&self, result: PortResult<Vec<Conversation>>) {
        self.script().conversations = Some(result);
    }

    pub(crate) fn set_student(&self, result: PortResult<Student>) {
        self.script().student = Some(result);
    }

    pub(crate) fn set_business(&self, result: PortResult<Business>) {
        self.script().business = Some(result);
    }

    pub(crate) fn set_talents(&self, result: PortResult<Vec<Talent>>) {
        self.script().talents = Some(result);
    }

    /// Makes every subsequent write fail with `error`.
    pub(crate) fn fail_writes(&self, error: PortError) {
        self.script().write_error = Some(error);
    }

    /// Parks every call to `name` until the returned handle is notified.
    pub(crate) fn hold(&self, name: &'static str) -> Arc<Notify> {
        let release = Arc::new(Notify::new());
        self.script().holds.insert(name, Arc::clone(&release));
        release
    }

    pub(crate) fn token(&self) -> Option<String> {
        self.script().token.clone()
    }

    pub(crate) fn calls(&self, name: &str) -> usize {
        self.script().calls.iter().filter(|call| **call == name).count()
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.script().calls.len()
    }

    pub(crate) fn logins(&self) -> Vec<(String, String)> {
        self.script().logins.clone()
    }

    pub(crate) fn job_filters(&self) -> Vec<JobFilter> {
        self.script().job_filters.clone()
    }

    pub(crate) fn accepted_versions(&self) -> Vec<String> {
        self.script().accepted.clone()
    }

    pub(crate) async fn wait_for_calls(&self, name: &str, count: usize) {
        loop {
            let changed = self.changed.notified();
            if self.calls(name) >= count {
                return;
            }
            changed.await;
        }
    }

    async fn enter(&self, name: &'static str) {
        let hold = {
            let mut script = self.script();
            script.calls.push(name);
            script.holds.get(name).cloned()
        };
        self.changed.notify_waiters();
        if let Some(release) = hold {
            release.notified().await;
        }
    }

    async fn write<T, F>(&self, name: &'static str, make: F) -> PortResult<T>
    where
        F: FnOnce(&mut Script) -> PortResult<T>,
    {
        self.enter(name).await;
        let mut script = self.script();
        if let Some(error) = script.write_error.clone() {
            return Err(error);
        }
        make(&mut script)
    }
}

#[async_trait]
impl RemoteGateway for FakeGateway {
    fn set_access_token(&self, token: Option<String>) {
        self.script().token = token;
    }

    async fn login(&self, identity: &str, secret: &str) -> PortResult<AuthPayload> {
        self.script()
            .logins
            .push((identity.to_string(), secret.to_string()));
        self.enter("login").await;
        scripted(self.script().login.clone(), "login")
    }

    async fn register_student(&self, _fields: &StudentRegistration) -> PortResult<AuthPayload> {
        self.enter("register_student").await;
        scripted(self.script().register.clone(), "register_student")
    }

    async fn register_business(&self, _fields: &BusinessRegistration) -> PortResult<AuthPayload> {
        self.enter("register_business").await;
        scripted(self.script().register.clone(), "register_business")
    }

    async fn logout(&self) -> PortResult<()> {
        self.enter("logout").await;
        self.script().logout.clone().unwrap_or(Ok(()))
    }

    async fn get_current_agreement(&self) -> PortResult<Agreement> {
        self.enter("get_current_agreement").await;
        scripted(self.script().agreement.clone(), "get_current_agreement")
    }

    async fn accept_agreement(&self, version: &str) -> PortResult<()> {
        self.enter("accept_agreement").await;
        self.script().accepted.push(version.to_string());
        Ok(())
    }

    async fn fetch_jobs(&self, filter: &JobFilter) -> PortResult<Vec<Job>> {
        self.script().job_filters.push(filter.clone());
        self.enter("fetch_jobs").await;
        scripted(self.script().jobs.clone(), "fetch_jobs")
    }

    async fn apply_for_job(
        &self,
        _job_id: &str,
        _request: &ApplyRequest,
    ) -> PortResult<Application> {
        self.enter("apply_for_job").await;
        scripted(self.script().apply.clone(), "apply_for_job")
    }

    async fn fetch_conversations(&self) -> PortResult<Vec<Conversation>> {
        self.enter("fetch_conversations").await;
        scripted(self.script().conversations.clone(), "fetch_conversations")
    }

    async fn fetch_student_profile(&self) -> PortResult<Student> {
        self.enter("fetch_student_profile").await;
        scripted(self.script().student.clone(), "fetch_student_profile")
    }

    async fn update_student_profile(&self, partial: &StudentUpdate) -> PortResult<Student> {
        self.write("update_student_profile", |script| {
            let mut student = scripted(script.student.clone(), "update_student_profile")?;
            if let Some(bio) = &partial.bio {
                student.bio = Some(bio.clone());
            }
            if let Some(major) = &partial.major {
                student.major = Some(major.clone());
            }
            script.student = Some(Ok(student.clone()));
            Ok(student)
        })
        .await
    }

    async fn fetch_business_profile(&self) -> PortResult<Business> {
        self.enter("fetch_business_profile").await;
        scripted(self.script().business.clone(), "fetch_business_profile")
    }

    async fn update_business_profile(&self, partial: &BusinessUpdate) -> PortResult<Business> {
        self.write("update_business_profile", |script| {
            let mut business = scripted(script.business.clone(), "update_business_profile")?;
            if let Some(website) = &partial.website {
                business.website = Some(website.clone());
            }
            if let Some(industry) = &partial.industry {
                business.industry = Some(industry.clone());
            }
            script.business = Some(Ok(business.clone()));
            Ok(business)
        })
        .await
    }

    async fn add_skill(&self, input: &SkillInput) -> PortResult<Skill> {
        self.write("add_skill", |script| {
            Ok(Skill {
                id: script.next_id("skill"),
                name: input.name.clone(),
                level: input.level.clone(),
            })
        })
        .await
    }

    async fn update_skill(&self, id: &str, input: &SkillInput) -> PortResult<Skill> {
        self.write("update_skill", |_| {
            Ok(Skill {
                id: id.to_string(),
                name: input.name.clone(),
                level: input.level.clone(),
            })
        })
        .await
    }

    async fn delete_skill(&self, _id: &str) -> PortResult<()> {
        self.write("delete_skill", |_| Ok(())).await
    }

    async fn add_project(&self, input: &ProjectInput) -> PortResult<Project> {
        self.write("add_project", |script| {
            Ok(Project {
                id: script.next_id("project"),
                title: input.title.clone(),
                description: input.description.clone(),
                url: input.url.clone(),
            })
        })
        .await
    }

    async fn update_project(&self, id: &str, input: &ProjectInput) -> PortResult<Project> {
        self.write("update_project", |_| {
            Ok(Project {
                id: id.to_string(),
                title: input.title.clone(),
                description: input.description.clone(),
                url: input.url.clone(),
            })
        })
        .await
    }

    async fn delete_project(&self, _id: &str) -> PortResult<()> {
        self.write("delete_project", |_| Ok(())).await
    }

    async fn add_achievement(&self, input: &AchievementInput) -> PortResult<Achievement> {
        self.write("add_achievement", |script| {
            Ok(Achievement {
                id: script.next_id("achievement"),
                title: input.title.clone(),
                description: input.description.clone(),
                date: input.date,
            })
        })
        .await
    }

    async fn update_achievement(
        &self,
        id: &str,
        input: &AchievementInput,
    ) -> PortResult<Achievement> {
        self.write("update_achievement", |_| {
            Ok(Achievement {
                id: id.to_string(),
                title: input.title.clone(),
                description: input.description.clone(),
                date: input.date,
            })
        })
        .await
    }

    async fn delete_achievement(&self, _id: &str) -> PortResult<()> {
        self.write("delete_achievement", |_| Ok(())).await
    }

    async fn fetch_talents(&self) -> PortResult<Vec<Talent>> {
        self.enter("fetch_talents").await;
        scripted(self.script().talents.clone(), "fetch_talents")
    }

    async fn add_talent(&self, input: &TalentInput) -> PortResult<Talent> {
        self.write("add_talent", |script| {
            Ok(Talent {
                id: script.next_id("talent"),
                name: input.name.clone(),
                category: input.category.clone(),
                description: input.description.clone(),
            })
        })
        .await
    }

    async fn update_talent(&self, id: &str, input: &TalentInput) -> PortResult<Talent> {
        self.write("update_talent", |_| {
            Ok(Talent {
                id: id.to_string(),
                name: input.name.clone(),
                category: input.category.clone(),
                description: input.description.clone(),
            })
        })
        .await
    }

    async fn delete_talent(&self, _id: &str) -> PortResult<()> {
        self.write("delete_talent", |_| Ok(())).await
    }
}

//=========================================================================================
// FakeBiometric
//=========================================================================================

#[derive(Clone)]
pub(crate) struct FakeBiometric {
    available: bool,
    result: BiometricResult,
    prompts: Arc<AtomicUsize>,
}

impl FakeBiometric {
    pub(crate) fn unavailable() -> Self {
        Self {
            available: false,
            result: BiometricResult::NotAvailable,
            prompts: Arc::default(),
        }
    }

    /// Enrolled hardware whose every prompt answers `result`.
    pub(crate) fn ready(result: BiometricResult) -> Self {
        Self {
            available: true,
            result,
            prompts: Arc::default(),
        }
    }

    pub(crate) fn prompts(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BiometricAuthenticator for FakeBiometric {
    fn is_available(&self) -> bool {
        self.available
    }

    fn is_enrolled(&self) -> bool {
        self.available
    }

    async fn authenticate(&self, _reason: &str) -> BiometricResult {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}
