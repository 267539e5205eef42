//! services/client/src/cache/student.rs
//!
//! The signed-in student's profile and portfolio (skills, projects,
//! achievements). Portfolio writes patch the cached profile by id instead of
//! refetching it.

use std::sync::Arc;

use async_trait::async_trait;
use talent_core::domain::{
    Achievement, AchievementInput, Project, ProjectInput, Skill, SkillInput, Student,
    StudentUpdate,
};
use talent_core::ports::{PortResult, RemoteGateway};

use crate::cache::{upsert_by_id, CacheState, EntityCache, FetchOrigin, SyncTarget};

pub struct StudentProfileCache {
    gateway: Arc<dyn RemoteGateway>,
    cache: EntityCache<Option<Student>>,
}

impl StudentProfileCache {
    pub fn new(gateway: Arc<dyn RemoteGateway>) -> Self {
        Self {
            gateway,
            cache: EntityCache::new("student_profile"),
        }
    }

    pub async fn snapshot(&self) -> CacheState<Option<Student>> {
        self.cache.snapshot().await
    }

    pub async fn profile(&self) -> Option<Student> {
        self.cache.data().await
    }

    pub async fn fetch(&self) -> PortResult<()> {
        self.fetch_with(&FetchOrigin::Interactive).await
    }

    async fn fetch_with(&self, origin: &FetchOrigin) -> PortResult<()> {
        let fetch = async { self.gateway.fetch_student_profile().await.map(Some) };
        self.cache.load(origin, fetch).await
    }

    /// Sends a partial update and caches the profile the server returns.
    pub async fn update(&self, partial: &StudentUpdate) -> PortResult<Student> {
        let student = self.gateway.update_student_profile(partial).await?;
        let cached = student.clone();
        self.cache.patch(|profile| *profile = Some(cached)).await;
        Ok(student)
    }

    async fn patch_profile<F>(&self, mutate: F)
    where
        F: FnOnce(&mut Student),
    {
        self.cache
            .patch(|profile| {
                if let Some(student) = profile.as_mut() {
                    mutate(student);
                }
            })
            .await;
    }

    // --- Skills ---

    pub async fn add_skill(&self, input: &SkillInput) -> PortResult<Skill> {
        let skill = self.gateway.add_skill(input).await?;
        self.upsert_skill(skill.clone()).await;
        Ok(skill)
    }

    pub async fn update_skill(&self, id: &str, input: &SkillInput) -> PortResult<Skill> {
        let skill = self.gateway.update_skill(id, input).await?;
        self.upsert_skill(skill.clone()).await;
        Ok(skill)
    }

    pub async fn delete_skill(&self, id: &str) -> PortResult<()> {
        self.gateway.delete_skill(id).await?;
        self.patch_profile(|s| s.skills.retain(|skill| skill.id != id))
            .await;
        Ok(())
    }

    async fn upsert_skill(&self, skill: Skill) {
        self.patch_profile(|s| upsert_by_id(&mut s.skills, skill, |k| k.id.as_str()))
            .await;
    }

    // --- Projects ---

    pub async fn add_project(&self, input: &ProjectInput) -> PortResult<Project> {
        let project = self.gateway.add_project(input).await?;
        self.upsert_project(project.clone()).await;
        Ok(project)
    }

    pub async fn update_project(&self, id: &str, input: &ProjectInput) -> PortResult<Project> {
        let project = self.gateway.update_project(id, input).await?;
        self.upsert_project(project.clone()).await;
        Ok(project)
    }

    pub async fn delete_project(&self, id: &str) -> PortResult<()> {
        self.gateway.delete_project(id).await?;
        self.patch_profile(|s| s.projects.retain(|p| p.id != id))
            .await;
        Ok(())
    }

    async fn upsert_project(&self, project: Project) {
        self.patch_profile(|s| upsert_by_id(&mut s.projects, project, |p| p.id.as_str()))
            .await;
    }

    // --- Achievements ---

    pub async fn add_achievement(&self, input: &AchievementInput) -> PortResult<Achievement> {
        let achievement = self.gateway.add_achievement(input).await?;
        self.upsert_achievement(achievement.clone()).await;
        Ok(achievement)
    }

    pub async fn update_achievement(
        &self,
        id: &str,
        input: &AchievementInput,
    ) -> PortResult<Achievement> {
        let achievement = self.gateway.update_achievement(id, input).await?;
        self.upsert_achievement(achievement.clone()).await;
        Ok(achievement)
    }

    pub async fn delete_achievement(&self, id: &str) -> PortResult<()> {
        self.gateway.delete_achievement(id).await?;
        self.patch_profile(|s| s.achievements.retain(|a| a.id != id))
            .await;
        Ok(())
    }

    async fn upsert_achievement(&self, achievement: Achievement) {
        self.patch_profile(|s| {
            upsert_by_id(&mut s.achievements, achievement, |a| a.id.as_str())
        })
        .await;
    }
}

#[async_trait]
impl SyncTarget for StudentProfileCache {
    fn name(&self) -> &'static str {
        self.cache.name()
    }

    async fn refresh(&self, origin: FetchOrigin) -> PortResult<()> {
        self.fetch_with(&origin).await
    }

    async fn reset(&self) {
        self.cache.reset().await;
    }
}
