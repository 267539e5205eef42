//! crates/talent_core/src/views.rs
//!
//! Derived views: pure functions over cache contents, recomputed on every read
//! and never persisted.

use std::collections::HashSet;

use crate::domain::{Application, ApplicationStatus, Conversation, Job};

/// True iff the student already has an application embedded in `job`.
pub fn has_applied(job: &Job, student_id: &str) -> bool {
    job.applications.iter().any(|a| a.student.id == student_id)
}

/// Every application the student has across `jobs`, newest first.
///
/// The same application may be embedded in more than one job result when
/// partial results are merged, so entries are deduplicated by application id
/// (first occurrence kept).
pub fn my_applications(jobs: &[Job], student_id: &str) -> Vec<Application> {
    let mut seen = HashSet::new();
    let mut mine: Vec<Application> = jobs
        .iter()
        .flat_map(|job| job.applications.iter())
        .filter(|a| a.student.id == student_id)
        .filter(|a| seen.insert(a.id.as_str()))
        .cloned()
        .collect();

    mine.sort_by(|a, b| b.applied_at.cmp(&a.applied_at));
    mine
}

/// One tab of the application status filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusFilter {
    All,
    Only(ApplicationStatus),
}

impl StatusFilter {
    pub fn matches(&self, status: ApplicationStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(s) => *s == status,
        }
    }
}

/// Fixed-key tally of applications per status, plus the total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub all: usize,
    pub pending: usize,
    pub reviewing: usize,
    pub interviewing: usize,
    pub accepted: usize,
    pub rejected: usize,
}

impl StatusCounts {
    pub fn get(&self, filter: StatusFilter) -> usize {
        match filter {
            StatusFilter::All => self.all,
            StatusFilter::Only(ApplicationStatus::Pending) => self.pending,
            StatusFilter::Only(ApplicationStatus::Reviewing) => self.reviewing,
            StatusFilter::Only(ApplicationStatus::Interviewing) => self.interviewing,
            StatusFilter::Only(ApplicationStatus::Accepted) => self.accepted,
            StatusFilter::Only(ApplicationStatus::Rejected) => self.rejected,
        }
    }
}

pub fn status_counts(applications: &[Application]) -> StatusCounts {
    let count = |status| applications.iter().filter(|a| a.status == status).count();
    StatusCounts {
        all: applications.len(),
        pending: count(ApplicationStatus::Pending),
        reviewing: count(ApplicationStatus::Reviewing),
        interviewing: count(ApplicationStatus::Interviewing),
        accepted: count(ApplicationStatus::Accepted),
        rejected: count(ApplicationStatus::Rejected),
    }
}

pub fn filter_by_status(applications: &[Application], filter: StatusFilter) -> Vec<Application> {
    applications
        .iter()
        .filter(|a| filter.matches(a.status))
        .cloned()
        .collect()
}

/// Conversations whose last message came from someone other than `user_id`.
/// A conversation with no messages yet is never unread.
pub fn unread_conversation_count(conversations: &[Conversation], user_id: &str) -> usize {
    conversations
        .iter()
        .filter(|c| {
            c.last_message
                .as_ref()
                .is_some_and(|m| m.sender_id != user_id)
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Message, StudentRef};
    use chrono::{TimeZone, Utc};

    fn application(id: &str, job_id: &str, student: &str, status: ApplicationStatus, day: u32) -> Application {
        Application {
            id: id.to_string(),
            job_id: job_id.to_string(),
            student: StudentRef {
                id: student.to_string(),
                first_name: None,
                last_name: None,
            },
            status,
            applied_at: Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap(),
            cover_letter: None,
            resume: None,
        }
    }

    fn job(id: &str, applications: Vec<Application>) -> Job {
        Job {
            id: id.to_string(),
            title: format!("Job {}", id),
            description: String::new(),
            location: None,
            job_type: None,
            salary: None,
            business: None,
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            applications,
        }
    }

    fn conversation(id: &str, sender: Option<&str>) -> Conversation {
        Conversation {
            id: id.to_string(),
            participants: Vec::new(),
            last_message: sender.map(|s| Message {
                id: format!("m-{}", id),
                sender_id: s.to_string(),
                content: "hi".to_string(),
                sent_at: Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap(),
            }),
        }
    }

    #[test]
    fn test_has_applied_matches_student_only() {
        let j = job("j1", vec![application("a1", "j1", "s1", ApplicationStatus::Pending, 2)]);
        assert!(has_applied(&j, "s1"));
        assert!(!has_applied(&j, "s2"));
        assert!(!has_applied(&job("j2", Vec::new()), "s1"));
    }

    #[test]
    fn test_my_applications_deduplicates_across_jobs() {
        let a1 = application("a1", "j1", "s1", ApplicationStatus::Pending, 2);
        let jobs = vec![
            job("j1", vec![a1.clone()]),
            job("j1-again", vec![a1.clone()]),
        ];

        let mine = my_applications(&jobs, "s1");
        assert_eq!(mine, vec![a1]);
    }

    #[test]
    fn test_my_applications_filters_and_sorts_newest_first() {
        let jobs = vec![
            job(
                "j1",
                vec![
                    application("a1", "j1", "s1", ApplicationStatus::Pending, 2),
                    application("a2", "j1", "s2", ApplicationStatus::Pending, 9),
                ],
            ),
            job("j2", vec![application("a3", "j2", "s1", ApplicationStatus::Accepted, 5)]),
        ];

        let ids: Vec<_> = my_applications(&jobs, "s1").into_iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["a3", "a1"]);
    }

    #[test]
    fn test_status_counts_has_every_key() {
        let apps = vec![
            application("a1", "j1", "s1", ApplicationStatus::Pending, 1),
            application("a2", "j2", "s1", ApplicationStatus::Pending, 2),
            application("a3", "j3", "s1", ApplicationStatus::Rejected, 3),
        ];

        let counts = status_counts(&apps);
        assert_eq!(counts.get(StatusFilter::All), 3);
        assert_eq!(counts.get(StatusFilter::Only(ApplicationStatus::Pending)), 2);
        assert_eq!(counts.get(StatusFilter::Only(ApplicationStatus::Rejected)), 1);
        assert_eq!(counts.get(StatusFilter::Only(ApplicationStatus::Interviewing)), 0);
        assert_eq!(status_counts(&[]), StatusCounts::default());

        let pending = filter_by_status(&apps, StatusFilter::Only(ApplicationStatus::Pending));
        assert_eq!(pending.len(), 2);
        assert_eq!(filter_by_status(&apps, StatusFilter::All).len(), 3);
    }

    #[test]
    fn test_unread_count() {
        let conversations = vec![
            conversation("c1", Some("u2")),
            conversation("c2", None),
            conversation("c3", Some("u1")),
        ];
        assert_eq!(unread_conversation_count(&conversations, "u1"), 1);
        assert_eq!(unread_conversation_count(&[], "u1"), 0);
    }
}
