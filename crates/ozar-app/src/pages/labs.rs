use std::time::Duration;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use ozar_types::models::{AuthUser, Lab, LabSession, LabStatus};

use super::fallback;
use crate::error::AppError;
use crate::notify::Notifications;

/// How long starting a lab takes.
pub const LAB_START_DELAY: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabProgress {
    NotStarted,
    InProgress,
    Completed,
}

/// Premium labs catalogue. Labs and sessions are demo data; nothing here is
/// persisted.
pub struct LabsPage {
    notify: Notifications,
    start_delay: Duration,
    pub labs: Vec<Lab>,
    pub sessions: Vec<LabSession>,
}

impl LabsPage {
    pub fn new(notify: Notifications, start_delay: Duration) -> Self {
        Self {
            notify,
            start_delay,
            labs: Vec::new(),
            sessions: Vec::new(),
        }
    }

    pub fn load(&mut self, user: Option<&AuthUser>) {
        self.labs = fallback::labs();
        self.sessions = match user {
            Some(user) => demo_sessions(user.id),
            None => Vec::new(),
        };
    }

    pub fn progress(&self, lab_id: &str) -> LabProgress {
        let mut sessions = self.sessions.iter().filter(|s| s.lab_id == lab_id);
        if sessions.clone().any(|s| s.completed_at.is_some()) {
            LabProgress::Completed
        } else if sessions.any(|s| s.completed_at.is_none()) {
            LabProgress::InProgress
        } else {
            LabProgress::NotStarted
        }
    }

    /// Start a simulated lab session. The caller moves on to the dashboard.
    pub async fn start_lab(&mut self, user: Option<&AuthUser>, lab_id: &str) -> Result<LabSession, AppError> {
        let Some(user) = user else {
            self.notify.error("Please log in to access labs");
            return Err(AppError::NotSignedIn);
        };
        let lab = self
            .labs
            .iter()
            .find(|l| l.id == lab_id)
            .ok_or_else(|| AppError::Unavailable(format!("Lab {lab_id}")))?;
        if lab.status != LabStatus::Available {
            self.notify.error("Failed to start lab");
            return Err(AppError::Unavailable(lab.title.clone()));
        }

        tokio::time::sleep(self.start_delay).await;

        let session = LabSession {
            id: format!("session-{}", Uuid::new_v4()),
            user_id: user.id,
            lab_id: lab_id.to_string(),
            started_at: Utc::now(),
            completed_at: None,
        };
        self.sessions.push(session.clone());
        info!("User {} started lab {}", user.id, lab_id);
        self.notify.success("Lab started successfully!");
        Ok(session)
    }
}

fn demo_sessions(user_id: Uuid) -> Vec<LabSession> {
    let now = Utc::now();
    vec![
        LabSession {
            id: "session1".into(),
            user_id,
            lab_id: "lab1".into(),
            started_at: now - chrono::Duration::days(7),
            completed_at: Some(now - chrono::Duration::days(6)),
        },
        LabSession {
            id: "session2".into(),
            user_id,
            lab_id: "lab2".into(),
            started_at: now - chrono::Duration::days(2),
            completed_at: None,
        },
    ]
}
