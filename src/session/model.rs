//! Session domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::onboarding::{FocusMode, OnboardingData};

/// Structured end-of-session reflection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JournalReflection {
    /// What the user actually did.
    pub did: String,
    /// What pulled their attention away.
    pub distracted_by: String,
    /// What they want to carry into the next session.
    pub takeaway: String,
}

/// One timed focus attempt.
///
/// Created from the onboarding draft at session start — later draft edits do
/// not retroactively change it. Once `end_time` is set the record is
/// terminal: no further journal or reflection mutation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSession {
    /// Opaque unique identifier, assigned at creation.
    pub id: String,
    pub focus_task: String,
    pub focus_why: String,
    pub duration_minutes: u32,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    pub distraction_apps: Vec<String>,
    pub focus_mode: FocusMode,
    /// Free-form journal kept while the session runs. Last write wins.
    pub journal_during: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal_reflection: Option<JournalReflection>,
    /// True only after explicit successful completion. Stays false forever
    /// for abandoned sessions.
    pub completed: bool,
}

impl UserSession {
    /// Build a fresh session from an onboarding snapshot.
    pub fn from_onboarding(data: &OnboardingData) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            focus_task: data.focus_task.clone(),
            focus_why: data.focus_why.clone(),
            duration_minutes: data.focus_duration_minutes,
            start_time: Utc::now(),
            end_time: None,
            distraction_apps: data.distraction_apps.clone(),
            focus_mode: data.focus_mode,
            journal_during: String::new(),
            journal_reflection: None,
            completed: false,
        }
    }

    /// Whether the session is still running (no end time recorded).
    pub fn is_active(&self) -> bool {
        self.end_time.is_none()
    }
}
