//! Onboarding data models — the setup draft and its completed snapshot.

use serde::{Deserialize, Serialize};

/// How strictly a focus session should treat distractions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FocusMode {
    /// Gentle mode — the session only tracks what the user reports.
    Light,
    /// Reminder mode — the session nudges when the user drifts.
    Reminder,
}

impl Default for FocusMode {
    fn default() -> Self {
        Self::Light
    }
}

impl std::fmt::Display for FocusMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Light => write!(f, "light"),
            Self::Reminder => write!(f, "reminder"),
        }
    }
}

/// Completed onboarding snapshot.
///
/// Stored in the `settings` table as JSON under key `"onboarding_data"`.
/// Field ranges (task 1–60 chars, why 1–140 chars, duration 5–180 minutes)
/// are validated by the step flow, not here — see [`super::OnboardingStep`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OnboardingData {
    pub focus_task: String,
    pub focus_why: String,
    pub focus_duration_minutes: u32,
    pub distraction_apps: Vec<String>,
    pub focus_mode: FocusMode,
    pub allow_notifications: bool,
}

impl Default for OnboardingData {
    fn default() -> Self {
        Self {
            focus_task: String::new(),
            focus_why: String::new(),
            focus_duration_minutes: 25,
            distraction_apps: Vec::new(),
            focus_mode: FocusMode::default(),
            allow_notifications: false,
        }
    }
}

/// In-memory onboarding draft — partial until every step has been visited.
///
/// `merge` overwrites only the fields the update carries, so each setup step
/// can submit just its own answers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OnboardingDraft {
    pub focus_task: Option<String>,
    pub focus_why: Option<String>,
    pub focus_duration_minutes: Option<u32>,
    pub distraction_apps: Option<Vec<String>>,
    pub focus_mode: Option<FocusMode>,
    pub allow_notifications: Option<bool>,
}

impl OnboardingDraft {
    /// Merge an update into the draft, field by field.
    pub fn merge(&mut self, update: OnboardingDraft) {
        if let Some(task) = update.focus_task {
            self.focus_task = Some(task);
        }
        if let Some(why) = update.focus_why {
            self.focus_why = Some(why);
        }
        if let Some(duration) = update.focus_duration_minutes {
            self.focus_duration_minutes = Some(duration);
        }
        if let Some(apps) = update.distraction_apps {
            self.distraction_apps = Some(apps);
        }
        if let Some(mode) = update.focus_mode {
            self.focus_mode = Some(mode);
        }
        if let Some(allow) = update.allow_notifications {
            self.allow_notifications = Some(allow);
        }
    }

    /// Whether every field has been filled in.
    pub fn is_complete(&self) -> bool {
        self.focus_task.is_some()
            && self.focus_why.is_some()
            && self.focus_duration_minutes.is_some()
            && self.distraction_apps.is_some()
            && self.focus_mode.is_some()
            && self.allow_notifications.is_some()
    }

    /// Promote the draft to a snapshot, filling defaults for missing fields.
    ///
    /// There is deliberately no validation barrier here — gating progression
    /// is the caller's contract, via the step flow.
    pub fn to_data(&self) -> OnboardingData {
        let defaults = OnboardingData::default();
        OnboardingData {
            focus_task: self.focus_task.clone().unwrap_or(defaults.focus_task),
            focus_why: self.focus_why.clone().unwrap_or(defaults.focus_why),
            focus_duration_minutes: self
                .focus_duration_minutes
                .unwrap_or(defaults.focus_duration_minutes),
            distraction_apps: self
                .distraction_apps
                .clone()
                .unwrap_or(defaults.distraction_apps),
            focus_mode: self.focus_mode.unwrap_or(defaults.focus_mode),
            allow_notifications: self
                .allow_notifications
                .unwrap_or(defaults.allow_notifications),
        }
    }

    /// Rebuild a draft from a previously persisted snapshot.
    pub fn from_data(data: OnboardingData) -> Self {
        Self {
            focus_task: Some(data.focus_task),
            focus_why: Some(data.focus_why),
            focus_duration_minutes: Some(data.focus_duration_minutes),
            distraction_apps: Some(data.distraction_apps),
            focus_mode: Some(data.focus_mode),
            allow_notifications: Some(data.allow_notifications),
        }
    }
}

/// Settings keys used for onboarding persistence.
pub mod settings_keys {
    /// Key for the OnboardingData JSON blob in the settings table.
    pub const ONBOARDING_DATA: &str = "onboarding_data";
    /// Key for the has-onboarded flag in the settings table.
    pub const HAS_ONBOARDED: &str = "has_onboarded";
    /// Default user ID (single-user system).
    pub const DEFAULT_USER: &str = "default";
}
