//! Lifecycle event log — append-only local record of what happened when.
//!
//! Every controller transition emits an event here, fire-and-forget: a
//! failed append is logged and swallowed so the log can never block or fail
//! a lifecycle operation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::store::RecordStore;

/// The closed set of lifecycle events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    AppOpened,
    OnboardingCompleted,
    FocusStarted { duration_minutes: u32 },
    FocusCompleted { duration_minutes: u32 },
    FocusAbandoned,
    EmergencyExitUsed,
    JournalSaved,
    SecondSessionStarted,
}

impl LifecycleEvent {
    /// The persisted event name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AppOpened => "app_opened",
            Self::OnboardingCompleted => "onboarding_completed",
            Self::FocusStarted { .. } => "focus_started",
            Self::FocusCompleted { .. } => "focus_completed",
            Self::FocusAbandoned => "focus_abandoned",
            Self::EmergencyExitUsed => "emergency_exit_used",
            Self::JournalSaved => "journal_saved",
            Self::SecondSessionStarted => "second_session_started",
        }
    }

    /// Optional structured payload for the event.
    pub fn payload(&self) -> Option<serde_json::Value> {
        match self {
            Self::FocusStarted { duration_minutes }
            | Self::FocusCompleted { duration_minutes } => {
                Some(serde_json::json!({ "duration": duration_minutes }))
            }
            _ => None,
        }
    }
}

/// A persisted event log entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventRecord {
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

impl EventRecord {
    /// Stamp an event with the current time.
    pub fn now(event: &LifecycleEvent) -> Self {
        Self {
            event: event.name().to_string(),
            data: event.payload(),
            timestamp: Utc::now(),
        }
    }
}

/// Appends lifecycle events to the store.
#[derive(Clone)]
pub struct EventLog {
    store: Arc<dyn RecordStore>,
}

impl EventLog {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Append one event. Never fails — storage errors are logged and dropped.
    pub async fn emit(&self, event: LifecycleEvent) {
        let record = EventRecord::now(&event);
        debug!(event = record.event, "Lifecycle event");
        if let Err(e) = self.store.append_event(&record).await {
            warn!(event = record.event, error = %e, "Failed to append lifecycle event");
        }
    }
}
