//! SessionController — owns the onboarding draft and the single active
//! session, and is the sole writer to the record store.
//!
//! Store write failures are logged and swallowed: lifecycle transitions (and
//! their events) never depend on persistence succeeding. Invalid operations
//! for the current state are silent no-ops.

use std::sync::Arc;

use tokio::sync::{RwLock, broadcast};
use tracing::{info, warn};

use crate::events::{EventLog, LifecycleEvent};
use crate::onboarding::{OnboardingData, OnboardingDraft};
use crate::session::model::{JournalReflection, UserSession};
use crate::store::RecordStore;

/// Phase-change signals for the presentation layer.
///
/// The core never navigates; it announces transitions and lets a subscriber
/// decide what to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSignal {
    SessionStarted,
    SessionCompleted,
    SessionAbandoned,
}

/// Coordinates onboarding-data capture, session creation, journaling, and
/// finalization.
pub struct SessionController {
    store: Arc<dyn RecordStore>,
    events: EventLog,
    draft: RwLock<OnboardingDraft>,
    current: RwLock<Option<UserSession>>,
    signals: broadcast::Sender<SessionSignal>,
}

impl SessionController {
    /// Build a controller, seeding the draft from the persisted onboarding
    /// snapshot when one exists.
    pub async fn load(store: Arc<dyn RecordStore>, events: EventLog) -> Self {
        let draft = match store.get_onboarding_data().await {
            Ok(Some(data)) => OnboardingDraft::from_data(data),
            Ok(None) => OnboardingDraft::default(),
            Err(e) => {
                warn!(error = %e, "Failed to load onboarding snapshot, starting blank");
                OnboardingDraft::default()
            }
        };
        let (signals, _) = broadcast::channel(16);
        Self {
            store,
            events,
            draft: RwLock::new(draft),
            current: RwLock::new(None),
            signals,
        }
    }

    /// Subscribe to phase-change signals.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionSignal> {
        self.signals.subscribe()
    }

    // ── Onboarding ──────────────────────────────────────────────────

    /// Merge a partial update into the in-memory draft. Nothing is persisted
    /// until `complete_onboarding`.
    pub async fn update_onboarding_data(&self, update: OnboardingDraft) {
        self.draft.write().await.merge(update);
    }

    /// A copy of the current draft.
    pub async fn onboarding_draft(&self) -> OnboardingDraft {
        self.draft.read().await.clone()
    }

    /// Persist the draft as the onboarding snapshot and mark first-run done.
    ///
    /// Missing draft fields are written as defaults — gating completeness is
    /// the caller's contract, via the step flow.
    pub async fn complete_onboarding(&self) -> OnboardingData {
        let data = self.draft.read().await.to_data();
        if let Err(e) = self.store.save_onboarding_data(&data).await {
            warn!(error = %e, "Failed to persist onboarding snapshot");
        }
        if let Err(e) = self.store.set_has_completed_onboarding(true).await {
            warn!(error = %e, "Failed to persist onboarded flag");
        }
        self.events.emit(LifecycleEvent::OnboardingCompleted).await;
        info!(task = %data.focus_task, "Onboarding completed");
        data
    }

    // ── Session lifecycle ───────────────────────────────────────────

    /// Start a fresh session snapshotted from the current draft.
    ///
    /// Emits `second_session_started` first when any prior completed session
    /// exists, then `focus_started`.
    pub async fn start_session(&self) -> UserSession {
        let prior_completed = match self.store.total_completed_sessions().await {
            Ok(count) => count,
            Err(e) => {
                warn!(error = %e, "Failed to count completed sessions");
                0
            }
        };

        let session = UserSession::from_onboarding(&self.draft.read().await.to_data());
        self.persist(&session).await;
        *self.current.write().await = Some(session.clone());

        if prior_completed > 0 {
            self.events.emit(LifecycleEvent::SecondSessionStarted).await;
        }
        self.events
            .emit(LifecycleEvent::FocusStarted {
                duration_minutes: session.duration_minutes,
            })
            .await;
        let _ = self.signals.send(SessionSignal::SessionStarted);

        info!(session_id = %session.id, duration = session.duration_minutes, "Focus session started");
        session
    }

    /// Overwrite the active session's journal. Last write wins; no-op when
    /// no session is active or the current one is already finalized.
    pub async fn update_session_journal(&self, journal: &str) {
        let mut current = self.current.write().await;
        let Some(session) = current.as_mut().filter(|s| s.is_active()) else {
            return;
        };
        session.journal_during = journal.to_string();
        let snapshot = session.clone();
        drop(current);
        self.persist(&snapshot).await;
    }

    /// The active session's journal text, if a session is active.
    pub async fn current_journal(&self) -> Option<String> {
        self.current
            .read()
            .await
            .as_ref()
            .filter(|s| s.is_active())
            .map(|s| s.journal_during.clone())
    }

    /// Finalize the active session as completed, attaching the reflection.
    ///
    /// The finalized session stays the "current" reference until
    /// `reset_for_new_session` clears it.
    pub async fn complete_session(&self, reflection: Option<JournalReflection>) {
        let mut current = self.current.write().await;
        let Some(session) = current.as_mut().filter(|s| s.is_active()) else {
            return;
        };
        session.end_time = Some(chrono::Utc::now());
        session.journal_reflection = reflection;
        session.completed = true;
        let snapshot = session.clone();
        drop(current);

        self.persist(&snapshot).await;
        self.events
            .emit(LifecycleEvent::FocusCompleted {
                duration_minutes: snapshot.duration_minutes,
            })
            .await;
        self.events.emit(LifecycleEvent::JournalSaved).await;
        let _ = self.signals.send(SessionSignal::SessionCompleted);

        info!(session_id = %snapshot.id, "Focus session completed");
    }

    /// Finalize the active session as abandoned (`completed` stays false)
    /// and clear the active reference.
    pub async fn abandon_session(&self) {
        let mut current = self.current.write().await;
        let Some(session) = current.as_mut().filter(|s| s.is_active()) else {
            return;
        };
        session.end_time = Some(chrono::Utc::now());
        let snapshot = session.clone();
        *current = None;
        drop(current);

        self.persist(&snapshot).await;
        self.events.emit(LifecycleEvent::FocusAbandoned).await;
        let _ = self.signals.send(SessionSignal::SessionAbandoned);

        info!(session_id = %snapshot.id, "Focus session abandoned");
    }

    /// The escape hatch: records that it was used, then abandons.
    ///
    /// The event is emitted even with no active session — the user reaching
    /// for the exit is worth knowing about either way.
    pub async fn emergency_exit(&self) {
        self.events.emit(LifecycleEvent::EmergencyExitUsed).await;
        self.abandon_session().await;
    }

    /// Drop the current-session reference without touching the store. Used
    /// after a completed session has been finalized and the user goes home.
    pub async fn reset_for_new_session(&self) {
        *self.current.write().await = None;
    }

    /// A copy of the current session reference (active or just-finalized).
    pub async fn current_session(&self) -> Option<UserSession> {
        self.current.read().await.clone()
    }

    async fn persist(&self, session: &UserSession) {
        if let Err(e) = self.store.save_session(session).await {
            warn!(session_id = %session.id, error = %e, "Failed to persist session");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onboarding::FocusMode;
    use crate::store::LibSqlBackend;

    async fn test_controller() -> (Arc<LibSqlBackend>, SessionController) {
        let store = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        let events = EventLog::new(store.clone() as Arc<dyn RecordStore>);
        let controller =
            SessionController::load(store.clone() as Arc<dyn RecordStore>, events).await;
        (store, controller)
    }

    fn full_draft() -> OnboardingDraft {
        OnboardingDraft {
            focus_task: Some("Finish the chapter".to_string()),
            focus_why: Some("It matters".to_string()),
            focus_duration_minutes: Some(25),
            distraction_apps: Some(vec!["TikTok".to_string()]),
            focus_mode: Some(FocusMode::Light),
            allow_notifications: Some(false),
        }
    }

    fn reflection() -> JournalReflection {
        JournalReflection {
            did: "wrote".to_string(),
            distracted_by: "nothing".to_string(),
            takeaway: "keep going".to_string(),
        }
    }

    async fn event_names(store: &LibSqlBackend) -> Vec<String> {
        store
            .get_events()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.event)
            .collect()
    }

    #[tokio::test]
    async fn complete_onboarding_persists_snapshot_and_flag() {
        let (store, controller) = test_controller().await;
        controller.update_onboarding_data(full_draft()).await;
        let data = controller.complete_onboarding().await;

        assert_eq!(data.focus_task, "Finish the chapter");
        assert_eq!(
            store.get_onboarding_data().await.unwrap().unwrap(),
            data
        );
        assert!(store.has_completed_onboarding().await.unwrap());
        assert_eq!(event_names(&store).await, vec!["onboarding_completed"]);
    }

    #[tokio::test]
    async fn complete_onboarding_with_partial_draft_writes_defaults() {
        let (store, controller) = test_controller().await;
        controller
            .update_onboarding_data(OnboardingDraft {
                focus_task: Some("Only a task".to_string()),
                ..Default::default()
            })
            .await;
        let data = controller.complete_onboarding().await;

        assert_eq!(data.focus_task, "Only a task");
        assert!(data.focus_why.is_empty());
        assert_eq!(data.focus_duration_minutes, 25);
        assert!(store.get_onboarding_data().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn draft_is_reloaded_from_persisted_snapshot() {
        let (store, controller) = test_controller().await;
        controller.update_onboarding_data(full_draft()).await;
        controller.complete_onboarding().await;

        let events = EventLog::new(store.clone() as Arc<dyn RecordStore>);
        let restored =
            SessionController::load(store.clone() as Arc<dyn RecordStore>, events).await;
        let draft = restored.onboarding_draft().await;
        assert_eq!(draft.focus_task.as_deref(), Some("Finish the chapter"));
        assert!(draft.is_complete());
    }

    #[tokio::test]
    async fn start_then_complete_persists_a_completed_record() {
        let (store, controller) = test_controller().await;
        controller.update_onboarding_data(full_draft()).await;

        let started = controller.start_session().await;
        controller.complete_session(Some(reflection())).await;

        let sessions = store.get_sessions().await.unwrap();
        assert_eq!(sessions.len(), 1);
        let record = &sessions[0];
        assert_eq!(record.id, started.id);
        assert!(record.completed);
        assert!(record.end_time.unwrap() >= record.start_time);
        assert_eq!(record.journal_reflection, Some(reflection()));

        // The finalized session stays current until explicitly cleared.
        assert!(controller.current_session().await.is_some());
        controller.reset_for_new_session().await;
        assert!(controller.current_session().await.is_none());
    }

    #[tokio::test]
    async fn start_then_abandon_clears_the_active_reference() {
        let (store, controller) = test_controller().await;
        controller.update_onboarding_data(full_draft()).await;

        controller.start_session().await;
        controller.abandon_session().await;

        let sessions = store.get_sessions().await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert!(!sessions[0].completed);
        assert!(sessions[0].end_time.is_some());
        assert!(controller.current_session().await.is_none());
    }

    #[tokio::test]
    async fn journal_updates_overwrite_last_write_wins() {
        let (store, controller) = test_controller().await;
        controller.update_onboarding_data(full_draft()).await;
        controller.start_session().await;

        controller.update_session_journal("first thought").await;
        controller.update_session_journal("second thought").await;

        let sessions = store.get_sessions().await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].journal_during, "second thought");
        assert_eq!(
            controller.current_journal().await.as_deref(),
            Some("second thought")
        );
    }

    #[tokio::test]
    async fn journal_update_without_active_session_is_a_noop() {
        let (store, controller) = test_controller().await;
        controller.update_session_journal("shouting into the void").await;
        assert!(store.get_sessions().await.unwrap().is_empty());
        assert!(controller.current_journal().await.is_none());
    }

    #[tokio::test]
    async fn finalized_session_cannot_be_mutated_again() {
        let (store, controller) = test_controller().await;
        controller.update_onboarding_data(full_draft()).await;
        controller.start_session().await;
        controller.complete_session(None).await;

        // All of these hit a terminal record and must not change it.
        controller.update_session_journal("too late").await;
        controller.complete_session(Some(reflection())).await;
        controller.abandon_session().await;

        let sessions = store.get_sessions().await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert!(sessions[0].completed);
        assert!(sessions[0].journal_during.is_empty());
        assert!(sessions[0].journal_reflection.is_none());
    }

    #[tokio::test]
    async fn lifecycle_ops_without_a_session_are_noops() {
        let (store, controller) = test_controller().await;
        controller.complete_session(Some(reflection())).await;
        controller.abandon_session().await;
        controller.reset_for_new_session().await;

        assert!(store.get_sessions().await.unwrap().is_empty());
        assert!(event_names(&store).await.is_empty());
    }

    #[tokio::test]
    async fn start_emits_focus_started_with_duration() {
        let (store, controller) = test_controller().await;
        controller.update_onboarding_data(full_draft()).await;
        controller.start_session().await;

        let events = store.get_events().await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, "focus_started");
        assert_eq!(events[0].data, Some(serde_json::json!({ "duration": 25 })));
    }

    #[tokio::test]
    async fn completion_emits_focus_completed_then_journal_saved() {
        let (store, controller) = test_controller().await;
        controller.update_onboarding_data(full_draft()).await;
        controller.start_session().await;
        controller.complete_session(None).await;

        assert_eq!(
            event_names(&store).await,
            vec!["focus_started", "focus_completed", "journal_saved"]
        );
    }

    #[tokio::test]
    async fn second_session_event_requires_a_prior_completed_session() {
        let (store, controller) = test_controller().await;
        controller.update_onboarding_data(full_draft()).await;

        // First session, abandoned — still no completed session on record.
        controller.start_session().await;
        controller.abandon_session().await;
        controller.start_session().await;
        controller.complete_session(None).await;
        controller.reset_for_new_session().await;

        // Now a completed session exists, the next start announces it.
        controller.start_session().await;

        let names = event_names(&store).await;
        assert_eq!(
            names,
            vec![
                "focus_started",
                "focus_abandoned",
                "focus_started",
                "focus_completed",
                "journal_saved",
                "second_session_started",
                "focus_started",
            ]
        );
    }

    #[tokio::test]
    async fn emergency_exit_matches_abandon_plus_marker_event() {
        let (store, controller) = test_controller().await;
        controller.update_onboarding_data(full_draft()).await;
        controller.start_session().await;
        controller.emergency_exit().await;

        let sessions = store.get_sessions().await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert!(!sessions[0].completed);
        assert!(sessions[0].end_time.is_some());
        assert!(controller.current_session().await.is_none());

        let names = event_names(&store).await;
        assert_eq!(
            names,
            vec!["focus_started", "emergency_exit_used", "focus_abandoned"]
        );
    }

    #[tokio::test]
    async fn signals_fan_out_to_subscribers() {
        let (_store, controller) = test_controller().await;
        controller.update_onboarding_data(full_draft()).await;
        let mut rx = controller.subscribe();

        controller.start_session().await;
        controller.complete_session(None).await;

        assert_eq!(rx.recv().await.unwrap(), SessionSignal::SessionStarted);
        assert_eq!(rx.recv().await.unwrap(), SessionSignal::SessionCompleted);
    }

    #[tokio::test]
    async fn session_snapshot_ignores_later_draft_edits() {
        let (_store, controller) = test_controller().await;
        controller.update_onboarding_data(full_draft()).await;
        let session = controller.start_session().await;

        controller
            .update_onboarding_data(OnboardingDraft {
                focus_task: Some("Something else".to_string()),
                ..Default::default()
            })
            .await;

        let current = controller.current_session().await.unwrap();
        assert_eq!(current.focus_task, session.focus_task);
        assert_eq!(current.focus_task, "Finish the chapter");
    }
}
