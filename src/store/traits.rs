//! `RecordStore` trait — single async interface for all persistence.
//!
//! Pure reads and writes, no business rules. The lifecycle controller is the
//! only mutator; the backing medium is swappable behind this trait.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::events::EventRecord;
use crate::onboarding::OnboardingData;
use crate::session::UserSession;

/// Backend-agnostic store covering sessions, the onboarding slot, and the
/// event log.
#[async_trait]
pub trait RecordStore: Send + Sync {
    // ── Sessions ────────────────────────────────────────────────────

    /// Upsert a session by id. A replaced record keeps its original position
    /// in the sequence; a new id is appended.
    async fn save_session(&self, session: &UserSession) -> Result<(), StoreError>;

    /// All persisted sessions, oldest first. Empty if none exist.
    async fn get_sessions(&self) -> Result<Vec<UserSession>, StoreError>;

    /// The most recently appended session, if any.
    async fn get_last_session(&self) -> Result<Option<UserSession>, StoreError>;

    /// Count of completed sessions whose end time falls within the trailing
    /// seven 24-hour days.
    async fn completed_sessions_this_week(&self) -> Result<u64, StoreError>;

    /// All-time count of completed sessions.
    async fn total_completed_sessions(&self) -> Result<u64, StoreError>;

    // ── Onboarding ──────────────────────────────────────────────────

    /// Replace the single onboarding snapshot (latest wins, no history).
    async fn save_onboarding_data(&self, data: &OnboardingData) -> Result<(), StoreError>;

    /// The latest onboarding snapshot, if one was ever saved.
    async fn get_onboarding_data(&self) -> Result<Option<OnboardingData>, StoreError>;

    /// Set the first-run flag.
    async fn set_has_completed_onboarding(&self, value: bool) -> Result<(), StoreError>;

    /// Read the first-run flag. Defaults to false when absent.
    async fn has_completed_onboarding(&self) -> Result<bool, StoreError>;

    // ── Event log ───────────────────────────────────────────────────

    /// Append one record to the event log.
    async fn append_event(&self, record: &EventRecord) -> Result<(), StoreError>;

    /// The full event log, oldest first.
    async fn get_events(&self) -> Result<Vec<EventRecord>, StoreError>;
}
