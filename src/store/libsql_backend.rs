//! libSQL backend — async `RecordStore` implementation.
//!
//! Sessions are stored as a JSON payload column beside flat `completed` /
//! `end_time` columns so the weekly and all-time counts stay in SQL. A row
//! whose payload fails to parse is skipped, never surfaced as an error.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{info, warn};

use crate::error::StoreError;
use crate::events::EventRecord;
use crate::onboarding::OnboardingData;
use crate::onboarding::model::settings_keys;
use crate::session::UserSession;
use crate::store::migrations;
use crate::store::traits::RecordStore;

/// libSQL record store.
///
/// Holds a single connection reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Open(format!("Failed to create database directory: {e}")))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StoreError::Open(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| StoreError::Open(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        migrations::run_migrations(&backend.conn).await?;
        info!(path = %path.display(), "Record store opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, StoreError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| StoreError::Open(format!("Failed to create in-memory database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| StoreError::Open(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        migrations::run_migrations(&backend.conn).await?;
        Ok(backend)
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }

    // ── Settings helpers ────────────────────────────────────────────

    async fn get_setting(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT value FROM settings WHERE user_id = ?1 AND key = ?2",
                params![settings_keys::DEFAULT_USER, key],
            )
            .await
            .map_err(|e| StoreError::Query(format!("get_setting: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let value_str: String = row.get(0).unwrap_or_else(|_| "null".to_string());
                // Malformed stored JSON reads as absence.
                match serde_json::from_str(&value_str) {
                    Ok(value) => Ok(Some(value)),
                    Err(e) => {
                        warn!(key, error = %e, "Skipping malformed setting value");
                        Ok(None)
                    }
                }
            }
            Ok(None) => Ok(None),
            Err(e) => Err(StoreError::Query(format!("get_setting: {e}"))),
        }
    }

    async fn set_setting(&self, key: &str, value: &serde_json::Value) -> Result<(), StoreError> {
        let now = Utc::now().to_rfc3339();
        let value_str =
            serde_json::to_string(value).map_err(|e| StoreError::Serialization(e.to_string()))?;

        self.conn()
            .execute(
                "INSERT INTO settings (user_id, key, value, updated_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (user_id, key) DO UPDATE SET value = ?3, updated_at = ?4",
                params![settings_keys::DEFAULT_USER, key, value_str, now],
            )
            .await
            .map_err(|e| StoreError::Query(format!("set_setting: {e}")))?;

        Ok(())
    }
}

/// Convert `Option<String>` to a libsql Value.
fn opt_text_owned(s: Option<String>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s),
        None => libsql::Value::Null,
    }
}

/// Parse a session payload column, or `None` with a warning.
fn parse_session_payload(payload: &str) -> Option<UserSession> {
    match serde_json::from_str::<UserSession>(payload) {
        Ok(session) => Some(session),
        Err(e) => {
            warn!(error = %e, "Skipping malformed session row");
            None
        }
    }
}

/// Parse an RFC 3339 string into `DateTime<Utc>`, epoch-min on failure.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[async_trait]
impl RecordStore for LibSqlBackend {
    // ── Sessions ────────────────────────────────────────────────────

    async fn save_session(&self, session: &UserSession) -> Result<(), StoreError> {
        let payload = serde_json::to_string(session)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let end_time = session.end_time.map(|t| t.to_rfc3339());
        let created_at = session.start_time.to_rfc3339();
        let now = Utc::now().to_rfc3339();

        // ON CONFLICT keeps the original rowid, so a replaced record stays
        // at its first-seen position in the sequence.
        self.conn()
            .execute(
                "INSERT INTO sessions (id, payload, completed, end_time, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT (id) DO UPDATE SET
                     payload = ?2, completed = ?3, end_time = ?4, updated_at = ?6",
                params![
                    session.id.as_str(),
                    payload,
                    session.completed as i64,
                    opt_text_owned(end_time),
                    created_at,
                    now
                ],
            )
            .await
            .map_err(|e| StoreError::Query(format!("save_session: {e}")))?;

        Ok(())
    }

    async fn get_sessions(&self) -> Result<Vec<UserSession>, StoreError> {
        let mut rows = self
            .conn()
            .query("SELECT payload FROM sessions ORDER BY rowid ASC", ())
            .await
            .map_err(|e| StoreError::Query(format!("get_sessions: {e}")))?;

        let mut sessions = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            let payload: String = match row.get(0) {
                Ok(p) => p,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable session row");
                    continue;
                }
            };
            if let Some(session) = parse_session_payload(&payload) {
                sessions.push(session);
            }
        }
        Ok(sessions)
    }

    async fn get_last_session(&self) -> Result<Option<UserSession>, StoreError> {
        let mut rows = self
            .conn()
            .query("SELECT payload FROM sessions ORDER BY rowid DESC", ())
            .await
            .map_err(|e| StoreError::Query(format!("get_last_session: {e}")))?;

        while let Ok(Some(row)) = rows.next().await {
            let payload: String = match row.get(0) {
                Ok(p) => p,
                Err(_) => continue,
            };
            if let Some(session) = parse_session_payload(&payload) {
                return Ok(Some(session));
            }
        }
        Ok(None)
    }

    async fn completed_sessions_this_week(&self) -> Result<u64, StoreError> {
        let cutoff = (Utc::now() - chrono::Duration::days(7)).to_rfc3339();
        let mut rows = self
            .conn()
            .query(
                "SELECT COUNT(*) FROM sessions
                 WHERE completed = 1 AND end_time IS NOT NULL AND end_time >= ?1",
                params![cutoff],
            )
            .await
            .map_err(|e| StoreError::Query(format!("completed_sessions_this_week: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(row.get::<i64>(0).unwrap_or(0) as u64),
            _ => Ok(0),
        }
    }

    async fn total_completed_sessions(&self) -> Result<u64, StoreError> {
        let mut rows = self
            .conn()
            .query("SELECT COUNT(*) FROM sessions WHERE completed = 1", ())
            .await
            .map_err(|e| StoreError::Query(format!("total_completed_sessions: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(row.get::<i64>(0).unwrap_or(0) as u64),
            _ => Ok(0),
        }
    }

    // ── Onboarding ──────────────────────────────────────────────────

    async fn save_onboarding_data(&self, data: &OnboardingData) -> Result<(), StoreError> {
        let value =
            serde_json::to_value(data).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.set_setting(settings_keys::ONBOARDING_DATA, &value).await
    }

    async fn get_onboarding_data(&self) -> Result<Option<OnboardingData>, StoreError> {
        let Some(value) = self.get_setting(settings_keys::ONBOARDING_DATA).await? else {
            return Ok(None);
        };
        match serde_json::from_value(value) {
            Ok(data) => Ok(Some(data)),
            Err(e) => {
                warn!(error = %e, "Skipping malformed onboarding snapshot");
                Ok(None)
            }
        }
    }

    async fn set_has_completed_onboarding(&self, value: bool) -> Result<(), StoreError> {
        self.set_setting(settings_keys::HAS_ONBOARDED, &serde_json::Value::Bool(value))
            .await
    }

    async fn has_completed_onboarding(&self) -> Result<bool, StoreError> {
        Ok(self
            .get_setting(settings_keys::HAS_ONBOARDED)
            .await?
            .and_then(|v| v.as_bool())
            .unwrap_or(false))
    }

    // ── Event log ───────────────────────────────────────────────────

    async fn append_event(&self, record: &EventRecord) -> Result<(), StoreError> {
        let data = record
            .data
            .as_ref()
            .map(|d| serde_json::to_string(d))
            .transpose()
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        self.conn()
            .execute(
                "INSERT INTO events (event, data, timestamp) VALUES (?1, ?2, ?3)",
                params![
                    record.event.as_str(),
                    opt_text_owned(data),
                    record.timestamp.to_rfc3339()
                ],
            )
            .await
            .map_err(|e| StoreError::Query(format!("append_event: {e}")))?;

        Ok(())
    }

    async fn get_events(&self) -> Result<Vec<EventRecord>, StoreError> {
        let mut rows = self
            .conn()
            .query("SELECT event, data, timestamp FROM events ORDER BY id ASC", ())
            .await
            .map_err(|e| StoreError::Query(format!("get_events: {e}")))?;

        let mut events = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            let event: String = match row.get(0) {
                Ok(e) => e,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable event row");
                    continue;
                }
            };
            let data_str: Option<String> = row.get(1).ok();
            let timestamp_str: String = row.get(2).unwrap_or_default();

            let data = data_str.and_then(|d| serde_json::from_str(&d).ok());
            events.push(EventRecord {
                event,
                data,
                timestamp: parse_datetime(&timestamp_str),
            });
        }
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::LifecycleEvent;
    use crate::onboarding::FocusMode;
    use crate::session::JournalReflection;

    async fn test_db() -> LibSqlBackend {
        LibSqlBackend::new_memory().await.unwrap()
    }

    fn make_data(task: &str) -> OnboardingData {
        OnboardingData {
            focus_task: task.to_string(),
            focus_why: "because".to_string(),
            focus_duration_minutes: 25,
            distraction_apps: vec!["TikTok".to_string()],
            focus_mode: FocusMode::Light,
            allow_notifications: false,
        }
    }

    fn make_session(task: &str) -> UserSession {
        UserSession::from_onboarding(&make_data(task))
    }

    fn finish(mut session: UserSession, days_ago: i64) -> UserSession {
        session.end_time = Some(Utc::now() - chrono::Duration::days(days_ago));
        session.completed = true;
        session
    }

    // ── Session tests ───────────────────────────────────────────────

    #[tokio::test]
    async fn sessions_empty_by_default() {
        let db = test_db().await;
        assert!(db.get_sessions().await.unwrap().is_empty());
        assert!(db.get_last_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_and_get_sessions_in_order() {
        let db = test_db().await;
        let a = make_session("first");
        let b = make_session("second");

        db.save_session(&a).await.unwrap();
        db.save_session(&b).await.unwrap();

        let sessions = db.get_sessions().await.unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].id, a.id);
        assert_eq!(sessions[1].id, b.id);
    }

    #[tokio::test]
    async fn upsert_replaces_in_place() {
        let db = test_db().await;
        let a = make_session("first");
        let mut b = make_session("second");

        db.save_session(&a).await.unwrap();
        db.save_session(&b).await.unwrap();

        // Rewrite the first-saved record; it must keep its position.
        b.journal_during = "halfway there".to_string();
        db.save_session(&b).await.unwrap();
        let mut a2 = a.clone();
        a2.journal_during = "done with intro".to_string();
        db.save_session(&a2).await.unwrap();

        let sessions = db.get_sessions().await.unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].id, a.id);
        assert_eq!(sessions[0].journal_during, "done with intro");
        assert_eq!(sessions[1].id, b.id);
        assert_eq!(sessions[1].journal_during, "halfway there");
    }

    #[tokio::test]
    async fn last_session_is_most_recently_appended() {
        let db = test_db().await;
        let a = make_session("first");
        let b = make_session("second");

        db.save_session(&a).await.unwrap();
        db.save_session(&b).await.unwrap();
        // Updating the first record must not make it "last".
        db.save_session(&a).await.unwrap();

        let last = db.get_last_session().await.unwrap().unwrap();
        assert_eq!(last.id, b.id);
    }

    #[tokio::test]
    async fn weekly_count_uses_trailing_seven_days() {
        let db = test_db().await;
        db.save_session(&finish(make_session("recent"), 3)).await.unwrap();
        db.save_session(&finish(make_session("old"), 8)).await.unwrap();
        // Active session — no end_time, not counted anywhere.
        db.save_session(&make_session("running")).await.unwrap();

        assert_eq!(db.completed_sessions_this_week().await.unwrap(), 1);
        assert_eq!(db.total_completed_sessions().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn abandoned_sessions_never_count_as_completed() {
        let db = test_db().await;
        let mut session = make_session("gave up");
        session.end_time = Some(Utc::now());
        db.save_session(&session).await.unwrap();

        assert_eq!(db.completed_sessions_this_week().await.unwrap(), 0);
        assert_eq!(db.total_completed_sessions().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn reflection_survives_roundtrip() {
        let db = test_db().await;
        let mut session = finish(make_session("deep work"), 0);
        session.journal_reflection = Some(JournalReflection {
            did: "wrote two pages".to_string(),
            distracted_by: "phone".to_string(),
            takeaway: "leave phone outside".to_string(),
        });
        db.save_session(&session).await.unwrap();

        let fetched = db.get_last_session().await.unwrap().unwrap();
        assert_eq!(fetched.journal_reflection, session.journal_reflection);
    }

    #[tokio::test]
    async fn malformed_session_row_is_skipped() {
        let db = test_db().await;
        db.save_session(&make_session("good")).await.unwrap();

        db.conn()
            .execute(
                "INSERT INTO sessions (id, payload, completed, end_time, created_at, updated_at)
                 VALUES ('bad', 'not json at all', 0, NULL, '', '')",
                (),
            )
            .await
            .unwrap();

        let sessions = db.get_sessions().await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].focus_task, "good");
        // The malformed row was appended last; last-session skips past it.
        assert!(db.get_last_session().await.unwrap().is_some());
    }

    // ── Onboarding tests ────────────────────────────────────────────

    #[tokio::test]
    async fn onboarding_slot_is_latest_wins() {
        let db = test_db().await;
        assert!(db.get_onboarding_data().await.unwrap().is_none());

        db.save_onboarding_data(&make_data("first")).await.unwrap();
        db.save_onboarding_data(&make_data("second")).await.unwrap();

        let data = db.get_onboarding_data().await.unwrap().unwrap();
        assert_eq!(data.focus_task, "second");
    }

    #[tokio::test]
    async fn has_onboarded_defaults_to_false() {
        let db = test_db().await;
        assert!(!db.has_completed_onboarding().await.unwrap());

        db.set_has_completed_onboarding(true).await.unwrap();
        assert!(db.has_completed_onboarding().await.unwrap());
    }

    #[tokio::test]
    async fn malformed_settings_read_as_absence() {
        let db = test_db().await;
        db.conn()
            .execute(
                "INSERT INTO settings (user_id, key, value, updated_at)
                 VALUES ('default', 'onboarding_data', '{broken', '')",
                (),
            )
            .await
            .unwrap();
        db.conn()
            .execute(
                "INSERT INTO settings (user_id, key, value, updated_at)
                 VALUES ('default', 'has_onboarded', '{broken', '')",
                (),
            )
            .await
            .unwrap();

        assert!(db.get_onboarding_data().await.unwrap().is_none());
        assert!(!db.has_completed_onboarding().await.unwrap());
    }

    // ── Event log tests ─────────────────────────────────────────────

    #[tokio::test]
    async fn events_append_in_order() {
        let db = test_db().await;
        db.append_event(&EventRecord::now(&LifecycleEvent::AppOpened))
            .await
            .unwrap();
        db.append_event(&EventRecord::now(&LifecycleEvent::FocusStarted {
            duration_minutes: 25,
        }))
        .await
        .unwrap();

        let events = db.get_events().await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event, "app_opened");
        assert!(events[0].data.is_none());
        assert_eq!(events[1].event, "focus_started");
        assert_eq!(events[1].data, Some(serde_json::json!({ "duration": 25 })));
    }

    #[tokio::test]
    async fn file_backed_store_persists_across_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("braingain.db");

        {
            let db = LibSqlBackend::new_local(&path).await.unwrap();
            db.save_session(&make_session("persisted")).await.unwrap();
            db.set_has_completed_onboarding(true).await.unwrap();
        }

        let db = LibSqlBackend::new_local(&path).await.unwrap();
        let sessions = db.get_sessions().await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].focus_task, "persisted");
        assert!(db.has_completed_onboarding().await.unwrap());
    }
}
