//! Application context — the one explicitly constructed state object every
//! consuming surface receives a handle to. No hidden singletons.

use std::sync::Arc;

use tracing::warn;

use crate::config::AppConfig;
use crate::error::Result;
use crate::events::{EventLog, LifecycleEvent};
use crate::session::SessionController;
use crate::store::{LibSqlBackend, RecordStore};

/// Process-wide application state, constructed once at startup.
pub struct AppContext {
    config: AppConfig,
    store: Arc<dyn RecordStore>,
    controller: Arc<SessionController>,
    is_first_time: bool,
}

impl AppContext {
    /// Open the store at the configured path and bring the app up.
    ///
    /// Emits `app_opened` as its last step.
    pub async fn init(config: AppConfig) -> Result<Self> {
        let store: Arc<dyn RecordStore> =
            Arc::new(LibSqlBackend::new_local(&config.db_path).await?);
        Self::init_with_store(config, store).await
    }

    /// Bring the app up against an already-open store.
    ///
    /// This is the seam tests (and any alternate backend) go through.
    pub async fn init_with_store(config: AppConfig, store: Arc<dyn RecordStore>) -> Result<Self> {
        let events = EventLog::new(Arc::clone(&store));

        let is_first_time = match store.has_completed_onboarding().await {
            Ok(done) => !done,
            Err(e) => {
                warn!(error = %e, "Failed to read onboarded flag, assuming first run");
                true
            }
        };

        let controller =
            Arc::new(SessionController::load(Arc::clone(&store), events.clone()).await);
        events.emit(LifecycleEvent::AppOpened).await;

        Ok(Self {
            config,
            store,
            controller,
            is_first_time,
        })
    }

    /// Whether onboarding has never been completed on this device.
    pub fn is_first_time(&self) -> bool {
        self.is_first_time
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn controller(&self) -> Arc<SessionController> {
        Arc::clone(&self.controller)
    }

    pub fn store(&self) -> Arc<dyn RecordStore> {
        Arc::clone(&self.store)
    }
}
