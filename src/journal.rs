//! Debounced journal persistence.
//!
//! The journal re-persists the whole session on every write, so a write per
//! keystroke would hammer the store. Each edit cancels the previously
//! scheduled write and schedules a new one; only the final text within a
//! quiet window lands, and only if it differs from what is already persisted.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::session::SessionController;

/// Pending-write-with-cancelable-delay primitive for journal edits.
pub struct JournalDebouncer {
    controller: Arc<SessionController>,
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
    latest: Mutex<Option<String>>,
}

impl JournalDebouncer {
    pub fn new(controller: Arc<SessionController>, delay: Duration) -> Self {
        Self {
            controller,
            delay,
            pending: Mutex::new(None),
            latest: Mutex::new(None),
        }
    }

    /// Record an edit and (re)start the quiet-window clock.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&self, text: String) {
        *self.latest.lock().expect("latest slot poisoned") = Some(text.clone());

        let mut pending = self.pending.lock().expect("pending slot poisoned");
        if let Some(handle) = pending.take() {
            handle.abort();
        }

        let controller = Arc::clone(&self.controller);
        let delay = self.delay;
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            write_if_changed(&controller, &text).await;
        }));
    }

    /// Cancel the quiet window and persist the latest edit immediately.
    ///
    /// Used before finalizing a session so no journal text is lost.
    pub async fn flush_now(&self) {
        let handle = self.pending.lock().expect("pending slot poisoned").take();
        if let Some(handle) = handle {
            handle.abort();
        }
        let text = self.latest.lock().expect("latest slot poisoned").take();
        if let Some(text) = text {
            write_if_changed(&self.controller, &text).await;
        }
    }
}

async fn write_if_changed(controller: &SessionController, text: &str) {
    if controller.current_journal().await.as_deref() == Some(text) {
        return;
    }
    controller.update_session_journal(text).await;
}
