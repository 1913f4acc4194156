//! Notification service boundary.
//!
//! Best-effort by contract: implementations never propagate failures, and
//! sending without permission is a silent no-op.

use std::sync::Mutex;

use async_trait::async_trait;
use tracing::{debug, info};

/// Outcome of a permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
    /// The platform has no notification support at all.
    Unsupported,
}

/// Platform notification wrapper consumed by the app shell.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Ask the platform for permission to notify.
    async fn request_permission(&self) -> Permission;

    /// Show a notification. No-op if permission is absent or delivery fails.
    async fn notify(&self, title: &str, body: &str);
}

/// Default notifier that writes to the log instead of the OS.
///
/// Stands in wherever a real platform integration is not wired up; keeps the
/// permission bookkeeping honest so the calling code behaves the same.
pub struct LogNotifier {
    permission: Mutex<Permission>,
}

impl LogNotifier {
    pub fn new() -> Self {
        Self {
            permission: Mutex::new(Permission::Denied),
        }
    }
}

impl Default for LogNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn request_permission(&self) -> Permission {
        let mut permission = self.permission.lock().expect("permission slot poisoned");
        *permission = Permission::Granted;
        *permission
    }

    async fn notify(&self, title: &str, body: &str) {
        let permission = *self.permission.lock().expect("permission slot poisoned");
        if permission != Permission::Granted {
            debug!(title, "Notification suppressed (no permission)");
            return;
        }
        info!(title, body, "Notification");
    }
}
