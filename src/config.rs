//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Path to the local database file.
    pub db_path: PathBuf,
    /// Quiet window before a pending journal edit is persisted.
    pub journal_debounce: Duration,
    /// Countdown tick interval.
    pub tick_interval: Duration,
    /// Session duration used when the onboarding draft has none.
    pub default_duration_minutes: u32,
    /// Directory for the rolling log file, if file logging is wanted.
    pub log_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./data/braingain.db"),
            journal_debounce: Duration::from_secs(1),
            tick_interval: Duration::from_secs(1),
            default_duration_minutes: 25,
            log_dir: None,
        }
    }
}

impl AppConfig {
    /// Build a config from environment variables, falling back to defaults.
    ///
    /// Recognized variables: `BRAINGAIN_DB_PATH`, `BRAINGAIN_LOG_DIR`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(path) = std::env::var("BRAINGAIN_DB_PATH") {
            config.db_path = PathBuf::from(path);
        }
        if let Ok(dir) = std::env::var("BRAINGAIN_LOG_DIR") {
            config.log_dir = Some(PathBuf::from(dir));
        }
        config
    }
}
