//! Application-level configuration loading: join-code shape, name limits, polling and
//! spreadsheet quota tuning.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "TAPBATTLE_CONFIG_PATH";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Length of generated session join codes.
    pub session_code_length: usize,
    /// Upper bound for host, team and player names.
    pub max_name_length: usize,
    /// Interval used by polling clients.
    pub poll_interval_ms: u64,
    /// Google Sheets cache and quota settings.
    pub sheets: SheetsTuning,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<AppConfig>(&contents) {
                Ok(config) => {
                    info!(
                        path = %path.display(),
                        code_length = config.session_code_length,
                        poll_interval_ms = config.poll_interval_ms,
                        "loaded configuration"
                    );
                    config.sanitized()
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Interval between two polls of a client view.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if self.session_code_length < 4 {
            warn!(
                value = self.session_code_length,
                "session code length too short; using default"
            );
            self.session_code_length = defaults.session_code_length;
        }
        if self.max_name_length == 0 {
            self.max_name_length = defaults.max_name_length;
        }
        if self.poll_interval_ms == 0 {
            self.poll_interval_ms = defaults.poll_interval_ms;
        }
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            session_code_length: 6,
            max_name_length: 32,
            poll_interval_ms: 1_000,
            sheets: SheetsTuning::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// Cache and quota settings for the Google Sheets backend.
pub struct SheetsTuning {
    pub cache_ttl_ms: u64,
    pub min_request_interval_ms: u64,
    pub rate_limit_backoff_ms: u64,
}

impl SheetsTuning {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    pub fn min_request_interval(&self) -> Duration {
        Duration::from_millis(self.min_request_interval_ms)
    }

    pub fn rate_limit_backoff(&self) -> Duration {
        Duration::from_millis(self.rate_limit_backoff_ms)
    }
}

impl Default for SheetsTuning {
    fn default() -> Self {
        // 1.1 s spacing stays below the 60 requests/minute quota.
        Self {
            cache_ttl_ms: 30_000,
            min_request_interval_ms: 1_100,
            rate_limit_backoff_ms: 60_000,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults_for_missing_fields() {
        let config: AppConfig =
            serde_json::from_str(r#"{"pollIntervalMs": 500, "sheets": {"cacheTtlMs": 0}}"#)
                .unwrap();
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.session_code_length, 6);
        assert_eq!(config.sheets.cache_ttl(), Duration::ZERO);
        assert_eq!(config.sheets.min_request_interval_ms, 1_100);
    }

    #[test]
    fn sanitize_rejects_degenerate_values() {
        let config = AppConfig {
            session_code_length: 2,
            max_name_length: 0,
            poll_interval_ms: 0,
            sheets: SheetsTuning::default(),
        }
        .sanitized();
        assert_eq!(config.session_code_length, 6);
        assert_eq!(config.max_name_length, 32);
        assert_eq!(config.poll_interval_ms, 1_000);
    }
}
