use std::time::Duration;

use super::error::{SheetsDaoError, SheetsResult};
use crate::config::SheetsTuning;

const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Runtime configuration describing how to reach the spreadsheet.
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    pub service_account_email: String,
    /// PEM encoded PKCS#8 RSA key of the service account.
    pub private_key: String,
    pub api_base: String,
    pub token_url: String,
    /// How long GET responses stay cached.
    pub cache_ttl: Duration,
    /// Minimum spacing between two API calls.
    pub min_request_interval: Duration,
    /// Wait applied after a 429 before retrying.
    pub rate_limit_backoff: Duration,
}

impl SheetsConfig {
    /// Construct a configuration from the spreadsheet id and service account credentials.
    pub fn new(
        spreadsheet_id: impl Into<String>,
        service_account_email: impl Into<String>,
        private_key: impl Into<String>,
    ) -> Self {
        let tuning = SheetsTuning::default();
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            service_account_email: service_account_email.into(),
            private_key: private_key.into().replace("\\n", "\n"),
            api_base: DEFAULT_API_BASE.into(),
            token_url: DEFAULT_TOKEN_URL.into(),
            cache_ttl: tuning.cache_ttl(),
            min_request_interval: tuning.min_request_interval(),
            rate_limit_backoff: tuning.rate_limit_backoff(),
        }
    }

    /// Apply cache and rate-limit settings from the application config.
    pub fn with_tuning(mut self, tuning: &SheetsTuning) -> Self {
        self.cache_ttl = tuning.cache_ttl();
        self.min_request_interval = tuning.min_request_interval();
        self.rate_limit_backoff = tuning.rate_limit_backoff();
        self
    }

    /// Build a configuration by reading the expected environment variables.
    pub fn from_env() -> SheetsResult<Self> {
        let spreadsheet_id =
            std::env::var("GOOGLE_SPREADSHEET_ID").map_err(|_| SheetsDaoError::MissingEnvVar {
                var: "GOOGLE_SPREADSHEET_ID",
            })?;
        let email = std::env::var("GOOGLE_SERVICE_ACCOUNT_EMAIL").map_err(|_| {
            SheetsDaoError::MissingEnvVar {
                var: "GOOGLE_SERVICE_ACCOUNT_EMAIL",
            }
        })?;
        let key =
            std::env::var("GOOGLE_PRIVATE_KEY").map_err(|_| SheetsDaoError::MissingEnvVar {
                var: "GOOGLE_PRIVATE_KEY",
            })?;

        let mut config = Self::new(spreadsheet_id, email, key);
        if let Ok(base) = std::env::var("GOOGLE_SHEETS_API_BASE") {
            config.api_base = base.trim_end_matches('/').to_string();
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escaped_newlines_in_private_key_are_expanded() {
        let config = SheetsConfig::new("id", "svc@example.iam", "-----BEGIN-----\\nabc\\n-----END-----");
        assert_eq!(config.private_key, "-----BEGIN-----\nabc\n-----END-----");
    }
}
