//! Service-account OAuth: sign an RS256 assertion and trade it for a bearer token.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::Client;
use tokio::sync::Mutex;
use tracing::debug;

use super::{
    config::SheetsConfig,
    error::{SheetsDaoError, SheetsResult},
    models::{AssertionClaims, TokenResponse},
};

const SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const ASSERTION_LIFETIME_SECS: u64 = 3600;
/// Tokens are refreshed this long before Google expires them.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

struct CachedToken {
    value: String,
    refresh_at: Instant,
}

/// Access token cache shared by every clone of the store.
pub struct TokenSource {
    key: EncodingKey,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenSource {
    pub fn new(config: &SheetsConfig) -> SheetsResult<Self> {
        let key = EncodingKey::from_rsa_pem(config.private_key.as_bytes())
            .map_err(|source| SheetsDaoError::InvalidPrivateKey { source })?;
        Ok(Self {
            key,
            cached: Mutex::new(None),
        })
    }

    /// Return a valid bearer token, minting a new one when the cached token is stale.
    pub async fn token(&self, client: &Client, config: &SheetsConfig) -> SheetsResult<String> {
        let mut guard = self.cached.lock().await;
        if let Some(cached) = guard.as_ref() {
            if Instant::now() < cached.refresh_at {
                return Ok(cached.value.clone());
            }
        }

        let assertion = self.sign_assertion(config)?;
        let response = client
            .post(&config.token_url)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .map_err(|source| SheetsDaoError::TokenRequest { source })?;

        if !response.status().is_success() {
            return Err(SheetsDaoError::TokenStatus {
                status: response.status(),
            });
        }

        let token = response
            .json::<TokenResponse>()
            .await
            .map_err(|source| SheetsDaoError::TokenRequest { source })?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(EXPIRY_MARGIN);
        debug!(expires_in = token.expires_in, "obtained Google access token");
        guard.replace(CachedToken {
            value: token.access_token.clone(),
            refresh_at: Instant::now() + lifetime,
        });
        Ok(token.access_token)
    }

    fn sign_assertion(&self, config: &SheetsConfig) -> SheetsResult<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let claims = AssertionClaims {
            iss: &config.service_account_email,
            scope: SCOPE,
            aud: &config.token_url,
            exp: now + ASSERTION_LIFETIME_SECS,
            iat: now,
        };
        encode(&Header::new(Algorithm::RS256), &claims, &self.key)
            .map_err(|source| SheetsDaoError::SignAssertion { source })
    }
}
