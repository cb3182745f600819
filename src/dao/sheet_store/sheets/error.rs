//! Error types shared by the Google Sheets storage implementation.

use reqwest::StatusCode;
use thiserror::Error;

/// Convenient result alias returning [`SheetsDaoError`] failures.
pub type SheetsResult<T> = Result<T, SheetsDaoError>;

/// Failures that can occur while interacting with the Sheets API.
#[derive(Debug, Error)]
pub enum SheetsDaoError {
    /// Required environment variable is missing.
    #[error("missing Google Sheets environment variable `{var}`")]
    MissingEnvVar { var: &'static str },
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build Google Sheets client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// The service account private key is not a valid RSA PEM.
    #[error("invalid service account private key")]
    InvalidPrivateKey {
        #[source]
        source: jsonwebtoken::errors::Error,
    },
    /// Signing the OAuth assertion failed.
    #[error("failed to sign OAuth assertion")]
    SignAssertion {
        #[source]
        source: jsonwebtoken::errors::Error,
    },
    /// The token endpoint could not be reached.
    #[error("failed to request access token")]
    TokenRequest {
        #[source]
        source: reqwest::Error,
    },
    /// The token endpoint refused the assertion.
    #[error("token endpoint answered {status}")]
    TokenStatus { status: StatusCode },
    /// A request to the Sheets API could not be sent.
    #[error("failed to send Google Sheets request to `{path}`")]
    RequestSend {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// The Sheets API returned an unexpected status code.
    #[error("unexpected Google Sheets response status {status} for `{path}`: {body}")]
    RequestStatus {
        path: String,
        status: StatusCode,
        body: String,
    },
    /// Response payload could not be parsed into JSON.
    #[error("failed to decode Google Sheets response for `{path}`")]
    DecodeResponse {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// Decoding a JSON value into the expected model failed.
    #[error("failed to deserialize Google Sheets value for `{path}`")]
    DeserializeValue {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    /// The spreadsheet has no tab with the requested title.
    #[error("sheet `{sheet}` missing from spreadsheet")]
    MissingSheet { sheet: String },
    /// Still rate limited after every retry.
    #[error("rate limited by Google Sheets on `{path}`")]
    RateLimited { path: String },
}
