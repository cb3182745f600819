use reqwest::StatusCode;
use thiserror::Error;

/// Convenient result alias returning [`ClientError`] failures.
pub type ClientResult<T> = Result<T, ClientError>;

/// Failures raised while talking to the backend.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Building the HTTP client failed.
    #[error("failed to build API client")]
    Builder {
        #[source]
        source: reqwest::Error,
    },
    /// The request never got an answer.
    #[error("request to `{path}` failed")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// The backend answered with an error status.
    #[error("`{path}` answered {status}: {message}")]
    Status {
        path: String,
        status: StatusCode,
        message: String,
    },
    /// The response body did not match the expected payload.
    #[error("failed to decode response of `{path}`")]
    Decode {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// No session has been loaded yet, so there is no round to tap in.
    #[error("session not loaded")]
    SessionNotLoaded,
}

impl ClientError {
    /// Transport failures and 5xx answers are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Transport { .. } => true,
            ClientError::Status { status, .. } => status.is_server_error(),
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Status { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}
