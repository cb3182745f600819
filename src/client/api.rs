use std::{env, sync::Arc, time::Duration};

use futures::{FutureExt, future::BoxFuture};
use reqwest::{Client, Method, Response};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::{
    client::error::{ClientError, ClientResult},
    dto::{
        player::PlayerSummary,
        session::SessionSummary,
        tap::{TapRequest, TapResponse, TapSummary},
        team::TeamSummary,
    },
};

/// Environment variable holding the backend base URL.
pub const API_URL_ENV: &str = "TAPBATTLE_API_URL";
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_RETRIES: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Backend calls the pollers depend on.
pub trait GameApi: Send + Sync {
    /// Fetch a session, `None` when the code is unknown.
    fn session(&self, session_id: &str) -> BoxFuture<'static, ClientResult<Option<SessionSummary>>>;
    /// Taps of one round in arrival order.
    fn tap_order(&self, session_id: &str, round: u32)
    -> BoxFuture<'static, ClientResult<Vec<TapSummary>>>;
    fn add_tap(&self, tap: TapRequest) -> BoxFuture<'static, ClientResult<TapResponse>>;
    fn teams(&self, session_id: &str) -> BoxFuture<'static, ClientResult<Vec<TeamSummary>>>;
    fn players(&self, session_id: &str) -> BoxFuture<'static, ClientResult<Vec<PlayerSummary>>>;
}

/// Normalise a configured base URL: default when unset, `https://` when the scheme is missing.
pub fn resolve_base_url(raw: Option<&str>) -> String {
    let raw = raw.map(str::trim).filter(|value| !value.is_empty());
    let url = match raw {
        Some(value) if value.contains("://") => value.to_string(),
        Some(value) => format!("https://{value}"),
        None => DEFAULT_API_URL.to_string(),
    };
    url.trim_end_matches('/').to_string()
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// [`GameApi`] over HTTP with timeouts and retries.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Arc<str>,
    retry_delay: Duration,
}

impl ApiClient {
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| ClientError::Builder { source })?;
        Ok(Self {
            http,
            base_url: Arc::from(resolve_base_url(Some(base_url))),
            retry_delay: RETRY_DELAY,
        })
    }

    /// Override the pause between two attempts of a failed request.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Client for the URL found in `TAPBATTLE_API_URL`.
    pub fn from_env() -> ClientResult<Self> {
        let configured = env::var(API_URL_ENV).ok();
        Self::new(&resolve_base_url(configured.as_deref()))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send_once<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> ClientResult<Response> {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.http.request(method, &url);
        if let Some(payload) = body {
            builder = builder.json(payload);
        }
        let response = builder.send().await.map_err(|source| ClientError::Transport {
            path: path.to_string(),
            source,
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.message,
            Err(_) => status.canonical_reason().unwrap_or("error").to_string(),
        };
        Err(ClientError::Status {
            path: path.to_string(),
            status,
            message,
        })
    }

    /// Send with retries; also reports how many retries it took.
    async fn send_counted<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> ClientResult<(Response, u32)> {
        let mut attempt = 0;
        loop {
            match self.send_once(method.clone(), path, body).await {
                Ok(response) => return Ok((response, attempt)),
                Err(err) if err.is_retryable() && attempt < MAX_RETRIES => {
                    attempt += 1;
                    warn!(path, attempt, error = %err, "API request failed; retrying");
                    sleep(self.retry_delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn send<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> ClientResult<Response> {
        self.send_counted(method, path, body)
            .await
            .map(|(response, _)| response)
    }

    async fn decode<T: DeserializeOwned>(path: &str, response: Response) -> ClientResult<T> {
        response.json::<T>().await.map_err(|source| ClientError::Decode {
            path: path.to_string(),
            source,
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: String) -> ClientResult<T> {
        debug!(path, "GET");
        let response = self.send::<()>(Method::GET, &path, None).await?;
        Self::decode(&path, response).await
    }
}

impl GameApi for ApiClient {
    fn session(&self, session_id: &str) -> BoxFuture<'static, ClientResult<Option<SessionSummary>>> {
        let this = self.clone();
        let path = format!("/api/session/{session_id}");
        async move {
            match this.get::<SessionSummary>(path).await {
                Ok(session) => Ok(Some(session)),
                Err(err) if err.is_not_found() => Ok(None),
                Err(err) => Err(err),
            }
        }
        .boxed()
    }

    fn tap_order(
        &self,
        session_id: &str,
        round: u32,
    ) -> BoxFuture<'static, ClientResult<Vec<TapSummary>>> {
        let this = self.clone();
        let path = format!("/api/taps/{session_id}/{round}");
        async move { this.get(path).await }.boxed()
    }

    fn add_tap(&self, tap: TapRequest) -> BoxFuture<'static, ClientResult<TapResponse>> {
        let this = self.clone();
        async move {
            let path = "/api/taps";
            let (response, retries) = this.send_counted(Method::POST, path, Some(&tap)).await?;
            let mut recorded: TapResponse = Self::decode(path, response).await?;
            // A failed attempt may still have been stored; the duplicate is then our own tap.
            if retries > 0 && recorded.already_tapped {
                debug!(position = recorded.position, "retried tap was stored by an earlier attempt");
                recorded.already_tapped = false;
            }
            Ok(recorded)
        }
        .boxed()
    }

    fn teams(&self, session_id: &str) -> BoxFuture<'static, ClientResult<Vec<TeamSummary>>> {
        let this = self.clone();
        let path = format!("/api/teams/session/{session_id}");
        async move { this.get(path).await }.boxed()
    }

    fn players(&self, session_id: &str) -> BoxFuture<'static, ClientResult<Vec<PlayerSummary>>> {
        let this = self.clone();
        let path = format!("/api/players/{session_id}");
        async move { this.get(path).await }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{collections::VecDeque, sync::Mutex};

    use axum::{
        Json, Router,
        extract::State,
        http::Uri,
        response::{IntoResponse, Response as Reply},
    };
    use reqwest::StatusCode;
    use serde_json::{Value, json};
    use tokio::net::TcpListener;

    /// Backend double answering each request with the next queued status.
    struct Scripted {
        statuses: Mutex<VecDeque<StatusCode>>,
        hits: Mutex<Vec<String>>,
        body: Value,
    }

    impl Scripted {
        fn hits(&self) -> usize {
            self.hits.lock().unwrap().len()
        }
    }

    async fn answer(State(script): State<Arc<Scripted>>, uri: Uri) -> Reply {
        script.hits.lock().unwrap().push(uri.path().to_string());
        let status = script
            .statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(StatusCode::OK);
        if status.is_success() {
            Json(script.body.clone()).into_response()
        } else {
            let message = format!("scripted {}", status.as_u16());
            (status, Json(json!({ "message": message }))).into_response()
        }
    }

    async fn serve(statuses: &[StatusCode], body: Value) -> (ApiClient, Arc<Scripted>) {
        let script = Arc::new(Scripted {
            statuses: Mutex::new(statuses.iter().copied().collect()),
            hits: Mutex::default(),
            body,
        });
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().fallback(answer).with_state(script.clone());
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let client = ApiClient::new(&format!("http://{addr}"))
            .unwrap()
            .with_retry_delay(Duration::from_millis(5));
        (client, script)
    }

    fn tap_request() -> TapRequest {
        TapRequest {
            session_id: "ABC123".into(),
            player_name: "ann".into(),
            team_name: None,
            round: 1,
        }
    }

    #[tokio::test]
    async fn server_errors_are_retried_until_success() {
        let (client, script) = serve(
            &[StatusCode::SERVICE_UNAVAILABLE, StatusCode::BAD_GATEWAY],
            json!([]),
        )
        .await;
        let order = client.tap_order("ABC123", 1).await.unwrap();
        assert!(order.is_empty());
        assert_eq!(script.hits(), 3);
    }

    #[tokio::test]
    async fn retries_stop_after_three() {
        let (client, script) = serve(&[StatusCode::INTERNAL_SERVER_ERROR; 5], json!([])).await;
        let err = client.tap_order("ABC123", 1).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Status { status, .. } if status == StatusCode::INTERNAL_SERVER_ERROR
        ));
        assert_eq!(script.hits(), 4);
    }

    #[tokio::test]
    async fn client_errors_fail_at_once_with_server_message() {
        let (client, script) = serve(&[StatusCode::CONFLICT], json!([])).await;
        match client.tap_order("ABC123", 1).await.unwrap_err() {
            ClientError::Status {
                status, message, ..
            } => {
                assert_eq!(status, StatusCode::CONFLICT);
                assert_eq!(message, "scripted 409");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(script.hits(), 1);
    }

    #[tokio::test]
    async fn unknown_session_is_none() {
        let (client, script) = serve(&[StatusCode::NOT_FOUND], json!({})).await;
        assert!(client.session("NOPE42").await.unwrap().is_none());
        assert_eq!(script.hits(), 1);
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = ApiClient::new(&format!("http://{addr}"))
            .unwrap()
            .with_retry_delay(Duration::from_millis(5));
        assert!(matches!(
            client.tap_order("ABC123", 1).await,
            Err(ClientError::Transport { .. })
        ));
    }

    #[tokio::test]
    async fn retried_tap_found_stored_counts_as_recorded() {
        let stored = json!({
            "tap": {
                "tapId": "t1",
                "sessionId": "ABC123",
                "playerName": "ann",
                "round": 1,
                "timestamp": 10,
                "time": "12:00:00"
            },
            "position": 1,
            "alreadyTapped": true
        });

        let (client, script) = serve(&[StatusCode::GATEWAY_TIMEOUT], stored.clone()).await;
        let response = client.add_tap(tap_request()).await.unwrap();
        assert!(!response.already_tapped);
        assert_eq!(response.position, 1);
        assert_eq!(script.hits(), 2);

        let (client, _) = serve(&[], stored).await;
        assert!(client.add_tap(tap_request()).await.unwrap().already_tapped);
    }

    #[test]
    fn base_url_gets_default_and_scheme() {
        assert_eq!(resolve_base_url(None), DEFAULT_API_URL);
        assert_eq!(resolve_base_url(Some("  ")), DEFAULT_API_URL);
        assert_eq!(
            resolve_base_url(Some("tapbattle.example.org/")),
            "https://tapbattle.example.org"
        );
        assert_eq!(
            resolve_base_url(Some("http://127.0.0.1:3000")),
            "http://127.0.0.1:3000"
        );
    }

    #[test]
    fn only_transport_and_server_errors_retry() {
        let status = |status| ClientError::Status {
            path: "/x".into(),
            status,
            message: String::new(),
        };
        assert!(status(StatusCode::BAD_GATEWAY).is_retryable());
        assert!(!status(StatusCode::CONFLICT).is_retryable());
        assert!(status(StatusCode::NOT_FOUND).is_not_found());
    }
}
