//! Store behaviour against a local stand-in for the Google token and Sheets endpoints.

use std::{
    net::SocketAddr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU32, Ordering},
    },
    time::{Duration, Instant},
};

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use tokio::{net::TcpListener, time::sleep};

use super::{GoogleSheetStore, SheetsConfig};
use crate::dao::{models::Sheet, sheet_store::SheetStore};

const SERVICE_ACCOUNT_KEY: &str =
    include_str!("../../../../tests/fixtures/service-account-key.pem");
const SHEET_ID_BASE: i64 = 100;

#[derive(Debug, Clone)]
struct Call {
    method: Method,
    path: String,
    body: Value,
}

#[derive(Default)]
struct FakeSheets {
    calls: Mutex<Vec<Call>>,
    /// Upcoming API calls answered with 429.
    throttled: AtomicU32,
    rows: Mutex<Vec<Vec<String>>>,
    /// Titles left out of the metadata until an `addSheet` request creates them.
    absent: Mutex<Vec<String>>,
}

impl FakeSheets {
    fn reset(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn count(&self, method: Method, fragment: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.method == method && call.path.contains(fragment))
            .count()
    }

    fn last(&self, method: Method, fragment: &str) -> Option<Call> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|call| call.method == method && call.path.contains(fragment))
            .cloned()
    }
}

async fn answer(
    State(fake): State<Arc<FakeSheets>>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    let path = uri
        .path_and_query()
        .map(|target| target.as_str().to_string())
        .unwrap_or_default();
    let body = serde_json::from_slice(&body).unwrap_or(Value::Null);
    fake.calls.lock().unwrap().push(Call {
        method: method.clone(),
        path: path.clone(),
        body: body.clone(),
    });

    if path == "/token" {
        return Json(json!({ "access_token": "test-token", "expires_in": 3600 })).into_response();
    }
    if fake
        .throttled
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
        .is_ok()
    {
        return StatusCode::TOO_MANY_REQUESTS.into_response();
    }
    if method == Method::POST && path.ends_with(":batchUpdate") {
        let added = body["requests"][0]["addSheet"]["properties"]["title"].as_str();
        if let Some(title) = added {
            fake.absent.lock().unwrap().retain(|absent| absent != title);
        }
    }
    if method == Method::GET && path.contains("?fields=") {
        let absent = fake.absent.lock().unwrap().clone();
        let sheets: Vec<Value> = Sheet::ALL
            .iter()
            .zip(SHEET_ID_BASE..)
            .filter(|(sheet, _)| !absent.iter().any(|title| title == sheet.name()))
            .map(|(sheet, id)| json!({ "properties": { "sheetId": id, "title": sheet.name() } }))
            .collect();
        return Json(json!({ "sheets": sheets })).into_response();
    }
    if method == Method::GET {
        let rows = fake.rows.lock().unwrap().clone();
        return Json(json!({ "values": rows })).into_response();
    }
    Json(json!({})).into_response()
}

async fn start(fake: Arc<FakeSheets>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().fallback(answer).with_state(fake);
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    addr
}

fn config(addr: SocketAddr) -> SheetsConfig {
    let mut config = SheetsConfig::new("sheet123", "svc@tapbattle.iam", SERVICE_ACCOUNT_KEY);
    config.api_base = format!("http://{addr}/v4/spreadsheets");
    config.token_url = format!("http://{addr}/token");
    config.cache_ttl = Duration::from_millis(300);
    config.min_request_interval = Duration::ZERO;
    config.rate_limit_backoff = Duration::from_millis(5);
    config
}

async fn connected(tune: impl FnOnce(&mut SheetsConfig)) -> (GoogleSheetStore, Arc<FakeSheets>) {
    let fake = Arc::new(FakeSheets::default());
    let addr = start(fake.clone()).await;
    let mut config = config(addr);
    tune(&mut config);
    let store = GoogleSheetStore::connect(config).await.unwrap();
    fake.reset();
    (store, fake)
}

#[tokio::test]
async fn connect_finds_existing_sheets_with_one_token() {
    let fake = Arc::new(FakeSheets::default());
    let addr = start(fake.clone()).await;
    GoogleSheetStore::connect(config(addr)).await.unwrap();

    assert_eq!(fake.count(Method::POST, "/token"), 1);
    assert_eq!(fake.count(Method::GET, "?fields="), 1);
    assert_eq!(fake.count(Method::POST, ":batchUpdate"), 0);
}

#[tokio::test]
async fn reads_are_cached_until_expiry_or_write() {
    let (store, fake) = connected(|_| {}).await;
    fake.rows.lock().unwrap().extend([
        vec!["username".into(), "password".into(), "createdAt".into()],
        vec!["ann".into(), "pw".into(), "2024-01-01T00:00:00Z".into()],
    ]);

    let rows = store.read_rows(Sheet::Hosts).await.unwrap();
    assert_eq!(rows, vec![vec!["ann", "pw", "2024-01-01T00:00:00Z"]]);
    store.read_rows(Sheet::Hosts).await.unwrap();
    assert_eq!(fake.count(Method::GET, "/values/Hosts"), 1);

    store
        .append_row(Sheet::Hosts, vec!["bob".into(), "pw".into(), "x".into()])
        .await
        .unwrap();
    store.read_rows(Sheet::Hosts).await.unwrap();
    assert_eq!(fake.count(Method::GET, "/values/Hosts"), 2);

    sleep(Duration::from_millis(400)).await;
    store.read_rows(Sheet::Hosts).await.unwrap();
    assert_eq!(fake.count(Method::GET, "/values/Hosts"), 3);
}

#[tokio::test]
async fn calls_are_spaced_by_the_minimum_interval() {
    let interval = Duration::from_millis(80);
    let (store, fake) = connected(|config| config.min_request_interval = interval).await;

    let started = Instant::now();
    for sheet in [Sheet::Hosts, Sheet::Sessions, Sheet::Teams] {
        store.read_rows(sheet).await.unwrap();
    }
    assert!(started.elapsed() >= interval * 2);
    assert_eq!(fake.count(Method::GET, "/values/"), 3);
}

#[tokio::test]
async fn rate_limits_back_off_then_give_up() {
    let (store, fake) = connected(|_| {}).await;

    fake.throttled.store(2, Ordering::SeqCst);
    store.read_rows(Sheet::Hosts).await.unwrap();
    assert_eq!(fake.count(Method::GET, "/values/Hosts"), 3);

    // One attempt plus three retries, then the error surfaces.
    fake.throttled.store(10, Ordering::SeqCst);
    assert!(store.read_rows(Sheet::Sessions).await.is_err());
    assert_eq!(fake.count(Method::GET, "/values/Sessions"), 4);
}

#[tokio::test]
async fn rows_are_deleted_bottom_up_in_one_batch() {
    let (store, fake) = connected(|_| {}).await;

    store
        .delete_rows(Sheet::Players, vec![1, 4, 2, 4])
        .await
        .unwrap();

    assert_eq!(fake.count(Method::POST, ":batchUpdate"), 1);
    let batch = fake.last(Method::POST, ":batchUpdate").unwrap();
    let players_id = SHEET_ID_BASE + 3;
    let ranges: Vec<(i64, i64)> = batch.body["requests"]
        .as_array()
        .unwrap()
        .iter()
        .map(|request| {
            let range = &request["deleteDimension"]["range"];
            assert_eq!(range["sheetId"], players_id);
            assert_eq!(range["dimension"], "ROWS");
            (
                range["startIndex"].as_i64().unwrap(),
                range["endIndex"].as_i64().unwrap(),
            )
        })
        .collect();
    assert_eq!(ranges, [(5, 6), (3, 4), (2, 3)]);
}

#[tokio::test]
async fn missing_sheets_are_created_with_headers() {
    let fake = Arc::new(FakeSheets::default());
    fake.absent
        .lock()
        .unwrap()
        .push(Sheet::TapOrder.name().to_string());
    let addr = start(fake.clone()).await;
    GoogleSheetStore::connect(config(addr)).await.unwrap();

    assert_eq!(fake.count(Method::POST, ":batchUpdate"), 1);
    let added = fake.last(Method::POST, ":batchUpdate").unwrap();
    assert_eq!(
        added.body["requests"][0]["addSheet"]["properties"]["title"],
        Sheet::TapOrder.name()
    );

    let header = fake.last(Method::PUT, "A1:").unwrap();
    assert!(header.path.contains(&format!("/values/{}!A1:", Sheet::TapOrder.name())));
    assert_eq!(header.body["values"][0], json!(Sheet::TapOrder.headers()));
    assert!(fake.absent.lock().unwrap().is_empty());
}
