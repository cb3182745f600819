use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use dashmap::DashMap;
use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Value, from_value, json};
use tokio::{sync::Mutex, time::sleep};
use tracing::{debug, warn};

use crate::dao::{
    models::Sheet,
    sheet_store::{Row, SheetStore},
    storage::StorageResult,
};

use super::{
    auth::TokenSource,
    config::SheetsConfig,
    error::{SheetsDaoError, SheetsResult},
    models::{SpreadsheetMeta, ValueRange, column_letter},
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

#[derive(Clone)]
pub struct GoogleSheetStore {
    client: Client,
    config: Arc<SheetsConfig>,
    tokens: Arc<TokenSource>,
    cache: Arc<DashMap<String, (Instant, Value)>>,
    sheet_ids: Arc<DashMap<Sheet, i64>>,
    last_request: Arc<Mutex<Option<Instant>>>,
}

impl GoogleSheetStore {
    /// Authenticate against Google and make sure every sheet exists with its header row.
    pub async fn connect(config: SheetsConfig) -> SheetsResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| SheetsDaoError::ClientBuilder { source })?;
        let tokens = TokenSource::new(&config)?;

        let store = Self {
            client,
            config: Arc::new(config),
            tokens: Arc::new(tokens),
            cache: Arc::new(DashMap::new()),
            sheet_ids: Arc::new(DashMap::new()),
            last_request: Arc::new(Mutex::new(None)),
        };

        for sheet in Sheet::ALL {
            store.ensure_sheet_exists(sheet).await?;
        }
        Ok(store)
    }

    /// Space consecutive calls so the per-minute quota is never exceeded.
    async fn wait_for_rate_limit(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.config.min_request_interval {
                sleep(self.config.min_request_interval - elapsed).await;
            }
        }
        last.replace(Instant::now());
    }

    fn cached(&self, path: &str) -> Option<Value> {
        let entry = self.cache.get(path)?;
        let (stored_at, value) = entry.value();
        if stored_at.elapsed() < self.config.cache_ttl {
            Some(value.clone())
        } else {
            drop(entry);
            self.cache.remove(path);
            None
        }
    }

    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> SheetsResult<Value> {
        let is_read = method == Method::GET;
        if is_read {
            if let Some(hit) = self.cached(path) {
                return Ok(hit);
            }
        }

        let url = format!("{}/{}{}", self.config.api_base, self.config.spreadsheet_id, path);
        let mut attempt = 0;
        let response = loop {
            self.wait_for_rate_limit().await;
            let token = self.tokens.token(&self.client, &self.config).await?;

            let mut builder = self.client.request(method.clone(), &url).bearer_auth(token);
            if let Some(ref payload) = body {
                builder = builder.json(payload);
            }

            let response = builder
                .send()
                .await
                .map_err(|source| SheetsDaoError::RequestSend {
                    path: path.to_string(),
                    source,
                })?;

            if response.status() != StatusCode::TOO_MANY_REQUESTS {
                break response;
            }
            if attempt >= MAX_RATE_LIMIT_RETRIES {
                return Err(SheetsDaoError::RateLimited {
                    path: path.to_string(),
                });
            }
            attempt += 1;
            warn!(path, attempt, "rate limited by Google Sheets; backing off");
            sleep(self.config.rate_limit_backoff).await;
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SheetsDaoError::RequestStatus {
                path: path.to_string(),
                status,
                body,
            });
        }

        let value = response
            .json::<Value>()
            .await
            .map_err(|source| SheetsDaoError::DecodeResponse {
                path: path.to_string(),
                source,
            })?;

        if is_read {
            self.cache
                .insert(path.to_string(), (Instant::now(), value.clone()));
        } else {
            self.cache.clear();
        }
        Ok(value)
    }

    async fn get_as<T>(&self, path: &str) -> SheetsResult<T>
    where
        T: DeserializeOwned,
    {
        let value = self.send(Method::GET, path, None).await?;
        from_value(value).map_err(|source| SheetsDaoError::DeserializeValue {
            path: path.to_string(),
            source,
        })
    }

    async fn metadata(&self) -> SheetsResult<SpreadsheetMeta> {
        self.get_as("?fields=sheets.properties(sheetId,title)").await
    }

    async fn sheet_id(&self, sheet: Sheet) -> SheetsResult<i64> {
        if let Some(id) = self.sheet_ids.get(&sheet) {
            return Ok(*id);
        }
        let meta = self.metadata().await?;
        for entry in meta.sheets {
            if let Some(known) = Sheet::from_name(&entry.properties.title) {
                self.sheet_ids.insert(known, entry.properties.sheet_id);
            }
        }
        self.sheet_ids
            .get(&sheet)
            .map(|id| *id)
            .ok_or_else(|| SheetsDaoError::MissingSheet {
                sheet: sheet.to_string(),
            })
    }

    async fn ensure_sheet_exists(&self, sheet: Sheet) -> SheetsResult<()> {
        match self.sheet_id(sheet).await {
            Ok(_) => return Ok(()),
            Err(SheetsDaoError::MissingSheet { .. }) => {}
            Err(err) => return Err(err),
        }

        debug!(%sheet, "creating missing sheet");
        self.send(
            Method::POST,
            ":batchUpdate",
            Some(json!({
                "requests": [{ "addSheet": { "properties": { "title": sheet.name() } } }]
            })),
        )
        .await?;

        let headers = sheet.headers();
        let last = column_letter(headers.len() - 1);
        self.send(
            Method::PUT,
            &format!("/values/{sheet}!A1:{last}1?valueInputOption=RAW"),
            Some(json!({ "values": [headers] })),
        )
        .await?;

        self.sheet_ids.remove(&sheet);
        self.sheet_id(sheet).await.map(|_| ())
    }

    async fn values(&self, sheet: Sheet) -> SheetsResult<Vec<Row>> {
        let last = column_letter(sheet.headers().len() - 1);
        let range: ValueRange = self.get_as(&format!("/values/{sheet}!A:{last}")).await?;
        Ok(range.values.into_iter().skip(1).collect())
    }

    async fn append(&self, sheet: Sheet, row: Row) -> SheetsResult<()> {
        let last = column_letter(sheet.headers().len() - 1);
        self.send(
            Method::POST,
            &format!(
                "/values/{sheet}!A:{last}:append?valueInputOption=RAW&insertDataOption=INSERT_ROWS"
            ),
            Some(json!({ "values": [row] })),
        )
        .await
        .map(|_| ())
    }

    async fn update(&self, sheet: Sheet, row: usize, column: usize, value: String) -> SheetsResult<()> {
        // Data row 0 lives on spreadsheet row 2, below the header.
        let cell = format!("{}{}", column_letter(column), row + 2);
        self.send(
            Method::PUT,
            &format!("/values/{sheet}!{cell}?valueInputOption=RAW"),
            Some(json!({ "values": [[value]] })),
        )
        .await
        .map(|_| ())
    }

    async fn delete(&self, sheet: Sheet, mut rows: Vec<usize>) -> SheetsResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        rows.sort_unstable();
        rows.dedup();
        let sheet_id = self.sheet_id(sheet).await?;

        // Requests apply in order; deleting bottom-up keeps earlier indices valid.
        let requests: Vec<Value> = rows
            .iter()
            .rev()
            .map(|row| {
                json!({
                    "deleteDimension": {
                        "range": {
                            "sheetId": sheet_id,
                            "dimension": "ROWS",
                            "startIndex": row + 1,
                            "endIndex": row + 2,
                        }
                    }
                })
            })
            .collect();

        debug!(%sheet, count = rows.len(), "deleting rows");
        self.send(
            Method::POST,
            ":batchUpdate",
            Some(json!({ "requests": requests })),
        )
        .await
        .map(|_| ())
    }
}

impl SheetStore for GoogleSheetStore {
    fn ensure_sheet(&self, sheet: Sheet) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_sheet_exists(sheet).await.map_err(Into::into) })
    }

    fn read_rows(&self, sheet: Sheet) -> BoxFuture<'static, StorageResult<Vec<Row>>> {
        let store = self.clone();
        Box::pin(async move { store.values(sheet).await.map_err(Into::into) })
    }

    fn append_row(&self, sheet: Sheet, row: Row) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.append(sheet, row).await.map_err(Into::into) })
    }

    fn update_cell(
        &self,
        sheet: Sheet,
        row: usize,
        column: usize,
        value: String,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .update(sheet, row, column, value)
                .await
                .map_err(Into::into)
        })
    }

    fn delete_rows(&self, sheet: Sheet, rows: Vec<usize>) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.delete(sheet, rows).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            // Bypass the cache so an outage is noticed.
            store.cache.remove("?fields=sheets.properties(sheetId,title)");
            store.metadata().await.map(|_| ()).map_err(Into::into)
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.cache.clear();
            store.sheet_ids.clear();
            for sheet in Sheet::ALL {
                store.ensure_sheet_exists(sheet).await?;
            }
            Ok(())
        })
    }
}
