// SPDX-License-Identifier: MIT

//! Supabase row-API client.
//!
//! Speaks the PostgREST dialect directly: filters and embedded selects as
//! query parameters, `Prefer` headers for write behavior, and the
//! single-object `Accept` header for `.single()`-style reads. The client is
//! cheap to clone; all clones share one HTTP pool and one bearer slot.

use std::sync::{Arc, RwLock};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::AppError;

/// Media type that makes PostgREST return exactly one object (error
/// `PGRST116` otherwise).
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// Supabase row-API client.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: Option<reqwest::Client>,
    base_url: String,
    api_key: String,
    /// Access token of the signed-in user; requests fall back to the API
    /// key while it is empty.
    bearer: RwLock<Option<String>>,
}

impl Client {
    /// Create a client for the given project URL and API key.
    ///
    /// Pass the anon key for user-context access (row-level security
    /// applies) or the service-role key for trusted server-side work.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                http: Some(reqwest::Client::new()),
                base_url: base_url.into().trim_end_matches('/').to_string(),
                api_key: api_key.into(),
                bearer: RwLock::new(None),
            }),
        }
    }

    /// Create a mock client for testing (offline mode).
    /// All requests fail with a database error.
    pub fn new_mock() -> Self {
        Self {
            inner: Arc::new(ClientInner {
                http: None,
                base_url: "http://localhost:54321".to_string(),
                api_key: "offline".to_string(),
                bearer: RwLock::new(None),
            }),
        }
    }

    /// Install or clear the signed-in user's access token.
    pub fn set_bearer(&self, token: Option<String>) {
        if let Ok(mut slot) = self.inner.bearer.write() {
            *slot = token;
        }
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub(crate) fn api_key(&self) -> &str {
        &self.inner.api_key
    }

    pub(crate) fn bearer(&self) -> String {
        self.inner
            .bearer
            .read()
            .ok()
            .and_then(|slot| slot.clone())
            .unwrap_or_else(|| self.inner.api_key.clone())
    }

    /// Helper to get the HTTP client or return an error if offline.
    pub(crate) fn http(&self) -> Result<&reqwest::Client, AppError> {
        self.inner
            .http
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Start a query against a table or view.
    pub fn from(&self, table: &str) -> Query {
        Query {
            client: self.clone(),
            table: table.to_string(),
            params: Vec::new(),
        }
    }

    /// Call a stored procedure, expecting a JSON array (or scalar) back.
    pub async fn rpc<T: DeserializeOwned>(
        &self,
        function: &str,
        args: serde_json::Value,
    ) -> Result<T, AppError> {
        let response = self
            .rpc_request(function, &args)?
            .send()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        check_response_json(response).await
    }

    /// Call a stored procedure that returns a single row.
    pub async fn rpc_one<T: DeserializeOwned>(
        &self,
        function: &str,
        args: serde_json::Value,
    ) -> Result<T, AppError> {
        let response = self
            .rpc_request(function, &args)?
            .header(reqwest::header::ACCEPT, SINGLE_OBJECT)
            .send()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        check_response_json(response).await
    }

    /// Call a stored procedure with no interesting return value.
    pub async fn rpc_void(&self, function: &str, args: serde_json::Value) -> Result<(), AppError> {
        let response = self
            .rpc_request(function, &args)?
            .send()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        check_response(response).await
    }

    fn rpc_request(
        &self,
        function: &str,
        args: &serde_json::Value,
    ) -> Result<reqwest::RequestBuilder, AppError> {
        let url = format!("{}/rest/v1/rpc/{}", self.inner.base_url, function);
        Ok(self
            .http()?
            .post(url)
            .header("apikey", &self.inner.api_key)
            .bearer_auth(self.bearer())
            .json(args))
    }
}

/// Sort direction for `Query::order`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    fn suffix(self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

/// A single table query under construction.
pub struct Query {
    client: Client,
    table: String,
    params: Vec<(String, String)>,
}

impl Query {
    /// Columns (and embedded resources) to return. Defaults to `*`.
    pub fn select(mut self, columns: &str) -> Self {
        self.params.push(("select".to_string(), columns.to_string()));
        self
    }

    /// Equality filter on a column.
    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.params
            .push((column.to_string(), format!("eq.{}", value.to_string())));
        self
    }

    /// Disjunction filter, e.g. `starts_at.is.null,starts_at.lte.<now>`.
    /// Repeatable; each call adds an independent conjunct.
    pub fn or(mut self, expr: &str) -> Self {
        self.params.push(("or".to_string(), format!("({})", expr)));
        self
    }

    pub fn order(mut self, column: &str, direction: Direction) -> Self {
        self.params.push((
            "order".to_string(),
            format!("{}.{}", column, direction.suffix()),
        ));
        self
    }

    pub fn limit(mut self, count: u32) -> Self {
        self.params.push(("limit".to_string(), count.to_string()));
        self
    }

    /// Fetch all matching rows.
    pub async fn fetch<T: DeserializeOwned>(self) -> Result<Vec<T>, AppError> {
        let response = self
            .request(reqwest::Method::GET)?
            .send()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        check_response_json(response).await
    }

    /// Fetch exactly one row; `AppError::RowNotFound` when the backend
    /// reports its no-matching-row condition.
    pub async fn fetch_one<T: DeserializeOwned>(self) -> Result<T, AppError> {
        let response = self
            .request(reqwest::Method::GET)?
            .header(reqwest::header::ACCEPT, SINGLE_OBJECT)
            .send()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        check_response_json(response).await
    }

    /// Fetch at most one row, with absence as `None` rather than an error.
    pub async fn fetch_optional<T: DeserializeOwned>(self) -> Result<Option<T>, AppError> {
        let mut rows: Vec<T> = self.fetch().await?;
        match rows.len() {
            0 => Ok(None),
            1 => Ok(rows.pop()),
            n => Err(AppError::Database(format!(
                "expected at most one row, got {}",
                n
            ))),
        }
    }

    /// Insert a row and return the created record.
    pub async fn insert<B: Serialize + ?Sized, T: DeserializeOwned>(
        self,
        row: &B,
    ) -> Result<T, AppError> {
        let response = self
            .request(reqwest::Method::POST)?
            .header("Prefer", "return=representation")
            .header(reqwest::header::ACCEPT, SINGLE_OBJECT)
            .json(row)
            .send()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        check_response_json(response).await
    }

    /// Insert a row, discarding the echo.
    pub async fn insert_only<B: Serialize + ?Sized>(self, row: &B) -> Result<(), AppError> {
        let response = self
            .request(reqwest::Method::POST)?
            .header("Prefer", "return=minimal")
            .json(row)
            .send()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        check_response(response).await
    }

    /// Patch the filtered rows and return the updated record.
    pub async fn update<B: Serialize + ?Sized, T: DeserializeOwned>(
        self,
        patch: &B,
    ) -> Result<T, AppError> {
        let response = self
            .request(reqwest::Method::PATCH)?
            .header("Prefer", "return=representation")
            .header(reqwest::header::ACCEPT, SINGLE_OBJECT)
            .json(patch)
            .send()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        check_response_json(response).await
    }

    /// Patch the filtered rows, discarding the echo.
    pub async fn update_only<B: Serialize + ?Sized>(self, patch: &B) -> Result<(), AppError> {
        let response = self
            .request(reqwest::Method::PATCH)?
            .header("Prefer", "return=minimal")
            .json(patch)
            .send()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        check_response(response).await
    }

    /// Delete the filtered rows.
    pub async fn delete(self) -> Result<(), AppError> {
        let response = self
            .request(reqwest::Method::DELETE)?
            .header("Prefer", "return=minimal")
            .send()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        check_response(response).await
    }

    fn request(&self, method: reqwest::Method) -> Result<reqwest::RequestBuilder, AppError> {
        Ok(self
            .client
            .http()?
            .request(method, self.url())
            .header("apikey", self.client.api_key())
            .bearer_auth(self.client.bearer()))
    }

    /// Render the request URL. Filter values are percent-encoded; parameter
    /// names are plain column names and PostgREST keywords.
    fn url(&self) -> String {
        let mut url = format!("{}/rest/v1/{}", self.client.base_url(), self.table);
        if !self.params.is_empty() {
            let query = self
                .params
                .iter()
                .map(|(name, value)| format!("{}={}", name, urlencoding::encode(value)))
                .collect::<Vec<_>>()
                .join("&");
            url.push('?');
            url.push_str(&query);
        }
        url
    }
}

/// Error body shape PostgREST produces.
#[derive(Debug, serde::Deserialize)]
struct PostgrestError {
    code: Option<String>,
    message: Option<String>,
}

/// Map a failed response body to an `AppError`, preserving the backend's
/// error code in the message.
fn parse_rest_error(status: reqwest::StatusCode, body: &str) -> AppError {
    if let Ok(err) = serde_json::from_str::<PostgrestError>(body) {
        if err.code.as_deref() == Some("PGRST116") {
            return AppError::RowNotFound;
        }
        if let (Some(code), Some(message)) = (&err.code, &err.message) {
            return AppError::Database(format!("{}: {}", code, message));
        }
    }
    AppError::Database(format!("HTTP {}: {}", status, body))
}

/// Check response status and return error if not successful.
async fn check_response(response: reqwest::Response) -> Result<(), AppError> {
    if response.status().is_success() {
        return Ok(());
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(parse_rest_error(status, &body))
}

/// Check response and parse JSON body.
async fn check_response_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, AppError> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(parse_rest_error(status, &body));
    }

    response
        .json()
        .await
        .map_err(|e| AppError::Database(format!("JSON parse error: {}", e)))
}
