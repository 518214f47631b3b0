//! Bearer-authenticated HTTP client for the control-plane API.

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde_json::{Value, json};
use thiserror::Error;

use crate::types::{AppRecord, DbRecord, LoginResponse};

/// Control-plane API client errors.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("login failed: {0}")]
    Login(String),

    #[error("unexpected API response: {0}")]
    Unexpected(String),
}

/// Which relational database family an endpoint group targets.
///
/// The control plane exposes parallel endpoint sets (`/mariauser/`,
/// `/mariadb/` vs `/psqluser/`, `/psqldb/`) with identical shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbKind {
    Maria,
    Psql,
}

impl DbKind {
    pub(crate) const fn user_segment(self) -> &'static str {
        match self {
            Self::Maria => "mariauser",
            Self::Psql => "psqluser",
        }
    }

    pub(crate) const fn db_segment(self) -> &'static str {
        match self {
            Self::Maria => "mariadb",
            Self::Psql => "psqldb",
        }
    }
}

/// Control-plane REST API client.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client using an existing API token.
    pub fn new(host: &str, token: &str) -> Result<Self, ApiError> {
        if host.is_empty() {
            return Err(ApiError::Config("host is empty".into()));
        }
        if token.is_empty() {
            return Err(ApiError::Config("token is empty".into()));
        }

        let mut headers = HeaderMap::new();
        let token_val = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| ApiError::Config("invalid token format".into()))?;
        headers.insert(AUTHORIZATION, token_val);

        // Ensure a TLS crypto provider is installed (reqwest uses rustls-no-provider).
        // The `Err` case just means it was already installed — safe to ignore.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        let base_url = host.trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    /// Create a client by exchanging username/password for a token.
    ///
    /// This is the fallback path used when no `OPAL_TOKEN` is supplied; a
    /// login that yields no token fails the whole run.
    pub async fn login(host: &str, username: &str, password: &str) -> Result<Self, ApiError> {
        if username.is_empty() || password.is_empty() {
            return Err(ApiError::Config("username or password is empty".into()));
        }

        let _ = rustls::crypto::ring::default_provider().install_default();
        let url = format!("{}/api/v1/login/", host.trim_end_matches('/'));
        tracing::debug!("logging in at {url}");

        let resp = reqwest::Client::new()
            .post(&url)
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;
        Self::check_status(&resp)?;

        let login: LoginResponse = resp.json().await?;
        let token = login
            .token
            .ok_or_else(|| ApiError::Login("no token in login response".into()))?;
        Self::new(host, &token)
    }

    /// Build the API v1 URL for a given path.
    pub(crate) fn api_url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    /// Check HTTP response status, returning error for non-success codes.
    fn check_status(resp: &reqwest::Response) -> Result<(), ApiError> {
        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Api {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").into(),
            });
        }
        Ok(())
    }

    /// GET a path and parse the full body as JSON.
    pub async fn get(&self, path: &str) -> Result<Value, ApiError> {
        let url = self.api_url(path);
        tracing::debug!("GET {url}");
        let resp = self.http.get(&url).send().await?;
        Self::check_status(&resp)?;
        Ok(resp.json().await?)
    }

    /// POST a JSON body to a path and parse the full response body as JSON.
    pub async fn post(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        let url = self.api_url(path);
        tracing::debug!("POST {url}");
        let resp = self.http.post(&url).json(body).send().await?;
        Self::check_status(&resp)?;
        Ok(resp.json().await?)
    }

    // =========================================================================
    // Applications
    // =========================================================================

    /// Read one application record by UUID.
    pub async fn app_read(&self, uuid: &str) -> Result<AppRecord, ApiError> {
        let value = self.get(&format!("/app/read/{uuid}")).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Mark an application installed. The body is a one-element array; that
    /// shape is what the endpoint expects, not a batch feature we use.
    pub async fn app_installed(&self, uuid: &str) -> Result<(), ApiError> {
        self.post("/app/installed/", &installed_payload(uuid))
            .await?;
        Ok(())
    }

    /// Post a human-readable dashboard notice for the account owner.
    pub async fn notice_create(&self, content: &str) -> Result<(), ApiError> {
        self.post("/notice/create/", &notice_payload(content))
            .await?;
        Ok(())
    }

    // =========================================================================
    // Databases
    // =========================================================================

    /// Request creation of a database user. The returned record is not
    /// usable until a subsequent list call observes `ready: true`.
    pub async fn dbuser_create(
        &self,
        kind: DbKind,
        name: &str,
        server: &str,
        password: &str,
    ) -> Result<DbRecord, ApiError> {
        let path = format!("/{}/create/", kind.user_segment());
        let value = self
            .post(&path, &dbuser_payload(name, server, password))
            .await?;
        first_record(value)
    }

    /// List database users visible to the account.
    pub async fn dbuser_list(&self, kind: DbKind) -> Result<Vec<DbRecord>, ApiError> {
        let path = format!("/{}/list/", kind.user_segment());
        let value = self.get(&path).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Request creation of a database owned by an existing (ready) user.
    pub async fn db_create(
        &self,
        kind: DbKind,
        name: &str,
        server: &str,
        user_id: &str,
    ) -> Result<DbRecord, ApiError> {
        let path = format!("/{}/create/", kind.db_segment());
        let value = self.post(&path, &db_payload(name, server, user_id)).await?;
        first_record(value)
    }

    /// List databases visible to the account.
    pub async fn db_list(&self, kind: DbKind) -> Result<Vec<DbRecord>, ApiError> {
        let path = format!("/{}/list/", kind.db_segment());
        let value = self.get(&path).await?;
        Ok(serde_json::from_value(value)?)
    }
}

/// Parse a create response (an array of created records) and take the first.
fn first_record(value: Value) -> Result<DbRecord, ApiError> {
    let records: Vec<DbRecord> = serde_json::from_value(value)?;
    records
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::Unexpected("create returned an empty array".into()))
}

// Request body shapes. Create endpoints take one-element JSON arrays; the
// installed/notice endpoints do too, but with different member keys.

pub(crate) fn installed_payload(uuid: &str) -> Value {
    json!([{ "id": uuid }])
}

pub(crate) fn notice_payload(content: &str) -> Value {
    json!([{ "type": "D", "content": content }])
}

pub(crate) fn dbuser_payload(name: &str, server: &str, password: &str) -> Value {
    json!([{ "name": name, "server": server, "password": password }])
}

pub(crate) fn db_payload(name: &str, server: &str, user_id: &str) -> Value {
    json!([{ "name": name, "server": server, "dbusers_readwrite": [user_id] }])
}
