//! HTTP dispatcher for the opsdash API
//!
//! Builds tenant and bearer headers, serializes payloads, and drives the
//! 401 refresh-and-retry cycle. Query-style methods (GET, DELETE, HEAD)
//! serialize payloads as query parameters; mutating methods send JSON.

pub mod auth;
pub mod options;

pub use auth::ProfileRefresh;
pub use options::{OptionRecord, OptionsApi};
pub use reqwest::Method;

use crate::session::{SessionStorage, SessionStore};
use log::debug;
use opsdash_core::{ApiConfig, ErrorContext, OpsdashConfig, OpsdashError, OpsdashResult};
use reqwest::{header, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Header carrying the tenant identifier on every request
pub const TENANT_HEADER: &str = "x-tenant-id";

/// Per-request options
#[derive(Debug, Clone, Copy)]
pub struct RequestOptions {
    /// Attach a bearer token and refresh on 401 when true
    pub require_auth: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self { require_auth: true }
    }
}

impl RequestOptions {
    /// Options for endpoints that take no authentication
    pub fn public() -> Self {
        Self {
            require_auth: false,
        }
    }

    /// Options for bearer-authenticated endpoints
    pub fn authenticated() -> Self {
        Self { require_auth: true }
    }
}

/// Parsed response payload: JSON when the body parses as JSON, raw text
/// otherwise
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(serde_json::Value),
    Text(String),
}

impl ResponseBody {
    fn from_text(text: String) -> Self {
        match serde_json::from_str(&text) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Text(text),
        }
    }

    /// Deserialize the payload into a typed value
    pub fn decode<T: DeserializeOwned>(self) -> OpsdashResult<T> {
        let value = match self {
            ResponseBody::Json(value) => value,
            ResponseBody::Text(text) => serde_json::Value::String(text),
        };
        Ok(serde_json::from_value(value)?)
    }
}

/// Authenticated HTTP client for the opsdash API
///
/// Cheap to clone; clones share the session, the underlying connection pool,
/// and the refresh gate.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ApiConfig,
    session: SessionStore,
    refresh_gate: Arc<Mutex<()>>,
}

impl ApiClient {
    /// Create a client for the given API configuration and session store
    pub fn new(config: ApiConfig, session: SessionStore) -> OpsdashResult<Self> {
        let http = build_http_client(&config)?;

        debug!("Created API client for {}", config.base_url);

        Ok(Self {
            http,
            config,
            session,
            refresh_gate: Arc::new(Mutex::new(())),
        })
    }

    /// Build a client and session store from a full configuration
    ///
    /// When session persistence is enabled the store is rehydrated from the
    /// configured data directory.
    pub fn from_config(config: &OpsdashConfig) -> OpsdashResult<Self> {
        config.validate()?;

        let session = if config.storage.persist_session {
            SessionStore::with_storage(SessionStorage::new(&config.storage.data_dir)?)
        } else {
            SessionStore::new()
        };

        Self::new(config.api.clone(), session)
    }

    /// The session store this client reads and mutates
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// The API configuration this client was built with
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Dispatch a request under the full auth contract
    ///
    /// Preflight: when auth is required and only a refresh token is present,
    /// a refresh runs before the request; with no token at all the call fails
    /// without touching the network. A 401 response triggers one refresh and
    /// one retry of the identical request.
    pub async fn request<P>(
        &self,
        method: Method,
        path: &str,
        payload: Option<&P>,
        options: RequestOptions,
    ) -> OpsdashResult<ResponseBody>
    where
        P: Serialize + ?Sized,
    {
        let mut bearer: Option<String> = None;

        if options.require_auth {
            let mut token = self.session.access_token();

            if token.is_none() && self.session.refresh_token().is_some() {
                if let Some(pair) = self.refresh_session(None).await? {
                    token = Some(pair.access_token);
                }
            }

            let token = token.ok_or_else(|| OpsdashError::Authentication {
                message: "No access token available".to_string(),
                context: ErrorContext::new("api_client")
                    .with_operation("preflight")
                    .with_suggestion("Log in before calling authenticated endpoints"),
            })?;
            bearer = Some(token);
        }

        let response = self
            .send(method.clone(), path, payload, bearer.as_deref())
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED && options.require_auth {
            debug!("{} {} returned 401, refreshing token", method, path);

            let Some(tokens) = self.refresh_session(bearer.as_deref()).await? else {
                return Err(OpsdashError::Authentication {
                    message: "Authentication failed".to_string(),
                    context: ErrorContext::new("api_client")
                        .with_operation("refresh")
                        .with_suggestion("Log in again"),
                });
            };

            // Exactly one retry, with the refreshed token
            let retry = self
                .send(method, path, payload, Some(&tokens.access_token))
                .await?;

            if retry.status() == StatusCode::UNAUTHORIZED {
                return Err(OpsdashError::Authentication {
                    message: "Request rejected after token refresh".to_string(),
                    context: ErrorContext::new("api_client")
                        .with_operation("retry")
                        .with_suggestion("Log in again"),
                });
            }

            return handle_response(retry).await;
        }

        handle_response(response).await
    }

    /// GET an authenticated endpoint and deserialize the JSON response
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> OpsdashResult<T> {
        self.request(Method::GET, path, None::<&()>, RequestOptions::default())
            .await?
            .decode()
    }

    /// GET with a payload serialized as query parameters
    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> OpsdashResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.request(Method::GET, path, Some(query), RequestOptions::default())
            .await?
            .decode()
    }

    /// POST a JSON body to an authenticated endpoint
    pub async fn post<T, B>(&self, path: &str, body: &B) -> OpsdashResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, path, Some(body), RequestOptions::default())
            .await?
            .decode()
    }

    /// PATCH a JSON body to an authenticated endpoint
    pub async fn patch<T, B>(&self, path: &str, body: &B) -> OpsdashResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PATCH, path, Some(body), RequestOptions::default())
            .await?
            .decode()
    }

    /// DELETE an authenticated endpoint
    pub async fn delete(&self, path: &str) -> OpsdashResult<ResponseBody> {
        self.request(Method::DELETE, path, None::<&()>, RequestOptions::default())
            .await
    }

    /// Perform a single HTTP exchange with no auth handling
    async fn send<P>(
        &self,
        method: Method,
        path: &str,
        payload: Option<&P>,
        bearer: Option<&str>,
    ) -> OpsdashResult<reqwest::Response>
    where
        P: Serialize + ?Sized,
    {
        let url = self.endpoint(path);
        let mut request = self.http.request(method.clone(), &url);

        if let Some(payload) = payload {
            request = if is_query_method(&method) {
                request.query(payload)
            } else {
                // Serializing through reqwest sets Content-Type: application/json
                request.json(payload)
            };
        }

        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        request.send().await.map_err(|e| OpsdashError::Network {
            message: format!("Request to {} failed: {}", url, e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("api_client")
                .with_operation("send")
                .with_suggestion("Check network connectivity and the API base URL"),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Methods whose payload belongs in the query string rather than the body
fn is_query_method(method: &Method) -> bool {
    *method == Method::GET || *method == Method::DELETE || *method == Method::HEAD
}

/// Build the underlying HTTP client with the tenant header installed
fn build_http_client(config: &ApiConfig) -> OpsdashResult<reqwest::Client> {
    let mut headers = header::HeaderMap::new();

    headers.insert(
        header::USER_AGENT,
        header::HeaderValue::from_str(&config.user_agent).map_err(|e| OpsdashError::Config {
            message: format!("Invalid user agent: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("http_client").with_operation("build"),
        })?,
    );

    headers.insert(
        TENANT_HEADER,
        header::HeaderValue::from_str(&config.tenant_id).map_err(|e| OpsdashError::Config {
            message: format!("Invalid tenant identifier: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("http_client")
                .with_operation("build")
                .with_suggestion("Tenant identifiers must be valid header values"),
        })?,
    );

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.timeout_seconds))
        .default_headers(headers)
        .build()
        .map_err(|e| OpsdashError::Network {
            message: format!("Failed to create HTTP client: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("http_client").with_operation("build"),
        })?;

    Ok(client)
}

/// Turn a response into a parsed body or an HTTP error
async fn handle_response(response: reqwest::Response) -> OpsdashResult<ResponseBody> {
    let status = response.status();
    let url = response.url().clone();

    let text = response.text().await.map_err(|e| OpsdashError::Network {
        message: format!("Failed to read response from {}: {}", url, e),
        source: Some(Box::new(e)),
        context: ErrorContext::new("api_client").with_operation("read_body"),
    })?;

    if status.is_success() {
        return Ok(ResponseBody::from_text(text));
    }

    let message = server_message(&text).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    });

    Err(OpsdashError::Http {
        status: status.as_u16(),
        message,
        context: ErrorContext::new("api_client")
            .with_operation("response")
            .with_metadata("url", url.as_str())
            .with_suggestion(match status.as_u16() {
                403 => "Check the account's permissions",
                404 => "Check the endpoint path",
                _ => "Check the API status",
            }),
    })
}

/// Pull a human-readable message out of a JSON error body
fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    for key in ["message", "error", "detail"] {
        if let Some(message) = value.get(key).and_then(|v| v.as_str()) {
            return Some(message.to_string());
        }
    }
    None
}
