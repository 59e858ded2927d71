//! Common test utilities
//!
//! Hosts a mock opsdash API on a random local port so the client can be
//! exercised end to end: login, refresh rotation, bearer-gated endpoints,
//! and call counters for every route.

#![allow(dead_code)]

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::collections::HashMap;
use opsdash_client::{ApiClient, LoginCredentials, SessionStore};
use opsdash_core::ApiConfig;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const TEST_PASSWORD: &str = "secret";

/// Mutable token state of the mock API
#[derive(Default)]
struct IssuedTokens {
    generation: usize,
    access: String,
    refresh: String,
}

/// Shared state of the mock API
#[derive(Default)]
pub struct MockApi {
    pub login_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub profile_calls: AtomicUsize,
    pub options_calls: AtomicUsize,
    tokens: Mutex<IssuedTokens>,
    /// Headers seen by the public endpoint: (authorization present, tenant present)
    pub public_headers: Mutex<Option<(bool, bool)>>,
}

impl MockApi {
    fn issue(&self) -> (String, String) {
        let mut tokens = self.tokens.lock().unwrap();
        tokens.generation += 1;
        tokens.access = format!("access-{}", tokens.generation);
        tokens.refresh = format!("refresh-{}", tokens.generation);
        (tokens.access.clone(), tokens.refresh.clone())
    }

    /// Invalidate the access token the client currently holds
    pub fn expire_access(&self) {
        let mut tokens = self.tokens.lock().unwrap();
        tokens.access = format!("rotated-{}", tokens.generation);
    }

    /// Invalidate the refresh token the client currently holds
    pub fn revoke_refresh(&self) {
        let mut tokens = self.tokens.lock().unwrap();
        tokens.refresh = format!("revoked-{}", tokens.generation);
    }

    pub fn current_access(&self) -> String {
        self.tokens.lock().unwrap().access.clone()
    }

    fn bearer_ok(&self, headers: &HeaderMap) -> bool {
        let tokens = self.tokens.lock().unwrap();
        if tokens.access.is_empty() {
            return false;
        }
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(|v| v == format!("Bearer {}", tokens.access))
            .unwrap_or(false)
    }
}

fn unauthorized() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"message": "Unauthorized"})),
    )
}

async fn login(
    State(state): State<Arc<MockApi>>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    state.login_calls.fetch_add(1, Ordering::SeqCst);

    if body["password"] == TEST_PASSWORD {
        let (access, refresh) = state.issue();
        (
            StatusCode::OK,
            Json(json!({"access_token": access, "refresh_token": refresh})),
        )
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Invalid credentials"})),
        )
    }
}

async fn refresh(
    State(state): State<Arc<MockApi>>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);

    let presented = body["refresh_token"].as_str().unwrap_or_default();
    let valid = {
        let tokens = state.tokens.lock().unwrap();
        !tokens.refresh.is_empty() && presented == tokens.refresh
    };

    if valid {
        let (access, refresh) = state.issue();
        (
            StatusCode::OK,
            Json(json!({"access_token": access, "refresh_token": refresh})),
        )
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Invalid refresh token"})),
        )
    }
}

fn profile_json() -> Value {
    json!({
        "id": 1,
        "status": "active",
        "code": "U-001",
        "username": "dora",
        "full_name": "Dora Eze",
        "first_name": "Dora",
        "last_name": "Eze",
        "email": "dora@example.com",
        "phone": "0800000000",
        "superadmin": false,
        "image": null,
        "permission": ["OPTIONS_READ", "OPTIONS_WRITE"],
        "roles": {"id": 2, "name": "Manager"}
    })
}

async fn profile(State(state): State<Arc<MockApi>>, headers: HeaderMap) -> impl IntoResponse {
    state.profile_calls.fetch_add(1, Ordering::SeqCst);

    if state.bearer_ok(&headers) {
        (StatusCode::OK, Json(profile_json()))
    } else {
        unauthorized()
    }
}

async fn list_options(
    State(state): State<Arc<MockApi>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    state.options_calls.fetch_add(1, Ordering::SeqCst);

    if state.bearer_ok(&headers) {
        (
            StatusCode::OK,
            Json(json!([
                {"id": 1, "name": "alpha"},
                {"id": 2, "name": "beta"}
            ])),
        )
    } else {
        unauthorized()
    }
}

async fn get_option(
    State(state): State<Arc<MockApi>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> impl IntoResponse {
    state.options_calls.fetch_add(1, Ordering::SeqCst);

    if state.bearer_ok(&headers) {
        (StatusCode::OK, Json(json!({"id": id, "name": "alpha"})))
    } else {
        unauthorized()
    }
}

async fn create_option(
    State(state): State<Arc<MockApi>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    state.options_calls.fetch_add(1, Ordering::SeqCst);

    if !state.bearer_ok(&headers) {
        return unauthorized();
    }

    let mut record = body.as_object().cloned().unwrap_or_default();
    record.insert("id".to_string(), json!(3));
    (StatusCode::CREATED, Json(Value::Object(record)))
}

async fn update_option(
    State(state): State<Arc<MockApi>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    state.options_calls.fetch_add(1, Ordering::SeqCst);

    if !state.bearer_ok(&headers) {
        return unauthorized();
    }

    let mut record = body.as_object().cloned().unwrap_or_default();
    record.insert("updated".to_string(), json!(true));
    (StatusCode::OK, Json(Value::Object(record)))
}

async fn delete_option(
    State(state): State<Arc<MockApi>>,
    Path(_id): Path<i64>,
    headers: HeaderMap,
) -> impl IntoResponse {
    state.options_calls.fetch_add(1, Ordering::SeqCst);

    if state.bearer_ok(&headers) {
        (StatusCode::OK, Json(json!({"deleted": true})))
    } else {
        unauthorized()
    }
}

async fn public_ping(
    State(state): State<Arc<MockApi>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    *state.public_headers.lock().unwrap() = Some((
        headers.contains_key("authorization"),
        headers.contains_key("x-tenant-id"),
    ));
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

async fn public_echo(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    (StatusCode::OK, Json(json!(params)))
}

async fn broken() -> impl IntoResponse {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"message": "boom"})),
    )
}

/// Test application instance wrapping the mock API
pub struct TestApp {
    pub address: String,
    pub api: Arc<MockApi>,
}

impl TestApp {
    /// Spawn the mock API on a random port
    pub async fn spawn() -> Self {
        let api = Arc::new(MockApi::default());

        let app = Router::new()
            .route("/auth/login", post(login))
            .route("/auth/refresh", post(refresh))
            .route("/auth/profile", get(profile))
            .route("/options", get(list_options).post(create_option).patch(update_option))
            .route("/options/{id}", get(get_option).delete(delete_option))
            .route("/public/ping", get(public_ping))
            .route("/public/echo", get(public_echo))
            .route("/broken", get(broken))
            .with_state(api.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        TestApp {
            address: format!("http://{}", addr),
            api,
        }
    }

    /// Build a client with a fresh in-memory session
    pub fn client(&self) -> ApiClient {
        self.client_with_store(SessionStore::new())
    }

    /// Build a client over an existing session store
    pub fn client_with_store(&self, store: SessionStore) -> ApiClient {
        let config = ApiConfig::new(self.address.clone(), "tester");
        ApiClient::new(config, store).expect("Failed to build API client")
    }

    /// Log the given client in with the test credentials
    pub async fn login(&self, client: &ApiClient) {
        client
            .login(&LoginCredentials {
                username: "dora".to_string(),
                password: TEST_PASSWORD.to_string(),
            })
            .await
            .expect("Login failed");
    }
}
