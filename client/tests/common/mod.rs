//! In-process mock of the coupon backend's favorites endpoints.
//!
//! Serves the same REST surface and response envelope the real backend
//! uses, backed by an in-memory list, so `HttpFavorites` is exercised
//! over actual HTTP.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Shared state of the mock backend.
#[derive(Clone, Default)]
pub struct Backend {
    favorites: Arc<Mutex<Vec<String>>>,
    add_log: Arc<Mutex<Vec<String>>>,
    auth_headers: Arc<Mutex<Vec<Option<String>>>>,
    fail_adds: Arc<AtomicBool>,
}

impl Backend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
        m.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current server-side favorites.
    pub fn favorites(&self) -> Vec<String> {
        Self::lock(&self.favorites).clone()
    }

    /// Every id POSTed so far, in arrival order.
    pub fn add_log(&self) -> Vec<String> {
        Self::lock(&self.add_log).clone()
    }

    /// Authorization header of each request, in arrival order.
    pub fn auth_headers(&self) -> Vec<Option<String>> {
        Self::lock(&self.auth_headers).clone()
    }

    /// Make every add respond with a non-success envelope.
    pub fn set_fail_adds(&self, fail: bool) {
        self.fail_adds.store(fail, Ordering::SeqCst);
    }

    pub fn seed(&self, ids: &[&str]) {
        *Self::lock(&self.favorites) = ids.iter().map(|s| s.to_string()).collect();
    }

    fn record_auth(&self, headers: &HeaderMap) {
        let value = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        Self::lock(&self.auth_headers).push(value);
    }
}

async fn list_favorites(State(backend): State<Backend>, headers: HeaderMap) -> Json<Value> {
    backend.record_auth(&headers);
    Json(json!({ "success": true, "data": backend.favorites() }))
}

async fn add_favorite(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    backend.record_auth(&headers);

    let Some(id) = body.get("couponId").and_then(|v| v.as_str()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "message": "couponId is required" })),
        );
    };

    Backend::lock(&backend.add_log).push(id.to_string());

    if backend.fail_adds.load(Ordering::SeqCst) {
        return (
            StatusCode::OK,
            Json(json!({ "success": false, "message": "favorites quota exceeded" })),
        );
    }

    let mut favorites = Backend::lock(&backend.favorites);
    if !favorites.iter().any(|existing| existing == id) {
        favorites.push(id.to_string());
    }
    (StatusCode::OK, Json(json!({ "success": true })))
}

async fn remove_favorite(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> (StatusCode, Json<Value>) {
    backend.record_auth(&headers);

    let mut favorites = Backend::lock(&backend.favorites);
    let before = favorites.len();
    favorites.retain(|existing| *existing != id);

    if favorites.len() == before {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "message": "favorite not found" })),
        );
    }
    (StatusCode::OK, Json(json!({ "success": true })))
}

/// Start the mock backend on an ephemeral port, returning its base URL.
pub async fn serve(backend: Backend) -> String {
    let app = Router::new()
        .route("/favorites", get(list_favorites).post(add_favorite))
        .route("/favorites/{id}", delete(remove_favorite))
        .with_state(backend);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock backend");
    let addr = listener.local_addr().expect("mock backend address");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve mock backend");
    });

    format!("http://{addr}")
}
