use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::json;

use crate::{
    AllocationError, AllocationOptions, AllocationResult, EngineConfig, PersistenceError,
    Snapshot, compute_allocations, validate_snapshot,
};

#[derive(Clone)]
pub struct AppState {
    snapshot: Arc<RwLock<Snapshot>>,
    config: Arc<EngineConfig>,
}

impl AppState {
    pub fn new(snapshot: Snapshot, config: EngineConfig) -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(snapshot)),
            config: Arc::new(config),
        }
    }

    fn snapshot(&self) -> Arc<RwLock<Snapshot>> {
        self.snapshot.clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    Invalid(String),
    Internal(String),
}

impl From<AllocationError> for ApiError {
    fn from(value: AllocationError) -> Self {
        ApiError::Invalid(value.to_string())
    }
}

impl From<PersistenceError> for ApiError {
    fn from(value: PersistenceError) -> Self {
        match value {
            PersistenceError::InvalidData(_) | PersistenceError::Serialization(_) => {
                ApiError::Invalid(value.to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        tracing::debug!(%status, error, %message, "request failed");
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/snapshot", get(get_snapshot).put(replace_snapshot))
        .route("/allocations", post(allocations))
        .route("/config", get(get_config))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, snapshot: Snapshot, config: EngineConfig) -> std::io::Result<()> {
    let state = AppState::new(snapshot, config);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "capacity forecast API listening");
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn get_snapshot(State(state): State<AppState>) -> Json<Snapshot> {
    let snapshot = state.snapshot();
    let current = snapshot.read().clone();
    Json(current)
}

async fn replace_snapshot(
    State(state): State<AppState>,
    Json(snapshot): Json<Snapshot>,
) -> Result<Json<serde_json::Value>, ApiError> {
    validate_snapshot(&snapshot)?;
    let counts = json!({
        "resources": snapshot.resources.len(),
        "tasks": snapshot.tasks.len(),
        "teams": snapshot.teams.len(),
    });
    *state.snapshot().write() = snapshot;
    Ok(Json(counts))
}

async fn allocations(
    State(state): State<AppState>,
    Json(options): Json<AllocationOptions>,
) -> Result<Json<AllocationResult>, ApiError> {
    // One computation sees exactly one snapshot, even if a PUT lands meanwhile
    let snapshot = state.snapshot().read().clone();
    let result = compute_allocations(&snapshot, &options, &state.config)?;
    Ok(Json(result))
}

async fn get_config(State(state): State<AppState>) -> Json<EngineConfig> {
    Json(state.config.as_ref().clone())
}
