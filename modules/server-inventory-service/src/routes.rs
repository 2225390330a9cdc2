//! Axum route handlers for the server inventory API.

use crate::dashboard;
use crate::service::{InventoryError, RecordService};
use axum::Router;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post, put};
use server_inventory_client::Controller;
use server_inventory_types::*;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

pub struct AppState {
    pub service: Arc<RecordService>,
    /// Dashboard UI state. One session per process.
    pub controller: Mutex<Controller>,
    pub start_time: Instant,
    pub source: String,
}

type ApiFailure = (StatusCode, Json<MessageResponse>);

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/servers", get(list_servers).post(create_server))
        .route("/api/servers/:id", put(update_server).delete(delete_server))
        .route("/api/import", post(import_yaml))
        .route("/api/export", get(export_yaml))
        .route("/api/status", get(status))
        .merge(dashboard::routes())
        .with_state(state)
}

fn failure(e: InventoryError) -> ApiFailure {
    let (status, message) = match &e {
        InventoryError::NotFound(_) => (StatusCode::NOT_FOUND, "Server not found".to_string()),
        InventoryError::Parse(_) => (StatusCode::BAD_REQUEST, "Error importing YAML".to_string()),
        InventoryError::Write(_) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    (status, Json(MessageResponse::new(message)))
}

/// Non-numeric ids can never match a stored record.
fn parse_id(raw: &str) -> Result<i64, ApiFailure> {
    raw.trim().parse().map_err(|_| {
        (
            StatusCode::NOT_FOUND,
            Json(MessageResponse::new("Server not found")),
        )
    })
}

// GET /api/servers
pub async fn list_servers(State(state): State<Arc<AppState>>) -> Json<Vec<ServerRecord>> {
    Json(state.service.list())
}

// POST /api/servers
pub async fn create_server(
    State(state): State<Arc<AppState>>,
    Json(record): Json<ServerRecord>,
) -> Result<(StatusCode, Json<ServerRecord>), ApiFailure> {
    let created = state.service.create(record).map_err(failure)?;
    Ok((StatusCode::CREATED, Json(created)))
}

// PUT /api/servers/:id
pub async fn update_server(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(patch): Json<ServerPatch>,
) -> Result<Json<ServerRecord>, ApiFailure> {
    let id = parse_id(&id)?;
    let merged = state.service.update(id, patch).map_err(failure)?;
    Ok(Json(merged))
}

// DELETE /api/servers/:id
pub async fn delete_server(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiFailure> {
    let id = parse_id(&id)?;
    state.service.delete(id).map_err(failure)?;
    Ok(Json(MessageResponse::new("Server deleted successfully")))
}

// POST /api/import
pub async fn import_yaml(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ImportRequest>,
) -> Result<Json<MessageResponse>, ApiFailure> {
    state.service.import(&req.yaml_data).map_err(failure)?;
    Ok(Json(MessageResponse::new("YAML imported successfully")))
}

// GET /api/export
pub async fn export_yaml(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    yaml_attachment(state.service.export())
}

pub fn yaml_attachment(yaml: String) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, YAML_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", EXPORT_FILE_NAME),
            ),
        ],
        yaml,
    )
}

// GET /api/status
pub async fn status(State(state): State<Arc<AppState>>) -> Json<ServiceStatus> {
    Json(ServiceStatus {
        running: true,
        uptime_secs: state.start_time.elapsed().as_secs(),
        record_count: state.service.count(),
    })
}
