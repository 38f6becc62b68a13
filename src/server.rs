//! HTTP API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Welcome message |
//! | `GET`  | `/health` | Health check (returns version) |
//! | `POST` | `/upload_departments` | Multipart CSV upload (`file` field) |
//! | `POST` | `/upload_jobs` | Multipart CSV upload (`file` field) |
//! | `POST` | `/upload_hired_employees` | Multipart CSV upload (`file` field) |
//! | `POST` | `/create_backup` | `{"table": "..."}` → Parquet unload |
//! | `POST` | `/upload_parquet_backup` | `{"s3_location": "...", "table": "..."}` → restore |
//!
//! Every route except `/` and `/health` is also served under `/api/v1`.
//!
//! # Responses
//!
//! Success: `{"status_code": 200, "table": ..., "locations": [...], "message": ...}`.
//!
//! Failure: HTTP 400 with `{"detail": "<message>"}`, including malformed
//! JSON or multipart bodies. For load failures the detail is the
//! warehouse's own error text.

use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::JsonRejection,
        DefaultBodyLimit, Multipart, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::context::IngestContext;
use crate::error::IngestError;
use crate::models::LoadResult;
use crate::schema::RecordType;

/// Starts the HTTP server on `[server].bind` and runs until the process
/// is terminated.
pub async fn run_server(ctx: Arc<IngestContext>) -> anyhow::Result<()> {
    let bind_addr = ctx.config.server.bind.clone();
    let app = router(ctx);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds the application router.
pub fn router(ctx: Arc<IngestContext>) -> Router {
    let max_upload = ctx.config.server.max_upload_bytes;

    let api = Router::new()
        .route("/upload_departments", post(handle_upload_departments))
        .route("/upload_jobs", post(handle_upload_jobs))
        .route("/upload_hired_employees", post(handle_upload_hired_employees))
        .route("/create_backup", post(handle_create_backup))
        .route("/upload_parquet_backup", post(handle_restore_backup));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .merge(api.clone())
        .nest("/api/v1", api)
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(cors)
        .with_state(ctx)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

struct AppError {
    status: StatusCode,
    detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { detail: self.detail })).into_response()
    }
}

fn bad_request(detail: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        detail: detail.into(),
    }
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        warn!(error = %err, "request failed");
        bad_request(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        warn!(error = %rejection.body_text(), "rejected request body");
        bad_request(rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        warn!(error = %rejection.body_text(), "rejected request body");
        bad_request(rejection.body_text())
    }
}

// ============ GET / and /health ============

#[derive(Serialize)]
struct WelcomeResponse {
    message: String,
}

async fn handle_root() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "Welcome from file-upload 👋🏻🚀".to_string(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /upload_* ============

async fn handle_upload_departments(
    State(ctx): State<Arc<IngestContext>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<LoadResult>, AppError> {
    upload(ctx, RecordType::Departments, multipart).await
}

async fn handle_upload_jobs(
    State(ctx): State<Arc<IngestContext>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<LoadResult>, AppError> {
    upload(ctx, RecordType::Jobs, multipart).await
}

async fn handle_upload_hired_employees(
    State(ctx): State<Arc<IngestContext>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<LoadResult>, AppError> {
    upload(ctx, RecordType::HiredEmployees, multipart).await
}

async fn upload(
    ctx: Arc<IngestContext>,
    record_type: RecordType,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<LoadResult>, AppError> {
    let (filename, contents) = match read_file_field(multipart?).await? {
        Some(file) => file,
        None => (None, Vec::new()),
    };

    let result = ctx
        .ingestor
        .upload(record_type, filename.as_deref(), &contents)
        .await?;
    Ok(Json(result))
}

/// Pull the `file` field out of a multipart body.
async fn read_file_field(
    mut multipart: Multipart,
) -> Result<Option<(Option<String>, Vec<u8>)>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.map_err(|e| bad_request(e.body_text()))?;
        return Ok(Some((filename, bytes.to_vec())));
    }
    Ok(None)
}

// ============ POST /create_backup, /upload_parquet_backup ============

#[derive(Deserialize)]
struct BackupRequest {
    table: String,
}

#[derive(Deserialize)]
struct RestoreRequest {
    s3_location: String,
    table: String,
}

async fn handle_create_backup(
    State(ctx): State<Arc<IngestContext>>,
    req: Result<Json<BackupRequest>, JsonRejection>,
) -> Result<Json<LoadResult>, AppError> {
    let Json(req) = req?;
    let table: RecordType = req.table.parse()?;
    let result = ctx.backups.backup(table).await?;
    Ok(Json(result))
}

async fn handle_restore_backup(
    State(ctx): State<Arc<IngestContext>>,
    req: Result<Json<RestoreRequest>, JsonRejection>,
) -> Result<Json<LoadResult>, AppError> {
    let Json(req) = req?;
    let table: RecordType = req.table.parse()?;
    let result = ctx.backups.restore(&req.s3_location, table).await?;
    Ok(Json(result))
}
