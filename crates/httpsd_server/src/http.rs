//! HTTP surface: the discovery endpoint and the JSON admin API.
//!
//! `GET /{file}.json` is the wire contract Prometheus's `http_sd_config`
//! depends on. Everything under `/api` is the operator-facing CRUD shell
//! around the entity store.

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use httpsd_db::{DbError, SdDb};
use httpsd_protocol::{display_name, Label, Record, SdError, SdFile, Target};

use crate::discovery::{self, DiscoveryError};

#[derive(Clone)]
pub struct AppState {
    pub db: SdDb,
}

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Build the service router around an opened store.
pub fn router(db: SdDb) -> Router {
    let state = AppState { db };
    Router::new()
        .route("/api/files", get(list_files).post(create_file))
        .route("/api/targets", get(list_targets).post(create_target))
        .route("/api/labels/keys", get(list_label_keys))
        .route("/api/labels/keys/{key}/values", get(list_label_values_for_key))
        .route("/api/records", get(list_records).post(create_record))
        .route(
            "/api/records/{id}",
            get(get_record).put(update_record).delete(delete_record),
        )
        .route("/api/records/{id}/labels", post(assign_record_label))
        .route("/{file}", get(serve_discovery))
        .with_state(state)
}

// ============================================================================
// Discovery endpoint
// ============================================================================

/// `GET /{file}.json` - the discovery document.
///
/// Blank stem -> 422 with empty body. Unknown file or no active records ->
/// `200 []`. Non-`.json` paths fall through to 404.
async fn serve_discovery(State(state): State<AppState>, Path(file): Path<String>) -> Response {
    let Some(stem) = file.strip_suffix(".json") else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match discovery::generate(&state.db, stem).await {
        Ok(body) => (
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        Err(DiscoveryError::UnprocessableInput) => StatusCode::UNPROCESSABLE_ENTITY.into_response(),
        Err(err) => {
            error!(file = stem, %err, "discovery generation failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// ============================================================================
// Files
// ============================================================================

#[derive(Debug, Deserialize)]
struct NewFileRequest {
    file_name: String,
}

async fn list_files(State(state): State<AppState>) -> ApiResult<Json<Vec<SdFile>>> {
    Ok(Json(state.db.file_list_all().await.map_err(db_error)?))
}

async fn create_file(
    State(state): State<AppState>,
    Json(request): Json<NewFileRequest>,
) -> ApiResult<(StatusCode, Json<SdFile>)> {
    let file_name = request.file_name.trim();
    if file_name.is_empty() {
        return Err(bad_request("filename cannot be empty"));
    }
    if file_name.contains('.') {
        return Err(bad_request("filename should be without extension"));
    }
    if state.db.file_exists(file_name).await.map_err(db_error)? {
        return Err(conflict("file with this name already exists"));
    }

    let file = state.db.file_create(file_name).await.map_err(db_error)?;
    info!(file_name = %file.file_name, "file created");
    Ok((StatusCode::CREATED, Json(file)))
}

// ============================================================================
// Targets
// ============================================================================

#[derive(Debug, Deserialize)]
struct NewTargetRequest {
    value: String,
}

async fn list_targets(State(state): State<AppState>) -> ApiResult<Json<Vec<Target>>> {
    Ok(Json(state.db.target_list_all().await.map_err(db_error)?))
}

async fn create_target(
    State(state): State<AppState>,
    Json(request): Json<NewTargetRequest>,
) -> ApiResult<(StatusCode, Json<Target>)> {
    if state
        .db
        .target_exists(&request.value)
        .await
        .map_err(db_error)?
    {
        return Err(conflict("target with this value already exists"));
    }
    let target = state
        .db
        .target_create(&request.value)
        .await
        .map_err(db_error)?;
    Ok((StatusCode::CREATED, Json(target)))
}

// ============================================================================
// Labels
// ============================================================================

async fn list_label_keys(State(state): State<AppState>) -> ApiResult<Json<Vec<String>>> {
    let keys = state.db.label_key_list_all().await.map_err(db_error)?;
    Ok(Json(keys.into_iter().map(|key| key.value).collect()))
}

/// Value narrowing for a chosen key: only values previously paired with it.
/// A UI assist, not a constraint on what may be saved.
async fn list_label_values_for_key(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Json<Vec<String>>> {
    let Some(key) = state
        .db
        .label_key_find_by_value(&key)
        .await
        .map_err(db_error)?
    else {
        return Ok(Json(Vec::new()));
    };
    let values = state
        .db
        .label_values_for_key(&key)
        .await
        .map_err(db_error)?;
    Ok(Json(values.into_iter().map(|value| value.value).collect()))
}

// ============================================================================
// Records
// ============================================================================

#[derive(Debug, Deserialize)]
struct LabelPair {
    key: String,
    value: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RecordPayload {
    name: Option<String>,
    /// Owning file name; `null` leaves the record unbound.
    file: Option<String>,
    active: Option<bool>,
    targets: Vec<String>,
    labels: Vec<LabelPair>,
}

async fn list_records(State(state): State<AppState>) -> ApiResult<Json<Vec<Record>>> {
    Ok(Json(state.db.record_list_all().await.map_err(db_error)?))
}

async fn get_record(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Record>> {
    let record = state
        .db
        .record_find_by_id(id)
        .await
        .map_err(db_error)?
        .ok_or_else(|| not_found(format!("record {id} does not exist")))?;
    Ok(Json(record))
}

async fn create_record(
    State(state): State<AppState>,
    Json(payload): Json<RecordPayload>,
) -> ApiResult<(StatusCode, Json<Record>)> {
    let record = build_record(&state, Record::default(), payload).await?;
    let saved = state.db.record_save(&record).await.map_err(db_error)?;
    info!(name = %saved.name, "record created");
    Ok((StatusCode::CREATED, Json(saved)))
}

async fn update_record(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<RecordPayload>,
) -> ApiResult<Json<Record>> {
    let existing = state
        .db
        .record_find_by_id(id)
        .await
        .map_err(db_error)?
        .ok_or_else(|| not_found(format!("record {id} does not exist")))?;

    let mut base = existing;
    base.targets.clear();
    base.labels.clear();
    let record = build_record(&state, base, payload).await?;
    let saved = state.db.record_save(&record).await.map_err(db_error)?;
    Ok(Json(saved))
}

async fn delete_record(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if state
        .db
        .record_find_by_id(id)
        .await
        .map_err(db_error)?
        .is_none()
    {
        return Err(not_found(format!("record {id} does not exist")));
    }
    state.db.record_delete(id).await.map_err(db_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Resolve one (key, value) pair through the interning tables, commit the
/// label and attach it to the record with replace-by-key semantics.
async fn assign_record_label(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(pair): Json<LabelPair>,
) -> ApiResult<Json<Record>> {
    let mut record = state
        .db
        .record_find_by_id(id)
        .await
        .map_err(db_error)?
        .ok_or_else(|| not_found(format!("record {id} does not exist")))?;

    let label = resolve_label(&state, &pair).await?;
    record.assign_label(label).map_err(domain_error)?;

    let saved = state.db.record_save(&record).await.map_err(db_error)?;
    Ok(Json(saved))
}

/// Apply a payload on top of a base record, resolving targets and labels
/// against the store.
async fn build_record(
    state: &AppState,
    mut record: Record,
    payload: RecordPayload,
) -> ApiResult<Record> {
    if let Some(name) = payload.name {
        record.name = name;
    }
    if let Some(active) = payload.active {
        record.active = active;
    }

    record.file = match payload.file {
        Some(file_name) => Some(
            state
                .db
                .file_find_by_name(&file_name)
                .await
                .map_err(db_error)?
                .ok_or_else(|| bad_request(format!("unknown file: {file_name}")))?,
        ),
        None => None,
    };

    for value in &payload.targets {
        let target = state.db.target_resolve(value).await.map_err(db_error)?;
        // Dedupe while keeping first-mention order.
        if !record.targets.iter().any(|existing| existing.id == target.id) {
            record.targets.push(target);
        }
    }

    for pair in &payload.labels {
        let label = resolve_label(state, pair).await?;
        record.assign_label(label).map_err(domain_error)?;
    }

    // A blank name gets the display-name fallback before saving.
    if record.name.trim().is_empty() {
        record.name = display_name(Some(&record));
    }

    Ok(record)
}

async fn resolve_label(state: &AppState, pair: &LabelPair) -> ApiResult<Label> {
    let key = state
        .db
        .label_key_resolve(&pair.key)
        .await
        .map_err(db_error)?;
    let value = state
        .db
        .label_value_resolve(&pair.value)
        .await
        .map_err(db_error)?;
    let label = state.db.label_resolve(&key, &value).await.map_err(db_error)?;
    state.db.label_commit(&label).await.map_err(db_error)
}

// ============================================================================
// Error mapping
// ============================================================================

fn db_error(err: DbError) -> ApiError {
    match err {
        DbError::InvalidArgument(msg) => bad_request(msg),
        DbError::NotFound(msg) => not_found(msg),
        other => {
            error!(%other, "storage fault");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "internal error".to_string(),
                }),
            )
        }
    }
}

fn domain_error(err: SdError) -> ApiError {
    match err {
        SdError::InvalidArgument(msg) => bad_request(msg),
        SdError::UnprocessableInput(msg) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse { error: msg }),
        ),
    }
}

fn bad_request(msg: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse { error: msg.into() }),
    )
}

fn not_found(msg: impl Into<String>) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse { error: msg.into() }),
    )
}

fn conflict(msg: impl Into<String>) -> ApiError {
    (
        StatusCode::CONFLICT,
        Json(ErrorResponse { error: msg.into() }),
    )
}
