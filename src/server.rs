//! HTTP API server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`    | `/api/snippets/` | List snippets (`?tag=`, `?search=`) |
//! | `POST`   | `/api/snippets/` | Create a snippet; tag assigned automatically |
//! | `GET`    | `/api/snippets/{id}/` | Retrieve one snippet |
//! | `PUT`    | `/api/snippets/{id}/` | Replace content; snippet is re-tagged |
//! | `DELETE` | `/api/snippets/{id}/` | Delete a snippet |
//! | `GET`    | `/health` | Health check (returns version) |
//!
//! Every snippet route also answers without the trailing slash.
//!
//! # Error Contract
//!
//! Content validation failures list messages per field:
//!
//! ```json
//! { "errors": { "content": ["Content cannot be empty."] } }
//! ```
//!
//! Everything else carries a single message:
//!
//! ```json
//! { "error": "No snippet found with id 42." }
//! ```
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so a browser frontend
//! served from another origin can call the API.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::Config;
use crate::db;
use crate::migrate::run_migrations;
use crate::models::{validate_content, Snippet, Tag};
use crate::store::{SnippetFilter, SnippetStore, SqliteStore};
use crate::tagger::Tagger;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SnippetStore>,
    pub tagger: Arc<Tagger>,
    /// Maximum accepted `content` length, in characters.
    pub max_content_length: usize,
}

/// Build the API router over the given state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/snippets/", get(list_snippets).post(create_snippet))
        .route("/api/snippets", get(list_snippets).post(create_snippet))
        .route(
            "/api/snippets/{id}/",
            get(get_snippet).put(update_snippet).delete(delete_snippet),
        )
        .route(
            "/api/snippets/{id}",
            get(get_snippet).put(update_snippet).delete(delete_snippet),
        )
        .route("/health", get(handle_health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Starts the HTTP server.
///
/// Connects to the database, applies migrations, builds the tagger from
/// `[classifier]` and `[keywords]`, and binds to `[server].bind`. Runs until
/// Ctrl-C.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pool = db::connect(config).await?;
    run_migrations(&pool).await?;

    let tagger = Tagger::from_config(config)?;
    let state = AppState {
        store: Arc::new(SqliteStore::new(pool)),
        tagger: Arc::new(tagger),
        max_content_length: config.snippets.max_content_length,
    };

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!(
        bind = %config.server.bind,
        classifier = %config.classifier.provider,
        "snippet API listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
    }
}

// ============ Error response ============

/// Error type that converts into an Axum HTTP response.
#[derive(Debug)]
pub enum ApiError {
    /// 400 with `{"errors": {field: [message]}}`.
    Validation { field: &'static str, message: String },
    /// 400 with `{"error": message}`.
    BadRequest(String),
    /// 404 with `{"error": message}`.
    NotFound(String),
    /// 500; details are logged, not returned.
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation { field, message } => {
                let mut errors = BTreeMap::new();
                errors.insert(field, vec![message]);
                (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({ "errors": errors })),
                )
                    .into_response()
            }
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": message })),
            )
                .into_response(),
            ApiError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({ "error": message })),
            )
                .into_response(),
            ApiError::Internal(err) => {
                error!(error = %err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({ "error": "Internal server error." })),
                )
                    .into_response()
            }
        }
    }
}

fn snippet_not_found(id: impl std::fmt::Display) -> ApiError {
    ApiError::NotFound(format!("No snippet found with id {}.", id))
}

/// Parse a path id. Anything that is not an integer cannot name a row, so
/// it is reported as not found.
fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse().map_err(|_| snippet_not_found(raw))
}

/// Pull a validated `content` value out of a request body.
fn content_from_body(
    payload: Result<Json<serde_json::Value>, JsonRejection>,
    max_len: usize,
) -> Result<String, ApiError> {
    let Json(body) = payload.map_err(|rejection| ApiError::Validation {
        field: "body",
        message: rejection.body_text(),
    })?;

    if !body.is_object() {
        return Err(ApiError::Validation {
            field: "non_field_errors",
            message: "Invalid data. Expected a JSON object.".to_string(),
        });
    }

    validate_content(body.get("content"), max_len).map_err(|e| ApiError::Validation {
        field: "content",
        message: e.to_string(),
    })
}

// ============ Response bodies ============

#[derive(Serialize)]
struct ListResponse {
    count: usize,
    results: Vec<Snippet>,
}

#[derive(Serialize)]
struct DataResponse {
    message: &'static str,
    data: Snippet,
}

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

// ============ Handlers ============

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Debug, Default)]
struct ListParams {
    tag: Option<String>,
    search: Option<String>,
}

impl ListParams {
    /// A repeated parameter takes its last value; unknown keys are ignored.
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "tag" => params.tag = Some(value),
                "search" => params.search = Some(value),
                _ => {}
            }
        }
        params
    }
}

/// `GET /api/snippets/`. Empty `tag` or `search` values are ignored.
async fn list_snippets(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<ListResponse>, ApiError> {
    let Query(pairs) = query.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let params = ListParams::from_pairs(pairs);

    let tag = match params.tag.as_deref().filter(|t| !t.is_empty()) {
        Some(raw) => Some(
            raw.parse::<Tag>()
                .map_err(|e| ApiError::BadRequest(e.to_string()))?,
        ),
        None => None,
    };

    let filter = SnippetFilter {
        tag,
        search: params.search.filter(|s| !s.is_empty()),
    };

    let results = state.store.list(&filter).await?;
    Ok(Json(ListResponse {
        count: results.len(),
        results,
    }))
}

/// `POST /api/snippets/`.
async fn create_snippet(
    State(state): State<AppState>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<(StatusCode, Json<DataResponse>), ApiError> {
    let content = content_from_body(payload, state.max_content_length)?;

    let tag = state.tagger.tag(&content).await;
    let snippet = state.store.insert(&content, tag).await?;
    info!(id = snippet.id, %tag, "snippet created");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            message: "Snippet uploaded and tagged successfully.",
            data: snippet,
        }),
    ))
}

/// `GET /api/snippets/{id}/`.
async fn get_snippet(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Snippet>, ApiError> {
    let id = parse_id(&raw_id)?;
    let snippet = state
        .store
        .get(id)
        .await?
        .ok_or_else(|| snippet_not_found(id))?;
    Ok(Json(snippet))
}

/// `PUT /api/snippets/{id}/`. The id is checked before the body is validated.
async fn update_snippet(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<DataResponse>, ApiError> {
    let id = parse_id(&raw_id)?;
    if state.store.get(id).await?.is_none() {
        return Err(snippet_not_found(id));
    }

    let content = content_from_body(payload, state.max_content_length)?;
    let tag = state.tagger.tag(&content).await;

    // The row may have been deleted while the tagger was running.
    let snippet = state
        .store
        .update(id, &content, tag)
        .await?
        .ok_or_else(|| snippet_not_found(id))?;
    info!(id, %tag, "snippet updated");

    Ok(Json(DataResponse {
        message: "Snippet updated and re-tagged successfully.",
        data: snippet,
    }))
}

/// `DELETE /api/snippets/{id}/`.
async fn delete_snippet(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&raw_id)?;
    if !state.store.delete(id).await? {
        return Err(snippet_not_found(id));
    }
    info!(id, "snippet deleted");

    Ok(Json(MessageResponse {
        message: format!("Snippet #{} deleted successfully.", id),
    }))
}
