//! HTTP API service.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Health check |
//! | `POST` | `/chat` | Ask a question, optionally scoped to one document |
//!
//! # Error contract
//!
//! Failures return `{ "error": { "code": ..., "message": ... } }` with
//! `bad_request` (400), `not_ready` (503, no index built yet), or
//! `upstream` (500, embedding/index/LLM failure). The process never dies
//! on a failed invocation.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::error::ChatError;
use crate::evidence::refine;
use crate::models::{ChatRequest, ChatResponse, EvidenceSnippet, PageChunk};
use crate::rag::RagEngine;

/// Shared application state. The engine is built once before the listener
/// opens; handlers only ever borrow it.
#[derive(Clone)]
struct AppState {
    data_dir: PathBuf,
    engine: Option<Arc<RagEngine>>,
}

/// Start the API service. The engine is constructed here, up front; when
/// no index exists the server still comes up and answers health checks,
/// while `/chat` reports `not_ready`.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let engine = RagEngine::load(config).await?.map(Arc::new);

    let state = AppState {
        data_dir: config.data.path.clone(),
        engine,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(handle_health))
        .route("/chat", post(handle_chat))
        .layer(cors)
        .with_state(state);

    tracing::info!(bind = %config.server.bind, "API listening");
    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<ChatError> for AppError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::NotReady => AppError {
                status: StatusCode::SERVICE_UNAVAILABLE,
                code: "not_ready",
                message: err.to_string(),
            },
            ChatError::BadInput(_) => AppError {
                status: StatusCode::BAD_REQUEST,
                code: "bad_request",
                message: err.to_string(),
            },
            ChatError::Upstream(_) => AppError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "upstream",
                message: err.to_string(),
            },
        }
    }
}

// ============ GET / ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    message: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        message: format!("medi-insight {} is running", env!("CARGO_PKG_VERSION")),
    })
}

// ============ POST /chat ============

async fn handle_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    if request.query.trim().is_empty() {
        return Err(ChatError::BadInput("query must not be empty".to_string()).into());
    }

    let engine = state.engine.as_ref().ok_or(ChatError::NotReady)?;

    let source_filter = match request.file_name.as_deref() {
        Some(name) => Some(resolve_source(&state.data_dir, name).map_err(AppError::from)?),
        None => None,
    };

    tracing::info!(query = %request.query, file = ?request.file_name, "chat request");

    let result = engine
        .answer(&request.query, source_filter.as_deref())
        .await?;

    let sources = result
        .context
        .iter()
        .map(|chunk| to_snippet(chunk, &request.query))
        .collect();

    Ok(Json(ChatResponse {
        answer: result.answer,
        sources,
    }))
}

/// Map a client-supplied file name to the exact source string the ingestor
/// stored, i.e. `<data_dir>/<file_name>`. Path components are rejected so
/// a caller cannot point the filter outside the corpus.
fn resolve_source(data_dir: &Path, file_name: &str) -> Result<String, ChatError> {
    if file_name.is_empty()
        || file_name.contains('/')
        || file_name.contains('\\')
        || file_name.contains("..")
    {
        return Err(ChatError::BadInput(format!(
            "invalid file name: {}",
            file_name
        )));
    }
    Ok(data_dir.join(file_name).to_string_lossy().to_string())
}

/// Derive the per-request evidence view of a retrieved chunk: basename,
/// one-based page, and the query-refined excerpt.
fn to_snippet(chunk: &PageChunk, query: &str) -> EvidenceSnippet {
    let basename = Path::new(&chunk.source)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| chunk.source.clone());

    EvidenceSnippet {
        source: basename,
        page: chunk.page + 1,
        content: refine(&chunk.text, query),
    }
}
