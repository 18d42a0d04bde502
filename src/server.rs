//! HTTP surface: health check, PDF upload, lesson plan generation.
//!
//! Handlers are thin: they validate presence of input, delegate to the
//! [`TextExtractor`] or [`LessonPlanner`], and serialise the result. Every
//! request runs on its own tokio task, so one request's retry sleep never
//! delays another.

use crate::answers::AnswerSet;
use crate::config::ServerConfig;
use crate::error::PlannerError;
use crate::generate::LessonPlanner;
use crate::output::GenerationResult;
use crate::pipeline::extract::TextExtractor;
use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

/// Banner returned by `GET /`.
pub const HEALTH_MESSAGE: &str = "Lesson Planner Backend is running!";

/// Multipart field carrying the uploaded PDF.
pub const UPLOAD_FIELD: &str = "pdf";

/// Shared, immutable per-process state.
#[derive(Clone)]
pub struct AppState {
    pub planner: Arc<LessonPlanner>,
    pub extractor: Arc<dyn TextExtractor>,
}

impl AppState {
    pub fn new(planner: LessonPlanner, extractor: Arc<dyn TextExtractor>) -> Self {
        Self {
            planner: Arc::new(planner),
            extractor,
        }
    }
}

/// Build the application router with CORS, tracing and a body limit.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/api/upload", post(upload))
        .route("/api/generate", post(generate))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Permissive CORS: any origin, the four verbs the client uses.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Bind and serve until Ctrl-C.
pub async fn serve(config: &ServerConfig, state: AppState) -> Result<(), PlannerError> {
    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| PlannerError::Internal(format!("Failed to bind {addr}: {e}")))?;
    info!("Server running on port {}", config.port);

    axum::serve(listener, router(state, config.max_upload_bytes))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| PlannerError::Internal(format!("Server error: {e}")))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install Ctrl-C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

// ── Handlers ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct MessageBody {
    message: &'static str,
}

async fn health() -> Json<MessageBody> {
    Json(MessageBody {
        message: HEALTH_MESSAGE,
    })
}

/// Successful upload response.
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub text: String,
}

async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, PlannerError> {
    info!("Upload endpoint hit");
    let Ok(mut multipart) = multipart else {
        warn!("Upload request is not multipart");
        return Err(PlannerError::MissingFile);
    };

    let bytes = loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| PlannerError::MalformedUpload {
                detail: e.to_string(),
            })?;
        let Some(field) = field else {
            warn!("No file uploaded");
            return Err(PlannerError::MissingFile);
        };
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        info!("File received: {}", field.file_name().unwrap_or("<unnamed>"));
        break field
            .bytes()
            .await
            .map_err(|e| PlannerError::MalformedUpload {
                detail: e.to_string(),
            })?;
    };
    debug!("File size: {}", bytes.len());

    let text = state.extractor.extract(&bytes).await?;
    Ok(Json(UploadResponse { text }))
}

/// `POST /api/generate` body. Both fields are optional at the type level so
/// their absence can be reported as a 400 rather than a parse failure.
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(rename = "pdfText")]
    pub pdf_text: Option<String>,
    pub answers: Option<AnswerSet>,
}

async fn generate(
    State(state): State<AppState>,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerationResult>, PlannerError> {
    info!("Generate endpoint hit");
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!("Rejected generate body: {}", rejection.body_text());
            return Err(PlannerError::MissingGenerationInput);
        }
    };
    let (Some(pdf_text), Some(answers)) = (request.pdf_text, request.answers) else {
        return Err(PlannerError::MissingGenerationInput);
    };

    let result = state.planner.generate(&pdf_text, &answers).await?;
    Ok(Json(result))
}

// ── Error mapping ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for PlannerError {
    fn into_response(self) -> Response {
        let (status, body) = if self.is_client_error() {
            (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: self.to_string(),
                    details: None,
                },
            )
        } else if self.is_extraction_error() {
            error!("PDF processing error: {}", self);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    error: "Failed to parse PDF".to_string(),
                    details: Some(self.to_string()),
                },
            )
        } else if matches!(self, PlannerError::GenerationFailed { .. }) {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    error: "Failed to generate lesson plan".to_string(),
                    details: Some(self.to_string()),
                },
            )
        } else {
            error!("Request failed: {}", self);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    error: "Internal server error".to_string(),
                    details: Some(self.to_string()),
                },
            )
        };
        (status, Json(body)).into_response()
    }
}
