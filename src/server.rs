//! HTTP API surface.
//!
//! A small axum router over the same driver the CLI uses: one endpoint for
//! URL sources, one for multipart file uploads, plus health and
//! service-info routes. Each HTTP request maps to exactly one
//! [`ConversionRequest`] through [`crate::driver::convert_one`] — batch
//! concurrency is the CLI's concern; the server relies on axum's own
//! request-level parallelism.
//!
//! Status mapping: conversion failure → 422 with a JSON error body,
//! malformed request → 400, unsupported upload extension → 415.

use crate::backend::{is_url, DocumentConverter};
use crate::config::{ConvertOptions, ExportFormat};
use crate::driver::{convert_bytes, convert_one};
use crate::request::ConversionRequest;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Upload size cap: parsing backends choke on multi-hundred-MB inputs long
/// before this limit matters.
const MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// Input file extensions the backend understands.
const SUPPORTED_EXTENSIONS: &[&str] = &[
    "pdf", "docx", "pptx", "html", "htm", "md", "png", "jpg", "jpeg", "tiff", "tif",
];

/// Shared state: the conversion backend.
#[derive(Clone)]
pub struct AppState {
    pub converter: Arc<dyn DocumentConverter>,
}

/// Build the API router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/formats", get(formats_handler))
        .route("/convert/source", post(convert_source_handler))
        .route("/convert/upload", post(convert_upload_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}

// ── Response types ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    pub success: bool,
    pub source: String,
    pub format: ExportFormat,
    pub content: String,
    pub duration_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

// ── Handlers ─────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct RootResponse {
    service: &'static str,
    version: &'static str,
    endpoints: &'static [&'static str],
}

async fn root_handler() -> impl IntoResponse {
    Json(RootResponse {
        service: "doc2any",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: &["/health", "/formats", "/convert/source", "/convert/upload"],
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
        }),
    )
}

#[derive(Serialize)]
struct FormatsResponse {
    input_extensions: Vec<&'static str>,
    output_formats: Vec<String>,
}

async fn formats_handler() -> impl IntoResponse {
    Json(FormatsResponse {
        input_extensions: SUPPORTED_EXTENSIONS.to_vec(),
        output_formats: ExportFormat::all().iter().map(|f| f.to_string()).collect(),
    })
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct ConvertSourceRequest {
    pub url: String,
    #[serde(default)]
    pub format: ExportFormat,
    #[serde(default)]
    pub enable_ocr: bool,
    #[serde(default = "default_true")]
    pub enable_table_structure: bool,
}

/// Convert a document fetched from a URL.
#[tracing::instrument(skip(state, body), fields(url = %body.url))]
async fn convert_source_handler(
    State(state): State<AppState>,
    Json(body): Json<ConvertSourceRequest>,
) -> Response {
    if !is_url(&body.url) {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("Not an HTTP/HTTPS URL: '{}'", body.url),
        );
    }

    let options = ConvertOptions {
        ocr_enabled: body.enable_ocr,
        table_structure_enabled: body.enable_table_structure,
    };
    let request = ConversionRequest::new(body.url, body.format).with_options(options);

    let outcome = convert_one(&state.converter, &request, None).await;
    outcome_response(outcome, body.format)
}

/// Convert an uploaded document.
///
/// Multipart fields: `file` (required), `format`, `enable_ocr`,
/// `enable_table_structure` — the same knobs the URL endpoint takes as
/// JSON.
#[tracing::instrument(skip(state, multipart))]
async fn convert_upload_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Response {
    let mut filename: Option<String> = None;
    let mut data: Option<Vec<u8>> = None;
    let mut format = ExportFormat::default();
    let mut options = ConvertOptions::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(f)) => f,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read multipart body");
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Failed to read multipart body: {e}"),
                );
            }
        };

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                filename = Some(
                    field
                        .file_name()
                        .unwrap_or("document")
                        .to_string(),
                );
                match field.bytes().await {
                    Ok(bytes) => data = Some(bytes.to_vec()),
                    Err(e) => {
                        return error_response(
                            StatusCode::BAD_REQUEST,
                            format!("Failed to read file field: {e}"),
                        )
                    }
                }
            }
            "format" => match read_text_field(field).await {
                Ok(text) => match text.parse::<ExportFormat>() {
                    Ok(f) => format = f,
                    Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
                },
                Err(resp) => return resp,
            },
            "enable_ocr" => match read_bool_field(field).await {
                Ok(v) => options.ocr_enabled = v,
                Err(resp) => return resp,
            },
            "enable_table_structure" => match read_bool_field(field).await {
                Ok(v) => options.table_structure_enabled = v,
                Err(resp) => return resp,
            },
            other => {
                tracing::debug!(field = %other, "Ignoring unknown multipart field");
            }
        }
    }

    let (filename, data) = match (filename, data) {
        (Some(f), Some(d)) => (f, d),
        _ => return error_response(StatusCode::BAD_REQUEST, "No file uploaded"),
    };

    let extension = Path::new(&filename)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        return error_response(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            format!(
                "Unsupported file extension '{extension}'. Supported: {}",
                SUPPORTED_EXTENSIONS.join(", ")
            ),
        );
    }

    tracing::debug!(filename = %filename, bytes = data.len(), "Processing file upload");

    let request = ConversionRequest::new(filename.clone(), format).with_options(options);
    match convert_bytes(&state.converter, &data, &filename, request, None).await {
        Ok(outcome) => outcome_response(outcome, format),
        Err(e) => {
            tracing::error!(error = %e, "Failed to stage uploaded file");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

async fn read_text_field(field: axum::extract::multipart::Field<'_>) -> Result<String, Response> {
    field.text().await.map_err(|e| {
        error_response(
            StatusCode::BAD_REQUEST,
            format!("Failed to read form field: {e}"),
        )
    })
}

async fn read_bool_field(field: axum::extract::multipart::Field<'_>) -> Result<bool, Response> {
    let text = read_text_field(field).await?;
    match text.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        other => Err(error_response(
            StatusCode::BAD_REQUEST,
            format!("Expected a boolean, got '{other}'"),
        )),
    }
}

fn outcome_response(outcome: crate::report::ConversionOutcome, format: ExportFormat) -> Response {
    if outcome.is_success() {
        (
            StatusCode::OK,
            Json(ConvertResponse {
                success: true,
                source: outcome.source,
                format,
                content: outcome.content.unwrap_or_default(),
                duration_ms: outcome.duration_ms,
            }),
        )
            .into_response()
    } else {
        error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            outcome
                .error
                .unwrap_or_else(|| "conversion failed".to_string()),
        )
    }
}
