//! HTTP surface: request/response schemas, router, and the extract handler.
//!
//! Thin glue over [`crate::process::extract_document`]. The endpoint either
//! returns the fully-structured success payload or a generic 500 with the
//! stringified error — there is no partial-success signaling in the wire
//! format (a page that failed extraction simply contributes no records).

use crate::config::ExtractionConfig;
use crate::output::{PageRecord, TokenUsage};
use crate::process::extract_document;
use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

/// Shared state for all handlers: one immutable config per process.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ExtractionConfig>,
}

impl AppState {
    pub fn new(config: ExtractionConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

// ── Wire schemas ──────────────────────────────────────────────────────────

/// Request body for `POST /extract-bill-data`.
#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    /// URL of the bill document (PDF or image).
    pub document: String,
}

/// The `data` object of a success response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExtractionData {
    pub pagewise_line_items: Vec<PageRecord>,
    pub total_item_count: usize,
}

/// 200 response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExtractSuccess {
    pub is_success: bool,
    pub token_usage: TokenUsage,
    pub data: ExtractionData,
}

/// 500 response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExtractFailure {
    pub is_success: bool,
    pub message: String,
}

// ── Handlers ──────────────────────────────────────────────────────────────

/// `POST /extract-bill-data`
pub async fn extract_bill_data(
    State(state): State<AppState>,
    Json(request): Json<ExtractRequest>,
) -> Response {
    match extract_document(&request.document, &state.config).await {
        Ok(outcome) => {
            if !outcome.failed_pages.is_empty() {
                warn!(
                    "Document '{}' completed with failed pages: {:?}",
                    request.document, outcome.failed_pages
                );
            }
            let total_item_count = outcome.total_item_count();
            let body = ExtractSuccess {
                is_success: true,
                token_usage: outcome.usage,
                data: ExtractionData {
                    pagewise_line_items: outcome.pages,
                    total_item_count,
                },
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => {
            error!("Extraction failed for '{}': {}", request.document, e);
            let body = ExtractFailure {
                is_success: false,
                message: format!("Processing failed: {e}"),
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

/// `GET /health`
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// ── Router ────────────────────────────────────────────────────────────────

/// Build the API router with all endpoints and middleware.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/extract-bill-data", post(extract_bill_data))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until the process is terminated.
pub async fn start_server(addr: &str, state: AppState) -> Result<(), std::io::Error> {
    tracing::info!("Starting bill-extract server on {}", addr);
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::PageType;

    #[test]
    fn success_body_shape() {
        let body = ExtractSuccess {
            is_success: true,
            token_usage: TokenUsage {
                total_tokens: 150,
                input_tokens: 100,
                output_tokens: 50,
            },
            data: ExtractionData {
                pagewise_line_items: vec![PageRecord {
                    page_no: "1".into(),
                    page_type: PageType::FinalBill,
                    bill_items: vec![],
                }],
                total_item_count: 0,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["is_success"], true);
        assert_eq!(json["token_usage"]["total_tokens"], 150);
        assert_eq!(json["data"]["total_item_count"], 0);
        assert_eq!(
            json["data"]["pagewise_line_items"][0]["page_type"],
            "Final Bill"
        );
    }

    #[test]
    fn failure_body_shape() {
        let body = ExtractFailure {
            is_success: false,
            message: "Processing failed: Fetching 'x' returned HTTP 404".into(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["is_success"], false);
        assert!(json["message"].as_str().unwrap().contains("404"));
    }

    #[test]
    fn request_body_parses() {
        let req: ExtractRequest =
            serde_json::from_str(r#"{"document": "https://example.com/bill.pdf"}"#).unwrap();
        assert_eq!(req.document, "https://example.com/bill.pdf");
    }
}
