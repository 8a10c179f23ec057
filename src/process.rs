//! The document processor: fetch, split, extract, normalize.
//!
//! This is the primary library entry point. Pages are processed strictly
//! sequentially, in physical order — one model call at a time with a fixed
//! pause between pages. No parallelism, no shared state across requests;
//! everything accumulated here (records, token counts, failed-page indices)
//! is local to one call.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::model::{GeminiClient, GeminiOptions, VisionModel};
use crate::output::{ExtractionOutcome, PageRecord, TokenUsage};
use crate::pipeline::{extract, fetch, normalize, split};
use serde_json::Value;
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{info, warn};

/// MIME tag for a one-page PDF chunk.
const MIME_PDF: &str = "application/pdf";
/// MIME tag for a whole image document.
const MIME_IMAGE: &str = "image/jpeg";

/// Download a bill document and extract its line items page by page.
///
/// # Arguments
/// * `url`    — HTTP/HTTPS URL of a PDF or image document
/// * `config` — Extraction configuration
///
/// # Returns
/// `Ok(ExtractionOutcome)` on success, even when some pages yielded nothing
/// (check `outcome.failed_pages`).
///
/// # Errors
/// Returns `Err(ExtractError)` only for fatal conditions:
/// - the download failed, timed out, or returned non-2xx
/// - the bytes were classified as PDF but cannot be parsed
/// - no model client could be resolved
pub async fn extract_document(
    url: &str,
    config: &ExtractionConfig,
) -> Result<ExtractionOutcome, ExtractError> {
    // ── Step 1: Resolve the model client ─────────────────────────────────
    let model = resolve_model(config)?;

    // ── Step 2: Fetch and classify the document ──────────────────────────
    let document = fetch::fetch_document(url, config.download_timeout_secs).await?;

    let mut raw_pages: Vec<Value> = Vec::new();
    let mut usage = TokenUsage::default();
    let mut failed_pages: Vec<usize> = Vec::new();

    match document.kind {
        // ── Step 3a: PDF — one model call per physical page ──────────────
        fetch::DocumentKind::Pdf => {
            let pdf = split::load(&document.bytes)?;
            let total_pages = pdf.page_count();
            info!("PDF detected with {} pages. Switching to page-by-page mode.", total_pages);

            for i in 0..total_pages {
                let chunk = pdf.single_page_bytes(i)?;
                info!("Processing page {}/{}", i + 1, total_pages);

                let page = extract::extract_single_page(&model, MIME_PDF, &chunk, config).await;

                if page.exhausted {
                    warn!("Page {} yielded no data after {} attempts", i + 1, config.max_attempts);
                    failed_pages.push(i + 1);
                }

                // Force the physical page number onto every record; the
                // model is never trusted to know which page it is on.
                for mut record in normalize::raw_pages(&page.value) {
                    if let Some(obj) = record.as_object_mut() {
                        obj.insert("page_no".to_string(), Value::String((i + 1).to_string()));
                    }
                    raw_pages.push(record);
                }

                if let Some(u) = page.usage {
                    usage.add(u.prompt_tokens, u.candidates_tokens);
                }

                // Fixed-rate throttling against model-API rate limits.
                if !config.page_delay.is_zero() {
                    sleep(config.page_delay).await;
                }
            }
        }

        // ── Step 3b: Image — exactly one call, no retry loop framing ─────
        fetch::DocumentKind::Image => {
            info!("Image detected. Sending single request.");
            let page =
                extract::extract_single_page(&model, MIME_IMAGE, &document.bytes, config).await;
            if page.exhausted {
                failed_pages.push(1);
            }
            raw_pages = normalize::raw_pages(&page.value);
            if let Some(u) = page.usage {
                usage.add(u.prompt_tokens, u.candidates_tokens);
            }
        }
    }

    // ── Step 4: Normalization pass over every record ──────────────────────
    let pages: Vec<PageRecord> = raw_pages.iter().map(normalize::normalize_page).collect();

    info!(
        "Extraction complete: {} page records, {} items, {} tokens",
        pages.len(),
        pages.iter().map(|p| p.bill_items.len()).sum::<usize>(),
        usage.total_tokens
    );

    Ok(ExtractionOutcome {
        pages,
        usage,
        failed_pages,
    })
}

/// Resolve the model client, from most-specific to least-specific.
///
/// 1. **Pre-built client** (`config.client`) — the caller constructed the
///    client entirely; used as-is. This is the test-injection seam.
/// 2. **Configured key** (`config.api_key`) — explicit credential.
/// 3. **Environment** (`GEMINI_API_KEY`) — the deployment-level default.
fn resolve_model(config: &ExtractionConfig) -> Result<Arc<dyn VisionModel>, ExtractError> {
    if let Some(ref client) = config.client {
        return Ok(Arc::clone(client));
    }

    let api_key = match config.api_key.clone() {
        Some(key) => key,
        None => std::env::var("GEMINI_API_KEY").unwrap_or_default(),
    };

    if api_key.is_empty() {
        return Err(ExtractError::ModelNotConfigured {
            hint: "Set GEMINI_API_KEY or provide ExtractionConfig::api_key.".to_string(),
        });
    }

    let client = GeminiClient::new(
        api_key,
        GeminiOptions {
            model: config.model.clone(),
            base_url: config.api_base_url.clone(),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        },
    )
    .map_err(|e| ExtractError::ModelNotConfigured { hint: e.to_string() })?;

    Ok(Arc::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_model_prefers_injected_client() {
        use crate::error::ModelError;
        use crate::model::ModelResponse;
        use async_trait::async_trait;

        struct Stub;

        #[async_trait]
        impl VisionModel for Stub {
            async fn generate(
                &self,
                _mime_type: &str,
                _data: &[u8],
                _prompt: &str,
            ) -> Result<ModelResponse, ModelError> {
                Err(ModelError::EmptyResponse)
            }
        }

        let config = ExtractionConfig::builder()
            .client(Arc::new(Stub))
            .build()
            .unwrap();
        assert!(resolve_model(&config).is_ok());
    }

    #[test]
    fn resolve_model_uses_configured_key() {
        let config = ExtractionConfig::builder().api_key("test-key").build().unwrap();
        assert!(resolve_model(&config).is_ok());
    }
}
