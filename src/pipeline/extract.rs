//! Single-page extraction: drive the vision model over one page with retry.
//!
//! This stage is intentionally thin — the prompt lives in
//! [`crate::prompts`] and the wire client in [`crate::model`], so retry and
//! failure policy can change without touching either.
//!
//! ## Failure policy
//!
//! A page never fails the document. Transport-level [`ModelError`]s are
//! retried up to `max_attempts` with the configured delay between attempts;
//! a response that arrives but fails fence stripping or JSON parsing is not
//! retried — the model is unlikely to answer differently, so the page
//! degrades immediately to the empty fallback `{"pagewise_line_items": []}`.
//! Either way the caller gets a [`PageExtraction`], never an error.

use crate::config::ExtractionConfig;
use crate::model::{UsageMetadata, VisionModel};
use crate::prompts::DEFAULT_EXTRACTION_PROMPT;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::time::sleep;
use tracing::warn;

/// The per-page result: whatever JSON the model produced (or the empty
/// fallback), usage metadata when the call returned any, and whether every
/// attempt failed at transport level.
#[derive(Debug)]
pub struct PageExtraction {
    pub value: Value,
    pub usage: Option<UsageMetadata>,
    /// True when all attempts raised a [`crate::error::ModelError`]; the
    /// processor records the page index and moves on.
    pub exhausted: bool,
}

/// The fallback value every failure path degrades to.
fn empty_result() -> Value {
    json!({ "pagewise_line_items": [] })
}

/// Invoke the model on exactly one page/image and parse its response.
///
/// `mime_type` is `application/pdf` for a one-page chunk or `image/jpeg`
/// for a full image document. See the module docs for the failure policy.
pub async fn extract_single_page(
    model: &Arc<dyn VisionModel>,
    mime_type: &str,
    data: &[u8],
    config: &ExtractionConfig,
) -> PageExtraction {
    let prompt = config
        .prompt
        .as_deref()
        .unwrap_or(DEFAULT_EXTRACTION_PROMPT);

    for attempt in 1..=config.max_attempts {
        if attempt > 1 {
            sleep(config.retry_delay.wait(attempt - 1)).await;
        }

        match model.generate(mime_type, data, prompt).await {
            Ok(response) => {
                let stripped = strip_json_fences(&response.text);
                match serde_json::from_str::<Value>(stripped) {
                    Ok(value) => {
                        return PageExtraction {
                            value,
                            usage: response.usage,
                            exhausted: false,
                        };
                    }
                    Err(e) => {
                        // The model answered but not with JSON; retrying the
                        // same prompt rarely changes that. Degrade now and
                        // drop the usage so a junk response costs nothing in
                        // the accounting.
                        warn!("Page processing error: unparsable model JSON: {e}");
                        return PageExtraction {
                            value: empty_result(),
                            usage: None,
                            exhausted: false,
                        };
                    }
                }
            }
            Err(e) => {
                warn!(
                    "Model call attempt {}/{} failed: {}",
                    attempt, config.max_attempts, e
                );
            }
        }
    }

    PageExtraction {
        value: empty_result(),
        usage: None,
        exhausted: true,
    }
}

// ── Fence stripping ───────────────────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json)?\s*(.*?)\s*```$").unwrap());

/// Strip a wrapping ```` ```json … ``` ```` fence the model may emit despite
/// the prompt forbidding markdown. Input without fences passes through.
pub fn strip_json_fences(input: &str) -> &str {
    let trimmed = input.trim();
    match RE_OUTER_FENCES.captures(trimmed) {
        Some(caps) => caps.get(1).map_or(trimmed, |m| m.as_str()),
        None => trimmed,
    }
}
