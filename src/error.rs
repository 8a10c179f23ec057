//! Error types for the bill-extract library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ExtractError`] — **Fatal**: the extraction cannot proceed at all
//!   (download failed, corrupt PDF, no model credential). Returned as
//!   `Err(ExtractError)` from [`crate::process::extract_document`] and
//!   surfaced by the HTTP layer as a 500 response.
//!
//! * [`ModelError`] — **Non-fatal**: one model call failed (network blip,
//!   HTTP 429/503). Consumed inside the per-page retry loop in
//!   [`crate::pipeline::extract`]; a page whose calls all fail contributes
//!   no data but never aborts the document.
//!
//! The separation lets the processor keep going through a multi-page bill
//! when a single page hits a transient API error.

use thiserror::Error;

/// All fatal errors returned by the bill-extract library.
///
/// Per-call model failures use [`ModelError`] and are absorbed by the
/// single-page extractor rather than propagated here.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Fetch errors ──────────────────────────────────────────────────────
    /// The document URL could not be fetched at all.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    /// The server answered, but not with a 2xx status.
    #[error("Fetching '{url}' returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// The downloaded bytes claim to be a PDF but cannot be parsed.
    #[error("Document is not a readable PDF: {detail}")]
    CorruptPdf { detail: String },

    /// A page index was requested that the document does not have.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    // ── Model errors ──────────────────────────────────────────────────────
    /// No model client could be resolved (no injected client, no API key).
    #[error("Vision model is not configured.\n{hint}")]
    ModelNotConfigured { hint: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error from a single model invocation.
///
/// Returned by [`crate::model::VisionModel::generate`] and retried by the
/// single-page extractor. Only transport-level failures live here — a
/// response that arrives but contains unparsable JSON is handled downstream
/// by degrading to an empty page result.
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    /// The request could not be sent or the connection dropped.
    #[error("model transport error: {0}")]
    Transport(String),

    /// The model API returned a non-2xx status.
    #[error("model API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// The response parsed but carried no candidate text.
    #[error("model returned an empty response")]
    EmptyResponse,

    /// No API key was available at call time.
    #[error("missing API key for the model service")]
    MissingApiKey,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_display() {
        let e = ExtractError::HttpStatus {
            url: "https://example.com/bill.pdf".into(),
            status: 404,
        };
        let msg = e.to_string();
        assert!(msg.contains("404"), "got: {msg}");
        assert!(msg.contains("bill.pdf"));
    }

    #[test]
    fn download_timeout_display() {
        let e = ExtractError::DownloadTimeout {
            url: "https://example.com/bill.pdf".into(),
            secs: 60,
        };
        assert!(e.to_string().contains("60s"));
    }

    #[test]
    fn model_api_display() {
        let e = ModelError::Api {
            status: 429,
            body: "rate limited".into(),
        };
        assert!(e.to_string().contains("429"));
        assert!(e.to_string().contains("rate limited"));
    }

    #[test]
    fn page_out_of_range_display() {
        let e = ExtractError::PageOutOfRange { page: 7, total: 3 };
        assert!(e.to_string().contains("Page 7"));
        assert!(e.to_string().contains("3 pages"));
    }
}
