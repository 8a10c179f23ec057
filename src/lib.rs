//! # bill-extract
//!
//! Extract structured line items from medical bills (PDF or image) using a
//! vision language model, served over HTTP.
//!
//! ## Why this crate?
//!
//! Hospital and pharmacy bills arrive as scans and ad-hoc PDFs where classic
//! table extraction (OCR + ruled-line heuristics) falls apart — merged cells,
//! handwritten rates, stamps over amounts. Instead each page is handed to a
//! VLM which reads it as a human would and returns the line items as JSON.
//! The model output is then normalized into a strict schema so downstream
//! consumers never see a string where they expect a number.
//!
//! ## Pipeline Overview
//!
//! ```text
//! URL
//!  │
//!  ├─ 1. Fetch      download bytes, classify PDF vs image
//!  ├─ 2. Split      PDFs only: one single-page document per page (lopdf)
//!  ├─ 3. Extract    per-page VLM call with retry, fence stripping, JSON parse
//!  ├─ 4. Normalize  coerce names/amounts/page types into the output schema
//!  └─ 5. Output     pagewise records + aggregated token usage
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bill_extract::{extract_document, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // API key read from GEMINI_API_KEY when not set explicitly
//!     let config = ExtractionConfig::default();
//!     let outcome = extract_document("https://example.com/bill.pdf", &config).await?;
//!     println!("{} items across {} pages",
//!         outcome.total_item_count(),
//!         outcome.pages.len());
//!     eprintln!("tokens: {} in / {} out",
//!         outcome.usage.input_tokens,
//!         outcome.usage.output_tokens);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | Enables the `bill-extract-server` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `server` when using only the library:
//! ```toml
//! bill-extract = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod prompts;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{DelayPolicy, ExtractionConfig, ExtractionConfigBuilder};
pub use error::{ExtractError, ModelError};
pub use model::{GeminiClient, GeminiOptions, ModelResponse, UsageMetadata, VisionModel};
pub use output::{BillItem, ExtractionOutcome, PageRecord, PageType, TokenUsage};
pub use process::extract_document;
pub use server::{build_router, start_server, AppState};
