//! Server binary for bill-extract.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig` and serves the HTTP API.

use anyhow::{Context, Result};
use bill_extract::{start_server, AppState, DelayPolicy, ExtractionConfig};
use clap::Parser;
use std::io;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "bill-extract-server",
    version,
    about = "HTTP service extracting structured line items from bill PDFs and images",
    long_about = "Serves POST /extract-bill-data: downloads the document at the given URL, \
sends each page to a Gemini vision model, and returns the extracted line items as JSON \
together with token usage. Requires GEMINI_API_KEY."
)]
struct Cli {
    /// Address to bind.
    #[arg(long, env = "BILL_EXTRACT_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on.
    #[arg(short, long, env = "BILL_EXTRACT_PORT", default_value_t = 3000)]
    port: u16,

    /// Gemini model ID.
    #[arg(long, env = "BILL_EXTRACT_MODEL", default_value = "gemini-2.0-flash")]
    model: String,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, env = "BILL_EXTRACT_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Maximum tokens the model may generate per page.
    #[arg(long, env = "BILL_EXTRACT_MAX_TOKENS", default_value_t = 8192)]
    max_tokens: u32,

    /// Attempts per page before giving up on it (minimum 1).
    #[arg(long, env = "BILL_EXTRACT_MAX_ATTEMPTS", default_value_t = 2)]
    max_attempts: u32,

    /// Seconds to wait between attempts on the same page.
    #[arg(long, env = "BILL_EXTRACT_RETRY_DELAY", default_value_t = 2)]
    retry_delay_secs: u64,

    /// Seconds to pause between pages of a PDF.
    #[arg(long, env = "BILL_EXTRACT_PAGE_DELAY", default_value_t = 1)]
    page_delay_secs: u64,

    /// Timeout for downloading the document, in seconds.
    #[arg(long, env = "BILL_EXTRACT_DOWNLOAD_TIMEOUT", default_value_t = 60)]
    download_timeout: u64,

    /// Enable debug-level logging.
    #[arg(short, long, env = "BILL_EXTRACT_VERBOSE")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // The key is resolved again per request so the process can start without
    // it, but say so loudly up front rather than on the first extraction.
    if std::env::var("GEMINI_API_KEY").is_err() {
        tracing::error!(
            "GEMINI_API_KEY is not set; every extraction request will fail until it is"
        );
    }

    let config = ExtractionConfig::builder()
        .model(&cli.model)
        .temperature(cli.temperature)
        .max_output_tokens(cli.max_tokens)
        .max_attempts(cli.max_attempts)
        .retry_delay(DelayPolicy::Fixed(Duration::from_secs(cli.retry_delay_secs)))
        .page_delay(Duration::from_secs(cli.page_delay_secs))
        .download_timeout_secs(cli.download_timeout)
        .build()
        .context("Invalid configuration")?;

    let addr = format!("{}:{}", cli.host, cli.port);
    start_server(&addr, AppState::new(config))
        .await
        .with_context(|| format!("Server failed on {addr}"))?;

    Ok(())
}
