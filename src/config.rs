//! Configuration types for a bill-extraction run.
//!
//! Everything the pipeline does is driven by one [`ExtractionConfig`], built
//! through [`ExtractionConfigBuilder`]. The server constructs a single config
//! at startup and shares it (behind an `Arc`) across all requests; tests
//! build one per case with a fake model client injected.

use crate::error::ExtractError;
use crate::model::VisionModel;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for document extraction.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use bill_extract::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .model("gemini-2.0-flash")
///     .max_attempts(2)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Model identifier sent to the Gemini API. Default: "gemini-2.0-flash".
    pub model: String,

    /// API key for the model service. If None, `GEMINI_API_KEY` is read from
    /// the environment when the client is resolved.
    pub api_key: Option<String>,

    /// Base URL of the generateContent endpoint. Default: the public Gemini
    /// API. Overridable so tests can point the client at a local fixture.
    pub api_base_url: String,

    /// Pre-constructed model client. Takes precedence over `api_key`; this
    /// is the injection point for fakes in tests.
    pub client: Option<Arc<dyn VisionModel>>,

    /// Sampling temperature. Default: 0.1.
    ///
    /// Low temperature keeps the model deterministic and faithful to what is
    /// printed on the bill — exactly what you want for transcription.
    pub temperature: f32,

    /// Maximum tokens the model may generate per page. Default: 8192.
    ///
    /// Dense pharmacy pages can run to hundreds of line items; a low ceiling
    /// silently truncates the JSON mid-array and the whole page degrades to
    /// an empty result at parse time.
    pub max_output_tokens: u32,

    /// Model-call attempts per page before the page is given up. Default: 2.
    pub max_attempts: u32,

    /// Delay between failed attempts on the same page. Default: fixed 2 s.
    pub retry_delay: DelayPolicy,

    /// Pause after each PDF page, as crude protection against model-API rate
    /// limits. Default: 1 s. Not adaptive; set to `Duration::ZERO` in tests.
    pub page_delay: Duration,

    /// Document download timeout in seconds. Default: 60.
    pub download_timeout_secs: u64,

    /// Custom extraction prompt. If None, uses the built-in default.
    pub prompt: Option<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".to_string(),
            api_key: None,
            api_base_url: crate::model::GEMINI_API_BASE.to_string(),
            client: None,
            temperature: 0.1,
            max_output_tokens: 8192,
            max_attempts: 2,
            retry_delay: DelayPolicy::Fixed(Duration::from_secs(2)),
            page_delay: Duration::from_secs(1),
            download_timeout_secs: 60,
            prompt: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base_url", &self.api_base_url)
            .field("client", &self.client.as_ref().map(|_| "<dyn VisionModel>"))
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("max_attempts", &self.max_attempts)
            .field("retry_delay", &self.retry_delay)
            .field("page_delay", &self.page_delay)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into();
        self
    }

    pub fn client(mut self, client: Arc<dyn VisionModel>) -> Self {
        self.config.client = Some(client);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_output_tokens(mut self, n: u32) -> Self {
        self.config.max_output_tokens = n;
        self
    }

    pub fn max_attempts(mut self, n: u32) -> Self {
        self.config.max_attempts = n.max(1);
        self
    }

    pub fn retry_delay(mut self, policy: DelayPolicy) -> Self {
        self.config.retry_delay = policy;
        self
    }

    pub fn page_delay(mut self, d: Duration) -> Self {
        self.config.page_delay = d;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.prompt = Some(prompt.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let c = &self.config;
        if c.model.is_empty() {
            return Err(ExtractError::InvalidConfig("model must not be empty".into()));
        }
        if c.max_attempts == 0 {
            return Err(ExtractError::InvalidConfig("max_attempts must be ≥ 1".into()));
        }
        if c.max_output_tokens == 0 {
            return Err(ExtractError::InvalidConfig(
                "max_output_tokens must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How long to wait before retry attempt `attempt` (1-based).
///
/// The default is a fixed pause between attempts; the enum lets tests switch
/// the wait off and lets rate-limited deployments swap in backoff without
/// touching the retry loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DelayPolicy {
    /// No pause between attempts.
    None,
    /// The same pause before every retry. (default: 2 s)
    Fixed(Duration),
    /// `base * 2^(attempt-1)` — doubling backoff for rate-limited deployments.
    Exponential { base: Duration },
}

impl DelayPolicy {
    /// Duration to wait before the given retry attempt (1-based; attempt 1
    /// is the first *re*try).
    pub fn wait(&self, attempt: u32) -> Duration {
        match self {
            DelayPolicy::None => Duration::ZERO,
            DelayPolicy::Fixed(d) => *d,
            DelayPolicy::Exponential { base } => {
                *base * 2u32.saturating_pow(attempt.saturating_sub(1))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_expectations() {
        let c = ExtractionConfig::default();
        assert_eq!(c.model, "gemini-2.0-flash");
        assert_eq!(c.temperature, 0.1);
        assert_eq!(c.max_output_tokens, 8192);
        assert_eq!(c.max_attempts, 2);
        assert_eq!(c.retry_delay, DelayPolicy::Fixed(Duration::from_secs(2)));
        assert_eq!(c.page_delay, Duration::from_secs(1));
        assert_eq!(c.download_timeout_secs, 60);
    }

    #[test]
    fn builder_rejects_empty_model() {
        let err = ExtractionConfig::builder().model("").build();
        assert!(err.is_err());
    }

    #[test]
    fn builder_clamps_attempts_to_one() {
        let c = ExtractionConfig::builder().max_attempts(0).build().unwrap();
        assert_eq!(c.max_attempts, 1);
    }

    #[test]
    fn delay_policy_wait() {
        assert_eq!(DelayPolicy::None.wait(1), Duration::ZERO);
        assert_eq!(
            DelayPolicy::Fixed(Duration::from_secs(2)).wait(3),
            Duration::from_secs(2)
        );
        let exp = DelayPolicy::Exponential {
            base: Duration::from_millis(500),
        };
        assert_eq!(exp.wait(1), Duration::from_millis(500));
        assert_eq!(exp.wait(2), Duration::from_millis(1000));
        assert_eq!(exp.wait(3), Duration::from_millis(2000));
    }
}
