//! The vision-model seam and its Gemini implementation.
//!
//! [`VisionModel`] is the trait the pipeline is written against; production
//! code uses [`GeminiClient`], tests inject a scripted fake through
//! [`crate::config::ExtractionConfig::client`]. This keeps the per-page loop
//! free of any provider detail and makes the external model an explicit,
//! swappable collaborator instead of process-global state.

use crate::error::ModelError;
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Public Gemini generateContent endpoint prefix.
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Token counts reported by one model call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageMetadata {
    /// Tokens consumed by the prompt (page bytes + instruction text).
    pub prompt_tokens: u64,
    /// Tokens generated in the candidate response.
    pub candidates_tokens: u64,
}

/// Text plus usage accounting from one model call.
#[derive(Debug, Clone)]
pub struct ModelResponse {
    pub text: String,
    pub usage: Option<UsageMetadata>,
}

/// A vision-language model that accepts one inline binary page plus a text
/// prompt and returns generated text with token accounting.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Run the model once over a single page or image.
    ///
    /// `mime_type` is `application/pdf` for a one-page PDF chunk or
    /// `image/jpeg` for a whole image document.
    async fn generate(
        &self,
        mime_type: &str,
        data: &[u8],
        prompt: &str,
    ) -> Result<ModelResponse, ModelError>;
}

// ── Gemini wire types ─────────────────────────────────────────────────────
// The generateContent REST surface; field names are camelCase on the wire.

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum Part {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Text {
        text: String,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    /// Base64-encoded page bytes.
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<WireUsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireUsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

// ── Gemini client ─────────────────────────────────────────────────────────

/// Options the client needs from the config, kept separate so the client
/// can be constructed without dragging the whole [`ExtractionConfig`] along.
#[derive(Debug, Clone)]
pub struct GeminiOptions {
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

/// Thin REST client for the Gemini generateContent API.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    options: GeminiOptions,
}

impl GeminiClient {
    /// Build a client with its own connection pool.
    ///
    /// Model calls get no explicit per-call timeout (large multi-hundred-item
    /// pages can legitimately take a while); the connect timeout guards
    /// against a black-holed endpoint.
    pub fn new(api_key: impl Into<String>, options: GeminiOptions) -> Result<Self, ModelError> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(ModelError::MissingApiKey);
        }
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ModelError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            api_key,
            options,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.options.base_url.trim_end_matches('/'),
            self.options.model
        )
    }
}

#[async_trait]
impl VisionModel for GeminiClient {
    async fn generate(
        &self,
        mime_type: &str,
        data: &[u8],
        prompt: &str,
    ) -> Result<ModelResponse, ModelError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: mime_type.to_string(),
                            data: base64::engine::general_purpose::STANDARD.encode(data),
                        },
                    },
                    Part::Text {
                        text: prompt.to_string(),
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                max_output_tokens: self.options.max_output_tokens,
                temperature: self.options.temperature,
            },
        };

        let response = self
            .http
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| ModelError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Transport(e.to_string()))?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .filter_map(|p| match p {
                        Part::Text { text } => Some(text),
                        Part::InlineData { .. } => None,
                    })
                    .collect::<Vec<_>>()
                    .join("")
            })
            .filter(|t| !t.is_empty())
            .ok_or(ModelError::EmptyResponse)?;

        let usage = parsed.usage_metadata.map(|u| UsageMetadata {
            prompt_tokens: u.prompt_token_count,
            candidates_tokens: u.candidates_token_count,
        });

        debug!(
            model = %self.options.model,
            text_len = text.len(),
            "model call succeeded"
        );

        Ok(ModelResponse { text, usage })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_api_key_is_rejected() {
        let opts = GeminiOptions {
            model: "gemini-2.0-flash".into(),
            base_url: GEMINI_API_BASE.into(),
            temperature: 0.1,
            max_output_tokens: 8192,
        };
        assert!(matches!(
            GeminiClient::new("", opts),
            Err(ModelError::MissingApiKey)
        ));
    }

    #[test]
    fn endpoint_joins_base_and_model() {
        let opts = GeminiOptions {
            model: "gemini-2.0-flash".into(),
            base_url: "http://127.0.0.1:8099/v1beta/".into(),
            temperature: 0.1,
            max_output_tokens: 8192,
        };
        let client = GeminiClient::new("k", opts).unwrap();
        assert_eq!(
            client.endpoint(),
            "http://127.0.0.1:8099/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn request_body_shape_is_camel_case() {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".into()),
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: "application/pdf".into(),
                            data: "AAAA".into(),
                        },
                    },
                    Part::Text {
                        text: "prompt".into(),
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".into(),
                max_output_tokens: 8192,
                temperature: 0.1,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 8192);
        assert_eq!(
            json["contents"][0]["parts"][0]["inlineData"]["mimeType"],
            "application/pdf"
        );
        assert_eq!(json["contents"][0]["parts"][1]["text"], "prompt");
    }

    #[test]
    fn response_parses_text_and_usage() {
        let raw = serde_json::json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "{\"pagewise_line_items\": []}" }] }
            }],
            "usageMetadata": { "promptTokenCount": 1200, "candidatesTokenCount": 80 }
        });
        let parsed: GenerateContentResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.candidates.len(), 1);
        let usage = parsed.usage_metadata.unwrap();
        assert_eq!(usage.prompt_token_count, 1200);
        assert_eq!(usage.candidates_token_count, 80);
    }
}
