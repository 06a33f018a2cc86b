//! Google Gemini Provider
//!
//! Calls the `models/{model}:generateContent` REST endpoint.
//! HTTP status and the provider's error status string are kept on every
//! failure so rate limits can be told apart from other errors.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::{
    ErrorCategory, ErrorClassifier, GenerationConfig, InlineData, ModelClient, ModelResponse,
    ProviderError, ResponsePart,
};
use crate::config::ProviderConfig;
use crate::constants::network;
use crate::types::{GuardError, Result};

/// Gemini REST client with secure API key handling
pub struct GeminiClient {
    /// API key stored securely - never exposed in logs or debug output
    api_key: Option<SecretString>,
    api_base: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl GeminiClient {
    /// Build a client. A missing key is allowed here; every analysis then
    /// fails with a configuration error before reaching the network.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let api_base = Self::validate_endpoint(&config.api_base)?;

        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .map(|k| SecretString::from(k.to_string()));

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GuardError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            api_base,
            client,
        })
    }

    /// Only http/https endpoints are accepted
    fn validate_endpoint(endpoint: &str) -> Result<String> {
        let url = url::Url::parse(endpoint).map_err(|e| {
            GuardError::Config(format!("Invalid provider endpoint '{}': {}", endpoint, e))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(GuardError::Config(format!(
                "Provider endpoint must use http or https scheme, got: {}",
                url.scheme()
            )));
        }

        let mut result = url.to_string();
        if result.ends_with('/') {
            result.pop();
        }
        Ok(result)
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.api_base, model)
    }

    fn build_request(content: &str, config: &GenerationConfig) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![TextPart {
                    text: content.to_string(),
                }],
            }],
            generation_config: config.clone(),
        }
    }

    fn transport_error(err: reqwest::Error, model: &str) -> ProviderError {
        if err.is_timeout() {
            return ProviderError::new(ErrorCategory::Timeout, err.to_string()).model(model);
        }
        if err.is_connect() {
            return ProviderError::new(ErrorCategory::Network, err.to_string()).model(model);
        }
        ErrorClassifier::classify(&err.to_string(), model)
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn generate(
        &self,
        model: &str,
        content: &str,
        config: &GenerationConfig,
    ) -> Result<ModelResponse> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            GuardError::Config(format!(
                "{} environment variable is not set",
                network::API_KEY_ENV
            ))
        })?;

        let start_time = Instant::now();
        let request = Self::build_request(content, config);

        debug!(model, prompt_chars = content.len(), "Sending request to Gemini API");

        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", api_key.expose_secret())
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| GuardError::Provider(Self::transport_error(e, model)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = describe_error_body(&body);
            return Err(GuardError::Provider(ErrorClassifier::classify_http_status(
                status.as_u16(),
                &message,
                model,
            )));
        }

        let body: GenerateContentResponse = response.json().await.map_err(|e| {
            GuardError::Provider(
                ProviderError::new(
                    ErrorCategory::Unknown,
                    format!("Failed to parse Gemini response: {}", e),
                )
                .model(model),
            )
        })?;

        let parts = body.into_parts();
        if parts.is_empty() {
            warn!(model, "Gemini response carried no candidate parts");
        }

        debug!(
            model,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            parts = parts.len(),
            "Received response from Gemini"
        );

        Ok(ModelResponse {
            model: model.to_string(),
            parts,
        })
    }

    fn name(&self) -> &str {
        "gemini"
    }

    fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Flatten a Gemini error body into `"<code> <STATUS>: <message>"`, falling
/// back to the raw body when it is not the documented error shape.
fn describe_error_body(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => {
            let err = envelope.error;
            format!(
                "{} {}: {}",
                err.code.map(|c| c.to_string()).unwrap_or_default(),
                err.status.unwrap_or_default(),
                err.message.unwrap_or_default()
            )
            .trim()
            .to_string()
        }
        Err(_) => body.to_string(),
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<TextPart>,
}

#[derive(Debug, Serialize)]
struct TextPart {
    text: String,
}

#[derive(Debug, Deserialize, Default)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Parts of the first candidate, in order
    fn into_parts(self) -> Vec<ResponsePart> {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| match (p.text, p.inline_data) {
                        (_, Some(inline)) => Some(ResponsePart::Inline(InlineData {
                            mime_type: inline.mime_type,
                            data: inline.data,
                        })),
                        (Some(text), None) => Some(ResponsePart::Text(text)),
                        (None, None) => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    text: Option<String>,
    inline_data: Option<WireInlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: Option<u16>,
    message: Option<String>,
    status: Option<String>,
}
