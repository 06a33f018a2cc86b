//! Model Provider Abstraction
//!
//! Defines the `ModelClient` trait: model id, prompt and output-format
//! configuration in, response parts or a classified `ProviderError` out.
//! Clients carry no retry logic; that lives in the fallback invoker.
//!
//! ## Modules
//!
//! - `fallback`: Ordered model fallback with rate-limit backoff
//! - `gemini`: Google Gemini REST client

mod fallback;
mod gemini;

pub use fallback::{AttemptRecord, FallbackInvoker, InvocationStats, RetryPolicy};
pub use gemini::GeminiClient;

pub use crate::types::{ErrorCategory, ErrorClassifier, ProviderError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::ProviderConfig;
use crate::types::Result;

// =============================================================================
// Generation Config
// =============================================================================

/// Output-format directives sent with a prompt
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// e.g. `application/json` to request strict JSON
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    /// e.g. `["IMAGE", "TEXT"]` for image generation
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub response_modalities: Vec<String>,
}

impl GenerationConfig {
    /// Request a strict JSON text response
    pub fn json() -> Self {
        Self {
            response_mime_type: Some("application/json".to_string()),
            response_modalities: Vec::new(),
        }
    }

    /// Request image output alongside text
    pub fn image() -> Self {
        Self {
            response_mime_type: None,
            response_modalities: vec!["IMAGE".to_string(), "TEXT".to_string()],
        }
    }
}

// =============================================================================
// Model Response
// =============================================================================

/// Binary payload returned inline by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineData {
    pub mime_type: String,
    /// Base64-encoded bytes, as delivered on the wire
    pub data: String,
}

/// One part of the first response candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponsePart {
    Text(String),
    Inline(InlineData),
}

/// Response of a single successful provider call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelResponse {
    /// Model that produced the response
    pub model: String,
    pub parts: Vec<ResponsePart>,
}

impl ModelResponse {
    pub fn from_text(model: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            parts: vec![ResponsePart::Text(text.into())],
        }
    }

    /// Concatenated text parts, or `None` when the response has no text
    pub fn text(&self) -> Option<String> {
        let texts: Vec<&str> = self
            .parts
            .iter()
            .filter_map(|p| match p {
                ResponsePart::Text(t) => Some(t.as_str()),
                ResponsePart::Inline(_) => None,
            })
            .collect();

        if texts.is_empty() {
            None
        } else {
            Some(texts.concat())
        }
    }

    /// First inline payload, if any
    pub fn first_inline(&self) -> Option<&InlineData> {
        self.parts.iter().find_map(|p| match p {
            ResponsePart::Inline(data) => Some(data),
            ResponsePart::Text(_) => None,
        })
    }
}

// =============================================================================
// Model Client Trait
// =============================================================================

/// Shared client type for concurrent access across requests.
pub type SharedModelClient = Arc<dyn ModelClient + Send + Sync>;

/// Uniform boundary around the generative-AI provider
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Run one generation call against `model`.
    ///
    /// Failures must come back as `GuardError::Provider` with a category that
    /// preserves the rate-limit signal.
    async fn generate(
        &self,
        model: &str,
        content: &str,
        config: &GenerationConfig,
    ) -> Result<ModelResponse>;

    /// Provider name for logging
    fn name(&self) -> &str;

    /// Whether a credential is configured; analyses fail fast without one
    fn has_credentials(&self) -> bool;
}

/// Create a shared client from configuration
pub fn create_client(config: &ProviderConfig) -> Result<SharedModelClient> {
    Ok(Arc::new(GeminiClient::new(config)?))
}
