//! Visualization Enrichment
//!
//! Best-effort image generation themed on a finished prediction.
//! Nothing in this module returns an error: every failure is logged and
//! collapses to `None`, leaving the prediction itself untouched.

use std::time::Duration;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use tracing::{debug, warn};

use super::prompt::{DEFAULT_RISK_TYPE, build_visualization_prompt};
use super::provider::{GenerationConfig, InlineData, SharedModelClient};
use super::timeout::with_timeout;
use crate::config::EnrichmentMode;
use crate::types::PredictionResult;

/// Produces the optional `visualizationImage` data URL
#[derive(Debug, Clone)]
pub struct VisualizationEnricher {
    mode: EnrichmentMode,
    image_model: String,
    timeout: Duration,
}

impl VisualizationEnricher {
    pub fn new(mode: EnrichmentMode, image_model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            mode,
            image_model: image_model.into(),
            timeout,
        }
    }

    pub fn mode(&self) -> EnrichmentMode {
        self.mode
    }

    /// Attempt one image generation call for `result` at the requested
    /// `location` (not the location echoed by the model).
    ///
    /// Returns `None` when disabled, on any provider failure, and when the
    /// response carries no usable image part.
    pub async fn visualize(
        &self,
        client: &SharedModelClient,
        location: &str,
        result: &PredictionResult,
    ) -> Option<String> {
        if !self.mode.is_enabled() {
            debug!("Visualization enrichment disabled");
            return None;
        }

        let risk_type = result
            .top_risk()
            .map(|r| r.risk_type.as_str())
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(DEFAULT_RISK_TYPE);
        let risk_level = result.overall_risk_level.to_string();
        let prompt = build_visualization_prompt(location, &risk_level, risk_type);

        let response = match with_timeout(
            self.timeout,
            client.generate(&self.image_model, &prompt, &GenerationConfig::image()),
            "visualization call",
        )
        .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(model = %self.image_model, error = %e, "Visualization generation failed (non-critical)");
                return None;
            }
        };

        match response.first_inline() {
            Some(inline) => to_data_url(inline),
            None => {
                warn!(model = %self.image_model, "Visualization response contained no image part");
                None
            }
        }
    }
}

/// Validate the inline payload and render it as a `data:` URL
fn to_data_url(inline: &InlineData) -> Option<String> {
    if !inline.mime_type.starts_with("image/") {
        warn!(mime_type = %inline.mime_type, "Inline payload is not an image");
        return None;
    }

    match STANDARD.decode(inline.data.trim()) {
        Ok(bytes) if !bytes.is_empty() => {
            debug!(bytes = bytes.len(), mime_type = %inline.mime_type, "Visualization generated");
            Some(format!(
                "data:{};base64,{}",
                inline.mime_type,
                STANDARD.encode(&bytes)
            ))
        }
        Ok(_) => {
            warn!("Visualization image payload is empty");
            None
        }
        Err(e) => {
            warn!(error = %e, "Visualization image payload is not valid base64");
            None
        }
    }
}
