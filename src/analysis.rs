//! Risk Analysis Pipeline
//!
//! One request in, one `PredictionResult` out:
//!
//! 1. Validate the request and check the provider credential
//! 2. Build the prediction prompt
//! 3. Invoke the fallback model list for strict JSON
//! 4. Normalize the response text
//! 5. Attach the best-effort visualization
//! 6. Audit percentage fields (logged, never altered)
//!
//! The analyzer holds no per-request state; concurrent calls share only the
//! immutable client and settings.

use std::time::Duration;

use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::ai::enrichment::VisualizationEnricher;
use crate::ai::normalizer::{NormalizeContext, format_timestamp, normalize};
use crate::ai::prompt::build_prediction_prompt;
use crate::ai::provider::{
    FallbackInvoker, GenerationConfig, RetryPolicy, SharedModelClient, create_client,
};
use crate::config::{Config, EnrichmentMode};
use crate::constants::network;
use crate::types::{GuardError, PredictionRequest, PredictionResult, Result};

/// Knobs the analyzer needs, detached from the file-level config
#[derive(Debug, Clone)]
pub struct AnalyzerSettings {
    pub fallback_models: Vec<String>,
    pub policy: RetryPolicy,
    pub call_timeout: Duration,
    pub enrichment: EnrichmentMode,
    pub image_model: String,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for AnalyzerSettings {
    fn from(config: &Config) -> Self {
        Self {
            fallback_models: config.provider.fallback_models.clone(),
            policy: RetryPolicy::from(&config.retry),
            call_timeout: Duration::from_secs(config.provider.timeout_secs),
            enrichment: config.enrichment,
            image_model: config.provider.image_model.clone(),
        }
    }
}

/// Disaster-risk analysis over a single provider client
pub struct RiskAnalyzer {
    client: SharedModelClient,
    invoker: FallbackInvoker,
    enricher: VisualizationEnricher,
    fallback_models: Vec<String>,
}

impl RiskAnalyzer {
    pub fn new(client: SharedModelClient, settings: AnalyzerSettings) -> Self {
        let invoker = FallbackInvoker::new(client.clone(), settings.policy, settings.call_timeout);
        let enricher = VisualizationEnricher::new(
            settings.enrichment,
            settings.image_model,
            settings.call_timeout,
        );

        Self {
            client,
            invoker,
            enricher,
            fallback_models: settings.fallback_models,
        }
    }

    /// Build an analyzer backed by the Gemini client
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = create_client(&config.provider)?;
        Ok(Self::new(client, AnalyzerSettings::from(config)))
    }

    pub fn has_credentials(&self) -> bool {
        self.client.has_credentials()
    }

    pub fn enrichment(&self) -> EnrichmentMode {
        self.enricher.mode()
    }

    /// Run a full prediction for `request`.
    ///
    /// Caller errors (`InvalidRequest`, missing credential as `Config`) are
    /// raised before any provider call.
    #[instrument(skip(self, request), fields(location = %request.location, lang = request.lang.code()))]
    pub async fn analyze(&self, request: &PredictionRequest) -> Result<PredictionResult> {
        request.validate()?;

        if !self.client.has_credentials() {
            return Err(GuardError::Config(format!(
                "{} environment variable is not set",
                network::API_KEY_ENV
            )));
        }

        let prompt = build_prediction_prompt(request);
        let (response, stats) = self
            .invoker
            .invoke(&self.fallback_models, &prompt, &GenerationConfig::json())
            .await?;

        let raw = response.text().unwrap_or_else(|| {
            warn!(model = %response.model, "Model returned no text, treating as empty object");
            "{}".to_string()
        });

        let location = request.location.trim();
        let context = NormalizeContext::new(location);
        let mut result = normalize(&raw, &context)?;

        result.visualization_image = self
            .enricher
            .visualize(&self.client, location, &result)
            .await;
        result.timestamp = format_timestamp(Utc::now());

        let out_of_range = result.out_of_range_fields();
        if !out_of_range.is_empty() {
            warn!(fields = ?out_of_range, "Model returned percentages outside 0-100");
        }

        info!(
            model = stats.successful_model.as_deref().unwrap_or("unknown"),
            attempts = stats.total_attempts,
            risk_level = %result.overall_risk_level,
            risks = result.risks.len(),
            visualization = result.visualization_image.is_some(),
            "Prediction complete"
        );

        Ok(result)
    }
}
