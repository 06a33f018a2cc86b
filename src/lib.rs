//! DisasterGuard - Disaster-Risk Prediction Relay
//!
//! Accepts a location (plus optional community hazard reports) and returns a
//! structured risk prediction produced by a generative model and reshaped
//! into a fixed JSON schema.
//!
//! ## Core Features
//!
//! - **Model Fallback**: ordered candidate models with rate-limit backoff
//! - **Strict Normalization**: field-by-field extraction with defaults
//! - **Visualization Enrichment**: best-effort image that never fails a request
//! - **HTTP API**: axum server with configurable CORS
//!
//! ## Quick Start
//!
//! ```ignore
//! use disasterguard::{ConfigLoader, PredictionRequest, RiskAnalyzer};
//!
//! let config = ConfigLoader::load()?;
//! let analyzer = RiskAnalyzer::from_config(&config)?;
//! let result = analyzer.analyze(&PredictionRequest::new("Miami")).await?;
//! ```
//!
//! ## Modules
//!
//! - [`ai`]: provider client, fallback invoker, prompts, normalizer
//! - [`analysis`]: end-to-end prediction pipeline
//! - [`server`]: HTTP routes and error mapping
//! - [`config`]: layered configuration

pub mod ai;
pub mod analysis;
pub mod cli;
pub mod config;
pub mod constants;
pub mod server;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

pub use analysis::{AnalyzerSettings, RiskAnalyzer};
pub use config::{Config, ConfigLoader, EnrichmentMode};
pub use types::error::{ErrorCategory, GuardError, ProviderError, Result};
pub use types::{Language, PredictionRequest, PredictionResult, UserReport};

// =============================================================================
// AI Re-exports
// =============================================================================

pub use ai::{
    FallbackInvoker, GeminiClient, GenerationConfig, ModelClient, ModelResponse, RetryPolicy,
    SharedModelClient, VisualizationEnricher, normalize, with_timeout,
};
