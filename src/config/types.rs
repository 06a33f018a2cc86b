//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/disasterguard/) and project (./disasterguard.toml) files.

use serde::{Deserialize, Serialize};

use crate::constants::{models, network, retry, server};
use crate::types::{GuardError, Result};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Inbound API server settings
    pub server: ServerConfig,

    /// Generative model provider settings
    pub provider: ProviderConfig,

    /// Retry/backoff settings for provider calls
    pub retry: RetryConfig,

    /// Visualization enrichment toggle
    pub enrichment: EnrichmentMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            server: ServerConfig::default(),
            provider: ProviderConfig::default(),
            retry: RetryConfig::default(),
            enrichment: EnrichmentMode::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `GuardError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if self.retry.max_retries == 0 {
            return Err(GuardError::Config(
                "retry.max_retries must be greater than 0".to_string(),
            ));
        }

        if self.provider.fallback_models.is_empty() {
            return Err(GuardError::Config(
                "provider.fallback_models must list at least one model".to_string(),
            ));
        }

        if self
            .provider
            .fallback_models
            .iter()
            .any(|m| m.trim().is_empty())
        {
            return Err(GuardError::Config(
                "provider.fallback_models must not contain empty names".to_string(),
            ));
        }

        if self.provider.timeout_secs == 0 {
            return Err(GuardError::Config(
                "provider.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.server.host.trim().is_empty() {
            return Err(GuardError::Config("server.host must not be empty".to_string()));
        }

        Ok(())
    }
}

// =============================================================================
// Server Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,

    /// Bind port
    pub port: u16,

    /// Allowed CORS origins ("*" allows any)
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: server::DEFAULT_HOST.to_string(),
            port: server::DEFAULT_PORT,
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
                "*".to_string(),
            ],
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// Provider Configuration
// =============================================================================

/// Configuration for the generative model provider
///
/// Note: the API key is never serialized and is redacted in debug output.
/// The Gemini client converts it to a SecretString on construction.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// REST endpoint base
    pub api_base: String,

    /// Text models, tried in order
    pub fallback_models: Vec<String>,

    /// Image model used by visualization enrichment
    pub image_model: String,

    /// Per provider call timeout in seconds
    pub timeout_secs: u64,

    /// API key, filled from GEMINI_API_KEY when absent from files
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_base", &self.api_base)
            .field("fallback_models", &self.fallback_models)
            .field("image_model", &self.image_model)
            .field("timeout_secs", &self.timeout_secs)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_base: network::DEFAULT_API_BASE.to_string(),
            fallback_models: models::FALLBACK_MODELS
                .iter()
                .map(|m| m.to_string())
                .collect(),
            image_model: models::IMAGE_MODEL.to_string(),
            timeout_secs: network::PROVIDER_TIMEOUT_SECS,
            api_key: None,
        }
    }
}

impl ProviderConfig {
    /// Credential present and non-blank
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

// =============================================================================
// Retry Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per model
    pub max_retries: u32,

    /// Backoff base in seconds; waits are base, 2x base, 4x base...
    pub base_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: retry::MAX_RETRIES,
            base_delay_secs: retry::BASE_DELAY_SECS,
        }
    }
}

// =============================================================================
// Enrichment Mode
// =============================================================================

/// Whether the best-effort visualization step runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EnrichmentMode {
    #[default]
    On,
    Off,
}

impl EnrichmentMode {
    pub fn is_enabled(&self) -> bool {
        matches!(self, EnrichmentMode::On)
    }
}

impl std::fmt::Display for EnrichmentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnrichmentMode::On => write!(f, "on"),
            EnrichmentMode::Off => write!(f, "off"),
        }
    }
}

impl std::str::FromStr for EnrichmentMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "on" => Ok(EnrichmentMode::On),
            "off" => Ok(EnrichmentMode::Off),
            _ => Err(format!("Unknown enrichment mode: {}. Valid values: on, off", s)),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.base_delay_secs, 5);
        assert_eq!(
            config.provider.fallback_models,
            vec!["gemini-2.0-flash", "gemini-1.5-flash", "gemini-1.5-pro"]
        );
        assert_eq!(config.enrichment, EnrichmentMode::On);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_model_list() {
        let mut config = Config::default();
        config.provider.fallback_models.clear();
        assert!(matches!(config.validate(), Err(GuardError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_retries() {
        let mut config = Config::default();
        config.retry.max_retries = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_api_key_redacted_and_not_serialized() {
        let provider = ProviderConfig {
            api_key: Some("super-secret".to_string()),
            ..Default::default()
        };
        assert!(provider.has_api_key());
        assert!(!format!("{:?}", provider).contains("super-secret"));
        let json = serde_json::to_string(&provider).unwrap();
        assert!(!json.contains("super-secret"));
    }

    #[test]
    fn test_blank_api_key_is_missing() {
        let provider = ProviderConfig {
            api_key: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(!provider.has_api_key());
    }

    #[test]
    fn test_enrichment_mode() {
        assert_eq!("off".parse::<EnrichmentMode>().unwrap(), EnrichmentMode::Off);
        assert_eq!(EnrichmentMode::On.to_string(), "on");
        assert!(!EnrichmentMode::Off.is_enabled());
        assert!("maybe".parse::<EnrichmentMode>().is_err());
    }
}
