//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Retry/fallback orchestration constants
pub mod retry {
    /// Attempts per model before falling through to the next candidate
    pub const MAX_RETRIES: u32 = 3;

    /// Base delay for exponential backoff on rate limits (seconds)
    pub const BASE_DELAY_SECS: u64 = 5;
}

/// Model identifiers
pub mod models {
    /// Text prediction models in fallback order
    pub const FALLBACK_MODELS: [&str; 3] =
        ["gemini-2.0-flash", "gemini-1.5-flash", "gemini-1.5-pro"];

    /// Image generation model used for visualization enrichment
    pub const IMAGE_MODEL: &str = "gemini-2.0-flash-exp-image-generation";
}

/// HTTP/Network constants
pub mod network {
    /// Default Gemini REST endpoint
    pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

    /// Per provider call timeout (seconds)
    pub const PROVIDER_TIMEOUT_SECS: u64 = 60;

    /// Environment variable holding the provider credential
    pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
}

/// Inbound API server constants
pub mod server {
    pub const DEFAULT_HOST: &str = "0.0.0.0";
    pub const DEFAULT_PORT: u16 = 8000;

    /// Maximum accepted request body (bytes)
    pub const MAX_BODY_BYTES: usize = 256 * 1024;

    /// Engine label reported by the health endpoint
    pub const ENGINE_NAME: &str = "Neural-X V4.2";

    /// Detail returned to callers for any internal failure
    pub const INTERNAL_FAILURE_DETAIL: &str = "Neural Core Sync Failure";
}

/// Score bounds shared by every percentage-like field
pub mod score {
    pub const MIN: i64 = 0;
    pub const MAX: i64 = 100;
}
