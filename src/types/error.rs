//! Unified Error Type System
//!
//! Centralized error types for the relay.
//! Provides provider error classification for retry and fallback decisions.
//!
//! ## Error Categories
//!
//! - **RateLimit**: Quota or throughput exhausted (backoff, then next model)
//! - **Auth**: Credential rejected by the provider
//! - **BadRequest**: Provider refused the request shape
//! - **Network**: Connectivity issues
//! - **Timeout**: Per-call deadline exceeded
//! - **Unavailable**: Model missing or provider down
//! - **Unknown**: Anything else
//!
//! Only `RateLimit` is retried on the same model. Every other category moves
//! the orchestrator to the next fallback model.

use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// Provider error categories for routing decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Quota exhausted - wait then retry same model
    RateLimit,
    /// Credential rejected
    Auth,
    /// Request rejected by the provider
    BadRequest,
    /// Connectivity issues
    Network,
    /// Provider call exceeded its deadline
    Timeout,
    /// Model unavailable or provider failing
    Unavailable,
    /// Unclassified failure
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::Auth => write!(f, "AUTH"),
            Self::BadRequest => write!(f, "BAD_REQUEST"),
            Self::Network => write!(f, "NETWORK"),
            Self::Timeout => write!(f, "TIMEOUT"),
            Self::Unavailable => write!(f, "UNAVAILABLE"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl ErrorCategory {
    /// Check if this category is retryable on the same model
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimit)
    }
}

// =============================================================================
// Provider Error
// =============================================================================

/// Provider failure with the signals needed to classify it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    /// Error category for routing decisions
    pub category: ErrorCategory,
    /// Detailed error message (provider body or transport error)
    pub message: String,
    /// Model that produced the error
    pub model: Option<String>,
    /// HTTP status, when the provider answered
    pub status: Option<u16>,
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.model, self.status) {
            (Some(model), Some(status)) => {
                write!(f, "[{}:{}:{}] {}", model, self.category, status, self.message)
            }
            (Some(model), None) => write!(f, "[{}:{}] {}", model, self.category, self.message),
            (None, _) => write!(f, "[{}] {}", self.category, self.message),
        }
    }
}

impl std::error::Error for ProviderError {}

impl ProviderError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            model: None,
            status: None,
        }
    }

    /// Add model context
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Add HTTP status context
    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn is_rate_limited(&self) -> bool {
        self.category == ErrorCategory::RateLimit
    }

    pub fn is_retryable(&self) -> bool {
        self.category.is_retryable()
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

/// Error classifier for provider failures
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify an error message from the provider or transport
    pub fn classify(message: &str, model: &str) -> ProviderError {
        let lower = message.to_lowercase();

        if Self::mentions_rate_limit(&lower) {
            return ProviderError::new(ErrorCategory::RateLimit, message).model(model);
        }

        if lower.contains("timed out") || lower.contains("timeout") || lower.contains("deadline")
        {
            return ProviderError::new(ErrorCategory::Timeout, message).model(model);
        }

        if lower.contains("api key")
            || lower.contains("unauthenticated")
            || lower.contains("permission_denied")
            || lower.contains("permission denied")
        {
            return ProviderError::new(ErrorCategory::Auth, message).model(model);
        }

        if lower.contains("connection")
            || lower.contains("dns")
            || lower.contains("network")
            || lower.contains("unreachable")
        {
            return ProviderError::new(ErrorCategory::Network, message).model(model);
        }

        if lower.contains("not found")
            || lower.contains("unavailable")
            || lower.contains("internal error")
        {
            return ProviderError::new(ErrorCategory::Unavailable, message).model(model);
        }

        if lower.contains("invalid_argument") || lower.contains("bad request") {
            return ProviderError::new(ErrorCategory::BadRequest, message).model(model);
        }

        ProviderError::new(ErrorCategory::Unknown, message).model(model)
    }

    /// Classify an HTTP error response. The body is consulted as well because
    /// the provider may report `RESOURCE_EXHAUSTED` under a non-429 status.
    pub fn classify_http_status(status: u16, body: &str, model: &str) -> ProviderError {
        if Self::mentions_rate_limit(&body.to_lowercase()) {
            return ProviderError::new(ErrorCategory::RateLimit, body)
                .model(model)
                .status(status);
        }

        let category = match status {
            429 => ErrorCategory::RateLimit,
            400 => ErrorCategory::BadRequest,
            401 | 403 => ErrorCategory::Auth,
            404 | 500 | 502 | 503 => ErrorCategory::Unavailable,
            408 | 504 => ErrorCategory::Timeout,
            _ => ErrorCategory::Unknown,
        };
        ProviderError::new(category, body).model(model).status(status)
    }

    fn mentions_rate_limit(lower: &str) -> bool {
        lower.contains("429")
            || lower.contains("resource_exhausted")
            || lower.contains("resource exhausted")
            || lower.contains("rate limit")
            || lower.contains("too many requests")
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum GuardError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Caller Errors
    // -------------------------------------------------------------------------
    /// Missing credential or invalid settings
    #[error("{0}")]
    Config(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // -------------------------------------------------------------------------
    // Provider Errors
    // -------------------------------------------------------------------------
    #[error("Provider error: {0}")]
    Provider(ProviderError),

    /// Every candidate model failed; carries the error of the last call
    #[error("All models exhausted after {attempts} attempts: {last}")]
    Exhausted { attempts: usize, last: ProviderError },

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("Timeout after {duration:?}: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    #[error("Server error: {0}")]
    Server(String),
}

impl From<ProviderError> for GuardError {
    fn from(err: ProviderError) -> Self {
        GuardError::Provider(err)
    }
}

pub type Result<T> = std::result::Result<T, GuardError>;

impl GuardError {
    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }

    /// Errors the caller can fix; surfaced with detail (400-class)
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::Config(_) | Self::InvalidRequest(_))
    }

    /// View this error as a provider failure for the orchestrator
    pub fn into_provider_error(self, model: &str) -> ProviderError {
        match self {
            Self::Provider(err) => err,
            Self::Timeout { .. } => {
                ProviderError::new(ErrorCategory::Timeout, self.to_string()).model(model)
            }
            other => ErrorClassifier::classify(&other.to_string(), model),
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
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::RateLimit.to_string(), "RATE_LIMIT");
        assert_eq!(ErrorCategory::Timeout.to_string(), "TIMEOUT");
        assert_eq!(ErrorCategory::Auth.to_string(), "AUTH");
    }

    #[test]
    fn test_only_rate_limit_is_retryable() {
        assert!(ErrorCategory::RateLimit.is_retryable());
        assert!(!ErrorCategory::Network.is_retryable());
        assert!(!ErrorCategory::Timeout.is_retryable());
        assert!(!ErrorCategory::Unavailable.is_retryable());
        assert!(!ErrorCategory::Unknown.is_retryable());
    }

    #[test]
    fn test_classify_resource_exhausted() {
        let err = ErrorClassifier::classify(
            "429 RESOURCE_EXHAUSTED. Quota exceeded for metric generate_content",
            "gemini-2.0-flash",
        );
        assert!(err.is_rate_limited());
        assert_eq!(err.model.as_deref(), Some("gemini-2.0-flash"));
    }

    #[test]
    fn test_classify_plain_failure_is_not_rate_limited() {
        let err = ErrorClassifier::classify("Something weird happened", "m");
        assert_eq!(err.category, ErrorCategory::Unknown);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_classify_network_and_auth() {
        let net = ErrorClassifier::classify("error sending request: connection refused", "m");
        assert_eq!(net.category, ErrorCategory::Network);

        let auth = ErrorClassifier::classify("API key not valid. Please pass a valid API key.", "m");
        assert_eq!(auth.category, ErrorCategory::Auth);
    }

    #[test]
    fn test_classify_http_status() {
        let rate = ErrorClassifier::classify_http_status(429, "slow down", "m");
        assert_eq!(rate.category, ErrorCategory::RateLimit);
        assert_eq!(rate.status, Some(429));

        let not_found = ErrorClassifier::classify_http_status(404, "models/x is not found", "m");
        assert_eq!(not_found.category, ErrorCategory::Unavailable);

        let bad = ErrorClassifier::classify_http_status(400, "{}", "m");
        assert_eq!(bad.category, ErrorCategory::BadRequest);
    }

    #[test]
    fn test_classify_http_status_reads_body_status() {
        let body = r#"{"error":{"code":503,"status":"RESOURCE_EXHAUSTED"}}"#;
        let err = ErrorClassifier::classify_http_status(503, body, "m");
        assert!(err.is_rate_limited());
    }

    #[test]
    fn test_provider_error_display() {
        let err = ProviderError::new(ErrorCategory::RateLimit, "Too many requests")
            .model("gemini-1.5-pro")
            .status(429);
        assert_eq!(err.to_string(), "[gemini-1.5-pro:RATE_LIMIT:429] Too many requests");

        let bare = ProviderError::new(ErrorCategory::Network, "Connection failed");
        assert_eq!(bare.to_string(), "[NETWORK] Connection failed");
    }

    #[test]
    fn test_caller_errors() {
        assert!(GuardError::Config("missing key".into()).is_caller_error());
        assert!(GuardError::InvalidRequest("blank".into()).is_caller_error());
        assert!(!GuardError::malformed("not json").is_caller_error());
        let exhausted = GuardError::Exhausted {
            attempts: 3,
            last: ProviderError::new(ErrorCategory::Unknown, "boom"),
        };
        assert!(!exhausted.is_caller_error());
    }

    #[test]
    fn test_timeout_maps_to_timeout_category() {
        let err = GuardError::timeout("provider call", Duration::from_secs(1))
            .into_provider_error("gemini-2.0-flash");
        assert_eq!(err.category, ErrorCategory::Timeout);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_quota_wording_alone_is_not_rate_limited() {
        let body = "code 400: Quota project is not set for this request";
        let err = ErrorClassifier::classify_http_status(400, body, "gemini-2.0-flash");
        assert_eq!(err.category, ErrorCategory::BadRequest);
        assert!(!err.is_retryable());

        let err = ErrorClassifier::classify("user quota settings are invalid", "m");
        assert!(!err.is_rate_limited());

        let err = ErrorClassifier::classify_http_status(
            429,
            "code RESOURCE_EXHAUSTED: Quota exceeded",
            "gemini-2.0-flash",
        );
        assert!(err.is_rate_limited());
    }
}
