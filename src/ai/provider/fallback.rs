//! Ordered Model Fallback with Rate-Limit Backoff
//!
//! Walks a list of candidate models in order, giving each up to
//! `max_retries` attempts.
//!
//! ## Strategy
//!
//! 1. Call the current model under a per-call deadline
//! 2. On success, return immediately
//! 3. On a rate-limit failure, wait `base_delay * 2^(attempt-1)` and retry
//!    the same model (the wait also follows the final attempt)
//! 4. On any other failure, move to the next model without waiting
//! 5. When every model has failed, return the last observed error

use std::time::{Duration, Instant};

use tokio::time::sleep;
use tracing::{info, instrument, warn};

use super::{GenerationConfig, ModelResponse, ProviderError, SharedModelClient};
use crate::ai::timeout::with_timeout;
use crate::config::RetryConfig;
use crate::types::{GuardError, Result};

/// Retry budget and backoff base
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per model
    pub max_retries: u32,
    /// Wait after the first rate-limited attempt; doubles per attempt
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_secs(config.base_delay_secs),
        }
    }
}

impl RetryPolicy {
    /// Backoff after the given 1-based rate-limited attempt
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1u32 << exponent)
    }
}

/// Outcome of a single provider call
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    pub model: String,
    /// 1-based attempt number on this model
    pub attempt: u32,
    pub error: Option<ProviderError>,
    pub duration_ms: u64,
}

/// Execution statistics for one invocation
#[derive(Debug, Default)]
pub struct InvocationStats {
    pub total_attempts: usize,
    pub successful_model: Option<String>,
    pub attempts: Vec<AttemptRecord>,
    /// Waits performed after rate-limited attempts, in order
    pub backoffs: Vec<Duration>,
    pub total_duration_ms: u64,
}

/// Sequential model fallback over a single provider client
pub struct FallbackInvoker {
    client: SharedModelClient,
    policy: RetryPolicy,
    call_timeout: Duration,
}

impl FallbackInvoker {
    pub fn new(client: SharedModelClient, policy: RetryPolicy, call_timeout: Duration) -> Self {
        Self {
            client,
            policy,
            call_timeout,
        }
    }

    /// Try each model in order until one returns a response.
    ///
    /// Returns `GuardError::Exhausted` carrying the last provider error when
    /// every model fails, and `GuardError::Config` for an empty model list.
    #[instrument(skip(self, content, config), fields(models = models.len(), provider = self.client.name()))]
    pub async fn invoke(
        &self,
        models: &[String],
        content: &str,
        config: &GenerationConfig,
    ) -> Result<(ModelResponse, InvocationStats)> {
        let mut stats = InvocationStats::default();
        let start_time = Instant::now();

        if models.is_empty() {
            return Err(GuardError::Config(
                "No candidate models configured".to_string(),
            ));
        }

        let mut last_error: Option<ProviderError> = None;

        for model in models {
            for attempt in 1..=self.policy.max_retries {
                stats.total_attempts += 1;
                let attempt_start = Instant::now();

                info!(
                    model = %model,
                    attempt,
                    max_retries = self.policy.max_retries,
                    "Calling model"
                );

                let outcome = with_timeout(
                    self.call_timeout,
                    self.client.generate(model, content, config),
                    "model call",
                )
                .await;
                let duration_ms = attempt_start.elapsed().as_millis() as u64;

                match outcome {
                    Ok(response) => {
                        stats.attempts.push(AttemptRecord {
                            model: model.clone(),
                            attempt,
                            error: None,
                            duration_ms,
                        });
                        stats.successful_model = Some(model.clone());
                        stats.total_duration_ms = start_time.elapsed().as_millis() as u64;

                        info!(
                            model = %model,
                            attempts = stats.total_attempts,
                            "Model call succeeded"
                        );
                        return Ok((response, stats));
                    }
                    Err(err) => {
                        let classified = err.into_provider_error(model);

                        stats.attempts.push(AttemptRecord {
                            model: model.clone(),
                            attempt,
                            error: Some(classified.clone()),
                            duration_ms,
                        });

                        let retryable = classified.is_retryable();
                        last_error = Some(classified);

                        if retryable {
                            let wait = self.policy.delay_for(attempt);
                            warn!(
                                model = %model,
                                attempt,
                                wait_secs = wait.as_secs(),
                                "Rate limited, backing off"
                            );
                            stats.backoffs.push(wait);
                            sleep(wait).await;
                        } else {
                            if let Some(err) = &last_error {
                                warn!(
                                    model = %model,
                                    attempt,
                                    category = %err.category,
                                    error = %err.message,
                                    "Model failed, trying next model"
                                );
                            }
                            break;
                        }
                    }
                }
            }
            warn!(model = %model, "All attempts exhausted for model, trying next fallback");
        }

        stats.total_duration_ms = start_time.elapsed().as_millis() as u64;

        match last_error {
            Some(last) => {
                warn!(
                    attempts = stats.total_attempts,
                    error = %last,
                    "All models exhausted"
                );
                Err(GuardError::Exhausted {
                    attempts: stats.total_attempts,
                    last,
                })
            }
            // max_retries == 0 means no call was ever made
            None => Err(GuardError::Config(
                "Retry budget allows no model calls".to_string(),
            )),
        }
    }
}
