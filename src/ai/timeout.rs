//! Deadline helpers for provider calls
//!
//! Every outbound model call is bounded so a hung provider cannot hold a
//! request open indefinitely.

use std::future::Future;
use std::time::Duration;

use crate::types::{GuardError, Result};

/// Execute an async operation with a timeout
///
/// Returns `GuardError::Timeout` if the operation doesn't complete within
/// `timeout`. The inner future is dropped on expiry, cancelling any
/// in-flight request it owns.
pub async fn with_timeout<T, F>(timeout: Duration, future: F, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(GuardError::timeout(operation_name, timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_timeout_success() {
        let result = with_timeout(
            Duration::from_secs(1),
            async { Ok::<_, GuardError>(42) },
            "provider call",
        )
        .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_timeout_expires() {
        let result = with_timeout(
            Duration::from_secs(60),
            async {
                tokio::time::sleep(Duration::from_secs(120)).await;
                Ok::<_, GuardError>(42)
            },
            "provider call",
        )
        .await;
        assert!(matches!(
            result.unwrap_err(),
            GuardError::Timeout { duration, .. } if duration == Duration::from_secs(60)
        ));
    }

    #[tokio::test]
    async fn test_with_timeout_passes_inner_error() {
        let result: Result<()> = with_timeout(
            Duration::from_secs(1),
            async { Err(GuardError::malformed("bad")) },
            "provider call",
        )
        .await;
        assert!(matches!(result.unwrap_err(), GuardError::MalformedResponse(_)));
    }
}
