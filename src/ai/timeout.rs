//! Timeout and cancellation helpers
//!
//! Every model attempt runs under a deadline and a cancellation token.
//!
//! ## Usage
//!
//! ```ignore
//! use crate::ai::timeout::{health_check_timeout, with_timeout};
//!
//! let healthy = with_timeout(
//!     health_check_timeout(),
//!     provider.health_check(),
//!     "provider health check",
//! ).await?;
//! ```

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::constants::network as net_constants;
use crate::types::{Result, ScribeError};

/// Deadline for a provider reachability check (10 seconds)
pub fn health_check_timeout() -> Duration {
    Duration::from_secs(net_constants::HEALTH_CHECK_TIMEOUT_SECS)
}

/// Execute an async operation with a timeout
///
/// Returns `ScribeError::Timeout` if the operation doesn't complete in time.
pub async fn with_timeout<T, F>(timeout: Duration, future: F, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(ScribeError::timeout(operation_name, timeout)),
    }
}

/// Run `future` until it finishes or `cancel` fires
///
/// The future is dropped on cancellation, which aborts any in-flight request.
pub async fn with_cancellation<T, F>(cancel: &CancellationToken, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ScribeError::Cancelled),
        result = future => result,
    }
}
