//! Retrying extraction client
//!
//! Wraps a single `ExtractionProvider` with an explicit retry loop:
//!
//! 1. Stop if the request was cancelled
//! 2. Run one attempt under the per-attempt timeout
//! 3. On a retryable failure, wait `base * 2^(n-1)` (capped, honouring
//!    Retry-After, optionally jittered) and go again
//! 4. Anything else propagates immediately
//!
//! Sleeping goes through the `Sleeper` trait so tests can record the
//! backoff schedule without waiting for it.

use futures::FutureExt;
use futures::future::BoxFuture;
use rand::Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::prompt::ModelPayload;
use super::provider::{RawModelOutput, SharedProvider};
use super::timeout::{with_cancellation, with_timeout};
use crate::constants::{network as net_constants, retry as retry_constants};
use crate::types::{Result, ScribeError};

// =============================================================================
// Policy
// =============================================================================

/// Declared retry behaviour for one extraction
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first (at least 1)
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub base_delay: Duration,
    /// Upper bound for any single delay, Retry-After included
    pub max_delay: Duration,
    /// Add up to a quarter of the delay at random
    pub jitter: bool,
    /// Deadline for each individual attempt
    pub attempt_timeout: Duration,
    /// Which failures are worth another attempt
    pub is_retryable: fn(&ScribeError) -> bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: retry_constants::MAX_ATTEMPTS,
            base_delay: Duration::from_millis(retry_constants::BASE_DELAY_MS),
            max_delay: Duration::from_millis(retry_constants::MAX_DELAY_MS),
            jitter: true,
            attempt_timeout: Duration::from_secs(net_constants::DEFAULT_TIMEOUT_SECS),
            is_retryable: ScribeError::is_transient,
        }
    }
}

impl RetryPolicy {
    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// Delay after failed attempt `attempt` (1-based), before jitter
    pub fn delay_for(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let backoff = self
            .base_delay
            .saturating_mul(retry_constants::BACKOFF_FACTOR.saturating_pow(exponent));
        let delay = match retry_after {
            Some(hint) => backoff.max(hint),
            None => backoff,
        };
        delay.min(self.max_delay)
    }

    /// Longest a whole `extract` call can take: every attempt timing out
    /// plus the full backoff schedule between them, jitter included.
    /// A Retry-After hint above the schedule can push past this.
    pub fn overall_deadline(&self) -> Duration {
        let attempts = self.max_attempts.max(1);
        let mut total = self.attempt_timeout.saturating_mul(attempts);
        for attempt in 1..attempts {
            let delay = self.delay_for(attempt, None);
            total = total.saturating_add(delay);
            if self.jitter {
                total = total.saturating_add(max_jitter(delay));
            }
        }
        total
    }

    fn jittered(&self, delay: Duration) -> Duration {
        if !self.jitter {
            return delay;
        }
        let max_jitter_ms = max_jitter(delay).as_millis() as u64;
        if max_jitter_ms == 0 {
            return delay;
        }
        delay + Duration::from_millis(rand::rng().random_range(0..max_jitter_ms))
    }
}

fn max_jitter(delay: Duration) -> Duration {
    delay / retry_constants::JITTER_DIVISOR
}

// =============================================================================
// Sleeper
// =============================================================================

/// Source of backoff waits
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()>;
}

/// Real wall-clock sleeping
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        tokio::time::sleep(duration).boxed()
    }
}

// =============================================================================
// Client
// =============================================================================

/// Stateless retrying front for one provider
#[derive(Clone)]
pub struct ExtractionClient {
    provider: SharedProvider,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl ExtractionClient {
    pub fn new(provider: SharedProvider, policy: RetryPolicy) -> Self {
        Self {
            provider,
            policy,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn provider(&self) -> &SharedProvider {
        &self.provider
    }

    /// Run the payload through the provider, retrying transient failures
    pub async fn extract(
        &self,
        payload: &ModelPayload,
        cancel: &CancellationToken,
    ) -> Result<RawModelOutput> {
        let max_attempts = self.policy.max_attempts.max(1);
        let start = Instant::now();

        for attempt in 1..=max_attempts {
            if cancel.is_cancelled() {
                info!(attempt, "Extraction cancelled before attempt");
                return Err(ScribeError::Cancelled);
            }

            let call = with_timeout(
                self.policy.attempt_timeout,
                self.provider.generate(payload),
                "model request",
            );

            let err = match with_cancellation(cancel, call).await {
                Ok(output) => {
                    debug!(
                        provider = self.provider.name(),
                        attempt,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "Model call succeeded"
                    );
                    return Ok(output);
                }
                Err(ScribeError::Cancelled) => {
                    info!(attempt, "Extraction cancelled during model call");
                    return Err(ScribeError::Cancelled);
                }
                Err(err) => err,
            };

            let retryable = (self.policy.is_retryable)(&err);
            warn!(
                provider = self.provider.name(),
                attempt,
                max_attempts,
                retryable,
                error = %err,
                "Model call failed"
            );

            if !retryable || attempt == max_attempts {
                return Err(err);
            }

            let delay = self
                .policy
                .jittered(self.policy.delay_for(attempt, err.retry_after()));
            info!(delay_ms = delay.as_millis() as u64, "Retrying after backoff");

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(attempt, "Extraction cancelled during backoff");
                    return Err(ScribeError::Cancelled);
                }
                _ = self.sleeper.sleep(delay) => {}
            }
        }

        // The loop always returns on its final attempt
        Err(ScribeError::Cancelled)
    }
}
