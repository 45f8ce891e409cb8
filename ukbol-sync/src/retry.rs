//! Retry logic for remote page fetches
//!
//! Exponential backoff around a single fallible request. Only errors that
//! [`SyncError::is_transient`] accepts are retried; anything else fails the
//! operation immediately.

use crate::error::{Result, SyncError};
use std::time::{Duration, Instant};
use ukbol_common::config::NbnConfig;

/// Backoff policy for one operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub initial: Duration,
    pub max: Duration,
}

impl Backoff {
    pub fn from_config(config: &NbnConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial: Duration::from_millis(config.initial_backoff_ms),
            max: Duration::from_millis(config.max_backoff_ms),
        }
    }
}

/// Retry an operation with exponential backoff until it succeeds, fails
/// permanently, or runs out of retries.
///
/// **Backoff Strategy:**
/// - First delay: `backoff.initial`
/// - Each further delay doubles, capped at `backoff.max`
///
/// # Arguments
/// * `operation_name` - Name for logging (e.g., "nbn page 400")
/// * `backoff` - Retry budget and delays
/// * `operation` - Closure producing a fresh attempt each call
pub async fn retry_transient<F, Fut, T>(
    operation_name: &str,
    backoff: &Backoff,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let start_time = Instant::now();
    let mut attempt: u32 = 0;
    let mut delay = backoff.initial;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = start_time.elapsed().as_millis(),
                        "Operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) if !err.is_transient() => return Err(err),
            Err(err) => {
                if attempt > backoff.max_retries {
                    tracing::error!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = start_time.elapsed().as_millis(),
                        error = %err,
                        "Giving up after max retries"
                    );
                    return Err(err);
                }

                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    backoff_ms = delay.as_millis(),
                    error = %err,
                    "Transient failure, will retry after backoff"
                );

                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(backoff.max);
            }
        }
    }
}

/// Convenience for call sites that build the error themselves
pub fn network_error(err: impl std::fmt::Display) -> SyncError {
    SyncError::Network(err.to_string())
}
