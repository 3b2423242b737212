//! Retry bookkeeping for the fetch loop.
//!
//! A fetch moves through
//! `Attempting -> Backoff -> Attempting | Terminal | Success`. Transport
//! failures, 429 and 500 lead to `Backoff` while attempts remain; every other
//! failure is terminal on first sight.

use std::time::Duration;

use bytes::Bytes;
use docfetch_core::Error;
use tokio_util::sync::CancellationToken;

/// Default number of attempts per fetch, including the first.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Delay before the second attempt; doubles for every attempt after that.
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(1);

/// States of a single fetch.
#[derive(Debug)]
pub(crate) enum FetchState {
    Attempting { attempt: u32 },
    Backoff { next_attempt: u32, delay: Duration },
    Success { body: Bytes, attempts: u32 },
    Terminal(Error),
}

/// Delay to wait after `failed_attempt` (1-indexed) before the next one.
///
/// With a one second base this is 1s after the first failure, 2s after the second.
pub fn backoff_delay(base: Duration, failed_attempt: u32) -> Duration {
    let exponent = failed_attempt.saturating_sub(1).min(16);
    base.saturating_mul(1 << exponent)
}

/// Decide where a failed attempt leads.
pub(crate) fn after_failure(err: Error, attempt: u32, max_attempts: u32, base: Duration) -> FetchState {
    if !err.is_retryable() {
        return FetchState::Terminal(err);
    }
    if attempt < max_attempts {
        return FetchState::Backoff { next_attempt: attempt + 1, delay: backoff_delay(base, attempt) };
    }
    FetchState::Terminal(exhausted(err, attempt))
}

/// Rewrite a retryable error into its terminal form once the budget is spent.
fn exhausted(err: Error, attempts: u32) -> Error {
    match err {
        Error::Network { url, message, .. } => Error::Network { url, attempts, message },
        Error::HttpStatus { url, code, class } => Error::RetriesExhausted { url, code, class, attempts },
        other => other,
    }
}

/// Sleep for `delay` unless `cancel` fires first.
///
/// Cancellation is checked before the wait starts and raced against it.
pub(crate) async fn wait_or_cancel(cancel: &CancellationToken, delay: Duration, url: &str) -> Result<(), Error> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled(url.to_string()));
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled(url.to_string())),
        _ = tokio::time::sleep(delay) => Ok(()),
    }
}
