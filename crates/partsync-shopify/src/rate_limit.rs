//! Retry and pacing for Admin API calls.
//!
//! [`retry_with_backoff`] retries transient failures with jittered exponential
//! backoff. Reads retry on 429 and network errors ([`is_retriable`]); mutations
//! retry on 429 only ([`is_rate_limited`]), since a request that timed out may
//! already have been applied. [`Throttle`] spaces consecutive calls a
//! fixed interval apart; batch loops own one and wait on it before every call.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::ShopifyError;

pub(crate) const MAX_DELAY_MS: u64 = 60_000;

/// Returns `true` if `err` is worth retrying after a backoff delay.
///
/// Only [`ShopifyError::RateLimited`] and [`ShopifyError::Http`] (network,
/// timeout, body read) qualify. Status errors, GraphQL errors and user errors
/// come back the same on every attempt.
pub(crate) fn is_retriable(err: &ShopifyError) -> bool {
    matches!(
        err,
        ShopifyError::RateLimited { .. } | ShopifyError::Http(_)
    )
}

/// Returns `true` only for [`ShopifyError::RateLimited`]: the server refused
/// the request without applying it.
pub(crate) fn is_rate_limited(err: &ShopifyError) -> bool {
    matches!(err, ShopifyError::RateLimited { .. })
}

/// Delay before retry number `attempt` (1-based): `base * 2^(attempt-1)` with
/// ±25 % jitter, capped at 60 s, never shorter than a server `Retry-After`.
fn backoff_delay(err: &ShopifyError, attempt: u32, backoff_base_secs: u64) -> Duration {
    let computed = backoff_base_secs
        .saturating_mul(1000)
        .saturating_mul(1u64 << (attempt - 1).min(10));
    let capped = computed.min(MAX_DELAY_MS);
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let jittered_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;

    let floor_ms = match err {
        ShopifyError::RateLimited { retry_after_secs } => retry_after_secs.saturating_mul(1000),
        _ => 0,
    };
    Duration::from_millis(jittered_ms.max(floor_ms))
}

/// Runs `operation` with up to `max_retries` additional attempts on errors
/// accepted by `retriable`.
///
/// With `max_retries = 3` the operation is attempted at most 4 times. The last
/// error is returned once retries are exhausted; other errors are returned
/// immediately.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    retriable: fn(&ShopifyError) -> bool,
    mut operation: F,
) -> Result<T, ShopifyError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ShopifyError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let delay = backoff_delay(&err, attempt, backoff_base_secs);
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "transient Admin API error, retrying after backoff"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Fixed minimum spacing between outbound calls.
#[derive(Debug)]
pub struct Throttle {
    interval: Duration,
    last_call: Option<Instant>,
}

impl Throttle {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_call: None,
        }
    }

    #[must_use]
    pub fn from_millis(interval_ms: u64) -> Self {
        Self::new(Duration::from_millis(interval_ms))
    }

    /// Sleeps until at least `interval` has passed since the previous call
    /// returned from `wait`. The first call never sleeps.
    pub async fn wait(&mut self) {
        if let Some(last) = self.last_call {
            tokio::time::sleep_until(last + self.interval).await;
        }
        self.last_call = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn rate_limited() -> ShopifyError {
        ShopifyError::RateLimited {
            retry_after_secs: 0,
        }
    }

    #[test]
    fn status_and_graphql_errors_are_not_retriable() {
        assert!(!is_retriable(&ShopifyError::NotFound {
            url: "https://x/products/1.json".to_owned()
        }));
        assert!(!is_retriable(&ShopifyError::UnexpectedStatus {
            status: 500,
            url: "https://x/graphql.json".to_owned()
        }));
        assert!(!is_retriable(&ShopifyError::GraphQl("boom".to_owned())));
        assert!(is_retriable(&rate_limited()));
    }

    #[test]
    fn only_rate_limits_are_retried_for_mutations() {
        assert!(is_rate_limited(&rate_limited()));
        assert!(!is_rate_limited(&ShopifyError::GraphQl("boom".to_owned())));
        assert!(!is_rate_limited(&ShopifyError::UnexpectedStatus {
            status: 502,
            url: "https://x/graphql.json".to_owned()
        }));
    }

    #[test]
    fn retry_after_is_the_minimum_delay() {
        let err = ShopifyError::RateLimited {
            retry_after_secs: 7,
        };
        assert!(backoff_delay(&err, 1, 0) >= Duration::from_secs(7));
    }

    #[test]
    fn backoff_is_capped() {
        let delay = backoff_delay(&rate_limited(), 30, 3600);
        assert!(delay <= Duration::from_millis(MAX_DELAY_MS * 5 / 4));
    }

    #[tokio::test]
    async fn retries_on_rate_limited_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, is_retriable, || {
            let c = Arc::clone(&c);
            async move {
                if c.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(rate_limited())
                } else {
                    Ok::<u32, ShopifyError>(99)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 99);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(2, 0, is_retriable, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, ShopifyError>(rate_limited())
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(result, Err(ShopifyError::RateLimited { .. })));
    }

    #[tokio::test]
    async fn user_errors_are_returned_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, is_retriable, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, ShopifyError>(ShopifyError::UserErrors {
                    operation: "productCreate",
                    messages: vec!["Title can't be blank".to_owned()],
                })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(ShopifyError::UserErrors { .. })));
    }

    #[tokio::test]
    async fn mutation_policy_returns_non_rate_limit_errors_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, is_rate_limited, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, ShopifyError>(ShopifyError::UnexpectedStatus {
                    status: 504,
                    url: "https://x/graphql.json".to_owned(),
                })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(ShopifyError::UnexpectedStatus { status: 504, .. })));
    }

    #[tokio::test]
    async fn throttle_spaces_calls() {
        let mut throttle = Throttle::from_millis(30);
        let start = Instant::now();
        throttle.wait().await;
        assert!(start.elapsed() < Duration::from_millis(30));
        throttle.wait().await;
        throttle.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(60));
    }
}
