//! Bounded retry for expensive supplier calls.
//!
//! Detail fetches cost a browser launch or paid API quota, so retries are
//! capped at a small constant number of attempts with a fixed delay,
//! never an unbounded loop. Rate-limit signals are deliberately *not*
//! retried here: they require a cooldown, which is the caller's call.

use std::future::Future;
use std::time::Duration;

use crate::error::SupplierError;

/// Returns `true` for errors worth one more attempt after a fixed delay.
///
/// Retriable: network-level failures (timeout, connection reset) and 5xx
/// gateway errors. Everything else (`NotFound`, `RateLimited`, API-level
/// errors, deserialization failures, missing credentials) is returned
/// immediately; retrying cannot change the outcome.
fn is_retriable(err: &SupplierError) -> bool {
    match err {
        SupplierError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        SupplierError::UnexpectedStatus { status, .. } => *status >= 500,
        SupplierError::Deserialize { .. }
        | SupplierError::NotFound { .. }
        | SupplierError::RateLimited { .. }
        | SupplierError::MissingCredential { .. }
        | SupplierError::InvalidBaseUrl { .. }
        | SupplierError::UnknownDefaultSupplier { .. }
        | SupplierError::Api { .. } => false,
    }
}

/// Runs `operation`, retrying transient failures up to `max_retries`
/// additional times with a fixed `delay` between attempts.
///
/// With `max_retries = 2` the operation runs at most 3 times. Non-retriable
/// errors propagate immediately without sleeping.
pub(crate) async fn retry_fixed<T, F, Fut>(
    max_retries: u32,
    delay: Duration,
    mut operation: F,
) -> Result<T, SupplierError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SupplierError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "transient supplier error, retrying after fixed delay"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    fn gateway_timeout() -> SupplierError {
        SupplierError::UnexpectedStatus {
            status: 504,
            url: "https://api.example/scraper".to_owned(),
        }
    }

    #[test]
    fn rate_limited_is_not_retriable() {
        assert!(!is_retriable(&SupplierError::RateLimited {
            supplier: "cj",
            retry_after_secs: 300,
        }));
    }

    #[test]
    fn not_found_is_not_retriable() {
        assert!(!is_retriable(&SupplierError::NotFound {
            supplier: "cj",
            external_id: "123".to_owned(),
        }));
    }

    #[test]
    fn gateway_errors_are_retriable() {
        assert!(is_retriable(&gateway_timeout()));
        assert!(!is_retriable(&SupplierError::UnexpectedStatus {
            status: 403,
            url: String::new(),
        }));
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_fixed(2, Duration::ZERO, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, SupplierError>(7)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_gateway_timeout_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_fixed(2, Duration::ZERO, || {
            let c = Arc::clone(&c);
            async move {
                let attempt = c.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt < 3 {
                    Err(gateway_timeout())
                } else {
                    Ok::<u32, SupplierError>(99)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 99);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausts_retries_and_surfaces_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_fixed(2, Duration::ZERO, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(gateway_timeout())
            }
        })
        .await;
        // 1 initial + 2 retries, never more.
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(
            result,
            Err(SupplierError::UnexpectedStatus { status: 504, .. })
        ));
    }

    #[tokio::test]
    async fn does_not_retry_rate_limited() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_fixed(2, Duration::ZERO, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(SupplierError::RateLimited {
                    supplier: "cj",
                    retry_after_secs: 300,
                })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1, "rate limits need a cooldown, not a retry");
        assert!(matches!(result, Err(SupplierError::RateLimited { .. })));
    }
}
