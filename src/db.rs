//! Connection pooling for the Storage Layer (C2). All repositories in
//! `repos/` take a clone of `PgPool` and hop onto a blocking thread for
//! the actual Diesel call, matching the teacher's repository style.

use anyhow::{Context, Result};
use diesel::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};

pub type PgPool = Pool<ConnectionManager<PgConnection>>;
pub type PgPooledConnection = PooledConnection<ConnectionManager<PgConnection>>;

pub fn build_pool(database_url: &str) -> Result<PgPool> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder()
        .max_size(10)
        .build(manager)
        .context("failed to build Postgres connection pool")
}

/// Marks an error as having survived every retry attempt, so callers at
/// the `AnalysisError` boundary can tell a permanent failure (retries
/// already exhausted) apart from one that hasn't been retried at all.
#[derive(Debug, thiserror::Error)]
#[error("storage operation failed after exhausting retries: {source}")]
pub struct RetriesExhausted {
    #[source]
    pub source: anyhow::Error,
}

/// True if `err` (or anything in its anyhow chain) is a
/// [`RetriesExhausted`] — i.e. came out of [`with_retry`] after all
/// attempts failed, meaning a further retry wouldn't help and the
/// failure is permanent for this request.
pub fn retries_exhausted(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| cause.downcast_ref::<RetriesExhausted>().is_some())
}

/// Retries a storage operation up to 3 times with exponential backoff
/// (50ms, 100ms, 200ms) before giving up, reserved for transient
/// failures rather than permanent ones. The retried closure runs
/// synchronously inside `tokio::task::spawn_blocking` at the call site.
/// An `Err` result always means retries were exhausted (see
/// [`retries_exhausted`]) — this function only ever returns once 3
/// attempts have failed, never after a single unretried failure.
pub async fn with_retry<T, F, Fut>(mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut delay_ms = 50u64;
    let mut last_err = None;
    for attempt in 0..3 {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) => {
                last_err = Some(e);
                if attempt < 2 {
                    tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
                    delay_ms *= 2;
                }
            }
        }
    }
    Err(anyhow::Error::new(RetriesExhausted { source: last_err.unwrap() }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn with_retry_returns_a_retries_exhausted_error_after_three_attempts() {
        let attempts = AtomicUsize::new(0);
        let result: Result<()> = with_retry(|| {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(anyhow::anyhow!("always fails")) }
        })
        .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        let err = result.unwrap_err();
        assert!(retries_exhausted(&err));
    }

    #[tokio::test]
    async fn with_retry_succeeds_without_exhausting() {
        let attempts = AtomicUsize::new(0);
        let result = with_retry(|| {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move { if n < 1 { Err(anyhow::anyhow!("transient")) } else { Ok(42) } }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
    }

    #[test]
    fn retries_exhausted_is_false_for_an_unrelated_error() {
        let err = anyhow::anyhow!("some other failure");
        assert!(!retries_exhausted(&err));
    }
}
