use std::{future::Future, pin::Pin, time::Duration};

use tokio::time::sleep;

/// How often and how patiently a cache write is retried.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(20),
        }
    }
}

/// Runs `operation` until it succeeds, the policy runs out, or it fails
/// with an error `is_transient` rejects. The delay doubles after each try.
pub async fn retry_with_backoff<F, T, E>(
    mut operation: F,
    is_transient: impl Fn(&E) -> bool,
    policy: RetryPolicy,
) -> Result<T, E>
where
    F: FnMut() -> Pin<Box<dyn Future<Output = Result<T, E>> + Send>>,
    E: std::fmt::Display,
{
    let mut delay = policy.initial_delay;
    for attempt in 1..=policy.max_retries {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if is_transient(&e) => {
                tracing::warn!("Cache write attempt {attempt} failed: {e}. Retrying in {delay:?}");
                sleep(delay).await;
                delay *= 2;
            }
            Err(e) => {
                tracing::debug!("Not retrying permanent failure: {e}");
                return Err(e);
            }
        }
    }
    operation().await
}

/// SQLite busy/locked results and pool or I/O hiccups are worth another try;
/// anything else (missing table, constraint, bad SQL) will fail again.
pub fn is_transient_sqlx(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db) => db
            .code()
            .and_then(|code| code.parse::<i32>().ok())
            .is_some_and(|code| matches!(code & 0xff, 5 | 6)),
        sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    fn quick(max_retries: usize) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            initial_delay: Duration::from_millis(1),
        }
    }

    fn counting<T: Send + 'static>(
        calls: &Arc<AtomicUsize>,
        outcome: impl Fn(usize) -> Result<T, String> + Send + Sync + Clone + 'static,
    ) -> impl FnMut() -> Pin<Box<dyn Future<Output = Result<T, String>> + Send>> {
        let counter = calls.clone();
        move || {
            let counter = counter.clone();
            let outcome = outcome.clone();
            Box::pin(async move { outcome(counter.fetch_add(1, Ordering::SeqCst)) })
        }
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let op = counting(&calls, |n| if n < 2 { Err(format!("locked {n}")) } else { Ok(n) });
        let result = retry_with_backoff(op, |_| true, quick(3)).await;
        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let calls = Arc::new(AtomicUsize::new(0));
        let op = counting(&calls, |_| Err::<(), _>("still locked".to_string()));
        let result = retry_with_backoff(op, |_| true, quick(2)).await;
        assert_eq!(result, Err("still locked".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_fails_fast() {
        let calls = Arc::new(AtomicUsize::new(0));
        let op = counting(&calls, |_| Err::<(), _>("no such table".to_string()));
        let result = retry_with_backoff(op, |e: &String| e.contains("locked"), quick(5)).await;
        assert_eq!(result, Err("no such table".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_row_not_found_is_not_transient() {
        assert!(!is_transient_sqlx(&sqlx::Error::RowNotFound));
        assert!(is_transient_sqlx(&sqlx::Error::PoolTimedOut));
    }
}
