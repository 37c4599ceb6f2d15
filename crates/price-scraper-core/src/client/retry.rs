use std::time::Duration;

use async_trait::async_trait;

use super::{Completion, Extractor};
use crate::error::Result;

const BASE_DELAY: Duration = Duration::from_millis(500);
const MAX_DELAY: Duration = Duration::from_secs(10);

/// Retries transient transport failures with exponential backoff (500ms, 1s, 2s, ...
/// capped at 10s). Everything else passes straight through.
pub struct Retrying<E> {
    inner: E,
    max_retries: u32,
}

impl<E: Extractor> Retrying<E> {
    pub fn new(inner: E, max_retries: u32) -> Self {
        Self { inner, max_retries }
    }
}

/// Delay before retry number `attempt` (1-based).
fn backoff(attempt: u32) -> Duration {
    BASE_DELAY
        .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
        .min(MAX_DELAY)
}

#[async_trait]
impl<E: Extractor> Extractor for Retrying<E> {
    async fn extract(&self, prompt: &str, content: &str) -> Result<Completion> {
        let mut attempt = 0u32;
        loop {
            match self.inner.extract(prompt, content).await {
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = backoff(attempt);
                    tracing::warn!(attempt, max = self.max_retries, ?delay, "{e}, retrying");
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }

    fn provider(&self) -> &str {
        self.inner.provider()
    }

    fn model(&self) -> &str {
        self.inner.model()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::error::ScrapeError;

    /// Fails with the given error `failures` times, then succeeds.
    struct Flaky {
        calls: AtomicU32,
        failures: u32,
        error: fn() -> ScrapeError,
    }

    #[async_trait]
    impl Extractor for Flaky {
        async fn extract(&self, _: &str, _: &str) -> Result<Completion> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                return Err((self.error)());
            }
            Ok(Completion {
                text: "{}".into(),
                prompt_tokens: 1,
                completion_tokens: 1,
            })
        }
        fn provider(&self) -> &str {
            "flaky"
        }
        fn model(&self) -> &str {
            "m"
        }
    }

    fn transport() -> ScrapeError {
        ScrapeError::Transport {
            status: Some(503),
            message: "overloaded".into(),
        }
    }

    fn bad_request() -> ScrapeError {
        ScrapeError::Transport {
            status: Some(400),
            message: "prompt is too long".into(),
        }
    }

    fn auth() -> ScrapeError {
        ScrapeError::Auth("nope".into())
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transport_until_success() {
        let r = Retrying::new(
            Flaky { calls: AtomicU32::new(0), failures: 2, error: transport },
            3,
        );
        assert!(r.extract("p", "c").await.is_ok());
        assert_eq!(r.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_retries() {
        let r = Retrying::new(
            Flaky { calls: AtomicU32::new(0), failures: 10, error: transport },
            2,
        );
        let err = r.extract("p", "c").await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(r.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn auth_is_never_retried() {
        let r = Retrying::new(
            Flaky { calls: AtomicU32::new(0), failures: 10, error: auth },
            5,
        );
        assert!(matches!(r.extract("p", "c").await, Err(ScrapeError::Auth(_))));
        assert_eq!(r.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn client_errors_are_not_retried() {
        let r = Retrying::new(
            Flaky { calls: AtomicU32::new(0), failures: 10, error: bad_request },
            3,
        );
        let err = r.extract("p", "c").await.unwrap_err();
        assert!(matches!(err, ScrapeError::Transport { status: Some(400), .. }));
        assert_eq!(r.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn backoff_doubles_then_caps() {
        assert_eq!(backoff(1), Duration::from_millis(500));
        assert_eq!(backoff(2), Duration::from_secs(1));
        assert_eq!(backoff(3), Duration::from_secs(2));
        assert_eq!(backoff(5), Duration::from_secs(8));
        assert_eq!(backoff(6), MAX_DELAY);
        assert_eq!(backoff(12), MAX_DELAY);
        assert_eq!(backoff(40), MAX_DELAY);
        assert_eq!(backoff(u32::MAX), MAX_DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn long_retry_runs_wait_at_most_the_cap_each_time() {
        let r = Retrying::new(
            Flaky { calls: AtomicU32::new(0), failures: 12, error: transport },
            12,
        );
        let started = tokio::time::Instant::now();
        assert!(r.extract("p", "c").await.is_ok());
        // 0.5 + 1 + 2 + 4 + 8, then seven waits at the 10s cap.
        assert_eq!(started.elapsed(), Duration::from_millis(85_500));
    }

    #[tokio::test]
    async fn zero_retries_is_single_attempt() {
        let r = Retrying::new(
            Flaky { calls: AtomicU32::new(0), failures: 1, error: transport },
            0,
        );
        assert!(r.extract("p", "c").await.is_err());
        assert_eq!(r.inner.calls.load(Ordering::SeqCst), 1);
    }
}
