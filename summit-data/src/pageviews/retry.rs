//! Bounded retry for rate-limited requests and request-rate throttling.

use std::future::Future;
use std::time::Duration;

use super::SignalFetchError;

/// Delay used when a rate-limited response carries no usable `Retry-After`.
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(15);

/// Retries allowed after the first rate-limited attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// How rate-limited requests are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    /// Delay applied when the server advises none.
    pub default_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            default_delay: DEFAULT_RETRY_AFTER,
        }
    }
}

impl RetryPolicy {
    /// Delay before the next attempt, preferring the server's advice.
    #[must_use]
    pub const fn delay_for(&self, retry_after: Option<Duration>) -> Duration {
        match retry_after {
            Some(delay) => delay,
            None => self.default_delay,
        }
    }
}

/// Outcome of one attempt.
#[derive(Debug)]
pub enum Attempt<T> {
    /// The request completed.
    Done(T),
    /// The server asked the client to slow down.
    RateLimited {
        /// Server-advised delay, when one was given.
        retry_after: Option<Duration>,
    },
}

/// Parse a `Retry-After` header given in whole seconds.
///
/// HTTP-date values are not interpreted and yield `None`.
#[must_use]
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Run `attempt` until it completes or the policy's retries are spent.
///
/// Errors from `attempt` are returned immediately; only rate limiting is
/// retried.
pub async fn with_retry<T, F, Fut>(
    policy: RetryPolicy,
    url: &str,
    mut attempt: F,
) -> Result<T, SignalFetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Attempt<T>, SignalFetchError>>,
{
    let mut attempts: u32 = 0;
    loop {
        attempts = attempts.saturating_add(1);
        match attempt().await? {
            Attempt::Done(value) => return Ok(value),
            Attempt::RateLimited { retry_after } => {
                if attempts > policy.max_retries {
                    return Err(SignalFetchError::RateLimited {
                        url: url.to_owned(),
                        attempts,
                    });
                }
                let delay = policy.delay_for(retry_after);
                log::warn!(
                    "rate limited by {url}; retry {attempts} of {} in {delay:?}",
                    policy.max_retries
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Pause after every full batch of requests.
#[derive(Debug, Clone)]
pub struct Throttle {
    batch_size: usize,
    pause: Duration,
    in_batch: usize,
}

impl Throttle {
    /// Pause for `pause` after every `batch_size` requests. A batch size of
    /// zero disables throttling.
    #[must_use]
    pub const fn new(batch_size: usize, pause: Duration) -> Self {
        Self {
            batch_size,
            pause,
            in_batch: 0,
        }
    }

    /// Record one issued request, sleeping when it completes a batch.
    pub async fn record(&mut self) {
        if self.batch_size == 0 {
            return;
        }
        self.in_batch = self.in_batch.saturating_add(1);
        if self.in_batch >= self.batch_size {
            self.in_batch = 0;
            log::debug!("request batch complete; pausing for {:?}", self.pause);
            tokio::time::sleep(self.pause).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::cell::Cell;
    use tokio::time::Instant;

    #[rstest]
    #[case("15", Some(Duration::from_secs(15)))]
    #[case(" 2 ", Some(Duration::from_secs(2)))]
    #[case("Wed, 21 Oct 2015 07:28:00 GMT", None)]
    #[case("-1", None)]
    fn parses_retry_after_seconds(#[case] raw: &str, #[case] expected: Option<Duration>) {
        assert_eq!(parse_retry_after(raw), expected);
    }

    #[tokio::test(start_paused = true)]
    async fn honours_server_advised_delay() {
        let calls = Cell::new(0_u32);
        let started = Instant::now();

        let result = with_retry(RetryPolicy::default(), "http://pageviews.test", || {
            calls.set(calls.get() + 1);
            let call = calls.get();
            async move {
                if call < 3 {
                    Ok(Attempt::RateLimited {
                        retry_after: Some(Duration::from_secs(2)),
                    })
                } else {
                    Ok(Attempt::Done(7_u64))
                }
            }
        })
        .await;

        assert_eq!(result.expect("third attempt succeeds"), 7);
        assert_eq!(calls.get(), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_retries() {
        let calls = Cell::new(0_u32);
        let started = Instant::now();

        let result: Result<u64, _> =
            with_retry(RetryPolicy::default(), "http://pageviews.test", || {
                calls.set(calls.get() + 1);
                async { Ok(Attempt::RateLimited { retry_after: None }) }
            })
            .await;

        assert!(matches!(
            result,
            Err(SignalFetchError::RateLimited { attempts: 4, .. })
        ));
        assert_eq!(calls.get(), 4);
        assert_eq!(started.elapsed(), DEFAULT_RETRY_AFTER * 3);
    }

    #[tokio::test(start_paused = true)]
    async fn errors_are_not_retried() {
        let calls = Cell::new(0_u32);

        let result: Result<u64, _> =
            with_retry(RetryPolicy::default(), "http://pageviews.test", || {
                calls.set(calls.get() + 1);
                async {
                    Err(SignalFetchError::Status {
                        url: "http://pageviews.test".to_owned(),
                        status: 500,
                    })
                }
            })
            .await;

        assert!(matches!(result, Err(SignalFetchError::Status { status: 500, .. })));
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn throttle_pauses_after_each_full_batch() {
        let mut throttle = Throttle::new(20, Duration::from_secs(1));
        let started = Instant::now();

        for _ in 0..45 {
            throttle.record().await;
        }

        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_batch_size_never_pauses() {
        let mut throttle = Throttle::new(0, Duration::from_secs(1));
        let started = Instant::now();

        for _ in 0..100 {
            throttle.record().await;
        }

        assert_eq!(started.elapsed(), Duration::ZERO);
    }
}
