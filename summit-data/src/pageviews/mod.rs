//! HTTP page-view `SignalSource` backed by the Wikimedia REST API.
//!
//! This module provides [`HttpPageviewSource`], which looks up the total
//! encyclopedia page views for each peak's article over a configured date
//! range.
//!
//! # Architecture
//!
//! [`SignalSource`] is synchronous so the scoring crates stay free of any
//! async runtime. The source bridges its HTTP calls by blocking on a Tokio
//! runtime it owns, or on the caller's multi-threaded runtime when there is
//! one.
//!
//! Lookups never fail a run. Missing or forbidden articles (403, 404) yield
//! no value; rate limiting (429) is retried per [`RetryPolicy`], honouring
//! `Retry-After`; anything else is logged and yields no value.
//!
//! # Example
//!
//! ```no_run
//! use geo::Point;
//! use summit_core::{Crs, Layer, Peak};
//! use summit_data::pageviews::HttpPageviewSource;
//!
//! let source = HttpPageviewSource::new("https://wikimedia.org/api/rest_v1")?;
//! let mut peaks = Layer::new(
//!     "peaks",
//!     Some(Crs::Wgs84),
//!     vec![Peak::new(1, "Serles", Point::new(11.38, 47.12))],
//! );
//! let filled = source.fetch_view_counts(&mut peaks);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::future::Future;
use std::time::Duration;

use chrono::NaiveDate;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, StatusCode};
use summit_core::{Layer, Peak, Signal, SignalSource};
use thiserror::Error;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};
use url::Url;

mod error;
mod response;
mod retry;

pub use error::SignalFetchError;
pub use response::{PageviewItem, PageviewResponse};
pub use retry::{
    Attempt, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_AFTER, RetryPolicy, Throttle, parse_retry_after,
    with_retry,
};

/// Default user agent for page-view requests.
pub const DEFAULT_USER_AGENT: &str = "summit-stress/0.1 (page-view lookups)";

/// Public Wikimedia REST API root.
pub const DEFAULT_BASE_URL: &str = "https://wikimedia.org/api/rest_v1";

const DEFAULT_LANGUAGE: &str = "de";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_BATCH_SIZE: usize = 20;
const DEFAULT_BATCH_PAUSE: Duration = Duration::from_secs(1);
const DATE_FORMAT: &str = "%Y%m%d";

const DEFAULT_START: NaiveDate = match NaiveDate::from_ymd_opt(2025, 1, 1) {
    Some(date) => date,
    None => NaiveDate::MIN,
};
const DEFAULT_END: NaiveDate = match NaiveDate::from_ymd_opt(2025, 11, 1) {
    Some(date) => date,
    None => NaiveDate::MAX,
};

/// Error type for [`HttpPageviewSource`] construction failures.
#[derive(Debug, Error)]
pub enum PageviewSourceBuildError {
    /// The base URL is not an absolute URL that can carry a path.
    #[error("invalid page-view base URL {base_url}")]
    BaseUrl {
        /// Configured base URL.
        base_url: String,
    },
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),
    /// Failed to build the Tokio runtime.
    #[error("failed to build Tokio runtime")]
    Runtime(#[source] std::io::Error),
}

/// Configuration for [`HttpPageviewSource`].
#[derive(Debug, Clone)]
pub struct HttpPageviewSourceConfig {
    /// REST API root (e.g. `"https://wikimedia.org/api/rest_v1"`).
    pub base_url: String,
    /// Wikipedia language edition queried, such as `"de"`.
    pub language: String,
    /// First day counted, inclusive.
    pub start: NaiveDate,
    /// Last day counted, inclusive.
    pub end: NaiveDate,
    /// Request timeout.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
    /// Retry behaviour for rate-limited responses.
    pub retry: RetryPolicy,
    /// Requests issued before each pause; zero disables pausing.
    pub batch_size: usize,
    /// Pause after each full batch.
    pub batch_pause: Duration,
}

impl Default for HttpPageviewSourceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            language: DEFAULT_LANGUAGE.to_owned(),
            start: DEFAULT_START,
            end: DEFAULT_END,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            retry: RetryPolicy::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            batch_pause: DEFAULT_BATCH_PAUSE,
        }
    }
}

impl HttpPageviewSourceConfig {
    /// Create a configuration for the given API root.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the Wikipedia language edition.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Set the inclusive date range summed per article.
    #[must_use]
    pub const fn with_date_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the retry policy.
    #[must_use]
    pub const fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Pause for `pause` after every `size` requests.
    #[must_use]
    pub const fn with_batching(mut self, size: usize, pause: Duration) -> Self {
        self.batch_size = size;
        self.batch_pause = pause;
        self
    }
}

/// Page-view source for peaks, keyed by article title.
///
/// The peak's name is used as the article title, with spaces replaced by
/// underscores.
///
/// # Runtime behaviour
///
/// Outside any Tokio runtime, or inside a `current_thread` runtime, the
/// source blocks on its own stored runtime. Inside a multi-threaded runtime
/// it uses that runtime's handle with [`tokio::task::block_in_place`].
pub struct HttpPageviewSource {
    client: Client,
    base_url: Url,
    config: HttpPageviewSourceConfig,
    runtime: Runtime,
}

impl std::fmt::Debug for HttpPageviewSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPageviewSource")
            .field("client", &self.client)
            .field("config", &self.config)
            .field("runtime", &"<tokio::runtime::Runtime>")
            .finish_non_exhaustive()
    }
}

impl HttpPageviewSource {
    /// Create a source with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client or
    /// Tokio runtime fails to build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, PageviewSourceBuildError> {
        Self::with_config(HttpPageviewSourceConfig::new(base_url))
    }

    /// Create a source with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client or
    /// Tokio runtime fails to build.
    pub fn with_config(config: HttpPageviewSourceConfig) -> Result<Self, PageviewSourceBuildError> {
        let base_url = Url::parse(&config.base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| PageviewSourceBuildError::BaseUrl {
                base_url: config.base_url.clone(),
            })?;
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(PageviewSourceBuildError::HttpClient)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(PageviewSourceBuildError::Runtime)?;
        Ok(Self {
            client,
            base_url,
            config,
            runtime,
        })
    }

    /// Configuration the source was built with.
    #[must_use]
    pub const fn config(&self) -> &HttpPageviewSourceConfig {
        &self.config
    }

    /// Build the per-article daily page-view URL for `title`.
    ///
    /// The format is
    /// `{base}/metrics/pageviews/per-article/{lang}.wikipedia/all-access/all-agents/{title}/daily/{start}/{end}`.
    ///
    /// # Errors
    ///
    /// Returns [`SignalFetchError::InvalidUrl`] if the base URL cannot carry
    /// path segments.
    pub fn article_url(&self, title: &str) -> Result<Url, SignalFetchError> {
        let project = format!("{}.wikipedia", self.config.language);
        let article = title.trim().replace(' ', "_");
        let start = self.config.start.format(DATE_FORMAT).to_string();
        let end = self.config.end.format(DATE_FORMAT).to_string();
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| SignalFetchError::InvalidUrl {
                base_url: self.config.base_url.clone(),
            })?
            .pop_if_empty()
            .extend([
                "metrics",
                "pageviews",
                "per-article",
                project.as_str(),
                "all-access",
                "all-agents",
                article.as_str(),
                "daily",
                start.as_str(),
                end.as_str(),
            ]);
        Ok(url)
    }

    /// Fetch the total views for `title`, retrying when rate limited.
    ///
    /// Returns `Ok(None)` for missing or forbidden articles and for an empty
    /// series.
    async fn fetch_views(&self, title: &str) -> Result<Option<u64>, SignalFetchError> {
        let url = self.article_url(title)?;
        with_retry(self.config.retry, url.as_str(), || self.attempt(&url)).await
    }

    async fn attempt(&self, url: &Url) -> Result<Attempt<Option<u64>>, SignalFetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, url))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(parse_retry_after);
            return Ok(Attempt::RateLimited { retry_after });
        }
        if matches!(status, StatusCode::FORBIDDEN | StatusCode::NOT_FOUND) {
            log::debug!("no page views at {url} (status {status})");
            return Ok(Attempt::Done(None));
        }
        if !status.is_success() {
            return Err(SignalFetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body: PageviewResponse =
            response
                .json()
                .await
                .map_err(|err| SignalFetchError::Decode {
                    url: url.to_string(),
                    message: err.to_string(),
                })?;
        Ok(Attempt::Done(body.total_views()))
    }

    /// Convert a reqwest error to a `SignalFetchError`.
    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &Url) -> SignalFetchError {
        if error.is_timeout() {
            return SignalFetchError::Timeout {
                url: url.to_string(),
                timeout_secs: self.config.timeout.as_secs(),
            };
        }
        SignalFetchError::Transport {
            url: url.to_string(),
            message: error.to_string(),
        }
    }

    /// Look up views for one peak, logging and absorbing failures.
    async fn lookup(&self, peak: &Peak) -> Option<u64> {
        if peak.name.trim().is_empty() {
            return None;
        }
        match self.fetch_views(&peak.name).await {
            Ok(views) => views,
            Err(err) => {
                log::warn!("page views for peak {} ({}) unavailable: {err}", peak.id, peak.name);
                None
            }
        }
    }

    /// Fill missing page-view counts on every named peak.
    ///
    /// Peaks that already carry a count, or whose input count was malformed,
    /// are skipped. Requests pause after every configured batch. Returns how
    /// many peaks received a count.
    pub fn fetch_view_counts(&self, peaks: &mut Layer<Peak>) -> usize {
        let total = peaks.len();
        let filled = self.block_on(self.fetch_all(peaks.features_mut()));
        log::info!("page views found for {filled} of {total} peaks");
        filled
    }

    async fn fetch_all(&self, peaks: &mut [Peak]) -> usize {
        let mut throttle = Throttle::new(self.config.batch_size, self.config.batch_pause);
        let mut filled = 0;
        for peak in peaks {
            if peak.signals.view_count.is_some()
                || peak.malformed.contains(&Signal::PageViews)
                || peak.name.trim().is_empty()
            {
                continue;
            }
            let found = self.lookup(peak).await;
            throttle.record().await;
            if let Some(views) = found {
                peak.signals.view_count = Some(i64::try_from(views).unwrap_or(i64::MAX));
                filled += 1;
            }
        }
        filled
    }

    /// Drive `future` to completion from synchronous code.
    ///
    /// `block_in_place` requires a multi-threaded runtime; for
    /// `current_thread` runtimes the stored runtime is used instead, which
    /// may deadlock if the caller's runtime drives IO this request needs.
    fn block_on<F: Future>(&self, future: F) -> F::Output {
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(future))
            }
            _ => self.runtime.block_on(future),
        }
    }
}

impl SignalSource for HttpPageviewSource {
    fn signal(&self) -> Signal {
        Signal::PageViews
    }

    #[expect(
        clippy::cast_precision_loss,
        reason = "page-view totals stay far below 2^53"
    )]
    fn fetch_raw_signal(&self, peak: &Peak) -> Option<f64> {
        self.block_on(self.lookup(peak)).map(|views| views as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn source() -> HttpPageviewSource {
        HttpPageviewSource::new(DEFAULT_BASE_URL).expect("source should build")
    }

    #[rstest]
    fn article_url_follows_rest_layout(source: HttpPageviewSource) {
        let url = source.article_url("Hoher Burgstall").expect("valid url");

        assert_eq!(
            url.as_str(),
            "https://wikimedia.org/api/rest_v1/metrics/pageviews/per-article/\
             de.wikipedia/all-access/all-agents/Hoher_Burgstall/daily/20250101/20251101"
        );
    }

    #[rstest]
    fn article_url_escapes_titles(source: HttpPageviewSource) {
        let url = source.article_url("Großer Ötscher/Nord").expect("valid url");

        assert!(
            url.as_str()
                .contains("/all-agents/Gro%C3%9Fer_%C3%96tscher%2FNord/daily/"),
            "{url}"
        );
    }

    #[rstest]
    fn article_url_tolerates_trailing_slash() {
        let config = HttpPageviewSourceConfig::new("http://pageviews.test/api/")
            .with_language("en")
            .with_date_range(
                NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date"),
                NaiveDate::from_ymd_opt(2024, 6, 30).expect("valid date"),
            );
        let source = HttpPageviewSource::with_config(config).expect("source should build");

        let url = source.article_url("Serles").expect("valid url");

        assert_eq!(
            url.as_str(),
            "http://pageviews.test/api/metrics/pageviews/per-article/\
             en.wikipedia/all-access/all-agents/Serles/daily/20240601/20240630"
        );
    }

    #[rstest]
    #[case("not a url")]
    #[case("mailto:peaks@example.com")]
    fn rejects_unusable_base_url(#[case] base_url: &str) {
        let result = HttpPageviewSource::new(base_url);

        assert!(matches!(
            result,
            Err(PageviewSourceBuildError::BaseUrl { .. })
        ));
    }

    #[rstest]
    fn unnamed_peaks_are_not_looked_up(source: HttpPageviewSource) {
        let peak = Peak::new(1, "  ", geo::Point::new(11.0, 47.0));

        assert_eq!(source.fetch_raw_signal(&peak), None);
    }

    #[rstest]
    fn config_builder_pattern() {
        let policy = RetryPolicy {
            max_retries: 1,
            default_delay: Duration::from_secs(5),
        };
        let config = HttpPageviewSourceConfig::new("http://example.com")
            .with_timeout(Duration::from_secs(60))
            .with_user_agent("test-agent/1.0")
            .with_retry_policy(policy)
            .with_batching(5, Duration::from_millis(250));

        assert_eq!(config.base_url, "http://example.com");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.user_agent, "test-agent/1.0");
        assert_eq!(config.retry, policy);
        assert_eq!(config.batch_size, 5);
        assert_eq!(config.batch_pause, Duration::from_millis(250));
    }
}
