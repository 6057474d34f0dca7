//! Tunables for the search cascade.

use std::time::Duration;

use crate::ProviderError;

/// Results returned by a free-text search.
pub const DEFAULT_TEXT_LIMIT: usize = 10;
/// Results returned by a radius search.
pub const DEFAULT_POI_LIMIT: usize = 100;
/// Local result count that makes networked providers unnecessary.
pub const DEFAULT_SUFFICIENCY_THRESHOLD: usize = 10;
/// Radius used when a category query has no explicit distance.
pub const DEFAULT_CATEGORY_RADIUS_KM: f64 = 10.0;
/// Shortest accepted free-text query.
pub const DEFAULT_MIN_QUERY_CHARS: usize = 2;
/// Results returned by a by-name search scoped to a region.
pub const DEFAULT_REGION_NAME_LIMIT: usize = 10;
/// Retries after the first attempt for gateway failures.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Pause between retries.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(3);

/// Fixed-delay retry for transient provider failures.
///
/// Only errors for which [`ProviderError::is_retryable`] holds are retried.
/// The delay blocks the calling thread.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use waymark_core::{ProviderError, RetryPolicy};
///
/// let policy = RetryPolicy::new(3, Duration::ZERO);
/// let mut calls = 0;
/// let result = policy.run("photon", || {
///     calls += 1;
///     if calls < 4 {
///         Err(ProviderError::Gateway { provider: "photon", status: 503 })
///     } else {
///         Ok(calls)
///     }
/// });
/// assert_eq!(result, Ok(4));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Pause before each retry.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY)
    }
}

impl RetryPolicy {
    /// Build a policy.
    #[must_use]
    pub const fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// A policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Invoke `call` until it succeeds, fails terminally or the retry ceiling
    /// is reached.
    ///
    /// # Errors
    ///
    /// Returns the last error once retries are exhausted, or the first
    /// non-retryable error.
    pub fn run<T>(
        &self,
        provider: &str,
        mut call: impl FnMut() -> Result<T, ProviderError>,
    ) -> Result<T, ProviderError> {
        let mut retries = 0;
        loop {
            match call() {
                Err(err) if err.is_retryable() && retries < self.max_retries => {
                    retries += 1;
                    log::warn!(
                        "{provider} failed ({err}); retry {retries}/{} in {:?}",
                        self.max_retries,
                        self.delay
                    );
                    if !self.delay.is_zero() {
                        std::thread::sleep(self.delay);
                    }
                }
                outcome => return outcome,
            }
        }
    }
}

/// Policy knobs for [`SearchCascade`](crate::SearchCascade).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CascadeConfig {
    /// Local result count at or above which providers are skipped.
    pub sufficiency_threshold: usize,
    /// Never contact networked providers.
    pub offline_only: bool,
    /// Maximum results for free-text searches.
    pub text_limit: usize,
    /// Maximum results for radius searches.
    pub poi_limit: usize,
    /// Maximum results for by-name searches scoped to a region.
    pub region_name_limit: usize,
    /// Radius for category queries routed around a centre.
    pub category_radius_km: f64,
    /// Shortest accepted free-text query, in characters.
    pub min_query_chars: usize,
    /// Retry behaviour for each provider tier.
    pub retry: RetryPolicy,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            sufficiency_threshold: DEFAULT_SUFFICIENCY_THRESHOLD,
            offline_only: false,
            text_limit: DEFAULT_TEXT_LIMIT,
            poi_limit: DEFAULT_POI_LIMIT,
            region_name_limit: DEFAULT_REGION_NAME_LIMIT,
            category_radius_km: DEFAULT_CATEGORY_RADIUS_KM,
            min_query_chars: DEFAULT_MIN_QUERY_CHARS,
            retry: RetryPolicy::default(),
        }
    }
}

impl CascadeConfig {
    /// Set the local sufficiency threshold.
    #[must_use]
    pub const fn with_sufficiency_threshold(mut self, threshold: usize) -> Self {
        self.sufficiency_threshold = threshold;
        self
    }

    /// Restrict searches to local data.
    #[must_use]
    pub const fn with_offline_only(mut self, offline_only: bool) -> Self {
        self.offline_only = offline_only;
        self
    }

    /// Set the free-text result limit.
    #[must_use]
    pub const fn with_text_limit(mut self, limit: usize) -> Self {
        self.text_limit = limit;
        self
    }

    /// Set the radius-search result limit.
    #[must_use]
    pub const fn with_poi_limit(mut self, limit: usize) -> Self {
        self.poi_limit = limit;
        self
    }

    /// Set the retry policy.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}
