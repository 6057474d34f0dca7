//! Interchangeable data-source strategies consulted by the search cascade.
//!
//! Providers are synchronous; implementations that talk to the network block
//! the calling thread until the request completes or times out. The cascade
//! iterates an ordered list of each kind until one yields a usable answer.

use geo::Coord;
use thiserror::Error;

use crate::{AddressRecord, NearbyQuery, PointOfInterestRecord};

/// HTTP statuses that signal transient upstream overload.
pub const GATEWAY_STATUSES: [u16; 3] = [502, 503, 504];

/// Whether `status` is a retryable gateway-class status.
#[must_use]
pub fn is_gateway_status(status: u16) -> bool {
    GATEWAY_STATUSES.contains(&status)
}

/// Failure reported by a networked provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// A transient gateway status; safe to retry.
    #[error("{provider} is temporarily unavailable (HTTP {status})")]
    Gateway {
        /// Provider name.
        provider: &'static str,
        /// HTTP status code.
        status: u16,
    },
    /// Any other non-success status.
    #[error("{provider} rejected the request (HTTP {status}): {message}")]
    Status {
        /// Provider name.
        provider: &'static str,
        /// HTTP status code.
        status: u16,
        /// Error detail.
        message: String,
    },
    /// The request did not complete in time.
    #[error("{provider} did not respond within {timeout_secs}s")]
    Timeout {
        /// Provider name.
        provider: &'static str,
        /// Configured timeout.
        timeout_secs: u64,
    },
    /// The request failed below the HTTP layer.
    #[error("could not reach {provider}: {message}")]
    Transport {
        /// Provider name.
        provider: &'static str,
        /// Error detail.
        message: String,
    },
    /// The payload was malformed or did not match the expected schema.
    #[error("{provider} returned an unreadable response: {message}")]
    Parse {
        /// Provider name.
        provider: &'static str,
        /// Error detail.
        message: String,
    },
}

impl ProviderError {
    /// Classify a non-success HTTP status.
    #[must_use]
    pub fn from_status(provider: &'static str, status: u16, message: impl Into<String>) -> Self {
        if is_gateway_status(status) {
            Self::Gateway { provider, status }
        } else {
            Self::Status {
                provider,
                status,
                message: message.into(),
            }
        }
    }

    /// Whether the error may clear on retry.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Gateway { .. })
    }

    /// Name of the provider that failed.
    #[must_use]
    pub const fn provider(&self) -> &'static str {
        match self {
            Self::Gateway { provider, .. }
            | Self::Status { provider, .. }
            | Self::Timeout { provider, .. }
            | Self::Transport { provider, .. }
            | Self::Parse { provider, .. } => provider,
        }
    }
}

/// Behaviour shared by every provider kind.
pub trait Provider: Send {
    /// Short, stable name used in logs, errors and record sources.
    fn name(&self) -> &'static str;
}

/// Free-text address search.
pub trait AddressProvider: Provider {
    /// Return up to `limit` records matching `query`.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`] describing the transport, status or
    /// payload failure.
    fn search(&self, query: &str, limit: usize) -> Result<Vec<AddressRecord>, ProviderError>;
}

/// Radius and category search for points of interest.
pub trait PoiProvider: Provider {
    /// Return up to `limit` points of interest matching `query`.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`] describing the transport, status or
    /// payload failure.
    fn search_nearby(
        &self,
        query: &NearbyQuery,
        limit: usize,
    ) -> Result<Vec<PointOfInterestRecord>, ProviderError>;
}

/// Point-to-address lookup.
pub trait ReverseGeocoder: Provider {
    /// Return a multi-line postal address for `location`, or `None` when the
    /// provider knows nothing there.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`] describing the transport, status or
    /// payload failure.
    fn reverse(&self, location: Coord<f64>) -> Result<Option<String>, ProviderError>;
}

/// Network reachability check consulted before contacting providers.
pub trait Connectivity: Send {
    /// Whether networked providers are worth contacting.
    fn is_reachable(&self) -> bool;
}

/// Fixed connectivity answer.
///
/// [`AssumeReachable::default`] reports the network as reachable, matching
/// the behaviour when no platform check is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssumeReachable(pub bool);

impl Default for AssumeReachable {
    fn default() -> Self {
        Self(true)
    }
}

impl Connectivity for AssumeReachable {
    fn is_reachable(&self) -> bool {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(502, true)]
    #[case(503, true)]
    #[case(504, true)]
    #[case(500, false)]
    #[case(429, false)]
    #[case(404, false)]
    fn classifies_statuses(#[case] status: u16, #[case] retryable: bool) {
        let error = ProviderError::from_status("photon", status, "boom");
        assert_eq!(error.is_retryable(), retryable);
        assert_eq!(error.provider(), "photon");
    }

    #[rstest]
    fn only_gateway_errors_are_retryable() {
        let errors = [
            ProviderError::Timeout {
                provider: "p",
                timeout_secs: 1,
            },
            ProviderError::Transport {
                provider: "p",
                message: "reset".to_owned(),
            },
            ProviderError::Parse {
                provider: "p",
                message: "eof".to_owned(),
            },
        ];
        assert!(errors.iter().all(|error| !error.is_retryable()));
    }

    #[rstest]
    fn default_connectivity_is_reachable() {
        assert!(AssumeReachable::default().is_reachable());
        assert!(!AssumeReachable(false).is_reachable());
    }
}
