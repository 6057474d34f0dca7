//! Networked data sources for the Waymark engine.
//!
//! Responsibilities:
//! - Implement the `waymark-core` provider traits over HTTP.
//! - Map provider payloads onto normalised records.
//! - Classify transport and status failures for the cascade's retry policy.
//!
//! Boundaries:
//! - Do not encode fallback policy (lives in `waymark-core`).
//! - Providers are synchronous; each owns a runtime for its async client.
//!
//! Invariants:
//! - 502, 503 and 504 map to retryable gateway errors; every other
//!   non-success status is terminal.
//! - Malformed individual entries are skipped; a malformed payload is a
//!   parse error.

mod connectivity;
mod endpoints;
mod http;
mod nominatim;
pub mod overpass;
mod photon;
mod reverse;

#[doc(hidden)]
pub mod test_support;

pub use connectivity::{DEFAULT_PROBE_TIMEOUT_SECS, TcpProbe};
pub use endpoints::ProviderEndpoints;
pub use http::{DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, HttpProviderConfig, ProviderBuildError};
pub use nominatim::{NOMINATIM_BASE_URL, NominatimProvider};
pub use overpass::{OVERPASS_BASE_URL, OVERPASS_TIMEOUT_SECS, OverpassProvider};
pub use photon::{PHOTON_BASE_URL, PhotonProvider};
pub use reverse::{NominatimReverseGeocoder, PhotonReverseGeocoder};
