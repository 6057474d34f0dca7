//! Core domain types and search orchestration for the Waymark engine.
//!
//! The crate turns free text ("gas arkansas", "hospitals in virginia") or a
//! centre, radius and category set into ranked address and point-of-interest
//! records. Local region databases answer first; networked providers extend
//! the answer when local data is missing or thin.
//!
//! - [`QueryInterpreter`] reads category, region and nearby intent from text.
//! - [`RegionStore`] serves installed region databases.
//! - [`SearchCascade`] applies the local-then-network fallback policy.
//! - [`SearchEngine`] runs the cascade on a single background worker.

mod alias;
pub mod cascade;
pub mod category;
mod engine;
pub mod geodesy;
mod interpret;
pub mod normalize;
mod provider;
pub mod query;
pub mod record;
mod region;
pub mod store;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use alias::{AliasMatch, CategoryAliases, STANDARD_ALIASES};
pub use cascade::{
    CascadeConfig, QueryContext, QueryOutcome, RetryPolicy, SearchCascade, SearchError,
};
pub use category::{Category, CategoryDefinition, DEFINITIONS, ParseCategoryError};
pub use engine::{DEFAULT_QUEUE_CAPACITY, EngineError, SearchEngine, SearchTicket};
pub use interpret::{QueryIntent, QueryInterpreter};
pub use provider::{
    AddressProvider, AssumeReachable, Connectivity, GATEWAY_STATUSES, PoiProvider, Provider,
    ProviderError, ReverseGeocoder, is_gateway_status,
};
pub use query::{NearbyQuery, QueryError};
pub use record::{
    AddressParts, AddressRecord, PlaceKind, PointOfInterestRecord, SearchHit, SourceKind, Tags,
    UNKNOWN_LOCATION,
};
pub use region::{RegionDictionary, RegionEntry, RegionId, STANDARD_REGIONS};
#[cfg(feature = "store-sqlite")]
pub use store::{LocalRegionStore, RegionDatabase};
pub use store::{RegionStats, RegionStore, RegionStoreError};
