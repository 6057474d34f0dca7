//! Facade crate for the Waymark search engine.
//!
//! This crate re-exports the core domain types and search orchestration, and
//! exposes the region database store and networked providers behind feature
//! flags.

#![forbid(unsafe_code)]

pub use waymark_core::{
    AddressProvider, AddressRecord, AssumeReachable, CascadeConfig, Category, Connectivity,
    EngineError, NearbyQuery, PlaceKind, PoiProvider, PointOfInterestRecord, Provider,
    ProviderError, QueryContext, QueryInterpreter, QueryOutcome, RegionId, RegionStats,
    RegionStore, RegionStoreError, RetryPolicy, ReverseGeocoder, SearchCascade, SearchEngine,
    SearchError, SearchHit, SearchTicket, SourceKind,
};

#[cfg(feature = "store-sqlite")]
pub use waymark_core::{LocalRegionStore, RegionDatabase};

#[cfg(feature = "providers-http")]
pub use waymark_data::{
    HttpProviderConfig, NominatimProvider, NominatimReverseGeocoder, OverpassProvider,
    PhotonProvider, PhotonReverseGeocoder, ProviderBuildError, ProviderEndpoints, TcpProbe,
};
