//! Read access to locally installed region databases.
//!
//! A region store answers text, radius and region-scoped queries without
//! touching the network. [`LocalRegionStore`] serves a directory of
//! `<region-id>.db` files and keeps at most one of them open.

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::{
    AddressRecord, Category, NearbyQuery, PointOfInterestRecord, RegionId, SearchHit,
};

#[cfg(feature = "store-sqlite")]
mod catalog;
#[cfg(feature = "store-sqlite")]
mod sqlite;

#[cfg(feature = "store-sqlite")]
pub use catalog::LocalRegionStore;
#[cfg(feature = "store-sqlite")]
pub use sqlite::{REGION_SCHEMA, RegionDatabase, sanitize_fts_query};

/// File extension used by region databases.
pub const REGION_FILE_EXTENSION: &str = "db";

/// Errors raised while listing, opening or querying region databases.
#[derive(Debug, Error)]
pub enum RegionStoreError {
    /// Opening the SQLite database failed.
    #[cfg(feature = "store-sqlite")]
    #[error("failed to open region database at {path}: {source}")]
    OpenDatabase {
        /// Location of the database on disk.
        path: Utf8PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// The regions directory could not be read.
    #[error("failed to list regions in {directory}: {source}")]
    ListRegions {
        /// Directory being listed.
        directory: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Reading file metadata for a region failed.
    #[error("failed to inspect region file {path}: {source}")]
    FileMetadata {
        /// Region database path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// No database is installed for the requested region.
    #[error("region {region} is not installed")]
    UnknownRegion {
        /// Requested region.
        region: RegionId,
    },
    /// Generic SQLite error while reading rows.
    #[cfg(feature = "store-sqlite")]
    #[error(transparent)]
    Database(#[from] rusqlite::Error),
}

/// Counts and provenance for one installed region.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RegionStats {
    /// Region identifier.
    pub region: RegionId,
    /// Number of address rows.
    pub place_count: u64,
    /// Number of point-of-interest rows.
    pub poi_count: u64,
    /// Creation timestamp recorded by the importer, when present.
    pub created: Option<String>,
    /// Database size on disk.
    pub file_size_bytes: u64,
}

/// Read-only search over locally installed regions.
///
/// Searches take `&mut self` because implementations may open and close
/// region handles while answering.
pub trait RegionStore: Send {
    /// Identifiers of installed regions, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`RegionStoreError`] when the installed set cannot be read.
    fn available_regions(&self) -> Result<Vec<RegionId>, RegionStoreError>;

    /// Ranked free-text address search across every installed region.
    ///
    /// # Errors
    ///
    /// Returns [`RegionStoreError`] when a database cannot be read.
    fn search_text(
        &mut self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<AddressRecord>, RegionStoreError>;

    /// Radius and category search across every installed region.
    ///
    /// Results lie within the query radius, carry their distance from the
    /// centre and are sorted nearest first.
    ///
    /// # Errors
    ///
    /// Returns [`RegionStoreError`] when a database cannot be read.
    fn search_nearby(
        &mut self,
        query: &NearbyQuery,
        limit: usize,
    ) -> Result<Vec<PointOfInterestRecord>, RegionStoreError>;

    /// Addresses and points of interest in `region` whose name contains
    /// `name`, de-duplicated by source identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RegionStoreError::UnknownRegion`] when `region` is not
    /// installed, or a database error.
    fn search_by_name_in_region(
        &mut self,
        region: &RegionId,
        name: &str,
        limit: usize,
    ) -> Result<Vec<SearchHit>, RegionStoreError>;

    /// Every point of interest in `region` matching `categories`, ordered by
    /// name.
    ///
    /// # Errors
    ///
    /// Returns [`RegionStoreError::UnknownRegion`] when `region` is not
    /// installed, or a database error.
    fn search_category_in_region(
        &mut self,
        region: &RegionId,
        categories: &[Category],
        limit: usize,
    ) -> Result<Vec<PointOfInterestRecord>, RegionStoreError>;

    /// Release any open handles. Later searches reopen lazily.
    fn close(&mut self) {}
}

/// Append `records` to `into` while skipping source identifiers already seen.
pub(crate) fn push_unique_hits(into: &mut Vec<SearchHit>, records: impl IntoIterator<Item = SearchHit>) {
    for hit in records {
        if !into.iter().any(|existing| existing.source_id() == hit.source_id()) {
            into.push(hit);
        }
    }
}
