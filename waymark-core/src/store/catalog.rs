//! Directory of region databases with a single open handle.

use camino::{Utf8Path, Utf8PathBuf};

use crate::{
    AddressRecord, Category, NearbyQuery, PointOfInterestRecord, RegionId, SearchHit,
    record::sort_by_distance,
};

use super::{REGION_FILE_EXTENSION, RegionDatabase, RegionStats, RegionStore, RegionStoreError};

/// Region store over a directory of `<region-id>.db` files.
///
/// At most one database is open at a time. Requesting another region closes
/// the current handle before the next one is opened; searches spanning every
/// region visit them in turn. A missing directory holds no regions.
#[derive(Debug)]
pub struct LocalRegionStore {
    directory: Utf8PathBuf,
    current: Option<RegionDatabase>,
}

impl LocalRegionStore {
    /// Serve the region databases in `directory`.
    pub fn new(directory: impl Into<Utf8PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            current: None,
        }
    }

    /// Directory searched for region databases.
    #[must_use]
    pub fn directory(&self) -> &Utf8Path {
        &self.directory
    }

    /// Path of the database for `region`.
    #[must_use]
    pub fn region_path(&self, region: &RegionId) -> Utf8PathBuf {
        self.directory
            .join(format!("{}.{REGION_FILE_EXTENSION}", region.as_str()))
    }

    /// Region whose database is currently open.
    #[must_use]
    pub fn current_region(&self) -> Option<&RegionId> {
        self.current.as_ref().map(RegionDatabase::region)
    }

    /// Whether `region` has an installed database.
    #[must_use]
    pub fn is_installed(&self, region: &RegionId) -> bool {
        waymark_fs::file_is_file(&self.region_path(region)).unwrap_or(false)
    }

    /// Counts and provenance for an installed region.
    ///
    /// # Errors
    ///
    /// Returns [`RegionStoreError::UnknownRegion`] when `region` is not
    /// installed, or the error raised while reading it.
    pub fn region_stats(&mut self, region: &RegionId) -> Result<RegionStats, RegionStoreError> {
        self.open_region(region)?.stats()
    }

    /// Whether the database for `region` carries point-of-interest data.
    ///
    /// # Errors
    ///
    /// Returns [`RegionStoreError::UnknownRegion`] when `region` is not
    /// installed, or the error raised while opening it.
    pub fn has_poi_data(&mut self, region: &RegionId) -> Result<bool, RegionStoreError> {
        Ok(self.open_region(region)?.has_poi_data())
    }

    /// Make `region` the open database, closing any other first.
    fn open_region(&mut self, region: &RegionId) -> Result<&RegionDatabase, RegionStoreError> {
        let reuse = self
            .current
            .as_ref()
            .is_some_and(|database| database.region() == region);
        if !reuse {
            if let Some(previous) = self.current.take() {
                previous.close();
            }
            if !self.is_installed(region) {
                return Err(RegionStoreError::UnknownRegion {
                    region: region.clone(),
                });
            }
            let path = self.region_path(region);
            self.current = Some(RegionDatabase::open(region.clone(), &path)?);
        }
        self.current
            .as_ref()
            .ok_or_else(|| RegionStoreError::UnknownRegion {
                region: region.clone(),
            })
    }

    /// Run `search` against every installed region in id order.
    ///
    /// A region that fails to open or answer is logged and skipped so one
    /// damaged file does not hide the rest.
    fn each_region<T>(
        &mut self,
        mut search: impl FnMut(&RegionDatabase) -> Result<Vec<T>, RegionStoreError>,
    ) -> Result<Vec<T>, RegionStoreError> {
        let mut combined = Vec::new();
        for region in self.available_regions()? {
            match self.open_region(&region).and_then(&mut search) {
                Ok(mut records) => combined.append(&mut records),
                Err(err) => log::warn!("skipping region {region}: {err}"),
            }
        }
        Ok(combined)
    }
}

impl RegionStore for LocalRegionStore {
    fn available_regions(&self) -> Result<Vec<RegionId>, RegionStoreError> {
        if !waymark_fs::dir_is_dir(&self.directory).unwrap_or(false) {
            return Ok(Vec::new());
        }
        let stems = waymark_fs::list_file_stems(&self.directory, REGION_FILE_EXTENSION).map_err(
            |source| RegionStoreError::ListRegions {
                directory: self.directory.clone(),
                source,
            },
        )?;
        Ok(stems.into_iter().map(RegionId::new).collect())
    }

    fn search_text(
        &mut self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<AddressRecord>, RegionStoreError> {
        let mut records = self.each_region(|database| database.search_text(query, limit))?;
        records.truncate(limit);
        Ok(records)
    }

    fn search_nearby(
        &mut self,
        query: &NearbyQuery,
        limit: usize,
    ) -> Result<Vec<PointOfInterestRecord>, RegionStoreError> {
        let mut records = self.each_region(|database| database.search_nearby(query, limit))?;
        sort_by_distance(&mut records);
        records.truncate(limit);
        Ok(records)
    }

    fn search_by_name_in_region(
        &mut self,
        region: &RegionId,
        name: &str,
        limit: usize,
    ) -> Result<Vec<SearchHit>, RegionStoreError> {
        self.open_region(region)?.search_by_name(name, limit)
    }

    fn search_category_in_region(
        &mut self,
        region: &RegionId,
        categories: &[Category],
        limit: usize,
    ) -> Result<Vec<PointOfInterestRecord>, RegionStoreError> {
        self.open_region(region)?.search_category(categories, limit)
    }

    fn close(&mut self) {
        if let Some(database) = self.current.take() {
            database.close();
        }
    }
}

impl Drop for LocalRegionStore {
    fn drop(&mut self) {
        RegionStore::close(self);
    }
}
