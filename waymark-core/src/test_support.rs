//! Test doubles for region stores and providers, plus region database
//! fixtures, used by unit and behaviour tests.

use std::{
    collections::{BTreeMap, VecDeque},
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
};

use geo::Coord;

use crate::{
    AddressParts, AddressProvider, AddressRecord, Category, NearbyQuery, PlaceKind, PoiProvider,
    PointOfInterestRecord, Provider, ProviderError, RegionId, RegionStore, RegionStoreError,
    ReverseGeocoder, SearchHit, SourceKind, Tags,
    geodesy::haversine_distance,
    record::sort_by_distance,
};

/// Address record attributed to `source`.
#[must_use]
pub fn address(source: SourceKind, id: i64, name: &str, lat: f64, lon: f64) -> AddressRecord {
    AddressRecord::new(AddressParts {
        source,
        source_id: id,
        osm_type: Some("node".to_owned()),
        location: Coord { x: lon, y: lat },
        name: name.to_owned(),
        display_name: String::new(),
        kind: PlaceKind::Other,
    })
}

/// Point of interest attributed to `source`, without a distance.
#[must_use]
pub fn poi(
    source: SourceKind,
    id: i64,
    name: &str,
    category: Category,
    lat: f64,
    lon: f64,
) -> PointOfInterestRecord {
    PointOfInterestRecord {
        source,
        source_id: id,
        osm_type: Some("node".to_owned()),
        location: Coord { x: lon, y: lat },
        category: Some(category),
        name: name.to_owned(),
        address: String::new(),
        distance_m: None,
        tags: Tags::new(),
    }
}

#[derive(Debug, Default, Clone)]
struct MemoryRegion {
    addresses: Vec<AddressRecord>,
    pois: Vec<PointOfInterestRecord>,
}

/// In-memory [`RegionStore`] performing linear scans.
///
/// Intended only for small datasets.
#[derive(Debug, Default)]
pub struct MemoryRegionStore {
    regions: BTreeMap<RegionId, MemoryRegion>,
    failing: bool,
    searches: Arc<AtomicUsize>,
}

impl MemoryRegionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a region holding `addresses` and `pois`.
    #[must_use]
    pub fn with_region(
        mut self,
        region: &str,
        addresses: Vec<AddressRecord>,
        pois: Vec<PointOfInterestRecord>,
    ) -> Self {
        self.regions
            .insert(RegionId::new(region), MemoryRegion { addresses, pois });
        self
    }

    /// Make every search fail as if the database were damaged.
    #[must_use]
    pub const fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    /// Shared counter of searches served.
    #[must_use]
    pub fn search_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.searches)
    }

    fn begin(&self) -> Result<(), RegionStoreError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            Err(RegionStoreError::ListRegions {
                directory: "memory".into(),
                source: std::io::Error::other("simulated failure"),
            })
        } else {
            Ok(())
        }
    }

    fn region(&self, region: &RegionId) -> Result<&MemoryRegion, RegionStoreError> {
        self.regions
            .get(region)
            .ok_or_else(|| RegionStoreError::UnknownRegion {
                region: region.clone(),
            })
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.trim().to_lowercase())
}

impl RegionStore for MemoryRegionStore {
    fn available_regions(&self) -> Result<Vec<RegionId>, RegionStoreError> {
        Ok(self.regions.keys().cloned().collect())
    }

    fn search_text(
        &mut self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<AddressRecord>, RegionStoreError> {
        self.begin()?;
        let mut records: Vec<_> = self
            .regions
            .values()
            .flat_map(|region| region.addresses.iter())
            .filter(|record| contains_ignore_case(record.display_name(), query))
            .cloned()
            .collect();
        records.truncate(limit);
        Ok(records)
    }

    fn search_nearby(
        &mut self,
        query: &NearbyQuery,
        limit: usize,
    ) -> Result<Vec<PointOfInterestRecord>, RegionStoreError> {
        self.begin()?;
        let radius_m = query.radius_m();
        let mut records: Vec<_> = self
            .regions
            .values()
            .flat_map(|region| region.pois.iter())
            .filter(|record| {
                record
                    .category
                    .is_some_and(|category| query.categories.contains(&category))
            })
            .filter(|record| haversine_distance(query.center, record.location) <= radius_m)
            .cloned()
            .map(|record| record.measured_from(query.center))
            .collect();
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
        self.begin()?;
        let data = self.region(region)?;
        let mut hits: Vec<SearchHit> = Vec::new();
        let candidates = data
            .addresses
            .iter()
            .filter(|record| contains_ignore_case(record.name(), name))
            .cloned()
            .map(SearchHit::Address)
            .chain(
                data.pois
                    .iter()
                    .filter(|record| contains_ignore_case(&record.name, name))
                    .cloned()
                    .map(SearchHit::PointOfInterest),
            );
        crate::store::push_unique_hits(&mut hits, candidates);
        hits.truncate(limit);
        Ok(hits)
    }

    fn search_category_in_region(
        &mut self,
        region: &RegionId,
        categories: &[Category],
        limit: usize,
    ) -> Result<Vec<PointOfInterestRecord>, RegionStoreError> {
        self.begin()?;
        let mut records: Vec<_> = self
            .region(region)?
            .pois
            .iter()
            .filter(|record| record.category.is_some_and(|category| categories.contains(&category)))
            .cloned()
            .collect();
        records.sort_by_key(|record| record.name.to_lowercase());
        records.truncate(limit);
        Ok(records)
    }
}

/// Provider double answering from a script, then from a fixed fallback.
///
/// `T` is the provider's answer: `Vec<AddressRecord>` for address search,
/// `Vec<PointOfInterestRecord>` for radius search and `Option<String>` for
/// reverse geocoding.
#[derive(Debug)]
pub struct ScriptedProvider<T> {
    name: &'static str,
    script: Mutex<VecDeque<Result<T, ProviderError>>>,
    fallback: Result<T, ProviderError>,
    calls: Arc<AtomicUsize>,
}

impl<T: Clone> ScriptedProvider<T> {
    /// Provider that always answers `fallback` once its script runs out.
    #[must_use]
    pub fn new(name: &'static str, fallback: Result<T, ProviderError>) -> Self {
        Self {
            name,
            script: Mutex::new(VecDeque::new()),
            fallback,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Queue `response` for the next unanswered call.
    #[must_use]
    pub fn then(self, response: Result<T, ProviderError>) -> Self {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
        self
    }

    /// Queue the same gateway failure `times` times.
    #[must_use]
    pub fn then_gateway_errors(self, times: usize, status: u16) -> Self {
        let name = self.name;
        (0..times).fold(self, |provider, _| {
            provider.then(Err(ProviderError::Gateway {
                provider: name,
                status,
            }))
        })
    }

    /// Shared counter of calls received.
    #[must_use]
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    fn answer(&self) -> Result<T, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

/// Gateway failure attributed to `provider`.
#[must_use]
pub const fn gateway_error(provider: &'static str, status: u16) -> ProviderError {
    ProviderError::Gateway { provider, status }
}

impl<T: Send> Provider for ScriptedProvider<T> {
    fn name(&self) -> &'static str {
        self.name
    }
}

impl AddressProvider for ScriptedProvider<Vec<AddressRecord>> {
    fn search(&self, _query: &str, _limit: usize) -> Result<Vec<AddressRecord>, ProviderError> {
        self.answer()
    }
}

impl PoiProvider for ScriptedProvider<Vec<PointOfInterestRecord>> {
    fn search_nearby(
        &self,
        _query: &NearbyQuery,
        _limit: usize,
    ) -> Result<Vec<PointOfInterestRecord>, ProviderError> {
        self.answer()
    }
}

impl ReverseGeocoder for ScriptedProvider<Option<String>> {
    fn reverse(&self, _location: Coord<f64>) -> Result<Option<String>, ProviderError> {
        self.answer()
    }
}

#[cfg(feature = "store-sqlite")]
pub use sqlite_fixtures::{PlaceRow, PoiRow, RegionFixture, write_region_database};

#[cfg(feature = "store-sqlite")]
mod sqlite_fixtures {
    use camino::Utf8Path;
    use rusqlite::{Connection, params};

    use crate::{Category, store::REGION_SCHEMA};

    /// One row of the `places` table.
    #[derive(Debug, Clone, PartialEq)]
    pub struct PlaceRow {
        /// Row identifier.
        pub id: i64,
        /// Map element identifier.
        pub osm_id: Option<i64>,
        /// Map element type.
        pub osm_type: Option<String>,
        /// Latitude.
        pub lat: f64,
        /// Longitude.
        pub lon: f64,
        /// Name.
        pub name: Option<String>,
        /// Stored display name.
        pub display_name: Option<String>,
        /// Raw place type, such as `city` or `shop_bakery`.
        pub place_type: Option<String>,
        /// Street.
        pub street: Option<String>,
        /// House number.
        pub housenumber: Option<String>,
        /// City.
        pub city: Option<String>,
        /// Postal code.
        pub postcode: Option<String>,
        /// State.
        pub state: Option<String>,
        /// Country.
        pub country: Option<String>,
    }

    impl PlaceRow {
        /// Named place whose map identifier equals its row identifier.
        #[must_use]
        pub fn new(id: i64, name: &str, lat: f64, lon: f64) -> Self {
            Self {
                id,
                osm_id: Some(id),
                osm_type: Some("node".to_owned()),
                lat,
                lon,
                name: Some(name.to_owned()),
                display_name: None,
                place_type: None,
                street: None,
                housenumber: None,
                city: None,
                postcode: None,
                state: None,
                country: None,
            }
        }

        /// Set the raw place type.
        #[must_use]
        pub fn with_type(mut self, place_type: &str) -> Self {
            self.place_type = Some(place_type.to_owned());
            self
        }

        /// Set street address fields.
        #[must_use]
        pub fn with_address(mut self, housenumber: &str, street: &str, city: &str, postcode: &str) -> Self {
            self.housenumber = Some(housenumber.to_owned());
            self.street = Some(street.to_owned());
            self.city = Some(city.to_owned());
            self.postcode = Some(postcode.to_owned());
            self
        }

        /// Set the stored display name.
        #[must_use]
        pub fn with_display_name(mut self, display_name: &str) -> Self {
            self.display_name = Some(display_name.to_owned());
            self
        }
    }

    /// One row of the `pois` table.
    #[derive(Debug, Clone, PartialEq)]
    pub struct PoiRow {
        /// Row identifier.
        pub id: i64,
        /// Map element identifier.
        pub osm_id: Option<i64>,
        /// Latitude.
        pub lat: f64,
        /// Longitude.
        pub lon: f64,
        /// Name.
        pub name: Option<String>,
        /// Category.
        pub category: Category,
        /// Address line.
        pub address: Option<String>,
        /// Phone number.
        pub phone: Option<String>,
    }

    impl PoiRow {
        /// Named point of interest whose map identifier equals its row
        /// identifier.
        #[must_use]
        pub fn new(id: i64, name: &str, category: Category, lat: f64, lon: f64) -> Self {
            Self {
                id,
                osm_id: Some(id),
                lat,
                lon,
                name: Some(name.to_owned()),
                category,
                address: None,
                phone: None,
            }
        }

        /// Set the phone number.
        #[must_use]
        pub fn with_phone(mut self, phone: &str) -> Self {
            self.phone = Some(phone.to_owned());
            self
        }

        /// Set the address line.
        #[must_use]
        pub fn with_address(mut self, address: &str) -> Self {
            self.address = Some(address.to_owned());
            self
        }
    }

    /// Contents of a region database fixture.
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct RegionFixture {
        /// Address rows.
        pub places: Vec<PlaceRow>,
        /// Point-of-interest rows.
        pub pois: Vec<PoiRow>,
    }

    /// Write `fixture` to a new region database at `path`.
    ///
    /// The region name recorded in `metadata` is the file stem.
    ///
    /// # Errors
    ///
    /// Returns any SQLite error raised while creating the database.
    pub fn write_region_database(path: &Utf8Path, fixture: &RegionFixture) -> rusqlite::Result<()> {
        let mut connection = Connection::open(path)?;
        connection.execute_batch(REGION_SCHEMA)?;
        let tx = connection.transaction()?;
        {
            let mut insert_place = tx.prepare(
                "INSERT INTO places (id, osm_id, osm_type, lat, lon, name, display_name, type, \
                 street, housenumber, city, postcode, state, country) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            )?;
            for place in &fixture.places {
                insert_place.execute(params![
                    place.id,
                    place.osm_id,
                    place.osm_type,
                    place.lat,
                    place.lon,
                    place.name,
                    place.display_name,
                    place.place_type,
                    place.street,
                    place.housenumber,
                    place.city,
                    place.postcode,
                    place.state,
                    place.country,
                ])?;
            }

            let mut insert_poi = tx.prepare(
                "INSERT INTO pois (id, osm_id, osm_type, lat, lon, name, category, address, phone) \
                 VALUES (?1, ?2, 'node', ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            let mut insert_bounds = tx.prepare(
                "INSERT INTO pois_rtree (id, min_lat, max_lat, min_lon, max_lon) \
                 VALUES (?1, ?2, ?2, ?3, ?3)",
            )?;
            for poi in &fixture.pois {
                insert_poi.execute(params![
                    poi.id,
                    poi.osm_id,
                    poi.lat,
                    poi.lon,
                    poi.name,
                    poi.category.id(),
                    poi.address,
                    poi.phone,
                ])?;
                insert_bounds.execute(params![poi.id, poi.lat, poi.lon])?;
            }

            let mut insert_metadata =
                tx.prepare("INSERT INTO metadata (key, value) VALUES (?1, ?2)")?;
            let region = path.file_stem().unwrap_or_default();
            for (key, value) in [
                ("created", "2024-01-01T00:00:00Z".to_owned()),
                ("place_count", fixture.places.len().to_string()),
                ("poi_count", fixture.pois.len().to_string()),
                ("region", region.to_owned()),
                ("schema_version", "1".to_owned()),
            ] {
                insert_metadata.execute(params![key, value])?;
            }
        }
        tx.execute(
            "INSERT INTO places_fts (rowid, name, display_name, street, city, postcode) \
             SELECT id, name, display_name, street, city, postcode FROM places",
            [],
        )?;
        tx.commit()
    }
}
