//! Layered search over local region data and networked providers.
//!
//! Every search follows the same policy:
//!
//! 1. When any region is installed, ask the region store first.
//! 2. In offline-only mode, return the local answer, even if empty.
//! 3. When the local answer meets the sufficiency threshold, return it.
//! 4. When the network is unreachable, return the local answer if it has
//!    results, or [`SearchError::NetworkUnavailable`].
//! 5. Try each provider tier in order, retrying gateway failures.
//! 6. An empty or failed tier falls through to the next one.
//! 7. The first non-empty provider answer wins over local data.
//! 8. Otherwise return local results, then the first provider failure, then
//!    an empty list.

mod config;
mod error;

use geo::Coord;

pub use config::{
    CascadeConfig, DEFAULT_CATEGORY_RADIUS_KM, DEFAULT_MAX_RETRIES, DEFAULT_MIN_QUERY_CHARS,
    DEFAULT_POI_LIMIT, DEFAULT_REGION_NAME_LIMIT, DEFAULT_RETRY_DELAY,
    DEFAULT_SUFFICIENCY_THRESHOLD, DEFAULT_TEXT_LIMIT, RetryPolicy,
};
pub use error::SearchError;

use crate::{
    AddressProvider, AddressRecord, AssumeReachable, Category, Connectivity, NearbyQuery,
    PoiProvider, PointOfInterestRecord, Provider, ProviderError, QueryInterpreter,
    ReverseGeocoder, RegionId, RegionStore, SearchHit,
    geodesy::haversine_distance,
    query::{validate_coordinate, validate_text},
    record::sort_by_distance,
};

/// Caller state consulted when routing a free-text query.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QueryContext {
    /// Centre for category queries without a region, usually the caller's
    /// own position or the visible map centre.
    pub center: Option<Coord<f64>>,
}

/// Answer to [`SearchCascade::search_query`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "kebab-case"))]
pub enum QueryOutcome {
    /// Free-text address results.
    Addresses {
        /// Matching records.
        results: Vec<AddressRecord>,
    },
    /// Category results, either around a centre or across a region.
    PointsOfInterest {
        /// Category recognised in the query.
        category: Category,
        /// Region the search was scoped to, if any.
        region: Option<RegionId>,
        /// Matching records.
        results: Vec<PointOfInterestRecord>,
    },
    /// Named matches inside a region.
    RegionMatches {
        /// Region the search was scoped to.
        region: RegionId,
        /// Matching records.
        results: Vec<SearchHit>,
    },
}

impl QueryOutcome {
    /// Number of results carried.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Addresses { results } => results.len(),
            Self::PointsOfInterest { results, .. } => results.len(),
            Self::RegionMatches { results, .. } => results.len(),
        }
    }

    /// Whether no results are carried.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Orchestrates the region store and provider tiers.
///
/// The cascade is synchronous and owns every data source; run it on a
/// dedicated worker through [`SearchEngine`](crate::SearchEngine) to keep
/// callers responsive.
pub struct SearchCascade {
    config: CascadeConfig,
    interpreter: QueryInterpreter,
    region_store: Option<Box<dyn RegionStore>>,
    address_providers: Vec<Box<dyn AddressProvider>>,
    poi_providers: Vec<Box<dyn PoiProvider>>,
    reverse_geocoders: Vec<Box<dyn ReverseGeocoder>>,
    connectivity: Box<dyn Connectivity>,
}

impl std::fmt::Debug for SearchCascade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let address: Vec<_> = self.address_providers.iter().map(|p| p.name()).collect();
        let poi: Vec<_> = self.poi_providers.iter().map(|p| p.name()).collect();
        let reverse: Vec<_> = self.reverse_geocoders.iter().map(|p| p.name()).collect();
        f.debug_struct("SearchCascade")
            .field("config", &self.config)
            .field("has_region_store", &self.region_store.is_some())
            .field("address_providers", &address)
            .field("poi_providers", &poi)
            .field("reverse_geocoders", &reverse)
            .finish_non_exhaustive()
    }
}

impl Default for SearchCascade {
    fn default() -> Self {
        Self::new(CascadeConfig::default())
    }
}

impl SearchCascade {
    /// Build a cascade with no data sources.
    #[must_use]
    pub fn new(config: CascadeConfig) -> Self {
        Self {
            config,
            interpreter: QueryInterpreter::standard(),
            region_store: None,
            address_providers: Vec::new(),
            poi_providers: Vec::new(),
            reverse_geocoders: Vec::new(),
            connectivity: Box::new(AssumeReachable::default()),
        }
    }

    /// Use `store` for local data.
    #[must_use]
    pub fn with_region_store(mut self, store: impl RegionStore + 'static) -> Self {
        self.region_store = Some(Box::new(store));
        self
    }

    /// Append an address provider tier.
    #[must_use]
    pub fn with_address_provider(mut self, provider: impl AddressProvider + 'static) -> Self {
        self.address_providers.push(Box::new(provider));
        self
    }

    /// Append a point-of-interest provider tier.
    #[must_use]
    pub fn with_poi_provider(mut self, provider: impl PoiProvider + 'static) -> Self {
        self.poi_providers.push(Box::new(provider));
        self
    }

    /// Append a reverse geocoding tier.
    #[must_use]
    pub fn with_reverse_geocoder(mut self, geocoder: impl ReverseGeocoder + 'static) -> Self {
        self.reverse_geocoders.push(Box::new(geocoder));
        self
    }

    /// Replace the connectivity check.
    #[must_use]
    pub fn with_connectivity(mut self, connectivity: impl Connectivity + 'static) -> Self {
        self.connectivity = Box::new(connectivity);
        self
    }

    /// Replace the query interpreter, for example to share dictionaries.
    #[must_use]
    pub fn with_interpreter(mut self, interpreter: QueryInterpreter) -> Self {
        self.interpreter = interpreter;
        self
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &CascadeConfig {
        &self.config
    }

    /// Interpreter used by [`Self::search_query`].
    #[must_use]
    pub const fn interpreter(&self) -> &QueryInterpreter {
        &self.interpreter
    }

    /// Installed regions, or an empty list when none can be read.
    #[must_use]
    pub fn available_regions(&self) -> Vec<RegionId> {
        self.region_store
            .as_ref()
            .map(|store| {
                store.available_regions().unwrap_or_else(|err| {
                    log::warn!("cannot list installed regions: {err}");
                    Vec::new()
                })
            })
            .unwrap_or_default()
    }

    /// Free-text address search.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidQuery`] for queries shorter than the
    /// configured minimum, [`SearchError::NetworkUnavailable`] when nothing
    /// local answered and the network is down, or the first provider
    /// failure when no tier produced results.
    pub fn search(&mut self, query: &str) -> Result<Vec<AddressRecord>, SearchError> {
        validate_text(query, self.config.min_query_chars)?;
        let query = query.trim();
        let limit = self.config.text_limit;
        let local = self.local(|store| store.search_text(query, limit));
        self.cascade(local, &self.address_providers, |provider| {
            provider.search(query, limit).map(|mut records| {
                records.truncate(limit);
                records
            })
        })
    }

    /// Radius and category search, nearest first.
    ///
    /// Provider answers are measured from the centre, clipped to the radius
    /// and sorted the same way local answers are.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidQuery`] for empty category sets,
    /// non-positive radii or invalid coordinates, and otherwise the same
    /// errors as [`Self::search`].
    pub fn search_nearby(
        &mut self,
        query: &NearbyQuery,
    ) -> Result<Vec<PointOfInterestRecord>, SearchError> {
        query.validate()?;
        let limit = self.config.poi_limit;
        let local = self.local(|store| store.search_nearby(query, limit));
        self.cascade(local, &self.poi_providers, |provider| {
            provider
                .search_nearby(query, limit)
                .map(|records| within_radius(records, query, limit))
        })
    }

    /// Every point of interest of `categories` in an installed region,
    /// ordered by name. Local data only.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidQuery`] when `categories` is empty.
    pub fn search_category_in_region(
        &mut self,
        region: &RegionId,
        categories: &[Category],
    ) -> Result<Vec<PointOfInterestRecord>, SearchError> {
        if categories.is_empty() {
            return Err(crate::QueryError::NoCategories.into());
        }
        let limit = self.config.poi_limit;
        Ok(self.local(|store| store.search_category_in_region(region, categories, limit)))
    }

    /// Addresses and points of interest in an installed region whose name
    /// contains `name`. Local data only.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidQuery`] when `name` is too short.
    pub fn search_by_name_in_region(
        &mut self,
        region: &RegionId,
        name: &str,
    ) -> Result<Vec<SearchHit>, SearchError> {
        validate_text(name, self.config.min_query_chars)?;
        let limit = self.config.region_name_limit;
        Ok(self.local(|store| store.search_by_name_in_region(region, name.trim(), limit)))
    }

    /// Interpret `query` and route it to the matching search.
    ///
    /// - category and installed region: region-wide category search;
    /// - category and a context centre: radius search around the centre;
    /// - installed region only: by-name search inside the region;
    /// - anything else: free-text search over the remaining term.
    ///
    /// Routed searches that find nothing fall back to free-text search over
    /// the whole query.
    ///
    /// # Errors
    ///
    /// Returns the error of whichever search ran last.
    pub fn search_query(
        &mut self,
        query: &str,
        context: &QueryContext,
    ) -> Result<QueryOutcome, SearchError> {
        validate_text(query, self.config.min_query_chars)?;
        let intent = self.interpreter.interpret(query);
        let installed = |cascade: &Self, region: &RegionId| {
            cascade.available_regions().iter().any(|known| known == region)
        };

        match (intent.category, intent.region.as_ref()) {
            (Some(category), Some(region)) if installed(self, region) => {
                let results = self.search_category_in_region(region, &[category])?;
                if !results.is_empty() {
                    return Ok(QueryOutcome::PointsOfInterest {
                        category,
                        region: Some(region.clone()),
                        results,
                    });
                }
                log::debug!("no {category} in region {region}, falling back to text search");
            }
            (Some(category), None) => {
                if let Some(center) = context.center {
                    let nearby =
                        NearbyQuery::new(center, self.config.category_radius_km, [category]);
                    let results = self.search_nearby(&nearby)?;
                    if !results.is_empty() {
                        return Ok(QueryOutcome::PointsOfInterest {
                            category,
                            region: None,
                            results,
                        });
                    }
                    log::debug!("no {category} near {center:?}, falling back to text search");
                }
            }
            (None, Some(region)) if installed(self, region) => {
                let results = self.search_by_name_in_region(region, &intent.search_term)?;
                if !results.is_empty() {
                    return Ok(QueryOutcome::RegionMatches {
                        region: region.clone(),
                        results,
                    });
                }
                log::debug!("no names matched in region {region}, falling back to text search");
            }
            (None, None) => {
                let term = if intent.search_term.trim().chars().count() >= self.config.min_query_chars {
                    intent.search_term.as_str()
                } else {
                    query
                };
                let results = self.search(term)?;
                return Ok(QueryOutcome::Addresses { results });
            }
            _ => {}
        }

        let results = self.search(query)?;
        Ok(QueryOutcome::Addresses { results })
    }

    /// Postal address for `location`, tried against each reverse geocoder in
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::NetworkUnavailable`] in offline-only mode or
    /// when the network is unreachable, [`SearchError::InvalidQuery`] for
    /// invalid coordinates, or the first provider failure when no geocoder
    /// produced an address.
    pub fn reverse(&mut self, location: Coord<f64>) -> Result<Option<String>, SearchError> {
        validate_coordinate(location)?;
        if self.config.offline_only || !self.connectivity.is_reachable() {
            return Err(SearchError::NetworkUnavailable);
        }
        let mut first_failure: Option<ProviderError> = None;
        for geocoder in &self.reverse_geocoders {
            match self.config.retry.run(geocoder.name(), || geocoder.reverse(location)) {
                Ok(Some(address)) if !address.trim().is_empty() => return Ok(Some(address)),
                Ok(_) => log::debug!("{} has no address at {location:?}", geocoder.name()),
                Err(err) => {
                    log::warn!("reverse geocoding via {} failed: {err}", geocoder.name());
                    first_failure.get_or_insert(err);
                }
            }
        }
        first_failure.map_or(Ok(None), |err| Err(err.into()))
    }

    /// Release region store handles.
    pub fn close(&mut self) {
        if let Some(store) = self.region_store.as_mut() {
            store.close();
        }
    }

    /// Run `search` against the region store when any region is installed.
    ///
    /// Store failures are logged and read as "no local data".
    fn local<T>(
        &mut self,
        search: impl FnOnce(&mut dyn RegionStore) -> Result<Vec<T>, crate::RegionStoreError>,
    ) -> Vec<T> {
        let Some(store) = self.region_store.as_mut() else {
            return Vec::new();
        };
        match store.available_regions() {
            Ok(regions) if regions.is_empty() => return Vec::new(),
            Ok(_) => {}
            Err(err) => {
                log::warn!("cannot list installed regions: {err}");
                return Vec::new();
            }
        }
        search(store.as_mut()).unwrap_or_else(|err| {
            log::warn!("region store search failed: {err}");
            Vec::new()
        })
    }

    /// Apply the fallback policy to a local answer and provider tiers.
    fn cascade<T, P>(
        &self,
        local: Vec<T>,
        tiers: &[Box<P>],
        mut call: impl FnMut(&P) -> Result<Vec<T>, ProviderError>,
    ) -> Result<Vec<T>, SearchError>
    where
        P: Provider + ?Sized,
    {
        if self.config.offline_only {
            return Ok(local);
        }
        if !local.is_empty() && local.len() >= self.config.sufficiency_threshold {
            log::debug!("{} local results meet the threshold", local.len());
            return Ok(local);
        }
        if tiers.is_empty() {
            return Ok(local);
        }
        if !self.connectivity.is_reachable() {
            return if local.is_empty() {
                Err(SearchError::NetworkUnavailable)
            } else {
                Ok(local)
            };
        }

        let mut first_failure: Option<ProviderError> = None;
        for provider in tiers {
            let provider = provider.as_ref();
            match self.config.retry.run(provider.name(), || call(provider)) {
                Ok(records) if !records.is_empty() => {
                    log::debug!("{} answered with {} results", provider.name(), records.len());
                    return Ok(records);
                }
                Ok(_) => log::debug!("{} returned no results", provider.name()),
                Err(err) => {
                    log::warn!("{} failed: {err}", provider.name());
                    first_failure.get_or_insert(err);
                }
            }
        }

        if !local.is_empty() {
            return Ok(local);
        }
        first_failure.map_or(Ok(Vec::new()), |err| Err(err.into()))
    }
}

impl Drop for SearchCascade {
    fn drop(&mut self) {
        self.close();
    }
}

/// Measure, clip to the radius, sort and truncate provider answers.
fn within_radius(
    records: Vec<PointOfInterestRecord>,
    query: &NearbyQuery,
    limit: usize,
) -> Vec<PointOfInterestRecord> {
    let radius_m = query.radius_m();
    let mut kept: Vec<_> = records
        .into_iter()
        .filter(|record| haversine_distance(query.center, record.location) <= radius_m)
        .filter(|record| {
            record
                .category
                .is_some_and(|category| query.categories.contains(&category))
        })
        .map(|record| record.measured_from(query.center))
        .collect();
    sort_by_distance(&mut kept);
    kept.truncate(limit);
    kept
}
