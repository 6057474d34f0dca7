//! Overpass point-of-interest search.
//!
//! Queries are Overpass QL unions of `node` and `way` clauses, one pair per
//! category, posted as the `data` form field to `/api/interpreter`. Ways are
//! located by the `center` Overpass computes for `out center`.
//!
//! See: <https://wiki.openstreetmap.org/wiki/Overpass_API/Overpass_QL>

use std::time::Duration;

use geo::Coord;
use serde::Deserialize;
use serde_json::Value;
use waymark_core::{
    Category, NearbyQuery, PoiProvider, PointOfInterestRecord, Provider, ProviderError,
    SourceKind, Tags,
    category::{self, query_fragment},
    normalize::{address_from_tags, poi_name},
    record::sort_by_distance,
};

use crate::http::{HttpProviderConfig, JsonClient, ProviderBuildError};

/// Public Overpass instance.
pub const OVERPASS_BASE_URL: &str = "https://overpass-api.de";

/// Request timeout for Overpass, which runs slower than the geocoders.
pub const OVERPASS_TIMEOUT_SECS: u64 = 30;

/// Server-side query budget written into every query.
const SERVER_TIMEOUT_SECS: u32 = 25;

const NAME: &str = "overpass";

#[derive(Debug, Deserialize)]
struct Response {
    #[serde(default)]
    elements: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Element {
    #[serde(default)]
    id: i64,
    #[serde(rename = "type")]
    element_type: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    center: Option<LatLon>,
    tags: Option<Tags>,
}

#[derive(Debug, Deserialize)]
struct LatLon {
    lat: f64,
    lon: f64,
}

impl Element {
    /// `center` for ways, `lat`/`lon` for nodes, else the origin.
    fn location(&self) -> Coord<f64> {
        self.center.as_ref().map_or_else(
            || Coord {
                x: self.lon.unwrap_or_default(),
                y: self.lat.unwrap_or_default(),
            },
            |center| Coord {
                x: center.lon,
                y: center.lat,
            },
        )
    }
}

/// Build the Overpass QL query for `query`.
///
/// # Examples
///
/// ```
/// use geo::Coord;
/// use waymark_core::{Category, NearbyQuery};
/// use waymark_data::overpass::build_query;
///
/// let query = NearbyQuery::new(Coord { x: -92.28, y: 34.74 }, 1.5, [Category::Hospital]);
/// let ql = build_query(&query);
/// assert!(ql.starts_with("[out:json][timeout:25];"));
/// assert!(ql.contains("node[\"amenity\"=\"hospital\"](around:1500,34.74,-92.28);"));
/// assert!(ql.ends_with("out center;\n"));
/// ```
#[must_use]
pub fn build_query(query: &NearbyQuery) -> String {
    let radius_m = radius_metres(query.radius_m());
    let clauses: String = query
        .categories
        .iter()
        .map(|category| query_fragment(*category, query.center, radius_m))
        .collect();
    format!("[out:json][timeout:{SERVER_TIMEOUT_SECS}];\n(\n{clauses});\nout center;\n")
}

/// Radius rounded to whole metres and clamped to the `u32` range.
fn radius_metres(radius_m: f64) -> u32 {
    radius_m.round().clamp(0.0, f64::from(u32::MAX)) as u32
}

/// Convert Overpass elements into records for `query`.
///
/// Elements without tags or located at the origin are skipped. The category
/// is the first requested category whose tag the element carries, falling
/// back to the full category table.
fn parse_elements(response: Response, query: &NearbyQuery) -> Vec<PointOfInterestRecord> {
    response
        .elements
        .into_iter()
        .filter_map(|raw| {
            let element = serde_json::from_value::<Element>(raw)
                .map_err(|err| log::debug!("skipping malformed Overpass element: {err}"))
                .ok()?;
            let location = element.location();
            if location.x == 0.0 && location.y == 0.0 {
                log::debug!("skipping Overpass element {} without a location", element.id);
                return None;
            }
            let tags = element.tags.filter(|tags| !tags.is_empty())?;
            let category = requested_category(&tags, &query.categories)
                .or_else(|| category::from_tags(&tags));
            Some(
                PointOfInterestRecord {
                    source: SourceKind::Provider(NAME),
                    source_id: element.id,
                    osm_type: Some(element.element_type.unwrap_or_else(|| "node".to_owned())),
                    location,
                    category,
                    name: poi_name(&tags, category),
                    address: address_from_tags(&tags),
                    distance_m: None,
                    tags,
                }
                .measured_from(query.center),
            )
        })
        .collect()
}

fn requested_category(tags: &Tags, requested: &[Category]) -> Option<Category> {
    requested.iter().copied().find(|category| {
        let definition = category.definition();
        tags.get(definition.tag_key)
            .is_some_and(|value| value == definition.tag_value)
    })
}

/// Radius and category search against an Overpass instance.
#[derive(Debug)]
pub struct OverpassProvider {
    client: JsonClient,
}

impl OverpassProvider {
    /// Provider for the Overpass instance at `base_url` with the Overpass
    /// request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL, HTTP client or runtime is invalid.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProviderBuildError> {
        Self::with_config(
            &HttpProviderConfig::new(base_url)
                .with_timeout(Duration::from_secs(OVERPASS_TIMEOUT_SECS)),
        )
    }

    /// Provider with explicit connection settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL, HTTP client or runtime is invalid.
    pub fn with_config(config: &HttpProviderConfig) -> Result<Self, ProviderBuildError> {
        Ok(Self {
            client: JsonClient::new(NAME, config)?,
        })
    }
}

impl Provider for OverpassProvider {
    fn name(&self) -> &'static str {
        self.client.provider()
    }
}

impl PoiProvider for OverpassProvider {
    fn search_nearby(
        &self,
        query: &NearbyQuery,
        limit: usize,
    ) -> Result<Vec<PointOfInterestRecord>, ProviderError> {
        let ql = build_query(query);
        log::debug!("overpass query: {ql}");
        let url = self.client.endpoint("/api/interpreter", &[]);
        let response: Response = self.client.post_form_json(url, &[("data", ql.as_str())])?;
        let mut records = parse_elements(response, query);
        sort_by_distance(&mut records);
        records.truncate(limit);
        Ok(records)
    }
}
