//! Photon forward geocoder.
//!
//! Photon answers `GET /api/?q=<text>&limit=<n>` with a GeoJSON feature
//! collection. It tolerates typos, which is why it is tried first.
//!
//! See: <https://github.com/komoot/photon#search-api>

use geo::Coord;
use serde::Deserialize;
use serde_json::Value;
use waymark_core::{
    AddressParts, AddressProvider, AddressRecord, Provider, ProviderError, SourceKind,
    normalize::{AddressComponents, place_kind},
};

use crate::http::{HttpProviderConfig, JsonClient, ProviderBuildError};

/// Public Photon instance.
pub const PHOTON_BASE_URL: &str = "https://photon.komoot.io";

pub(crate) const NAME: &str = "photon";

/// GeoJSON feature collection returned by Photon.
#[derive(Debug, Deserialize)]
pub(crate) struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Feature {
    pub geometry: Geometry,
    #[serde(default)]
    pub properties: Properties,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Geometry {
    /// `[lon, lat]`.
    pub coordinates: Vec<f64>,
}

/// Feature properties; every field is optional in practice.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct Properties {
    pub osm_id: Option<i64>,
    pub osm_type: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub place_type: Option<String>,
    pub street: Option<String>,
    pub road: Option<String>,
    pub housenumber: Option<String>,
    pub city: Option<String>,
    pub locality: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub district: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub countrycode: Option<String>,
    pub postcode: Option<String>,
}

impl Feature {
    pub(crate) fn location(&self) -> Option<Coord<f64>> {
        match self.geometry.coordinates.as_slice() {
            [lon, lat, ..] if lon.is_finite() && lat.is_finite() => Some(Coord { x: *lon, y: *lat }),
            _ => None,
        }
    }
}

/// Decode each feature, skipping ones that do not fit the schema.
pub(crate) fn features(collection: FeatureCollection) -> Vec<Feature> {
    collection
        .features
        .into_iter()
        .filter_map(|raw| match serde_json::from_value::<Feature>(raw) {
            Ok(feature) => Some(feature),
            Err(err) => {
                log::debug!("skipping malformed Photon feature: {err}");
                None
            }
        })
        .collect()
}

/// Convert a Photon feature collection into address records.
#[must_use]
pub(crate) fn parse_features(collection: FeatureCollection) -> Vec<AddressRecord> {
    features(collection)
        .into_iter()
        .filter_map(|feature| {
            let Some(location) = feature.location() else {
                log::debug!("skipping Photon feature without coordinates");
                return None;
            };
            let properties = feature.properties;
            let display_name = AddressComponents {
                name: properties.name.as_deref(),
                house_number: properties.housenumber.as_deref(),
                street: properties.street.as_deref(),
                locality: properties.city.as_deref(),
                region: properties.state.as_deref(),
                postcode: properties.postcode.as_deref(),
                country: properties.country.as_deref(),
            }
            .display_name();
            Some(AddressRecord::new(AddressParts {
                source: SourceKind::Provider(NAME),
                source_id: properties.osm_id.unwrap_or_default(),
                osm_type: properties.osm_type,
                location,
                name: properties.name.unwrap_or_default(),
                display_name,
                kind: place_kind(properties.place_type.as_deref()),
            }))
        })
        .collect()
}

/// Typo-tolerant address search against a Photon instance.
#[derive(Debug)]
pub struct PhotonProvider {
    client: JsonClient,
}

impl PhotonProvider {
    /// Provider for the Photon instance at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL, HTTP client or runtime is invalid.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProviderBuildError> {
        Self::with_config(&HttpProviderConfig::new(base_url))
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

impl Provider for PhotonProvider {
    fn name(&self) -> &'static str {
        self.client.provider()
    }
}

impl AddressProvider for PhotonProvider {
    fn search(&self, query: &str, limit: usize) -> Result<Vec<AddressRecord>, ProviderError> {
        let url = self.client.endpoint(
            "/api/",
            &[("q", query.to_owned()), ("limit", limit.to_string())],
        );
        let collection: FeatureCollection = self.client.get_json(url)?;
        let mut records = parse_features(collection);
        records.truncate(limit);
        log::debug!("photon found {} results for {query:?}", records.len());
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{CannedResponse, CannedServer};
    use rstest::rstest;
    use waymark_core::PlaceKind;

    const LITTLE_ROCK: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [-92.2896, 34.7465]},
                "properties": {
                    "osm_id": 119, "osm_type": "R", "name": "Little Rock",
                    "type": "city", "state": "Arkansas", "country": "United States",
                    "countrycode": "US"
                }
            },
            {
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [-92.2871, 34.7443]},
                "properties": {
                    "osm_id": 552, "osm_type": "N", "type": "house",
                    "housenumber": "500", "street": "Woodlane St",
                    "city": "Little Rock", "state": "Arkansas", "postcode": "72201"
                }
            },
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": []}},
            {"type": "Feature"}
        ]
    }"#;

    fn collection() -> FeatureCollection {
        serde_json::from_str(LITTLE_ROCK).expect("fixture should deserialise")
    }

    #[rstest]
    fn parses_features_into_records() {
        let records = parse_features(collection());

        assert_eq!(records.len(), 2);
        let city = records.first().expect("city");
        assert_eq!(city.source(), SourceKind::Provider("photon"));
        assert_eq!(city.source_id(), 119);
        assert_eq!(city.osm_type(), Some("R"));
        assert_eq!(city.location(), Coord { x: -92.2896, y: 34.7465 });
        assert_eq!(city.kind(), PlaceKind::Locality);
        assert_eq!(city.display_name(), "Little Rock, Arkansas, United States");
    }

    #[rstest]
    fn builds_display_names_for_unnamed_addresses() {
        let records = parse_features(collection());
        let house = records.get(1).expect("house");

        assert_eq!(house.display_name(), "500 Woodlane St, Little Rock, Arkansas 72201");
        assert_eq!(house.name(), "500 Woodlane St");
        assert_eq!(house.kind(), PlaceKind::Building);
    }

    #[rstest]
    fn parsing_is_deterministic() {
        let first = parse_features(collection());
        let second = parse_features(collection());
        assert_eq!(first, second);
    }

    #[rstest]
    fn missing_feature_list_is_empty() {
        let collection: FeatureCollection = serde_json::from_str("{}").expect("deserialise");
        assert!(parse_features(collection).is_empty());
    }

    #[rstest]
    fn search_requests_the_api_endpoint() {
        let server = CannedServer::start(vec![CannedResponse::json(LITTLE_ROCK)]).expect("server");
        let provider = PhotonProvider::new(server.base_url()).expect("provider should build");

        let records = provider.search("little rock", 1).expect("search should succeed");

        assert_eq!(records.len(), 1);
        let requests = server.requests();
        let request = requests.first().expect("one request");
        assert_eq!(request.method, "GET");
        assert_eq!(request.target, "/api/?q=little+rock&limit=1");
    }
}
