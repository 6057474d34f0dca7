//! Nominatim forward geocoder.
//!
//! Nominatim answers `GET /search?q=<text>&format=json&addressdetails=1`
//! with a JSON array of places. Coordinates arrive as decimal strings.
//!
//! See: <https://nominatim.org/release-docs/latest/api/Search/>

use std::collections::BTreeMap;

use geo::Coord;
use serde::Deserialize;
use serde_json::Value;
use waymark_core::{
    AddressParts, AddressProvider, AddressRecord, Provider, ProviderError, SourceKind,
    normalize::{AddressComponents, place_kind},
};

use crate::http::{HttpProviderConfig, JsonClient, ProviderBuildError};

/// Public Nominatim instance.
pub const NOMINATIM_BASE_URL: &str = "https://nominatim.openstreetmap.org";

pub(crate) const NAME: &str = "nominatim";

/// One entry of a Nominatim search or reverse response.
#[derive(Debug, Deserialize)]
pub(crate) struct Place {
    pub place_id: Option<i64>,
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub display_name: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub place_type: Option<String>,
    pub osm_type: Option<String>,
    pub osm_id: Option<i64>,
    #[serde(default)]
    pub address: BTreeMap<String, String>,
}

impl Place {
    fn location(&self) -> Option<Coord<f64>> {
        let lat = self.lat.as_deref()?.trim().parse::<f64>().ok()?;
        let lon = self.lon.as_deref()?.trim().parse::<f64>().ok()?;
        (lat.is_finite() && lon.is_finite()).then_some(Coord { x: lon, y: lat })
    }

    pub(crate) fn address_field(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .find_map(|key| self.address.get(*key))
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    fn fallback_display_name(&self) -> String {
        AddressComponents {
            name: self.name.as_deref(),
            house_number: self.address_field(&["house_number"]),
            street: self.address_field(&["road"]),
            locality: self.address_field(LOCALITY_KEYS),
            region: self.address_field(&["state"]),
            postcode: self.address_field(&["postcode"]),
            country: self.address_field(&["country"]),
        }
        .display_name()
    }
}

/// Address keys holding the locality, most specific first.
pub(crate) const LOCALITY_KEYS: &[&str] = &["city", "town", "village", "municipality"];

/// Convert a Nominatim search response into address records.
///
/// Entries that do not match the schema or carry unreadable coordinates are
/// skipped.
pub(crate) fn parse_places(entries: Vec<Value>) -> Vec<AddressRecord> {
    entries
        .into_iter()
        .filter_map(|raw| {
            let place = serde_json::from_value::<Place>(raw)
                .map_err(|err| log::debug!("skipping malformed Nominatim place: {err}"))
                .ok()?;
            let Some(location) = place.location() else {
                log::debug!("skipping Nominatim place {:?} without coordinates", place.place_id);
                return None;
            };
            let display_name = place
                .display_name
                .clone()
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| place.fallback_display_name());
            Some(AddressRecord::new(AddressParts {
                source: SourceKind::Provider(NAME),
                source_id: place.osm_id.or(place.place_id).unwrap_or_default(),
                osm_type: place.osm_type,
                location,
                name: place.name.unwrap_or_default(),
                display_name,
                kind: place_kind(place.place_type.as_deref()),
            }))
        })
        .collect()
}

/// Address search against a Nominatim instance.
#[derive(Debug)]
pub struct NominatimProvider {
    client: JsonClient,
}

impl NominatimProvider {
    /// Provider for the Nominatim instance at `base_url`.
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

impl Provider for NominatimProvider {
    fn name(&self) -> &'static str {
        self.client.provider()
    }
}

impl AddressProvider for NominatimProvider {
    fn search(&self, query: &str, limit: usize) -> Result<Vec<AddressRecord>, ProviderError> {
        let url = self.client.endpoint(
            "/search",
            &[
                ("q", query.to_owned()),
                ("format", "json".to_owned()),
                ("addressdetails", "1".to_owned()),
                ("limit", limit.to_string()),
            ],
        );
        let entries: Vec<Value> = self.client.get_json(url)?;
        let mut records = parse_places(entries);
        records.truncate(limit);
        log::debug!("nominatim found {} results for {query:?}", records.len());
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{CannedResponse, CannedServer};
    use rstest::rstest;
    use waymark_core::PlaceKind;

    const RICHMOND: &str = r#"[
        {
            "place_id": 2981, "lat": "37.5385087", "lon": "-77.43428",
            "display_name": "Richmond, Virginia, United States",
            "name": "Richmond", "type": "city", "osm_type": "relation", "osm_id": 206393,
            "address": {"city": "Richmond", "state": "Virginia", "country": "United States"}
        },
        {
            "place_id": 77, "lat": "37.54", "lon": "-77.44",
            "type": "house", "osm_type": "way",
            "address": {"house_number": "12", "road": "Main St", "town": "Richmond"}
        },
        {"place_id": 78, "lat": "north", "lon": "-77.44"},
        "not an object"
    ]"#;

    fn entries() -> Vec<Value> {
        serde_json::from_str(RICHMOND).expect("fixture should deserialise")
    }

    #[rstest]
    fn parses_places_with_string_coordinates() {
        let records = parse_places(entries());

        assert_eq!(records.len(), 2);
        let city = records.first().expect("city");
        assert_eq!(city.source(), SourceKind::Provider("nominatim"));
        assert_eq!(city.source_id(), 206_393);
        assert_eq!(city.location(), Coord { x: -77.43428, y: 37.538_508_7 });
        assert_eq!(city.kind(), PlaceKind::Locality);
        assert_eq!(city.name(), "Richmond");
    }

    #[rstest]
    fn falls_back_to_place_id_and_address_details() {
        let records = parse_places(entries());
        let house = records.get(1).expect("house");

        assert_eq!(house.source_id(), 77);
        assert_eq!(house.display_name(), "12 Main St, Richmond");
    }

    #[rstest]
    fn search_sends_expected_parameters() {
        let server = CannedServer::start(vec![CannedResponse::json(RICHMOND)]).expect("server");
        let provider = NominatimProvider::new(server.base_url()).expect("provider should build");

        let records = provider.search("richmond", 10).expect("search should succeed");

        assert_eq!(records.len(), 2);
        let requests = server.requests();
        let request = requests.first().expect("one request");
        assert_eq!(
            request.target,
            "/search?q=richmond&format=json&addressdetails=1&limit=10"
        );
    }

    #[rstest]
    fn non_array_payloads_are_parse_errors() {
        let server =
            CannedServer::start(vec![CannedResponse::json(r#"{"error":"boom"}"#)]).expect("server");
        let provider = NominatimProvider::new(server.base_url()).expect("provider should build");

        let err = provider.search("richmond", 10).expect_err("payload is not a list");

        assert!(matches!(err, ProviderError::Parse { provider: "nominatim", .. }));
    }
}
