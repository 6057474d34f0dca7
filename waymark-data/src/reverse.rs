//! Point-to-address lookup through Photon and Nominatim.
//!
//! Both geocoders render the same multi-line layout:
//!
//! ```text
//! 500 Woodlane St
//! State Capitol
//! Little Rock
//! Arkansas, US
//! ```
//!
//! The building or venue line is dropped when it repeats the street or the
//! locality.

use geo::Coord;
use serde_json::Value;
use waymark_core::{Provider, ProviderError, ReverseGeocoder};

use crate::{
    http::{HttpProviderConfig, JsonClient, ProviderBuildError},
    nominatim::{self, LOCALITY_KEYS, Place},
    photon::{self, FeatureCollection, Properties},
};

/// Fields of a postal address, each optional.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct AddressLines<'a> {
    house_number: Option<&'a str>,
    street: Option<&'a str>,
    name: Option<&'a str>,
    locality: Option<&'a str>,
    state: Option<&'a str>,
    country_code: Option<&'a str>,
}

impl AddressLines<'_> {
    fn render(&self) -> Option<String> {
        let street = present(self.street);
        let locality = present(self.locality);
        let mut lines: Vec<String> = Vec::new();
        if let Some(street) = street {
            lines.push(match present(self.house_number) {
                Some(number) => format!("{number} {street}"),
                None => street.to_owned(),
            });
        }
        if let Some(name) = present(self.name) {
            let repeats = [street, locality]
                .into_iter()
                .flatten()
                .any(|other| other.eq_ignore_ascii_case(name));
            if !repeats {
                lines.push(name.to_owned());
            }
        }
        if let Some(locality) = locality {
            lines.push(locality.to_owned());
        }
        match (present(self.state), present(self.country_code)) {
            (Some(state), Some(code)) => lines.push(format!("{state}, {code}")),
            (Some(value), None) | (None, Some(value)) => lines.push(value.to_owned()),
            (None, None) => {}
        }
        (!lines.is_empty()).then(|| lines.join("\n"))
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Two-letter code for common country names; unknown names pass through.
fn country_code(country: &str) -> String {
    let code = match country.trim().to_lowercase().as_str() {
        "united states" | "united states of america" | "usa" => "US",
        "united kingdom" | "uk" | "great britain" => "UK",
        "canada" => "CA",
        "mexico" | "méxico" => "MX",
        "spain" | "españa" => "ES",
        "france" => "FR",
        "germany" | "deutschland" => "DE",
        "italy" | "italia" => "IT",
        "portugal" => "PT",
        "netherlands" | "nederland" => "NL",
        "belgium" | "belgique" => "BE",
        "switzerland" | "schweiz" | "suisse" => "CH",
        "austria" | "österreich" => "AT",
        "poland" | "polska" => "PL",
        "sweden" | "sverige" => "SE",
        "norway" | "norge" => "NO",
        "denmark" | "danmark" => "DK",
        "finland" | "suomi" => "FI",
        "ireland" | "éire" => "IE",
        "australia" => "AU",
        "japan" => "JP",
        "china" => "CN",
        "india" => "IN",
        "brazil" | "brasil" => "BR",
        _ => return country.trim().to_owned(),
    };
    code.to_owned()
}

fn coordinate_query(location: Coord<f64>) -> [(&'static str, String); 2] {
    [
        ("lat", format!("{:.6}", location.y)),
        ("lon", format!("{:.6}", location.x)),
    ]
}

fn photon_address(properties: &Properties) -> Option<String> {
    let code = properties
        .countrycode
        .as_deref()
        .and_then(|code| present(Some(code)))
        .map(str::to_uppercase)
        .or_else(|| present(properties.country.as_deref()).map(country_code));
    let locality = [
        &properties.city,
        &properties.locality,
        &properties.town,
        &properties.village,
        &properties.district,
    ]
    .into_iter()
    .find_map(|value| present(value.as_deref()));
    AddressLines {
        house_number: properties.housenumber.as_deref(),
        street: present(properties.street.as_deref()).or(properties.road.as_deref()),
        name: properties.name.as_deref(),
        locality,
        state: properties.state.as_deref(),
        country_code: code.as_deref(),
    }
    .render()
}

fn nominatim_address(place: &Place) -> Option<String> {
    let code = place
        .address_field(&["country_code"])
        .map(str::to_uppercase)
        .or_else(|| place.address_field(&["country"]).map(country_code));
    AddressLines {
        house_number: place.address_field(&["house_number"]),
        street: place.address_field(&["road"]),
        name: place
            .address_field(&["building"])
            .or(place.name.as_deref()),
        locality: place.address_field(LOCALITY_KEYS),
        state: place.address_field(&["state"]),
        country_code: code.as_deref(),
    }
    .render()
    .or_else(|| {
        place
            .display_name
            .clone()
            .filter(|value| !value.trim().is_empty())
    })
}

/// Reverse geocoding against a Photon instance (`GET /reverse`).
#[derive(Debug)]
pub struct PhotonReverseGeocoder {
    client: JsonClient,
}

impl PhotonReverseGeocoder {
    /// Geocoder for the Photon instance at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL, HTTP client or runtime is invalid.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProviderBuildError> {
        Self::with_config(&HttpProviderConfig::new(base_url))
    }

    /// Geocoder with explicit connection settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL, HTTP client or runtime is invalid.
    pub fn with_config(config: &HttpProviderConfig) -> Result<Self, ProviderBuildError> {
        Ok(Self {
            client: JsonClient::new(photon::NAME, config)?,
        })
    }
}

impl Provider for PhotonReverseGeocoder {
    fn name(&self) -> &'static str {
        self.client.provider()
    }
}

impl ReverseGeocoder for PhotonReverseGeocoder {
    fn reverse(&self, location: Coord<f64>) -> Result<Option<String>, ProviderError> {
        let [lat, lon] = coordinate_query(location);
        let url = self
            .client
            .endpoint("/reverse", &[lat, lon, ("limit", "1".to_owned())]);
        let collection: FeatureCollection = self.client.get_json(url)?;
        Ok(photon::features(collection)
            .first()
            .and_then(|feature| photon_address(&feature.properties)))
    }
}

/// Reverse geocoding against a Nominatim instance (`GET /reverse`).
#[derive(Debug)]
pub struct NominatimReverseGeocoder {
    client: JsonClient,
}

impl NominatimReverseGeocoder {
    /// Geocoder for the Nominatim instance at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL, HTTP client or runtime is invalid.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProviderBuildError> {
        Self::with_config(&HttpProviderConfig::new(base_url))
    }

    /// Geocoder with explicit connection settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL, HTTP client or runtime is invalid.
    pub fn with_config(config: &HttpProviderConfig) -> Result<Self, ProviderBuildError> {
        Ok(Self {
            client: JsonClient::new(nominatim::NAME, config)?,
        })
    }
}

impl Provider for NominatimReverseGeocoder {
    fn name(&self) -> &'static str {
        self.client.provider()
    }
}

impl ReverseGeocoder for NominatimReverseGeocoder {
    fn reverse(&self, location: Coord<f64>) -> Result<Option<String>, ProviderError> {
        let [lat, lon] = coordinate_query(location);
        let url = self.client.endpoint(
            "/reverse",
            &[
                lat,
                lon,
                ("format", "json".to_owned()),
                ("addressdetails", "1".to_owned()),
            ],
        );
        let body: Value = self.client.get_json(url)?;
        // "Unable to geocode" arrives as `{"error": ...}` with a 200 status.
        if body.get("error").is_some() {
            return Ok(None);
        }
        let place: Place = serde_json::from_value(body).map_err(|err| ProviderError::Parse {
            provider: nominatim::NAME,
            message: err.to_string(),
        })?;
        Ok(nominatim_address(&place))
    }
}
