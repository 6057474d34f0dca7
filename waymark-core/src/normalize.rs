//! Shared normalisation rules for turning source payloads into records.
//!
//! Each data source keeps its own schema mapping; this module holds the
//! lookup tables and string builders they have in common.

use crate::{Category, PlaceKind, Tags, UNKNOWN_LOCATION, category};

const COUNTRY_TYPES: &[&str] = &["country"];
const REGION_TYPES: &[&str] = &[
    "state",
    "province",
    "county",
    "region",
    "municipality",
    "district",
    "administrative",
];
const LOCALITY_TYPES: &[&str] = &[
    "city",
    "town",
    "village",
    "hamlet",
    "suburb",
    "neighbourhood",
    "quarter",
    "locality",
];
const BUILDING_TYPES: &[&str] = &[
    "building",
    "house",
    "residential",
    "apartments",
    "hotel",
    "retail",
    "commercial",
    "industrial",
    "warehouse",
    "church",
    "school",
    "university",
    "hospital",
    "stadium",
    "museum",
    "library",
    "theatre",
    "cinema",
    "restaurant",
    "cafe",
    "bar",
    "pub",
    "bank",
    "pharmacy",
    "supermarket",
    "shop",
];
const STREET_TYPES: &[&str] = &["address", "street", "road", "path", "highway"];

/// Map a source's coarse type string to a [`PlaceKind`].
///
/// Matching ignores case. Region databases store types as `class_value`
/// (for example `building_house`); when the whole string is unknown the
/// class prefix is tried. Unknown types map to [`PlaceKind::Other`].
///
/// # Examples
///
/// ```
/// use waymark_core::{PlaceKind, normalize::place_kind};
///
/// assert_eq!(place_kind(Some("Town")), PlaceKind::Locality);
/// assert_eq!(place_kind(Some("shop_bakery")), PlaceKind::Building);
/// assert_eq!(place_kind(None), PlaceKind::Other);
/// ```
#[must_use]
pub fn place_kind(raw_type: Option<&str>) -> PlaceKind {
    let Some(raw) = raw_type.map(|value| value.trim().to_lowercase()) else {
        return PlaceKind::Other;
    };
    classify(&raw)
        .or_else(|| raw.split_once('_').and_then(|(class, _)| classify(class)))
        .unwrap_or(PlaceKind::Other)
}

fn classify(value: &str) -> Option<PlaceKind> {
    let tables = [
        (COUNTRY_TYPES, PlaceKind::Country),
        (REGION_TYPES, PlaceKind::Region),
        (LOCALITY_TYPES, PlaceKind::Locality),
        (BUILDING_TYPES, PlaceKind::Building),
        (STREET_TYPES, PlaceKind::StreetAddress),
    ];
    tables
        .into_iter()
        .find(|(types, _)| types.contains(&value))
        .map(|(_, kind)| kind)
}

/// Optional address components used to assemble a display name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddressComponents<'a> {
    /// Venue or place name.
    pub name: Option<&'a str>,
    /// House number.
    pub house_number: Option<&'a str>,
    /// Street.
    pub street: Option<&'a str>,
    /// City, town or village.
    pub locality: Option<&'a str>,
    /// State or other administrative area.
    pub region: Option<&'a str>,
    /// Postal code.
    pub postcode: Option<&'a str>,
    /// Country.
    pub country: Option<&'a str>,
}

impl AddressComponents<'_> {
    /// Assemble a display name from the present, non-empty fields.
    ///
    /// Order: name, "house number street", locality, region, postal code,
    /// country. The postal code follows the region, or the locality when there
    /// is no region, after a space; other fields are comma-separated. When nothing is present the result is
    /// [`UNKNOWN_LOCATION`].
    ///
    /// # Examples
    ///
    /// ```
    /// use waymark_core::normalize::AddressComponents;
    ///
    /// let parts = AddressComponents {
    ///     house_number: Some("500"),
    ///     street: Some("Woodlane St"),
    ///     locality: Some("Little Rock"),
    ///     region: Some("Arkansas"),
    ///     postcode: Some("72201"),
    ///     ..AddressComponents::default()
    /// };
    /// assert_eq!(parts.display_name(), "500 Woodlane St, Little Rock, Arkansas 72201");
    /// ```
    #[must_use]
    pub fn display_name(&self) -> String {
        let mut segments: Vec<String> = Vec::new();
        if let Some(name) = present(self.name) {
            segments.push(name.to_owned());
        }
        if let Some(street) = present(self.street) {
            match present(self.house_number) {
                Some(number) => segments.push(format!("{number} {street}")),
                None => segments.push(street.to_owned()),
            }
        }
        let locality = present(self.locality);
        let region = present(self.region);
        if let (Some(locality), Some(_)) = (locality, region) {
            segments.push(locality.to_owned());
        }
        match (region.or(locality), present(self.postcode)) {
            (Some(area), Some(postcode)) => segments.push(format!("{area} {postcode}")),
            (Some(value), None) | (None, Some(value)) => segments.push(value.to_owned()),
            (None, None) => {}
        }
        if let Some(country) = present(self.country) {
            segments.push(country.to_owned());
        }
        if segments.is_empty() {
            UNKNOWN_LOCATION.to_owned()
        } else {
            segments.join(", ")
        }
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Name for a tagged point of interest.
///
/// Tries `name`, `official_name` and `alt_name`, then falls back to the
/// matched category's tag value in title case (`fire_station` becomes
/// `Fire station`), then to the category display name.
#[must_use]
pub fn poi_name(tags: &Tags, category: Option<Category>) -> String {
    ["name", "official_name", "alt_name"]
        .into_iter()
        .find_map(|key| present(tags.get(key).map(String::as_str)))
        .map(str::to_owned)
        .or_else(|| {
            category.map(|category| {
                let definition = category.definition();
                tags.get(definition.tag_key)
                    .map_or_else(|| definition.display_name.to_owned(), |value| humanise(value))
            })
        })
        .unwrap_or_else(|| UNKNOWN_LOCATION.to_owned())
}

/// Capitalise the first letter and replace underscores with spaces.
fn humanise(value: &str) -> String {
    let spaced = value.replace('_', " ");
    let mut chars = spaced.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Single-line address from `addr:*` tags: `"number street, city postcode"`.
///
/// Returns an empty string when no address tags are present.
#[must_use]
pub fn address_from_tags(tags: &Tags) -> String {
    let tag = |key: &str| present(tags.get(key).map(String::as_str));
    let street_line = match (tag("addr:housenumber"), tag("addr:street")) {
        (Some(number), Some(street)) => Some(format!("{number} {street}")),
        (None, Some(street)) => Some(street.to_owned()),
        (Some(number), None) => Some(number.to_owned()),
        (None, None) => None,
    };
    let locality_line = match (tag("addr:city"), tag("addr:postcode")) {
        (Some(city), Some(postcode)) => Some(format!("{city} {postcode}")),
        (Some(value), None) | (None, Some(value)) => Some(value.to_owned()),
        (None, None) => None,
    };
    [street_line, locality_line]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(", ")
}

/// Category for a raw tag bag; see [`category::from_tags`].
#[must_use]
pub fn poi_category(tags: &Tags) -> Option<Category> {
    category::from_tags(tags)
}
