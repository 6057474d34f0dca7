//! Normalised search records shared by every data source.

use std::{collections::BTreeMap, fmt};

use geo::Coord;

use crate::Category;

/// Raw key/value tags carried by a point of interest.
pub type Tags = BTreeMap<String, String>;

/// Sentinel display name used when a payload has no usable text fields.
pub const UNKNOWN_LOCATION: &str = "Unknown location";

/// Where a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum SourceKind {
    /// A locally installed region database.
    RegionStore,
    /// A networked provider, identified by its name.
    Provider(&'static str),
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RegionStore => f.write_str("region-store"),
            Self::Provider(name) => f.write_str(name),
        }
    }
}

/// Coarse classification of an address result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum PlaceKind {
    /// A country.
    Country,
    /// A state, province, county or similar administrative area.
    Region,
    /// A city, town, village or neighbourhood.
    Locality,
    /// A building or named venue.
    Building,
    /// A street or street address.
    StreetAddress,
    /// Anything else.
    Other,
}

impl PlaceKind {
    /// Map zoom level suited to framing a result of this kind.
    ///
    /// Coarser kinds yield lower values.
    #[must_use]
    pub const fn zoom_hint(self) -> f64 {
        match self {
            Self::Country => 3.0,
            Self::Region => 4.0,
            Self::Locality => 6.0,
            Self::Building | Self::StreetAddress | Self::Other => 7.0,
        }
    }
}

/// Unvalidated fields used to build an [`AddressRecord`].
#[derive(Debug, Clone, PartialEq)]
pub struct AddressParts {
    /// Data source.
    pub source: SourceKind,
    /// Identifier assigned by the source.
    pub source_id: i64,
    /// Map element type (`node`, `way`, `relation`, or a one-letter form).
    pub osm_type: Option<String>,
    /// Position, `x = longitude`, `y = latitude`.
    pub location: Coord<f64>,
    /// Short name.
    pub name: String,
    /// Full display name.
    pub display_name: String,
    /// Coarse classification.
    pub kind: PlaceKind,
}

/// An address or named place resolved from text search.
///
/// Records are immutable once constructed. Empty names fall back to the
/// display name and vice versa; when both are empty the
/// [`UNKNOWN_LOCATION`] sentinel is used.
///
/// # Examples
///
/// ```
/// use geo::Coord;
/// use waymark_core::{AddressParts, AddressRecord, PlaceKind, SourceKind};
///
/// let record = AddressRecord::new(AddressParts {
///     source: SourceKind::RegionStore,
///     source_id: 42,
///     osm_type: Some("node".into()),
///     location: Coord { x: -92.28, y: 34.74 },
///     name: "Little Rock".into(),
///     display_name: String::new(),
///     kind: PlaceKind::Locality,
/// });
/// assert_eq!(record.display_name(), "Little Rock");
/// assert_eq!(record.zoom_hint(), 6.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AddressRecord {
    source: SourceKind,
    source_id: i64,
    osm_type: Option<String>,
    location: Coord<f64>,
    name: String,
    display_name: String,
    kind: PlaceKind,
    zoom_hint: f64,
}

impl AddressRecord {
    /// Build a record from raw parts, filling empty text fields.
    #[must_use]
    pub fn new(parts: AddressParts) -> Self {
        let name = parts.name.trim().to_owned();
        let display_name = parts.display_name.trim().to_owned();
        let (name, display_name) = match (name.is_empty(), display_name.is_empty()) {
            (false, false) => (name, display_name),
            (false, true) => (name.clone(), name),
            (true, false) => (short_name(&display_name), display_name),
            (true, true) => (UNKNOWN_LOCATION.to_owned(), UNKNOWN_LOCATION.to_owned()),
        };
        Self {
            source: parts.source,
            source_id: parts.source_id,
            osm_type: parts.osm_type,
            location: parts.location,
            name,
            display_name,
            kind: parts.kind,
            zoom_hint: parts.kind.zoom_hint(),
        }
    }

    /// Data source.
    #[must_use]
    pub const fn source(&self) -> SourceKind {
        self.source
    }

    /// Identifier assigned by the source.
    #[must_use]
    pub const fn source_id(&self) -> i64 {
        self.source_id
    }

    /// Map element type, when known.
    #[must_use]
    pub fn osm_type(&self) -> Option<&str> {
        self.osm_type.as_deref()
    }

    /// Position, `x = longitude`, `y = latitude`.
    #[must_use]
    pub const fn location(&self) -> Coord<f64> {
        self.location
    }

    /// Short name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Coarse classification.
    #[must_use]
    pub const fn kind(&self) -> PlaceKind {
        self.kind
    }

    /// Zoom hint derived from [`AddressRecord::kind`].
    #[must_use]
    pub const fn zoom_hint(&self) -> f64 {
        self.zoom_hint
    }
}

/// First comma-separated segment of a display name.
fn short_name(display_name: &str) -> String {
    display_name
        .split(',')
        .next()
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .unwrap_or(display_name)
        .to_owned()
}

/// A categorised point of interest.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PointOfInterestRecord {
    /// Data source.
    pub source: SourceKind,
    /// Identifier assigned by the source.
    pub source_id: i64,
    /// Map element type, when known.
    pub osm_type: Option<String>,
    /// Position, `x = longitude`, `y = latitude`.
    pub location: Coord<f64>,
    /// Category, or `None` when uncategorised.
    pub category: Option<Category>,
    /// Display name.
    pub name: String,
    /// Free-text address line, possibly empty.
    pub address: String,
    /// Distance in metres from the query centre.
    ///
    /// Only meaningful within one result set; `None` for queries without a
    /// centre.
    pub distance_m: Option<f64>,
    /// Raw tags reported by the source.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "BTreeMap::is_empty"))]
    pub tags: Tags,
}

impl PointOfInterestRecord {
    /// Set the distance from `center`, consuming and returning the record.
    #[must_use]
    pub fn measured_from(mut self, center: Coord<f64>) -> Self {
        self.distance_m = Some(crate::geodesy::haversine_distance(center, self.location));
        self
    }

    /// Distance used for ordering; records without one sort last.
    #[must_use]
    pub fn sort_distance(&self) -> f64 {
        self.distance_m.unwrap_or(f64::INFINITY)
    }
}

/// Sort records by ascending distance from the query centre.
pub fn sort_by_distance(records: &mut [PointOfInterestRecord]) {
    records.sort_by(|left, right| left.sort_distance().total_cmp(&right.sort_distance()));
}

/// One result of a by-name search scoped to a region.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", content = "record", rename_all = "kebab-case"))]
pub enum SearchHit {
    /// A matching address or place.
    Address(AddressRecord),
    /// A matching point of interest.
    PointOfInterest(PointOfInterestRecord),
}

impl SearchHit {
    /// Identifier assigned by the source.
    #[must_use]
    pub const fn source_id(&self) -> i64 {
        match self {
            Self::Address(record) => record.source_id(),
            Self::PointOfInterest(record) => record.source_id,
        }
    }

    /// Position of the hit.
    #[must_use]
    pub const fn location(&self) -> Coord<f64> {
        match self {
            Self::Address(record) => record.location(),
            Self::PointOfInterest(record) => record.location,
        }
    }
}
