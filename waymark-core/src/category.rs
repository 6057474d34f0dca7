//! Point-of-interest categories and the vocabulary table that describes them.
//!
//! Every category is one row of [`DEFINITIONS`]. Behaviour that varies per
//! category (tag lookup, rendering fallback, provider query fragments) is
//! expressed as plain functions over that table.

use std::{collections::BTreeMap, fmt, str::FromStr};

use geo::Coord;
use thiserror::Error;

/// A point-of-interest category.
///
/// Variants are declared in the same order as the rows of [`DEFINITIONS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum Category {
    /// Hospital.
    Hospital,
    /// Pharmacy.
    Pharmacy,
    /// Fire Station.
    FireStation,
    /// Police Station.
    PoliceStation,
    /// Airport.
    Airport,
    /// Heliport.
    Heliport,
    /// Railway Station.
    RailwayStation,
    /// Ferry Terminal.
    FerryTerminal,
    /// Parking.
    Parking,
    /// Gas Station.
    GasStation,
    /// Bank.
    Bank,
    /// Atm.
    Atm,
    /// School.
    School,
    /// Restaurant.
    Restaurant,
    /// Hotel.
    Hotel,
    /// Cafe.
    Cafe,
    /// Fast Food.
    FastFood,
    /// Bar.
    Bar,
    /// Pub.
    Pub,
    /// Supermarket.
    Supermarket,
    /// Convenience Store.
    ConvenienceStore,
    /// Shopping Mall.
    ShoppingMall,
    /// Hardware Store.
    HardwareStore,
    /// Dentist.
    Dentist,
    /// Doctor.
    Doctor,
    /// Clinic.
    Clinic,
    /// Veterinarian.
    Veterinarian,
    /// Car Wash.
    CarWash,
    /// Laundry.
    Laundry,
    /// Hair Salon.
    HairSalon,
    /// Cinema.
    Cinema,
    /// Gym.
    Gym,
    /// Cemetery.
    Cemetery,
    /// Grave Yard.
    GraveYard,
    /// Surveillance.
    Surveillance,
    /// Embassy.
    Embassy,
    /// Government.
    Government,
    /// Prison.
    Prison,
    /// Comm Tower.
    CommTower,
    /// Cell Tower.
    CellTower,
    /// Power Station.
    PowerStation,
    /// Water Tower.
    WaterTower,
    /// Post Office.
    PostOffice,
    /// Place Of Worship.
    PlaceOfWorship,
    /// Library.
    Library,
}

/// Static description of one [`Category`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryDefinition {
    /// Category described by this row.
    pub category: Category,
    /// Stable identifier persisted in region databases (e.g. `GAS_STATION`).
    pub id: &'static str,
    /// Human-readable label.
    pub display_name: &'static str,
    /// Vocabulary key used to tag raw map data (e.g. `amenity`).
    pub tag_key: &'static str,
    /// Vocabulary value paired with [`CategoryDefinition::tag_key`].
    pub tag_value: &'static str,
    /// Symbol identifier used when no dedicated icon exists.
    pub fallback_symbol: &'static str,
    /// Name of the icon asset for the category.
    pub icon: &'static str,
}

/// One row per category, in declaration order of [`Category`].
pub const DEFINITIONS: &[CategoryDefinition] = &[
    CategoryDefinition {
        category: Category::Hospital,
        id: "HOSPITAL",
        display_name: "Hospital",
        tag_key: "amenity",
        tag_value: "hospital",
        fallback_symbol: "a-n-G-I-H",
        icon: "hospital",
    },
    CategoryDefinition {
        category: Category::Pharmacy,
        id: "PHARMACY",
        display_name: "Pharmacy",
        tag_key: "amenity",
        tag_value: "pharmacy",
        fallback_symbol: "a-n-G-I-H",
        icon: "hospital",
    },
    CategoryDefinition {
        category: Category::FireStation,
        id: "FIRE_STATION",
        display_name: "Fire Station",
        tag_key: "amenity",
        tag_value: "fire_station",
        fallback_symbol: "a-n-G-I-FF",
        icon: "firebrigade",
    },
    CategoryDefinition {
        category: Category::PoliceStation,
        id: "POLICE_STATION",
        display_name: "Police Station",
        tag_key: "amenity",
        tag_value: "police",
        fallback_symbol: "a-n-G-I-LP",
        icon: "police",
    },
    CategoryDefinition {
        category: Category::Airport,
        id: "AIRPORT",
        display_name: "Airport",
        tag_key: "aeroway",
        tag_value: "aerodrome",
        fallback_symbol: "a-n-G-I-BA",
        icon: "airport",
    },
    CategoryDefinition {
        category: Category::Heliport,
        id: "HELIPORT",
        display_name: "Heliport",
        tag_key: "aeroway",
        tag_value: "helipad",
        fallback_symbol: "a-n-G-I-BH",
        icon: "helipad",
    },
    CategoryDefinition {
        category: Category::RailwayStation,
        id: "RAILWAY_STATION",
        display_name: "Railway Station",
        tag_key: "railway",
        tag_value: "station",
        fallback_symbol: "a-n-G-I-USR",
        icon: "railway_station",
    },
    CategoryDefinition {
        category: Category::FerryTerminal,
        id: "FERRY_TERMINAL",
        display_name: "Ferry Terminal",
        tag_key: "amenity",
        tag_value: "ferry_terminal",
        fallback_symbol: "a-n-G-I-USUSP",
        icon: "ferry",
    },
    CategoryDefinition {
        category: Category::Parking,
        id: "PARKING",
        display_name: "Parking",
        tag_key: "amenity",
        tag_value: "parking",
        fallback_symbol: "a-n-G",
        icon: "parking",
    },
    CategoryDefinition {
        category: Category::GasStation,
        id: "GAS_STATION",
        display_name: "Gas Station",
        tag_key: "amenity",
        tag_value: "fuel",
        fallback_symbol: "a-n-G-I-RP",
        icon: "fuel",
    },
    CategoryDefinition {
        category: Category::Bank,
        id: "BANK",
        display_name: "Bank",
        tag_key: "amenity",
        tag_value: "bank",
        fallback_symbol: "a-n-G",
        icon: "bank",
    },
    CategoryDefinition {
        category: Category::Atm,
        id: "ATM",
        display_name: "Atm",
        tag_key: "amenity",
        tag_value: "atm",
        fallback_symbol: "a-n-G",
        icon: "bank",
    },
    CategoryDefinition {
        category: Category::School,
        id: "SCHOOL",
        display_name: "School",
        tag_key: "amenity",
        tag_value: "school",
        fallback_symbol: "a-n-G",
        icon: "education",
    },
    CategoryDefinition {
        category: Category::Restaurant,
        id: "RESTAURANT",
        display_name: "Restaurant",
        tag_key: "amenity",
        tag_value: "restaurant",
        fallback_symbol: "a-n-G",
        icon: "restaurant",
    },
    CategoryDefinition {
        category: Category::Hotel,
        id: "HOTEL",
        display_name: "Hotel",
        tag_key: "tourism",
        tag_value: "hotel",
        fallback_symbol: "a-n-G",
        icon: "hotel",
    },
    CategoryDefinition {
        category: Category::Cafe,
        id: "CAFE",
        display_name: "Cafe",
        tag_key: "amenity",
        tag_value: "cafe",
        fallback_symbol: "a-n-G",
        icon: "cafe",
    },
    CategoryDefinition {
        category: Category::FastFood,
        id: "FAST_FOOD",
        display_name: "Fast Food",
        tag_key: "amenity",
        tag_value: "fast_food",
        fallback_symbol: "a-n-G",
        icon: "restaurant",
    },
    CategoryDefinition {
        category: Category::Bar,
        id: "BAR",
        display_name: "Bar",
        tag_key: "amenity",
        tag_value: "bar",
        fallback_symbol: "a-n-G",
        icon: "bar",
    },
    CategoryDefinition {
        category: Category::Pub,
        id: "PUB",
        display_name: "Pub",
        tag_key: "amenity",
        tag_value: "pub",
        fallback_symbol: "a-n-G",
        icon: "bar",
    },
    CategoryDefinition {
        category: Category::Supermarket,
        id: "SUPERMARKET",
        display_name: "Supermarket",
        tag_key: "shop",
        tag_value: "supermarket",
        fallback_symbol: "a-n-G",
        icon: "supermarket",
    },
    CategoryDefinition {
        category: Category::ConvenienceStore,
        id: "CONVENIENCE_STORE",
        display_name: "Convenience Store",
        tag_key: "shop",
        tag_value: "convenience",
        fallback_symbol: "a-n-G",
        icon: "convenience",
    },
    CategoryDefinition {
        category: Category::ShoppingMall,
        id: "SHOPPING_MALL",
        display_name: "Shopping Mall",
        tag_key: "shop",
        tag_value: "mall",
        fallback_symbol: "a-n-G",
        icon: "mall",
    },
    CategoryDefinition {
        category: Category::HardwareStore,
        id: "HARDWARE_STORE",
        display_name: "Hardware Store",
        tag_key: "shop",
        tag_value: "hardware",
        fallback_symbol: "a-n-G",
        icon: "hardware",
    },
    CategoryDefinition {
        category: Category::Dentist,
        id: "DENTIST",
        display_name: "Dentist",
        tag_key: "amenity",
        tag_value: "dentist",
        fallback_symbol: "a-n-G-I-H",
        icon: "hospital",
    },
    CategoryDefinition {
        category: Category::Doctor,
        id: "DOCTOR",
        display_name: "Doctor",
        tag_key: "amenity",
        tag_value: "doctors",
        fallback_symbol: "a-n-G-I-H",
        icon: "hospital",
    },
    CategoryDefinition {
        category: Category::Clinic,
        id: "CLINIC",
        display_name: "Clinic",
        tag_key: "amenity",
        tag_value: "clinic",
        fallback_symbol: "a-n-G-I-H",
        icon: "hospital",
    },
    CategoryDefinition {
        category: Category::Veterinarian,
        id: "VETERINARIAN",
        display_name: "Veterinarian",
        tag_key: "amenity",
        tag_value: "veterinary",
        fallback_symbol: "a-n-G",
        icon: "veterinary",
    },
    CategoryDefinition {
        category: Category::CarWash,
        id: "CAR_WASH",
        display_name: "Car Wash",
        tag_key: "amenity",
        tag_value: "car_wash",
        fallback_symbol: "a-n-G",
        icon: "car_wash",
    },
    CategoryDefinition {
        category: Category::Laundry,
        id: "LAUNDRY",
        display_name: "Laundry",
        tag_key: "shop",
        tag_value: "laundry",
        fallback_symbol: "a-n-G",
        icon: "laundry",
    },
    CategoryDefinition {
        category: Category::HairSalon,
        id: "HAIR_SALON",
        display_name: "Hair Salon",
        tag_key: "shop",
        tag_value: "hairdresser",
        fallback_symbol: "a-n-G",
        icon: "salon",
    },
    CategoryDefinition {
        category: Category::Cinema,
        id: "CINEMA",
        display_name: "Cinema",
        tag_key: "amenity",
        tag_value: "cinema",
        fallback_symbol: "a-n-G",
        icon: "cinema",
    },
    CategoryDefinition {
        category: Category::Gym,
        id: "GYM",
        display_name: "Gym",
        tag_key: "leisure",
        tag_value: "fitness_centre",
        fallback_symbol: "a-n-G",
        icon: "gym",
    },
    CategoryDefinition {
        category: Category::Cemetery,
        id: "CEMETERY",
        display_name: "Cemetery",
        tag_key: "landuse",
        tag_value: "cemetery",
        fallback_symbol: "a-n-G",
        icon: "cemetery",
    },
    CategoryDefinition {
        category: Category::GraveYard,
        id: "GRAVE_YARD",
        display_name: "Grave Yard",
        tag_key: "amenity",
        tag_value: "grave_yard",
        fallback_symbol: "a-n-G",
        icon: "cemetery",
    },
    CategoryDefinition {
        category: Category::Surveillance,
        id: "SURVEILLANCE",
        display_name: "Surveillance",
        tag_key: "man_made",
        tag_value: "surveillance",
        fallback_symbol: "a-n-G",
        icon: "surveillance",
    },
    CategoryDefinition {
        category: Category::Embassy,
        id: "EMBASSY",
        display_name: "Embassy",
        tag_key: "amenity",
        tag_value: "embassy",
        fallback_symbol: "a-n-G",
        icon: "embassy",
    },
    CategoryDefinition {
        category: Category::Government,
        id: "GOVERNMENT",
        display_name: "Government",
        tag_key: "office",
        tag_value: "government",
        fallback_symbol: "a-n-G",
        icon: "city",
    },
    CategoryDefinition {
        category: Category::Prison,
        id: "PRISON",
        display_name: "Prison",
        tag_key: "amenity",
        tag_value: "prison",
        fallback_symbol: "a-n-G",
        icon: "prison",
    },
    CategoryDefinition {
        category: Category::CommTower,
        id: "COMM_TOWER",
        display_name: "Comm Tower",
        tag_key: "man_made",
        tag_value: "tower",
        fallback_symbol: "a-n-G",
        icon: "tower",
    },
    CategoryDefinition {
        category: Category::CellTower,
        id: "CELL_TOWER",
        display_name: "Cell Tower",
        tag_key: "man_made",
        tag_value: "mast",
        fallback_symbol: "a-n-G",
        icon: "tower",
    },
    CategoryDefinition {
        category: Category::PowerStation,
        id: "POWER_STATION",
        display_name: "Power Station",
        tag_key: "power",
        tag_value: "plant",
        fallback_symbol: "a-n-G-I-UP",
        icon: "power",
    },
    CategoryDefinition {
        category: Category::WaterTower,
        id: "WATER_TOWER",
        display_name: "Water Tower",
        tag_key: "man_made",
        tag_value: "water_tower",
        fallback_symbol: "a-n-G",
        icon: "water_tower",
    },
    CategoryDefinition {
        category: Category::PostOffice,
        id: "POST_OFFICE",
        display_name: "Post Office",
        tag_key: "amenity",
        tag_value: "post_office",
        fallback_symbol: "a-n-G",
        icon: "post_office",
    },
    CategoryDefinition {
        category: Category::PlaceOfWorship,
        id: "PLACE_OF_WORSHIP",
        display_name: "Place Of Worship",
        tag_key: "amenity",
        tag_value: "place_of_worship",
        fallback_symbol: "a-n-G",
        icon: "worship",
    },
    CategoryDefinition {
        category: Category::Library,
        id: "LIBRARY",
        display_name: "Library",
        tag_key: "amenity",
        tag_value: "library",
        fallback_symbol: "a-n-G",
        icon: "library",
    },
];

impl Category {
    /// Return the table row describing this category.
    #[must_use]
    #[expect(
        clippy::indexing_slicing,
        reason = "DEFINITIONS rows follow the enum discriminant order"
    )]
    pub fn definition(self) -> &'static CategoryDefinition {
        &DEFINITIONS[self as usize]
    }

    /// Stable identifier, e.g. `GAS_STATION`.
    #[must_use]
    pub fn id(self) -> &'static str {
        self.definition().id
    }

    /// Human-readable label, e.g. `Gas Station`.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        self.definition().display_name
    }

    /// Iterate over every category in table order.
    pub fn all() -> impl Iterator<Item = Self> {
        DEFINITIONS.iter().map(|definition| definition.category)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Error returned when parsing an unknown category identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown category: {0}")]
pub struct ParseCategoryError(pub String);

impl FromStr for Category {
    type Err = ParseCategoryError;

    /// Parse a category identifier. Matching ignores ASCII case and accepts
    /// `-` or spaces in place of `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace(['-', ' '], "_");
        DEFINITIONS
            .iter()
            .find(|definition| definition.id.eq_ignore_ascii_case(&wanted))
            .map(|definition| definition.category)
            .ok_or_else(|| ParseCategoryError(s.to_owned()))
    }
}

/// Find the category tagged by an exact `key=value` pair.
///
/// The first matching row wins.
#[must_use]
pub fn from_tag(key: &str, value: &str) -> Option<Category> {
    DEFINITIONS
        .iter()
        .find(|definition| definition.tag_key == key && definition.tag_value == value)
        .map(|definition| definition.category)
}

/// Derive a category from a raw tag bag.
///
/// Rows are scanned in table order and the first row whose key is present
/// with the matching value wins. Tags with no matching row are
/// uncategorized.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use waymark_core::category::{self, Category};
///
/// let tags = BTreeMap::from([("amenity".to_owned(), "fuel".to_owned())]);
/// assert_eq!(category::from_tags(&tags), Some(Category::GasStation));
/// ```
#[must_use]
pub fn from_tags(tags: &BTreeMap<String, String>) -> Option<Category> {
    DEFINITIONS
        .iter()
        .find(|definition| {
            tags.get(definition.tag_key)
                .is_some_and(|value| value == definition.tag_value)
        })
        .map(|definition| definition.category)
}

/// Build the Overpass QL clauses selecting nodes and ways of `category`
/// within `radius_m` metres of `center`.
#[must_use]
pub fn query_fragment(category: Category, center: Coord<f64>, radius_m: u32) -> String {
    let definition = category.definition();
    let filter = format!(
        "[\"{}\"=\"{}\"](around:{radius_m},{},{})",
        definition.tag_key, definition.tag_value, center.y, center.x
    );
    format!("node{filter};\nway{filter};\n")
}
