//! Region identifiers and the dictionary of accepted spellings.

use std::{collections::HashMap, fmt};

/// Built-in regions: canonical id, postal abbreviation and extra spellings.
///
/// The canonical id and the abbreviation are always accepted spellings.
pub const STANDARD_REGIONS: &[(&str, &str, &[&str])] = &[
    ("alabama", "AL", &["alabama"]),
    ("alaska", "AK", &["alaska"]),
    ("arizona", "AZ", &["arizona"]),
    ("arkansas", "AR", &["arkansas"]),
    ("california", "CA", &["california"]),
    ("colorado", "CO", &["colorado"]),
    ("connecticut", "CT", &["connecticut"]),
    ("delaware", "DE", &["delaware"]),
    ("district-of-columbia", "DC", &["district of columbia", "washington dc", "washington d.c.", "d.c."]),
    ("florida", "FL", &["florida"]),
    ("georgia", "GA", &["georgia"]),
    ("hawaii", "HI", &["hawaii"]),
    ("idaho", "ID", &["idaho"]),
    ("illinois", "IL", &["illinois"]),
    ("indiana", "IN", &["indiana"]),
    ("iowa", "IA", &["iowa"]),
    ("kansas", "KS", &["kansas"]),
    ("kentucky", "KY", &["kentucky"]),
    ("louisiana", "LA", &["louisiana"]),
    ("maine", "ME", &["maine"]),
    ("maryland", "MD", &["maryland"]),
    ("massachusetts", "MA", &["massachusetts"]),
    ("michigan", "MI", &["michigan"]),
    ("minnesota", "MN", &["minnesota"]),
    ("mississippi", "MS", &["mississippi"]),
    ("missouri", "MO", &["missouri"]),
    ("montana", "MT", &["montana"]),
    ("nebraska", "NE", &["nebraska"]),
    ("nevada", "NV", &["nevada"]),
    ("new-hampshire", "NH", &["new hampshire"]),
    ("new-jersey", "NJ", &["new jersey"]),
    ("new-mexico", "NM", &["new mexico"]),
    ("new-york", "NY", &["new york"]),
    ("north-carolina", "NC", &["north carolina"]),
    ("north-dakota", "ND", &["north dakota"]),
    ("ohio", "OH", &["ohio"]),
    ("oklahoma", "OK", &["oklahoma"]),
    ("oregon", "OR", &["oregon"]),
    ("pennsylvania", "PA", &["pennsylvania"]),
    ("rhode-island", "RI", &["rhode island"]),
    ("south-carolina", "SC", &["south carolina"]),
    ("south-dakota", "SD", &["south dakota"]),
    ("tennessee", "TN", &["tennessee"]),
    ("texas", "TX", &["texas"]),
    ("utah", "UT", &["utah"]),
    ("vermont", "VT", &["vermont"]),
    ("virginia", "VA", &["virginia"]),
    ("washington", "WA", &["washington"]),
    ("west-virginia", "WV", &["west virginia"]),
    ("wisconsin", "WI", &["wisconsin"]),
    ("wyoming", "WY", &["wyoming"]),
];

/// Canonical identifier of a region, e.g. `new-york`.
///
/// Region identifiers double as the stem of region database file names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct RegionId(String);

impl RegionId {
    /// Wrap a canonical identifier. The value is lowercased and trimmed.
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_lowercase())
    }

    /// Borrow the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RegionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One dictionary row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionEntry {
    /// Canonical identifier.
    pub id: RegionId,
    /// Postal abbreviation in upper case.
    pub abbreviation: String,
    /// Every accepted lowercase spelling, including id and abbreviation.
    pub spellings: Vec<String>,
}

/// Case-insensitive lookup of region spellings.
///
/// # Examples
///
/// ```
/// use waymark_core::RegionDictionary;
///
/// let regions = RegionDictionary::standard();
/// assert_eq!(regions.resolve("New York").map(|id| id.as_str()), Some("new-york"));
/// assert_eq!(regions.resolve("nc").map(|id| id.as_str()), Some("north-carolina"));
/// ```
#[derive(Debug, Clone)]
pub struct RegionDictionary {
    entries: Vec<RegionEntry>,
    by_spelling: HashMap<String, usize>,
}

impl RegionDictionary {
    /// Build a dictionary from `(id, abbreviation, spellings)` rows.
    ///
    /// When two rows claim the same spelling, the first row keeps it.
    pub fn new<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str, &'a [&'a str])>,
    {
        let mut entries = Vec::new();
        let mut by_spelling = HashMap::new();
        for (id, abbreviation, extra) in rows {
            let index = entries.len();
            let id = RegionId::new(id);
            let mut spellings = Vec::new();
            let candidates = [id.as_str(), abbreviation]
                .into_iter()
                .chain(extra.iter().copied());
            for spelling in candidates {
                let spelling = spelling.trim().to_lowercase();
                if spelling.is_empty() || by_spelling.contains_key(&spelling) {
                    continue;
                }
                by_spelling.insert(spelling.clone(), index);
                spellings.push(spelling);
            }
            entries.push(RegionEntry {
                id,
                abbreviation: abbreviation.trim().to_uppercase(),
                spellings,
            });
        }
        Self {
            entries,
            by_spelling,
        }
    }

    /// The fifty US states and the District of Columbia.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(STANDARD_REGIONS.iter().copied())
    }

    /// Resolve any accepted spelling to its canonical identifier.
    #[must_use]
    pub fn resolve(&self, spelling: &str) -> Option<&RegionId> {
        self.entry(spelling).map(|entry| &entry.id)
    }

    /// Resolve any accepted spelling to its dictionary row.
    #[must_use]
    pub fn entry(&self, spelling: &str) -> Option<&RegionEntry> {
        let key = spelling.trim().to_lowercase();
        self.by_spelling
            .get(&key)
            .and_then(|index| self.entries.get(*index))
    }

    /// Iterate over dictionary rows in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = &RegionEntry> {
        self.entries.iter()
    }

    /// Number of regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the dictionary is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for RegionDictionary {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn regions() -> RegionDictionary {
        RegionDictionary::standard()
    }

    #[rstest]
    fn standard_dictionary_covers_states_and_district(regions: RegionDictionary) {
        assert_eq!(regions.len(), 51);
    }

    #[rstest]
    #[case("arkansas", "arkansas")]
    #[case("AR", "arkansas")]
    #[case("  Rhode Island ", "rhode-island")]
    #[case("rhode-island", "rhode-island")]
    #[case("district of columbia", "district-of-columbia")]
    #[case("Washington DC", "district-of-columbia")]
    #[case("washington", "washington")]
    #[case("wv", "west-virginia")]
    fn resolves_spellings(regions: RegionDictionary, #[case] spelling: &str, #[case] id: &str) {
        assert_eq!(regions.resolve(spelling), Some(&RegionId::new(id)));
    }

    #[rstest]
    #[case("")]
    #[case("ontario")]
    #[case("new")]
    fn rejects_unknown_spellings(regions: RegionDictionary, #[case] spelling: &str) {
        assert!(regions.resolve(spelling).is_none());
    }

    #[rstest]
    fn entries_expose_abbreviations(regions: RegionDictionary) {
        let entry = regions.entry("new mexico").expect("known region");
        assert_eq!(entry.abbreviation, "NM");
        assert!(entry.spellings.contains(&"nm".to_owned()));
    }

    #[rstest]
    fn first_row_keeps_shared_spelling() {
        let regions = RegionDictionary::new([
            ("georgia", "GA", &[][..]),
            ("georgia-country", "GE", &["georgia"][..]),
        ]);
        assert_eq!(regions.resolve("georgia"), Some(&RegionId::new("georgia")));
        assert_eq!(regions.resolve("ge"), Some(&RegionId::new("georgia-country")));
    }
}
