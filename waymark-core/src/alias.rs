//! Natural-language aliases for point-of-interest categories.
//!
//! [`CategoryAliases`] is built once (usually from [`STANDARD_ALIASES`]) and
//! shared by reference with the query interpreter.

use std::collections::HashMap;

use rapidfuzz::distance::levenshtein;

use crate::Category;

/// Fraction of an alias' length tolerated as edit distance by fuzzy matching.
const FUZZY_DISTANCE_RATIO: f64 = 0.3;

/// Terms shorter than this never take part in fuzzy matching.
const FUZZY_MIN_TERM_CHARS: usize = 3;

/// Built-in lowercase alias phrases.
pub const STANDARD_ALIASES: &[(&str, Category)] = &[
    ("gas", Category::GasStation),
    ("gas station", Category::GasStation),
    ("gasoline", Category::GasStation),
    ("fuel", Category::GasStation),
    ("petrol", Category::GasStation),
    ("petrol station", Category::GasStation),
    ("filling station", Category::GasStation),
    ("hospital", Category::Hospital),
    ("hospitals", Category::Hospital),
    ("emergency room", Category::Hospital),
    ("er", Category::Hospital),
    ("medical center", Category::Hospital),
    ("pharmacy", Category::Pharmacy),
    ("pharmacies", Category::Pharmacy),
    ("drugstore", Category::Pharmacy),
    ("drug store", Category::Pharmacy),
    ("chemist", Category::Pharmacy),
    ("police", Category::PoliceStation),
    ("police station", Category::PoliceStation),
    ("cops", Category::PoliceStation),
    ("sheriff", Category::PoliceStation),
    ("fire station", Category::FireStation),
    ("fire department", Category::FireStation),
    ("firehouse", Category::FireStation),
    ("fire brigade", Category::FireStation),
    ("airport", Category::Airport),
    ("airports", Category::Airport),
    ("airfield", Category::Airport),
    ("heliport", Category::Heliport),
    ("helipad", Category::Heliport),
    ("helicopter", Category::Heliport),
    ("train station", Category::RailwayStation),
    ("railway station", Category::RailwayStation),
    ("train", Category::RailwayStation),
    ("railway", Category::RailwayStation),
    ("metro", Category::RailwayStation),
    ("subway", Category::RailwayStation),
    ("ferry", Category::FerryTerminal),
    ("ferry terminal", Category::FerryTerminal),
    ("parking", Category::Parking),
    ("parking lot", Category::Parking),
    ("car park", Category::Parking),
    ("garage", Category::Parking),
    ("bank", Category::Bank),
    ("banks", Category::Bank),
    ("atm", Category::Atm),
    ("cash machine", Category::Atm),
    ("cash point", Category::Atm),
    ("school", Category::School),
    ("schools", Category::School),
    ("elementary school", Category::School),
    ("high school", Category::School),
    ("restaurant", Category::Restaurant),
    ("restaurants", Category::Restaurant),
    ("food", Category::Restaurant),
    ("eat", Category::Restaurant),
    ("dining", Category::Restaurant),
    ("hotel", Category::Hotel),
    ("hotels", Category::Hotel),
    ("motel", Category::Hotel),
    ("lodging", Category::Hotel),
    ("accommodation", Category::Hotel),
    ("inn", Category::Hotel),
    ("cafe", Category::Cafe),
    ("cafes", Category::Cafe),
    ("coffee", Category::Cafe),
    ("coffee shop", Category::Cafe),
    ("coffeeshop", Category::Cafe),
    ("starbucks", Category::Cafe),
    ("espresso", Category::Cafe),
    ("fast food", Category::FastFood),
    ("fastfood", Category::FastFood),
    ("mcdonalds", Category::FastFood),
    ("burger", Category::FastFood),
    ("burgers", Category::FastFood),
    ("drive thru", Category::FastFood),
    ("drive through", Category::FastFood),
    ("bar", Category::Bar),
    ("bars", Category::Bar),
    ("pub", Category::Pub),
    ("pubs", Category::Pub),
    ("tavern", Category::Bar),
    ("nightclub", Category::Bar),
    ("drinks", Category::Bar),
    ("supermarket", Category::Supermarket),
    ("supermarkets", Category::Supermarket),
    ("grocery", Category::Supermarket),
    ("grocery store", Category::Supermarket),
    ("groceries", Category::Supermarket),
    ("food store", Category::Supermarket),
    ("market", Category::Supermarket),
    ("convenience store", Category::ConvenienceStore),
    ("convenience", Category::ConvenienceStore),
    ("corner store", Category::ConvenienceStore),
    ("7-eleven", Category::ConvenienceStore),
    ("7 eleven", Category::ConvenienceStore),
    ("mall", Category::ShoppingMall),
    ("shopping mall", Category::ShoppingMall),
    ("shopping center", Category::ShoppingMall),
    ("shopping centre", Category::ShoppingMall),
    ("hardware store", Category::HardwareStore),
    ("hardware", Category::HardwareStore),
    ("home depot", Category::HardwareStore),
    ("lowes", Category::HardwareStore),
    ("dentist", Category::Dentist),
    ("dentists", Category::Dentist),
    ("dental", Category::Dentist),
    ("dental office", Category::Dentist),
    ("doctor", Category::Doctor),
    ("doctors", Category::Doctor),
    ("physician", Category::Doctor),
    ("medical office", Category::Doctor),
    ("gp", Category::Doctor),
    ("clinic", Category::Clinic),
    ("clinics", Category::Clinic),
    ("urgent care", Category::Clinic),
    ("walk in clinic", Category::Clinic),
    ("vet", Category::Veterinarian),
    ("vets", Category::Veterinarian),
    ("veterinarian", Category::Veterinarian),
    ("veterinary", Category::Veterinarian),
    ("animal hospital", Category::Veterinarian),
    ("pet doctor", Category::Veterinarian),
    ("car wash", Category::CarWash),
    ("carwash", Category::CarWash),
    ("auto wash", Category::CarWash),
    ("laundry", Category::Laundry),
    ("laundromat", Category::Laundry),
    ("launderette", Category::Laundry),
    ("dry cleaner", Category::Laundry),
    ("dry cleaning", Category::Laundry),
    ("hair salon", Category::HairSalon),
    ("hairdresser", Category::HairSalon),
    ("barber", Category::HairSalon),
    ("barbershop", Category::HairSalon),
    ("haircut", Category::HairSalon),
    ("salon", Category::HairSalon),
    ("cinema", Category::Cinema),
    ("movie theater", Category::Cinema),
    ("movie theatre", Category::Cinema),
    ("movies", Category::Cinema),
    ("theater", Category::Cinema),
    ("theatre", Category::Cinema),
    ("gym", Category::Gym),
    ("gyms", Category::Gym),
    ("fitness", Category::Gym),
    ("fitness center", Category::Gym),
    ("fitness centre", Category::Gym),
    ("workout", Category::Gym),
    ("health club", Category::Gym),
    ("cemetery", Category::Cemetery),
    ("cemeteries", Category::Cemetery),
    ("graveyard", Category::GraveYard),
    ("grave yard", Category::GraveYard),
    ("burial ground", Category::Cemetery),
    ("memorial park", Category::Cemetery),
    ("church", Category::PlaceOfWorship),
    ("churches", Category::PlaceOfWorship),
    ("mosque", Category::PlaceOfWorship),
    ("temple", Category::PlaceOfWorship),
    ("synagogue", Category::PlaceOfWorship),
    ("chapel", Category::PlaceOfWorship),
    ("place of worship", Category::PlaceOfWorship),
    ("library", Category::Library),
    ("libraries", Category::Library),
    ("public library", Category::Library),
    ("post office", Category::PostOffice),
    ("postal", Category::PostOffice),
    ("usps", Category::PostOffice),
    ("mail", Category::PostOffice),
    ("embassy", Category::Embassy),
    ("embassies", Category::Embassy),
    ("consulate", Category::Embassy),
    ("government", Category::Government),
    ("government office", Category::Government),
    ("city hall", Category::Government),
    ("town hall", Category::Government),
    ("dmv", Category::Government),
    ("prison", Category::Prison),
    ("jail", Category::Prison),
    ("correctional", Category::Prison),
    ("camera", Category::Surveillance),
    ("cameras", Category::Surveillance),
    ("surveillance", Category::Surveillance),
    ("cctv", Category::Surveillance),
    ("comm tower", Category::CommTower),
    ("communication tower", Category::CommTower),
    ("radio tower", Category::CommTower),
    ("cell tower", Category::CellTower),
    ("cell phone tower", Category::CellTower),
    ("cellular tower", Category::CellTower),
    ("power station", Category::PowerStation),
    ("power plant", Category::PowerStation),
    ("electric", Category::PowerStation),
    ("water tower", Category::WaterTower),
];

/// How a term was matched to a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasMatch {
    /// The whole term equals an alias.
    Exact(Category),
    /// The term contains an alias on word boundaries.
    Contained(Category),
    /// The term is within the edit-distance tolerance of an alias.
    Fuzzy {
        /// Matched category.
        category: Category,
        /// Levenshtein distance between the term and the alias.
        distance: usize,
    },
}

impl AliasMatch {
    /// Category selected by the match.
    #[must_use]
    pub const fn category(self) -> Category {
        match self {
            Self::Exact(category) | Self::Contained(category) => category,
            Self::Fuzzy { category, .. } => category,
        }
    }
}

#[derive(Debug, Clone)]
struct Alias {
    phrase: String,
    category: Category,
    chars: usize,
    tolerance: usize,
}

/// Immutable many-to-one mapping from lowercase phrases to categories.
///
/// # Examples
///
/// ```
/// use waymark_core::{Category, CategoryAliases};
///
/// let aliases = CategoryAliases::standard();
/// assert_eq!(aliases.lookup("petrol"), Some(Category::GasStation));
/// assert_eq!(
///     aliases.best_match("cheap gas").map(|m| m.category()),
///     Some(Category::GasStation)
/// );
/// ```
#[derive(Debug, Clone)]
pub struct CategoryAliases {
    exact: HashMap<String, Category>,
    // Longest phrase first so containment prefers the most specific alias.
    by_length: Vec<Alias>,
    // Declaration order breaks fuzzy ties.
    declared: Vec<Alias>,
}

impl CategoryAliases {
    /// Build an alias table from `(phrase, category)` pairs.
    ///
    /// Phrases are lowercased and trimmed. When a phrase repeats, the first
    /// occurrence wins.
    pub fn new<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Category)>,
    {
        let mut exact = HashMap::new();
        let mut declared = Vec::new();
        for (phrase, category) in entries {
            let phrase = phrase.trim().to_lowercase();
            if phrase.is_empty() || exact.contains_key(&phrase) {
                continue;
            }
            exact.insert(phrase.clone(), category);
            let chars = phrase.chars().count();
            declared.push(Alias {
                phrase,
                category,
                chars,
                tolerance: fuzzy_tolerance(chars),
            });
        }
        let mut by_length = declared.clone();
        by_length.sort_by(|left, right| right.chars.cmp(&left.chars));
        Self {
            exact,
            by_length,
            declared,
        }
    }

    /// Build the table from [`STANDARD_ALIASES`].
    #[must_use]
    pub fn standard() -> Self {
        Self::new(STANDARD_ALIASES.iter().copied())
    }

    /// Number of distinct phrases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.declared.len()
    }

    /// Whether the table holds no phrases.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.declared.is_empty()
    }

    /// Exact lookup of an already-normalised phrase.
    #[must_use]
    pub fn lookup(&self, phrase: &str) -> Option<Category> {
        self.exact.get(phrase).copied()
    }

    /// Match `term` by exact lookup, then word-boundary containment, then
    /// fuzzy edit distance.
    ///
    /// `term` is expected to be lowercase and trimmed.
    #[must_use]
    pub fn best_match(&self, term: &str) -> Option<AliasMatch> {
        if term.is_empty() {
            return None;
        }
        if let Some(category) = self.lookup(term) {
            return Some(AliasMatch::Exact(category));
        }
        if let Some(category) = self.contained(term) {
            return Some(AliasMatch::Contained(category));
        }
        self.fuzzy(term)
            .map(|(category, distance)| AliasMatch::Fuzzy { category, distance })
    }

    fn contained(&self, term: &str) -> Option<Category> {
        self.by_length
            .iter()
            .find(|alias| contains_on_word_boundary(term, &alias.phrase))
            .map(|alias| alias.category)
    }

    fn fuzzy(&self, term: &str) -> Option<(Category, usize)> {
        if term.chars().count() < FUZZY_MIN_TERM_CHARS {
            return None;
        }
        let mut best: Option<(Category, usize)> = None;
        for alias in &self.declared {
            let distance = levenshtein::distance(term.chars(), alias.phrase.chars());
            if distance > alias.tolerance {
                continue;
            }
            if best.is_none_or(|(_, current)| distance < current) {
                best = Some((alias.category, distance));
            }
        }
        best
    }
}

impl Default for CategoryAliases {
    fn default() -> Self {
        Self::standard()
    }
}

/// Whether `alias` occurs in `term` delimited by spaces or the term edges.
fn contains_on_word_boundary(term: &str, alias: &str) -> bool {
    term == alias
        || term
            .strip_prefix(alias)
            .is_some_and(|rest| rest.starts_with(' '))
        || term
            .strip_suffix(alias)
            .is_some_and(|rest| rest.ends_with(' '))
        || term.contains(&format!(" {alias} "))
}

/// Maximum accepted edit distance for an alias of `chars` characters:
/// `max(1, round(chars * 0.3))`.
#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "alias lengths are small and the rounded tolerance is non-negative"
)]
fn fuzzy_tolerance(chars: usize) -> usize {
    let scaled = (chars as f64 * FUZZY_DISTANCE_RATIO).round() as usize;
    scaled.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn aliases() -> CategoryAliases {
        CategoryAliases::standard()
    }

    #[rstest]
    #[case(1, 1)]
    #[case(3, 1)]
    #[case(5, 2)]
    #[case(8, 2)]
    #[case(9, 3)]
    #[case(12, 4)]
    fn tolerance_scales_with_length(#[case] chars: usize, #[case] expected: usize) {
        assert_eq!(fuzzy_tolerance(chars), expected);
    }

    #[rstest]
    #[case("gas station", "gas station", true)]
    #[case("cheap gas", "gas", true)]
    #[case("gas prices", "gas", true)]
    #[case("best gas here", "gas", true)]
    #[case("vegas", "gas", false)]
    #[case("gasoline", "gas", false)]
    fn word_boundary_containment(#[case] term: &str, #[case] alias: &str, #[case] expected: bool) {
        assert_eq!(contains_on_word_boundary(term, alias), expected);
    }

    #[rstest]
    #[case("hospital", AliasMatch::Exact(Category::Hospital))]
    #[case("animal hospital", AliasMatch::Exact(Category::Veterinarian))]
    #[case("24 hour animal hospital", AliasMatch::Contained(Category::Veterinarian))]
    #[case("bank of america", AliasMatch::Contained(Category::Bank))]
    #[case("hopsital", AliasMatch::Fuzzy { category: Category::Hospital, distance: 2 })]
    #[case("coffe", AliasMatch::Fuzzy { category: Category::Cafe, distance: 1 })]
    fn matches_in_priority_order(
        aliases: CategoryAliases,
        #[case] term: &str,
        #[case] expected: AliasMatch,
    ) {
        assert_eq!(aliases.best_match(term), Some(expected));
    }

    #[rstest]
    #[case("")]
    #[case("zz")]
    #[case("walmart")]
    #[case("springfield")]
    fn unmatched_terms_yield_none(aliases: CategoryAliases, #[case] term: &str) {
        assert_eq!(aliases.best_match(term), None);
    }

    #[rstest]
    fn short_terms_skip_fuzzy_matching() {
        let aliases = CategoryAliases::new([("gp", Category::Doctor)]);
        assert_eq!(aliases.best_match("gq"), None);
    }

    #[rstest]
    fn duplicate_phrases_keep_first_entry() {
        let aliases = CategoryAliases::new([
            (" Depot ", Category::HardwareStore),
            ("depot", Category::RailwayStation),
        ]);
        assert_eq!(aliases.len(), 1);
        assert_eq!(aliases.lookup("depot"), Some(Category::HardwareStore));
    }

    #[rstest]
    fn fuzzy_ties_prefer_declaration_order() {
        let aliases = CategoryAliases::new([("cart", Category::Supermarket), ("card", Category::Bank)]);
        let found = aliases.best_match("carx").expect("fuzzy match");
        assert_eq!(found.category(), Category::Supermarket);
    }
}
