//! Free-text query interpretation.
//!
//! [`QueryInterpreter::interpret`] turns text such as `"gas arkansas"` or
//! `"hospitals in virginia"` into a [`QueryIntent`]. It is a pure function
//! over the alias and region dictionaries and performs no I/O.

use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::{AliasMatch, Category, CategoryAliases, RegionDictionary, RegionId};

static NEARBY_SUFFIX: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s+)(?:near\s*me|nearby|near\s*by|close\s*by|around\s*me|near)\s*$").ok()
});

/// Longest region spelling, in words, tried against the end of a query.
const MAX_TRAILING_REGION_WORDS: usize = 3;

/// Structured reading of a free-text query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryIntent {
    /// Matched category, if any.
    pub category: Option<Category>,
    /// How the category was matched.
    pub category_match: Option<AliasMatch>,
    /// Region named in the query, if any.
    pub region: Option<RegionId>,
    /// Whether the query ended with a phrase such as "near me".
    pub nearby: bool,
    /// Remaining text once nearby and location phrases are removed.
    pub search_term: String,
}

impl QueryIntent {
    /// Whether the query named a known region.
    #[must_use]
    pub const fn has_location(&self) -> bool {
        self.region.is_some()
    }

    /// Whether a category was recognised.
    #[must_use]
    pub const fn has_match(&self) -> bool {
        self.category.is_some()
    }
}

/// Interprets queries against shared, immutable dictionaries.
///
/// # Examples
///
/// ```
/// use waymark_core::{Category, QueryInterpreter};
///
/// let interpreter = QueryInterpreter::standard();
/// let intent = interpreter.interpret("gas arkansas");
/// assert_eq!(intent.category, Some(Category::GasStation));
/// assert_eq!(intent.region.as_ref().map(|id| id.as_str()), Some("arkansas"));
/// assert_eq!(intent.search_term, "gas");
/// ```
#[derive(Debug, Clone)]
pub struct QueryInterpreter {
    aliases: Arc<CategoryAliases>,
    regions: Arc<RegionDictionary>,
}

impl QueryInterpreter {
    /// Create an interpreter over the given dictionaries.
    #[must_use]
    pub const fn new(aliases: Arc<CategoryAliases>, regions: Arc<RegionDictionary>) -> Self {
        Self { aliases, regions }
    }

    /// Interpreter over the built-in alias and region tables.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(
            Arc::new(CategoryAliases::standard()),
            Arc::new(RegionDictionary::standard()),
        )
    }

    /// Alias table in use.
    #[must_use]
    pub fn aliases(&self) -> &CategoryAliases {
        &self.aliases
    }

    /// Region dictionary in use.
    #[must_use]
    pub fn regions(&self) -> &RegionDictionary {
        &self.regions
    }

    /// Interpret `query`.
    #[must_use]
    pub fn interpret(&self, query: &str) -> QueryIntent {
        let normalised = query
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        let (text, nearby) = strip_nearby(&normalised);

        let (search_term, region) = match self.extract_location(text) {
            Some((term, region)) => (term.to_owned(), Some(region)),
            None => (text.to_owned(), None),
        };
        let category_match = self.aliases.best_match(&search_term);

        QueryIntent {
            category: category_match.map(AliasMatch::category),
            category_match,
            region,
            nearby,
            search_term,
        }
    }

    fn extract_location<'t>(&self, text: &'t str) -> Option<(&'t str, RegionId)> {
        self.explicit_location(text)
            .or_else(|| self.trailing_location(text))
    }

    /// `"<term> in <location>"`, split at the last `" in "`.
    fn explicit_location<'t>(&self, text: &'t str) -> Option<(&'t str, RegionId)> {
        let (term, location) = text.rsplit_once(" in ")?;
        let term = term.trim();
        if term.is_empty() {
            return None;
        }
        self.regions
            .resolve(location)
            .map(|region| (term, region.clone()))
    }

    /// A region spelling made of the last three, two or one words.
    fn trailing_location<'t>(&self, text: &'t str) -> Option<(&'t str, RegionId)> {
        let boundaries: Vec<usize> = text.match_indices(' ').map(|(index, _)| index).collect();
        (1..=MAX_TRAILING_REGION_WORDS).rev().find_map(|words| {
            let split = *boundaries.len().checked_sub(words).and_then(|i| boundaries.get(i))?;
            let (term, location) = text.split_at(split);
            let term = term.trim();
            if term.is_empty() {
                return None;
            }
            self.regions
                .resolve(location)
                .map(|region| (term, region.clone()))
        })
    }
}

impl Default for QueryInterpreter {
    fn default() -> Self {
        Self::standard()
    }
}

/// Remove a trailing nearby phrase, reporting whether one was present.
fn strip_nearby(text: &str) -> (&str, bool) {
    NEARBY_SUFFIX
        .as_ref()
        .and_then(|pattern| pattern.find(text))
        .map_or((text, false), |found| {
            (text.get(..found.start()).unwrap_or_default().trim(), true)
        })
}
