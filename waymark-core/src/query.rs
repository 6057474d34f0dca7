//! Validated inputs for spatial and free-text searches.

use geo::Coord;
use thiserror::Error;

use crate::Category;

/// Rejections raised before any I/O takes place.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// The text query is shorter than the configured minimum.
    #[error("query must contain at least {min_chars} characters")]
    TooShort {
        /// Minimum number of non-whitespace-trimmed characters.
        min_chars: usize,
    },
    /// A spatial query named no categories.
    #[error("at least one category must be selected")]
    NoCategories,
    /// The radius was not a positive, finite number of kilometres.
    #[error("radius must be a positive number of kilometres, got {radius_km}")]
    InvalidRadius {
        /// Rejected radius.
        radius_km: f64,
    },
    /// The coordinate lies outside WGS84 bounds.
    #[error("coordinate ({lat}, {lon}) is outside the valid range")]
    InvalidCoordinate {
        /// Rejected latitude.
        lat: f64,
        /// Rejected longitude.
        lon: f64,
    },
}

/// Check that `location` is a finite WGS84 coordinate.
///
/// # Errors
///
/// Returns [`QueryError::InvalidCoordinate`] when either axis is out of range.
pub fn validate_coordinate(location: Coord<f64>) -> Result<(), QueryError> {
    let lat_ok = (-90.0..=90.0).contains(&location.y);
    let lon_ok = (-180.0..=180.0).contains(&location.x);
    if lat_ok && lon_ok {
        Ok(())
    } else {
        Err(QueryError::InvalidCoordinate {
            lat: location.y,
            lon: location.x,
        })
    }
}

/// Check that `text` is long enough once trimmed.
///
/// # Errors
///
/// Returns [`QueryError::TooShort`] when fewer than `min_chars` remain.
pub fn validate_text(text: &str, min_chars: usize) -> Result<(), QueryError> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.chars().count() < min_chars {
        Err(QueryError::TooShort { min_chars })
    } else {
        Ok(())
    }
}

/// A radius search for points of interest.
///
/// # Examples
///
/// ```
/// use geo::Coord;
/// use waymark_core::{Category, NearbyQuery};
///
/// let query = NearbyQuery::new(Coord { x: -92.28, y: 34.74 }, 5.0, [Category::Hospital]);
/// assert!(query.validate().is_ok());
/// assert_eq!(query.radius_m(), 5_000.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NearbyQuery {
    /// Query centre, `x = longitude`, `y = latitude`.
    pub center: Coord<f64>,
    /// Search radius in kilometres.
    pub radius_km: f64,
    /// Categories to include, in caller order and without duplicates.
    pub categories: Vec<Category>,
}

impl NearbyQuery {
    /// Build a query; duplicate categories are dropped.
    pub fn new<I>(center: Coord<f64>, radius_km: f64, categories: I) -> Self
    where
        I: IntoIterator<Item = Category>,
    {
        let mut unique: Vec<Category> = Vec::new();
        for category in categories {
            if !unique.contains(&category) {
                unique.push(category);
            }
        }
        Self {
            center,
            radius_km,
            categories: unique,
        }
    }

    /// Radius in metres.
    #[must_use]
    pub fn radius_m(&self) -> f64 {
        self.radius_km * 1000.0
    }

    /// Reject empty category sets, non-positive radii and bad coordinates.
    ///
    /// # Errors
    ///
    /// Returns the first [`QueryError`] that applies.
    pub fn validate(&self) -> Result<(), QueryError> {
        if self.categories.is_empty() {
            return Err(QueryError::NoCategories);
        }
        if !(self.radius_km.is_finite() && self.radius_km > 0.0) {
            return Err(QueryError::InvalidRadius {
                radius_km: self.radius_km,
            });
        }
        validate_coordinate(self.center)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn duplicate_categories_are_dropped() {
        let query = NearbyQuery::new(
            Coord { x: 0.0, y: 0.0 },
            1.0,
            [Category::Bank, Category::Atm, Category::Bank],
        );
        assert_eq!(query.categories, vec![Category::Bank, Category::Atm]);
    }

    #[rstest]
    #[case(NearbyQuery::new(Coord { x: 0.0, y: 0.0 }, 1.0, []), QueryError::NoCategories)]
    #[case(
        NearbyQuery::new(Coord { x: 0.0, y: 0.0 }, 0.0, [Category::Bank]),
        QueryError::InvalidRadius { radius_km: 0.0 }
    )]
    #[case(
        NearbyQuery::new(Coord { x: 200.0, y: 0.0 }, 1.0, [Category::Bank]),
        QueryError::InvalidCoordinate { lat: 0.0, lon: 200.0 }
    )]
    fn invalid_queries_are_rejected(#[case] query: NearbyQuery, #[case] expected: QueryError) {
        assert_eq!(query.validate(), Err(expected));
    }

    #[rstest]
    fn nan_radius_is_rejected() {
        let query = NearbyQuery::new(Coord { x: 0.0, y: 0.0 }, f64::NAN, [Category::Bank]);
        assert!(matches!(query.validate(), Err(QueryError::InvalidRadius { .. })));
    }

    #[rstest]
    #[case("", false)]
    #[case(" a ", false)]
    #[case("ab", true)]
    #[case("école", true)]
    fn text_length_is_counted_in_characters(#[case] text: &str, #[case] ok: bool) {
        assert_eq!(validate_text(text, 2).is_ok(), ok);
    }
}
