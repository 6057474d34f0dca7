//! Great-circle distances and radius bounding boxes.
//!
//! Coordinates use WGS84 with `x = longitude` and `y = latitude`, in degrees.

use geo::{Coord, Rect};

/// Mean Earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Kilometres spanned by one degree of latitude.
pub const KM_PER_DEGREE: f64 = 111.0;

/// Haversine distance in metres between two coordinates.
///
/// # Examples
///
/// ```
/// use geo::Coord;
/// use waymark_core::geodesy::haversine_distance;
///
/// let little_rock = Coord { x: -92.2896, y: 34.7465 };
/// assert_eq!(haversine_distance(little_rock, little_rock), 0.0);
/// ```
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "great-circle distance requires floating point maths"
)]
pub fn haversine_distance(from: Coord<f64>, to: Coord<f64>) -> f64 {
    let lat1 = from.y.to_radians();
    let lat2 = to.y.to_radians();
    let delta_lat = (to.y - from.y).to_radians();
    let delta_lon = (to.x - from.x).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

/// Axis-aligned box that contains every point within `radius_km` of `center`.
///
/// The latitude half-height is `radius_km / 111` degrees and the longitude
/// half-width is `radius_km / (111 * cos(lat))`. Near the poles the box
/// widens to the full longitude range. Both axes are clamped, so a circle
/// crossing the antimeridian is cut at ±180°; use [`radius_boxes`] to cover
/// the far side.
#[must_use]
pub fn radius_bounds(center: Coord<f64>, radius_km: f64) -> Rect<f64> {
    let (lon_delta, lat_delta) = half_extents(center, radius_km);
    Rect::new(
        Coord {
            x: (center.x - lon_delta).max(-180.0),
            y: (center.y - lat_delta).max(-90.0),
        },
        Coord {
            x: (center.x + lon_delta).min(180.0),
            y: (center.y + lat_delta).min(90.0),
        },
    )
}

/// Boxes that together contain every point within `radius_km` of `center`.
///
/// Returns [`radius_bounds`] alone unless the circle crosses the
/// antimeridian, in which case the overhang is wrapped into a second box on
/// the other side of ±180°.
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "wrapping shifts longitudes by a full turn"
)]
pub fn radius_boxes(center: Coord<f64>, radius_km: f64) -> Vec<Rect<f64>> {
    let bounds = radius_bounds(center, radius_km);
    let (lon_delta, _) = half_extents(center, radius_km);
    let west = center.x - lon_delta;
    let east = center.x + lon_delta;
    let (south, north) = (bounds.min().y, bounds.max().y);
    let overhang = if lon_delta >= 180.0 {
        None
    } else if west < -180.0 {
        Some((west + 360.0, 180.0))
    } else if east > 180.0 {
        Some((-180.0, east - 360.0))
    } else {
        None
    };
    let mut boxes = vec![bounds];
    if let Some((min_lon, max_lon)) = overhang {
        boxes.push(Rect::new(
            Coord { x: min_lon, y: south },
            Coord { x: max_lon, y: north },
        ));
    }
    boxes
}

/// Longitude and latitude half-extents, in degrees, of a radius.
#[expect(
    clippy::float_arithmetic,
    reason = "degree deltas are derived from kilometre radii"
)]
fn half_extents(center: Coord<f64>, radius_km: f64) -> (f64, f64) {
    let lat_delta = radius_km / KM_PER_DEGREE;
    let cos_lat = center.y.to_radians().cos();
    let lon_delta = if cos_lat.abs() < f64::EPSILON {
        180.0
    } else {
        (radius_km / (KM_PER_DEGREE * cos_lat)).abs().min(180.0)
    };
    (lon_delta, lat_delta)
}

/// Whether `point` lies inside `bounds`, edges included.
#[must_use]
pub fn within_bounds(bounds: &Rect<f64>, point: Coord<f64>) -> bool {
    (bounds.min().x..=bounds.max().x).contains(&point.x)
        && (bounds.min().y..=bounds.max().y).contains(&point.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn assert_close(actual: f64, expected: f64, tolerance: f64) {
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {expected} ± {tolerance}, got {actual}"
        );
    }

    #[rstest]
    fn one_degree_of_latitude_is_about_111_km() {
        let distance = haversine_distance(Coord { x: 0.0, y: 0.0 }, Coord { x: 0.0, y: 1.0 });
        assert_close(distance, 111_195.0, 5.0);
    }

    #[rstest]
    fn distance_is_symmetric() {
        let a = Coord { x: -77.0369, y: 38.9072 };
        let b = Coord { x: -74.0060, y: 40.7128 };
        assert_close(haversine_distance(a, b), haversine_distance(b, a), 1e-6);
        assert_close(haversine_distance(a, b), 328_000.0, 2_000.0);
    }

    #[rstest]
    fn bounds_cover_radius_in_each_direction() {
        let center = Coord { x: -92.0, y: 35.0 };
        let bounds = radius_bounds(center, 10.0);
        let north = Coord { x: center.x, y: center.y + 0.089 };
        let east = Coord { x: center.x + 0.109, y: center.y };
        assert!(within_bounds(&bounds, north));
        assert!(within_bounds(&bounds, east));
        assert!(!within_bounds(&bounds, Coord { x: center.x, y: center.y + 0.1 }));
    }

    #[rstest]
    fn bounds_are_clamped_near_the_pole() {
        let bounds = radius_bounds(Coord { x: 0.0, y: 89.99 }, 50.0);
        assert_close(bounds.max().y, 90.0, 1e-9);
        assert_close(bounds.min().x, -180.0, 1e-9);
        assert_close(bounds.max().x, 180.0, 1e-9);
    }

    #[rstest]
    fn bounds_are_clamped_at_the_antimeridian() {
        let bounds = radius_bounds(Coord { x: 179.95, y: 0.0 }, 20.0);
        assert_close(bounds.max().x, 180.0, 1e-9);
        assert!(!within_bounds(&bounds, Coord { x: -179.95, y: 0.0 }));
    }

    #[rstest]
    #[case(179.95, -179.95)]
    #[case(-179.95, 179.95)]
    fn boxes_wrap_across_the_antimeridian(#[case] center_lon: f64, #[case] far_lon: f64) {
        let center = Coord { x: center_lon, y: 0.0 };
        let far_side = Coord { x: far_lon, y: 0.0 };
        let boxes = radius_boxes(center, 20.0);
        assert_eq!(boxes.len(), 2);
        assert!(boxes.iter().any(|bounds| within_bounds(bounds, far_side)));
        assert!(haversine_distance(center, far_side) < 20_000.0);
    }

    #[rstest]
    fn boxes_stay_single_away_from_the_antimeridian() {
        let center = Coord { x: -92.0, y: 35.0 };
        assert_eq!(radius_boxes(center, 10.0), vec![radius_bounds(center, 10.0)]);
    }
}
