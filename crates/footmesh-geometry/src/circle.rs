//! Circle–circle intersection and the RSSD sign test.
//!
//! Uses the chord-midpoint construction: with `d` the distance between
//! centers, the chord joining the two intersection points crosses the
//! center line at distance `a = (r1² − r2² + d²) / 2d` from the first
//! center, and each point sits `h = sqrt(r1² − a²)` off that line.
//!
//! "No intersection" is a normal outcome, returned as `None`:
//! - disjoint circles (`d > r1 + r2`)
//! - one circle strictly inside the other (`d < |r1 − r2|`)
//! - concentric circles (`d == 0`), including coincident ones
//! - negative or non-finite radii

use crate::Point;

/// Intersect two circles.
///
/// Returns both intersection points, `P − h·perp(u)` first and
/// `P + h·perp(u)` second, where `u` is the unit vector from `center1`
/// toward `center2`. With `center2` to the right of `center1` the first
/// point lies below the center line. Tangent circles yield the same point
/// twice.
pub fn circle_intersection(
    center1: Point,
    radius1: f64,
    center2: Point,
    radius2: f64,
) -> Option<[Point; 2]> {
    let delta = center2 - center1;
    let d = delta.norm();

    if d == 0.0 || !d.is_finite() {
        return None;
    }
    if !(radius1 >= 0.0 && radius2 >= 0.0) || !radius1.is_finite() || !radius2.is_finite() {
        return None;
    }
    if d > radius1 + radius2 || d < (radius1 - radius2).abs() {
        return None;
    }

    let a = (radius1 * radius1 - radius2 * radius2 + d * d) / (2.0 * d);
    // Rounding can push r1² − a² slightly below zero at tangency.
    let h = (radius1 * radius1 - a * a).max(0.0).sqrt();

    let unit = delta * (1.0 / d);
    let midpoint = center1 + unit * a;
    let offset = unit.perp() * h;

    let points = [midpoint - offset, midpoint + offset];
    points.iter().all(Point::is_finite).then_some(points)
}

/// Euclidean distance between two points.
#[inline]
pub fn distance(a: Point, b: Point) -> f64 {
    a.distance(&b)
}

/// Whether a signed differential clears the inclusion threshold.
#[inline]
pub fn rssd_is_positive(value: f64, threshold: f64) -> bool {
    value > threshold
}
