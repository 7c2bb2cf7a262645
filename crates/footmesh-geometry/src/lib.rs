//! Footmesh Geometry
//!
//! Pure planar geometry used by the location estimator.
//!
//! # Contents
//!
//! - [`Point`]: a 2-D coordinate in meters with vector arithmetic
//! - [`circle_intersection`]: the chord-midpoint construction for two range circles
//! - [`rssd_is_positive`]: the inclusion test applied to signed strength differentials
//!
//! Nothing here holds state or allocates. Degenerate inputs (concentric
//! centers, disjoint or nested circles) produce `None`, never a panic or NaN.

mod circle;
mod point;

pub use circle::{circle_intersection, distance, rssd_is_positive};
pub use point::Point;

/// Default RSSD inclusion threshold.
pub const DEFAULT_RSSD_THRESHOLD: f64 = 0.5;
