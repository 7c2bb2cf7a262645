//! Multilateration by iterative zone intersection.
//!
//! The estimate starts at a reference point with a "possible zone" circle
//! around it. Samples that clear the RSSD threshold are visited nearest
//! first (by anchor distance to the reference). Each one intersects the
//! current zone with its own range circle; on a hit the estimate jumps to
//! the first intersection point and the zone resets, on a miss the
//! estimate is kept and the walk continues.
//!
//! The pass is pure. It never fails and never produces a non-finite
//! point from a finite reference: missing intersections are skipped and
//! an empty or fully excluded sample set yields the reference unchanged.

use footmesh_geometry::{circle_intersection, rssd_is_positive, Point, DEFAULT_RSSD_THRESHOLD};
use tracing::trace;

use crate::{PeerDirectory, PeerToken};

/// Per-anchor input to the estimator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeSample {
    /// Directory entry this sample was taken from
    pub token: PeerToken,
    /// Position of the anchor or peer that was ranged
    pub anchor_position: Point,
    /// Signed strength differential; the sample is used only if it clears the threshold
    pub signed_differential: f64,
    /// Range estimate in meters
    pub radius: f64,
}

/// Estimator tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatorConfig {
    /// Samples with a differential at or below this are excluded
    pub rssd_threshold: f64,
    /// Radius of the possible zone at the start and after every hit
    pub zone_radius: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            rssd_threshold: DEFAULT_RSSD_THRESHOLD,
            zone_radius: 0.0,
        }
    }
}

/// Outcome of one estimation pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    /// Estimated position
    pub position: Point,
    /// Where the walk started
    pub reference: Point,
    /// Samples whose circle intersected the zone
    pub fused: usize,
    /// Included samples that did not intersect
    pub missed: usize,
    /// Samples dropped by the RSSD test
    pub excluded: usize,
}

impl Estimate {
    /// An estimate that never left its starting point.
    pub fn fallback(reference: Point, excluded: usize) -> Self {
        Self {
            position: reference,
            reference,
            fused: 0,
            missed: 0,
            excluded,
        }
    }

    /// Whether no sample contributed.
    pub fn is_fallback(&self) -> bool {
        self.fused == 0
    }
}

/// Run the intersection walk from an explicit reference point.
pub fn estimate_from(reference: Point, samples: &[RangeSample], config: &EstimatorConfig) -> Estimate {
    let mut zones: Vec<(f64, &RangeSample)> = samples
        .iter()
        .filter(|s| rssd_is_positive(s.signed_differential, config.rssd_threshold))
        .map(|s| (s.anchor_position.distance(&reference), s))
        .collect();
    let excluded = samples.len() - zones.len();

    // Stable: equal distances keep sample order.
    zones.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut estimate = Estimate::fallback(reference, excluded);
    let mut zone_radius = config.zone_radius;

    for (_, sample) in zones {
        match circle_intersection(estimate.position, zone_radius, sample.anchor_position, sample.radius) {
            Some([first, _]) => {
                estimate.position = first;
                zone_radius = config.zone_radius;
                estimate.fused += 1;
            }
            None => {
                trace!("sample from {} does not meet the zone, skipping", sample.token);
                estimate.missed += 1;
            }
        }
    }

    estimate
}

/// Estimate a position over a whole directory.
///
/// The reference is directory entry 0, or the origin for an empty
/// directory.
pub fn estimate_location(directory: &PeerDirectory, samples: &[RangeSample], rssd_threshold: f64) -> Point {
    let reference = directory
        .reference()
        .map(|r| r.coordinate)
        .unwrap_or(Point::ORIGIN);
    let config = EstimatorConfig {
        rssd_threshold,
        ..EstimatorConfig::default()
    };
    estimate_from(reference, samples, &config).position
}
