//! Neighbor desirability score.
//!
//! ```text
//! score = w_d / distance + w_b × battery + w_s × signal
//! ```
//!
//! Higher is better. The weights are tunable constants and are not
//! normalized; they need not sum to one.

use crate::NeighborRecord;

/// Smallest distance the scorer will divide by.
///
/// Zero, negative and NaN distances are clamped up to this value.
pub const MIN_DISTANCE: f64 = 1e-6;

/// Weights for the three score terms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    /// Numerator of the inverse-distance term
    pub distance: f64,
    /// Multiplier on battery level
    pub battery: f64,
    /// Multiplier on signal strength
    pub signal: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            distance: 0.5,
            battery: 0.3,
            signal: 0.2,
        }
    }
}

impl ScoreWeights {
    /// Score a single neighbor.
    pub fn score(&self, neighbor: &NeighborRecord) -> f64 {
        self.distance / clamp_distance(neighbor.distance_from_me)
            + self.battery * neighbor.battery_level
            + self.signal * neighbor.signal_strength
    }

    /// All three weights are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.distance.is_finite() && self.battery.is_finite() && self.signal.is_finite()
    }
}

/// Score a neighbor with the default weights.
pub fn score(neighbor: &NeighborRecord) -> f64 {
    ScoreWeights::default().score(neighbor)
}

/// Apply the minimum-distance floor. `f64::max` also maps NaN to the floor.
#[inline]
pub fn clamp_distance(distance: f64) -> f64 {
    distance.max(MIN_DISTANCE)
}
