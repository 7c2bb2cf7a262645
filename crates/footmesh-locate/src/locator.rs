//! The "get current location" pass: select, then estimate.
//!
//! The estimator runs over the selector's subset. The best-ranked peer is
//! the reference and only samples taken from selected peers are fused, so
//! selection and estimation always see the same neighbors.

use footmesh_geometry::Point;
use tracing::debug;

use crate::error::{Error, Result};
use crate::estimate::{estimate_from, Estimate, EstimatorConfig, RangeSample};
use crate::select::{rank_top_k, ScoredCandidate};
use crate::{PeerDirectory, PeerToken, ScoreWeights};

/// Number of peers selected per pass when not configured.
pub const DEFAULT_BEST_K: usize = 5;

/// Locator configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocatorConfig {
    /// How many peers to keep per pass
    pub best_k: usize,
    /// Score weights for ranking peers
    pub weights: ScoreWeights,
    /// Estimator tuning
    pub estimator: EstimatorConfig,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            best_k: DEFAULT_BEST_K,
            weights: ScoreWeights::default(),
            estimator: EstimatorConfig::default(),
        }
    }
}

impl LocatorConfig {
    /// Check that every value is usable.
    pub fn validate(&self) -> Result<()> {
        if self.best_k == 0 {
            return Err(Error::InvalidConfig("best_k must be at least 1".into()));
        }
        if !self.weights.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "score weights must be finite: {:?}",
                self.weights
            )));
        }
        if self.estimator.rssd_threshold.is_nan() {
            return Err(Error::InvalidConfig("rssd_threshold is NaN".into()));
        }
        if !(self.estimator.zone_radius >= 0.0 && self.estimator.zone_radius.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "zone_radius must be finite and non-negative, got {}",
                self.estimator.zone_radius
            )));
        }
        Ok(())
    }
}

/// Selection plus estimation for one node.
#[derive(Debug, Clone, Default)]
pub struct Locator {
    config: LocatorConfig,
}

impl Locator {
    /// Create a locator after validating its configuration.
    pub fn new(config: LocatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration in use.
    pub fn config(&self) -> &LocatorConfig {
        &self.config
    }

    /// Rank the directory and keep the best `best_k` entries.
    pub fn select<'a>(&self, directory: &'a PeerDirectory) -> Vec<ScoredCandidate<'a>> {
        rank_top_k(directory.as_slice(), &self.config.weights, self.config.best_k)
    }

    /// Estimate a position from the selected peers' samples.
    ///
    /// `fallback` is returned when the directory is empty.
    pub fn locate(&self, directory: &PeerDirectory, samples: &[RangeSample], fallback: Point) -> Estimate {
        let best = self.select(directory);
        let Some(reference) = best.first() else {
            debug!("no peers known, keeping {}", fallback);
            return Estimate::fallback(fallback, samples.len());
        };

        let chosen: Vec<PeerToken> = best.iter().map(|c| c.record.token).collect();
        let scoped: Vec<RangeSample> = samples
            .iter()
            .filter(|s| chosen.contains(&s.token))
            .copied()
            .collect();

        let estimate = estimate_from(reference.record.coordinate, &scoped, &self.config.estimator);
        debug!(
            reference = %reference.record.token,
            selected = chosen.len(),
            fused = estimate.fused,
            missed = estimate.missed,
            excluded = estimate.excluded,
            "estimated {}",
            estimate.position
        );
        estimate
    }

    /// Estimate using the samples the directory itself derives.
    pub fn locate_directory(&self, directory: &PeerDirectory, fallback: Point) -> Estimate {
        let samples = directory.range_samples();
        self.locate(directory, &samples, fallback)
    }
}
