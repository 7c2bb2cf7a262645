//! Simulation configuration.

use std::str::FromStr;
use std::time::Duration;

use footmesh_geometry::Point;
use tracing::warn;

use crate::mobility::Field;

/// Anchor positions on the default pitch: both touchlines and the near goal line.
pub const DEFAULT_ANCHORS: [Point; 3] = [
    Point { x: 0.0, y: 45.0 },
    Point { x: 122.0, y: 45.0 },
    Point { x: 61.0, y: 0.0 },
];

/// Configuration for the simulation.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Seed for deterministic movement
    pub seed: u64,
    /// Number of players on the field
    pub players: usize,
    /// Number of tracking rounds
    pub ticks: u64,
    /// Playing field
    pub field: Field,
    /// Fixed anchor positions; the first one does the tracking
    pub anchors: Vec<Point>,
    /// Largest per-axis move per tick, in meters
    pub max_step: f64,
    /// Peers kept per selection pass
    pub best_k: usize,
    /// Possible-zone radius for the estimator
    pub zone_radius: f64,
    /// Average battery drained per tick
    pub battery_drain: f64,
    /// Pause after polling so info responses land
    pub settle: Duration,
    /// How long the anchor waits for a reply
    pub fix_timeout: Duration,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            players: 11,
            ticks: 15,
            field: Field::default(),
            anchors: DEFAULT_ANCHORS.to_vec(),
            max_step: 4.0,
            best_k: footmesh_locate::DEFAULT_BEST_K,
            zone_radius: 10.0,
            battery_drain: 0.5,
            settle: Duration::from_millis(10),
            fix_timeout: Duration::from_millis(500),
        }
    }
}

impl SimulationConfig {
    /// Defaults overridden by `FOOTMESH_*` environment variables.
    ///
    /// Unparsable values are logged and ignored. Values that parse but are
    /// out of range are caught by [`SimulationConfig::validate`].
    pub fn from_env() -> Self {
        let mut config = Self::default();
        env_override("FOOTMESH_SEED", &mut config.seed);
        env_override("FOOTMESH_PLAYERS", &mut config.players);
        env_override("FOOTMESH_TICKS", &mut config.ticks);
        env_override("FOOTMESH_MAX_STEP", &mut config.max_step);
        env_override("FOOTMESH_BEST_K", &mut config.best_k);
        env_override("FOOTMESH_ZONE_RADIUS", &mut config.zone_radius);
        config
    }

    /// Reject values the mobility model and battery feed cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        let field = self.field;
        if !(field.width > 0.0 && field.width.is_finite() && field.height > 0.0 && field.height.is_finite()) {
            anyhow::bail!("field must have a finite positive size, got {} x {}", field.width, field.height);
        }
        if !(self.max_step >= 0.0 && self.max_step.is_finite()) {
            anyhow::bail!("max_step must be finite and non-negative, got {}", self.max_step);
        }
        if !(self.battery_drain >= 0.0 && self.battery_drain.is_finite()) {
            anyhow::bail!("battery_drain must be finite and non-negative, got {}", self.battery_drain);
        }
        if self.anchors.is_empty() {
            anyhow::bail!("at least one anchor is required");
        }
        if let Some(a) = self.anchors.iter().find(|a| !a.is_finite()) {
            anyhow::bail!("anchor position must be finite, got {}", a);
        }
        Ok(())
    }
}

fn env_override<T: FromStr>(key: &str, slot: &mut T) {
    if let Ok(raw) = std::env::var(key) {
        match raw.trim().parse() {
            Ok(value) => *slot = value,
            Err(_) => warn!("ignoring {}={:?}: not a valid value", key, raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_the_pitch() {
        let config = SimulationConfig::default();
        assert_eq!(config.players, 11);
        assert_eq!(config.anchors.len(), 3);
        assert_eq!(config.anchors[2], Point::new(61.0, 0.0));
        assert!(config.anchors.iter().all(|a| config.field.contains(*a)));
    }

    #[test]
    fn default_config_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_bad_max_step() {
        for max_step in [f64::INFINITY, f64::NAN, -1.0] {
            let config = SimulationConfig {
                max_step,
                ..SimulationConfig::default()
            };
            assert!(config.validate().is_err(), "max_step {} accepted", max_step);
        }
    }

    #[test]
    fn rejects_bad_battery_drain() {
        for battery_drain in [f64::INFINITY, f64::NAN, -0.5] {
            let config = SimulationConfig {
                battery_drain,
                ..SimulationConfig::default()
            };
            assert!(config.validate().is_err(), "battery_drain {} accepted", battery_drain);
        }
    }

    #[test]
    fn rejects_bad_field() {
        for (width, height) in [(0.0, 90.0), (122.0, -1.0), (f64::INFINITY, 90.0), (122.0, f64::NAN)] {
            let config = SimulationConfig {
                field: Field { width, height },
                ..SimulationConfig::default()
            };
            assert!(config.validate().is_err(), "field {} x {} accepted", width, height);
        }
    }

    #[test]
    fn rejects_missing_or_bad_anchors() {
        let none = SimulationConfig {
            anchors: Vec::new(),
            ..SimulationConfig::default()
        };
        assert!(none.validate().is_err());

        let nan = SimulationConfig {
            anchors: vec![Point::new(f64::NAN, 0.0)],
            ..SimulationConfig::default()
        };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn env_override_parses_or_keeps_default() {
        let mut players = 11usize;
        std::env::set_var("FOOTMESH_TEST_PLAYERS_OK", " 7 ");
        env_override("FOOTMESH_TEST_PLAYERS_OK", &mut players);
        assert_eq!(players, 7);

        std::env::set_var("FOOTMESH_TEST_PLAYERS_BAD", "seven");
        env_override("FOOTMESH_TEST_PLAYERS_BAD", &mut players);
        assert_eq!(players, 7);

        env_override("FOOTMESH_TEST_UNSET", &mut players);
        assert_eq!(players, 7);
    }
}
