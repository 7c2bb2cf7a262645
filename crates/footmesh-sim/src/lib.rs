//! Footmesh Field Simulation
//!
//! Drives a full pitch of players and anchors over loopback UDP.
//!
//! # Architecture
//!
//! - **Mobility**: Seeded bounded random walk on a 122 m × 90 m field
//! - **Feed**: Synthetic signal and range readings from ground truth
//! - **Tracking**: The first anchor asks one player per tick for its position
//! - **Report**: Every fix next to the truth, with mean and max error
//!
//! # Usage
//!
//! ```ignore
//! let report = Simulation::new(SimulationConfig::default()).await?.run().await?;
//! println!("mean error {:.2} m", report.mean_error);
//! ```

mod config;
mod mobility;
mod simulation;

pub use config::{SimulationConfig, DEFAULT_ANCHORS};
pub use mobility::{Field, RandomWalk};
pub use simulation::{FixRecord, Simulation, SimulationReport, ANCHOR_TOKEN_BASE};

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn small() -> SimulationConfig {
        SimulationConfig {
            players: 3,
            ticks: 4,
            settle: Duration::from_millis(5),
            fix_timeout: Duration::from_secs(2),
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn simulation_accounts_for_every_tick() {
        let report = tokio_test::block_on(async {
            Simulation::new(small()).await.unwrap().run().await.unwrap()
        });

        assert_eq!(report.ticks, 4);
        assert_eq!(report.fixes.len() as u64 + report.missed, 4);
        for fix in &report.fixes {
            assert!(fix.estimate.is_finite());
            assert!(fix.error.is_finite());
            assert!(Field::default().contains(fix.truth));
            assert!(fix.player < 3);
        }
        assert!(report.mean_error <= report.max_error);
    }

    #[test]
    fn tracker_cycles_through_players() {
        let report = tokio_test::block_on(async {
            Simulation::new(small()).await.unwrap().run().await.unwrap()
        });

        // One request per tick, round-robin from the first player.
        for fix in &report.fixes {
            assert_eq!(fix.player as u64, (fix.tick - 1) % 3);
        }
    }

    #[test]
    fn same_seed_same_kickoff() {
        let truth = |seed| {
            tokio_test::block_on(async move {
                let sim = Simulation::new(SimulationConfig { seed, ..small() }).await.unwrap();
                sim.truth().to_vec()
            })
        };
        assert_eq!(truth(9), truth(9));
        assert_ne!(truth(9), truth(10));
    }

    #[test]
    fn report_serializes() {
        let report = tokio_test::block_on(async {
            Simulation::new(SimulationConfig { ticks: 1, ..small() })
                .await
                .unwrap()
                .run()
                .await
                .unwrap()
        });
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("mean_error"));

        let back: SimulationReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.fixes.len(), report.fixes.len());
        assert_eq!(back.seed, report.seed);
    }

    #[test]
    fn rejects_missing_anchors() {
        let result = tokio_test::block_on(Simulation::new(SimulationConfig {
            anchors: Vec::new(),
            ..small()
        }));
        assert!(result.is_err());
    }

    #[test]
    fn infinite_step_is_an_error_not_a_panic() {
        let result = tokio_test::block_on(Simulation::new(SimulationConfig {
            max_step: "inf".parse().unwrap(),
            ..small()
        }));
        let err = result.err().expect("config rejected");
        assert!(format!("{:#}", err).contains("max_step"));
    }
}
