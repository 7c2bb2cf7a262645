//! Footmesh Field Simulator
//!
//! Run players and anchors on a simulated pitch and report how far the
//! reported positions are from the truth.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use footmesh_sim::{Simulation, SimulationConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "footmesh-sim")]
#[command(author, version, about = "Simulate footmesh player tracking on a football pitch", long_about = None)]
struct Cli {
    /// Number of players (overrides FOOTMESH_PLAYERS)
    #[arg(short, long)]
    players: Option<usize>,

    /// Number of tracking rounds (overrides FOOTMESH_TICKS)
    #[arg(short, long)]
    ticks: Option<u64>,

    /// Seed for player movement (overrides FOOTMESH_SEED)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Peers kept per selection pass
    #[arg(long)]
    best_k: Option<usize>,

    /// Possible-zone radius for the estimator, in meters
    #[arg(long)]
    zone_radius: Option<f64>,

    /// Write the full report as JSON
    #[arg(long)]
    json: Option<PathBuf>,
}

impl Cli {
    fn config(&self) -> SimulationConfig {
        let mut config = SimulationConfig::from_env();
        if let Some(players) = self.players {
            config.players = players;
        }
        if let Some(ticks) = self.ticks {
            config.ticks = ticks;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(best_k) = self.best_k {
            config.best_k = best_k;
        }
        if let Some(zone_radius) = self.zone_radius {
            config.zone_radius = zone_radius;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "footmesh=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = cli.config();

    println!("Footmesh Field Simulator");
    println!("========================");
    println!();
    println!(
        "{} players, {} anchors, {} ticks, seed {}",
        config.players,
        config.anchors.len(),
        config.ticks,
        config.seed
    );

    let report = Simulation::new(config).await?.run().await?;

    println!();
    println!("Simulation complete:");
    println!("  Fixes:      {}", report.fixes.len());
    println!("  Missed:     {}", report.missed);
    println!("  Mean error: {:.2} m", report.mean_error);
    println!("  Max error:  {:.2} m", report.max_error);

    if let Some(path) = cli.json {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
        println!("  Report:     {}", path.display());
    }

    Ok(())
}
