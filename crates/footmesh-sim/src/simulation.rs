//! Field simulation with fix recording.
//!
//! Every player and anchor binds a real loopback socket. Ground truth
//! lives here; the nodes only see the synthetic readings fed to them.
//! The feed is not a propagation model: signal is the negated true
//! distance and the range estimate is the true distance.

use std::collections::HashMap;
use std::net::SocketAddr;

use anyhow::Context;
use footmesh_geometry::Point;
use footmesh_locate::{EstimatorConfig, LocatorConfig, PeerToken, FULL_BATTERY};
use footmesh_transfer::{
    AnchorConfig, AnchorNode, PlayerConfig, PlayerNode, TransportConfig, DEFAULT_TRACK_INTERVAL,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::SimulationConfig;
use crate::mobility::RandomWalk;

/// Anchors get tokens from here up, players from zero.
pub const ANCHOR_TOKEN_BASE: u32 = 1000;

/// One reply received by the tracking anchor, next to the truth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixRecord {
    pub tick: u64,
    pub player: u32,
    pub estimate: Point,
    pub truth: Point,
    pub error: f64,
    pub battery: f64,
}

/// Outcome of a full run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub seed: u64,
    pub players: usize,
    pub ticks: u64,
    pub fixes: Vec<FixRecord>,
    /// Requests that got no reply in time
    pub missed: u64,
    pub mean_error: f64,
    pub max_error: f64,
}

impl SimulationReport {
    fn new(config: &SimulationConfig, fixes: Vec<FixRecord>, missed: u64) -> Self {
        let errors = fixes.iter().map(|f| f.error);
        let mean_error = if fixes.is_empty() {
            0.0
        } else {
            errors.clone().sum::<f64>() / fixes.len() as f64
        };
        let max_error = errors.fold(0.0, f64::max);
        Self {
            seed: config.seed,
            players: config.players,
            ticks: config.ticks,
            fixes,
            missed,
            mean_error,
            max_error,
        }
    }
}

/// A running field: players, anchors and their ground truth.
pub struct Simulation {
    config: SimulationConfig,
    rng: StdRng,
    walk: RandomWalk,
    truth: Vec<Point>,
    battery: Vec<f64>,
    players: Vec<PlayerNode>,
    by_addr: HashMap<SocketAddr, usize>,
    tracker: AnchorNode,
    // Keep the other anchors' sockets bound.
    _relays: Vec<AnchorNode>,
    servers: Vec<JoinHandle<footmesh_transfer::Result<()>>>,
    tick: u64,
    fixes: Vec<FixRecord>,
    missed: u64,
}

impl Simulation {
    /// Bind every node, wire up directories and start the player servers.
    pub async fn new(config: SimulationConfig) -> anyhow::Result<Self> {
        config.validate().context("invalid simulation config")?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let walk = RandomWalk {
            field: config.field,
            max_step: config.max_step,
        };

        let mut anchors = Vec::with_capacity(config.anchors.len());
        for &position in &config.anchors {
            let anchor = AnchorNode::new(AnchorConfig {
                position,
                interval: DEFAULT_TRACK_INTERVAL,
                transport: TransportConfig::loopback(),
            })
            .await
            .context("binding anchor")?;
            anchors.push(anchor);
        }
        let locator = LocatorConfig {
            best_k: config.best_k,
            estimator: EstimatorConfig {
                zone_radius: config.zone_radius,
                ..EstimatorConfig::default()
            },
            ..LocatorConfig::default()
        };

        let truth: Vec<Point> = (0..config.players)
            .map(|_| config.field.random_point(&mut rng))
            .collect();

        let mut players = Vec::with_capacity(config.players);
        for (i, &start) in truth.iter().enumerate() {
            let player = PlayerNode::new(PlayerConfig {
                token: player_token(i),
                position: start,
                battery: FULL_BATTERY,
                locator,
                transport: TransportConfig::loopback(),
            })
            .await
            .with_context(|| format!("binding player {}", i))?;
            players.push(player);
        }

        let mut by_addr = HashMap::new();
        for (i, player) in players.iter().enumerate() {
            by_addr.insert(player.local_addr()?, i);
        }

        // Anchors first, then every other player at its kickoff position.
        for (i, player) in players.iter().enumerate() {
            for (k, anchor) in anchors.iter().enumerate() {
                player
                    .add_anchor(anchor.local_addr()?, anchor_token(k), anchor.position())
                    .await;
            }
            for (j, other) in players.iter().enumerate() {
                if i != j {
                    player.add_player(other.local_addr()?, player_token(j), truth[j]).await;
                }
            }
        }

        let mut anchors = anchors.into_iter();
        let mut tracker = anchors.next().context("no tracking anchor")?;
        for player in &players {
            tracker.add_player(player.local_addr()?);
        }

        let servers = players
            .iter()
            .map(|p| tokio::spawn(p.clone().run()))
            .collect();

        info!(
            players = config.players,
            anchors = config.anchors.len(),
            seed = config.seed,
            "simulation ready"
        );

        Ok(Self {
            battery: vec![FULL_BATTERY; config.players],
            config,
            rng,
            walk,
            truth,
            players,
            by_addr,
            tracker,
            _relays: anchors.collect(),
            servers,
            tick: 0,
            fixes: Vec::new(),
            missed: 0,
        })
    }

    /// Current ground truth, indexed by player.
    pub fn truth(&self) -> &[Point] {
        &self.truth
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Advance one tick and return the fix it produced, if any.
    pub async fn step(&mut self) -> anyhow::Result<Option<FixRecord>> {
        self.tick += 1;

        for p in self.truth.iter_mut() {
            *p = self.walk.step(*p, &mut self.rng);
        }
        for b in self.battery.iter_mut() {
            let drain = self.config.battery_drain * self.rng.gen_range(0.5..1.5);
            *b = (*b - drain).max(0.0);
        }

        self.feed_observations().await?;

        for player in &self.players {
            player.poll_peers().await?;
        }
        tokio::time::sleep(self.config.settle).await;

        let Some(asked) = self.tracker.track_once().await? else {
            return Ok(None);
        };
        let Some(&index) = self.by_addr.get(&asked) else {
            anyhow::bail!("tracker asked unknown address {}", asked);
        };

        let reply = tokio::time::timeout(self.config.fix_timeout, self.fix_from(asked)).await;
        match reply {
            Ok(fix) => {
                let fix = fix?;
                let truth = self.truth[index];
                let record = FixRecord {
                    tick: self.tick,
                    player: index as u32,
                    estimate: fix.position,
                    truth,
                    error: fix.position.distance(&truth),
                    battery: fix.battery,
                };
                debug!(
                    tick = self.tick,
                    player = index,
                    "estimate {} truth {} error {:.2}",
                    record.estimate,
                    record.truth,
                    record.error
                );
                self.fixes.push(record);
                Ok(Some(record))
            }
            Err(_) => {
                warn!(tick = self.tick, player = index, "no location reply in time");
                self.missed += 1;
                Ok(None)
            }
        }
    }

    /// Wait for the reply from `asked`, skipping late replies to older requests.
    async fn fix_from(&self, asked: SocketAddr) -> footmesh_transfer::Result<footmesh_transfer::LocationFix> {
        loop {
            let fix = self.tracker.next_fix().await?;
            if fix.player == asked {
                return Ok(fix);
            }
        }
    }

    async fn feed_observations(&self) -> anyhow::Result<()> {
        for (i, player) in self.players.iter().enumerate() {
            let me = self.truth[i];
            for (k, &anchor) in self.config.anchors.iter().enumerate() {
                let d = me.distance(&anchor);
                player.observe(anchor_token(k), -d, d).await?;
            }
            for (j, &other) in self.truth.iter().enumerate() {
                if i != j {
                    let d = me.distance(&other);
                    player.observe(player_token(j), -d, d).await?;
                }
            }
            player.set_battery(self.battery[i]).await;
        }
        Ok(())
    }

    /// Run every configured tick and stop the player servers.
    pub async fn run(mut self) -> anyhow::Result<SimulationReport> {
        while self.tick < self.config.ticks {
            self.step().await?;
        }
        for server in &self.servers {
            server.abort();
        }
        let report = SimulationReport::new(&self.config, std::mem::take(&mut self.fixes), self.missed);
        info!(
            fixes = report.fixes.len(),
            missed = report.missed,
            "mean error {:.2} m, max {:.2} m",
            report.mean_error,
            report.max_error
        );
        Ok(report)
    }
}

fn player_token(index: usize) -> PeerToken {
    PeerToken(index as u32)
}

fn anchor_token(index: usize) -> PeerToken {
    PeerToken(ANCHOR_TOKEN_BASE + index as u32)
}
