//! Anchor node: a fixed transmitter that tracks players round-robin.
//!
//! Once per interval the anchor sends a LOCATION_REQUEST to the next
//! player in its list, wrapping to the first one past the end. Replies
//! are recorded as [`LocationFix`]es.

use std::net::SocketAddr;
use std::time::Duration;

use footmesh_geometry::Point;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::transport::{TransportConfig, TransportHandle};
use crate::wire::{PacketData, PacketKind};

/// Time between two tracking requests when not configured.
pub const DEFAULT_TRACK_INTERVAL: Duration = Duration::from_secs(1);

/// Anchor configuration
#[derive(Debug, Clone)]
pub struct AnchorConfig {
    /// Surveyed position of the anchor
    pub position: Point,
    /// Time between tracking requests
    pub interval: Duration,
    /// Socket settings
    pub transport: TransportConfig,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            position: Point::ORIGIN,
            interval: DEFAULT_TRACK_INTERVAL,
            transport: TransportConfig::default(),
        }
    }
}

/// A player position reported back to an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    /// Address the reply came from
    pub player: SocketAddr,
    /// Estimated position reported by the player
    pub position: Point,
    /// Battery level reported by the player
    pub battery: f64,
    /// Number of requests the anchor had sent when the reply arrived
    pub tick: u64,
}

/// A fixed anchor bound to a socket.
#[derive(Debug)]
pub struct AnchorNode {
    transport: TransportHandle,
    position: Point,
    interval: Duration,
    players: Vec<SocketAddr>,
    cursor: usize,
    tick: u64,
}

impl AnchorNode {
    /// Bind the anchor's socket.
    pub async fn new(config: AnchorConfig) -> Result<Self> {
        let transport = TransportHandle::new(config.transport).await?;
        info!(position = %config.position, addr = %transport.local_addr()?, "anchor ready");
        Ok(Self {
            transport,
            position: config.position,
            interval: config.interval,
            players: Vec::new(),
            cursor: 0,
            tick: 0,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.transport.local_addr()
    }

    pub fn position(&self) -> Point {
        self.position
    }

    /// Append a player to the tracking order.
    pub fn add_player(&mut self, addr: SocketAddr) {
        self.players.push(addr);
    }

    pub fn players(&self) -> &[SocketAddr] {
        &self.players
    }

    /// Requests sent so far.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Advance the cursor and return the player to ask next.
    fn next_target(&mut self) -> Option<SocketAddr> {
        if self.players.is_empty() {
            return None;
        }
        if self.cursor >= self.players.len() {
            self.cursor = 0;
        }
        let target = self.players[self.cursor];
        self.cursor += 1;
        Some(target)
    }

    /// Ask the next player for its location.
    ///
    /// Returns the player asked, or `None` when no players are registered.
    pub async fn track_once(&mut self) -> Result<Option<SocketAddr>> {
        let Some(target) = self.next_target() else {
            return Ok(None);
        };
        self.tick += 1;
        self.transport
            .send_packet(target, &PacketData::location_request(self.position))
            .await?;
        Ok(Some(target))
    }

    /// Turn a reply into a fix. Anything but LOCATION_RESPONSE is ignored.
    fn record(&self, from: SocketAddr, packet: &PacketData) -> Option<LocationFix> {
        if packet.kind != PacketKind::LocationResponse {
            debug!(from = %from, "anchor ignoring {:?}", packet.kind);
            return None;
        }
        Some(LocationFix {
            player: from,
            position: packet.position(),
            battery: packet.value,
            tick: self.tick,
        })
    }

    /// Wait for the next location reply.
    pub async fn next_fix(&self) -> Result<LocationFix> {
        loop {
            let (from, packet) = self.transport.recv_packet().await?;
            if let Some(fix) = self.record(from, &packet) {
                return Ok(fix);
            }
        }
    }

    /// Track players on a timer and forward every fix to `fixes`.
    ///
    /// Stops cleanly when the receiving side of `fixes` is dropped.
    pub async fn run(mut self, fixes: mpsc::Sender<LocationFix>) -> Result<()> {
        let transport = self.transport.clone();
        let mut interval = tokio::time::interval(self.interval);
        info!(
            "anchor at {} tracking {} players every {:?}",
            self.position,
            self.players.len(),
            self.interval
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.track_once().await {
                        warn!("tracking request failed: {}", e);
                    }
                }
                received = transport.recv_packet() => {
                    let (from, packet) = received?;
                    if let Some(fix) = self.record(from, &packet) {
                        if fixes.send(fix).await.is_err() {
                            info!("fix receiver dropped, anchor stopping");
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
}
