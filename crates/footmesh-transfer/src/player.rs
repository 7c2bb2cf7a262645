//! Player node: answers location and info requests from its directory.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use footmesh_geometry::Point;
use footmesh_locate::{Estimate, Locator, LocatorConfig, NeighborRecord, PeerDirectory, PeerToken, FULL_BATTERY};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::transport::{TransportConfig, TransportHandle};
use crate::wire::{PacketData, PacketKind};

/// Player configuration
#[derive(Debug, Clone)]
pub struct PlayerConfig {
    /// This player's own token
    pub token: PeerToken,
    /// Position before the first estimate
    pub position: Point,
    /// Starting battery level
    pub battery: f64,
    /// Selection and estimation settings
    pub locator: LocatorConfig,
    /// Socket settings
    pub transport: TransportConfig,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            token: PeerToken(0),
            position: Point::ORIGIN,
            battery: FULL_BATTERY,
            locator: LocatorConfig::default(),
            transport: TransportConfig::default(),
        }
    }
}

/// Everything a player knows, independent of its socket.
#[derive(Debug, Clone)]
pub struct PlayerState {
    token: PeerToken,
    position: Point,
    previous_position: Point,
    battery: f64,
    directory: PeerDirectory,
    peers: HashMap<SocketAddr, PeerToken>,
    locator: Locator,
}

impl PlayerState {
    /// Create a player with an empty directory.
    pub fn new(token: PeerToken, position: Point, battery: f64, locator: Locator) -> Self {
        Self {
            token,
            position,
            previous_position: position,
            battery,
            directory: PeerDirectory::new(),
            peers: HashMap::new(),
            locator,
        }
    }

    pub fn token(&self) -> PeerToken {
        self.token
    }

    /// Current position (the last estimate, or the starting point).
    pub fn position(&self) -> Point {
        self.position
    }

    /// Position before the last estimate.
    pub fn previous_position(&self) -> Point {
        self.previous_position
    }

    pub fn battery(&self) -> f64 {
        self.battery
    }

    pub fn set_battery(&mut self, battery: f64) {
        self.battery = battery;
    }

    pub fn directory(&self) -> &PeerDirectory {
        &self.directory
    }

    /// Token registered at `addr`, if any.
    pub fn peer_at(&self, addr: SocketAddr) -> Option<PeerToken> {
        self.peers.get(&addr).copied()
    }

    /// Addresses of every registered peer.
    pub fn peer_addrs(&self) -> impl Iterator<Item = SocketAddr> + '_ {
        self.peers.keys().copied()
    }

    /// Register another player reachable at `addr`.
    pub fn add_player(&mut self, addr: SocketAddr, token: PeerToken, coordinate: Point) {
        self.register(addr, NeighborRecord::player(token, coordinate));
    }

    /// Register a fixed anchor reachable at `addr`.
    pub fn add_anchor(&mut self, addr: SocketAddr, token: PeerToken, position: Point) {
        self.register(addr, NeighborRecord::anchor(token, position));
    }

    /// Map `addr` to the record's token, dropping any older mapping of
    /// either. Directory entries are kept; a displaced token just loses
    /// its address.
    fn register(&mut self, addr: SocketAddr, record: NeighborRecord) {
        let token = record.token;
        self.peers.retain(|a, t| *a == addr || *t != token);
        if let Some(old) = self.peers.insert(addr, token).filter(|old| *old != token) {
            debug!(player = %self.token, "{} replaces {} at {}", token, old, addr);
        }
        if self.directory.contains(token) {
            debug!(player = %self.token, "refreshed {} at {}", token, addr);
        }
        self.directory.insert(record);
    }

    /// Feed a signal and range reading for a known peer.
    pub fn observe(&mut self, token: PeerToken, signal: f64, distance: f64) -> Result<()> {
        self.directory.observe(token, signal, distance)?;
        Ok(())
    }

    /// Run a selection and estimation pass and adopt the result.
    pub fn relocate(&mut self) -> Estimate {
        let estimate = self.locator.locate_directory(&self.directory, self.position);
        self.previous_position = self.position;
        self.position = estimate.position;
        estimate
    }

    /// React to one incoming packet, returning the reply to send back.
    pub fn handle(&mut self, from: SocketAddr, packet: &PacketData) -> Result<Option<PacketData>> {
        match packet.kind {
            PacketKind::LocationRequest => {
                let estimate = self.relocate();
                debug!(
                    player = %self.token,
                    from = %from,
                    fused = estimate.fused,
                    "location {} -> {}",
                    self.previous_position,
                    self.position
                );
                Ok(Some(PacketData::location_response(self.position, self.battery)))
            }
            PacketKind::InfoRequest => {
                // The request carries the asker's own state.
                if let Some(token) = self.peer_at(from) {
                    self.refresh(token, packet)?;
                }
                Ok(Some(PacketData::info_response(self.position, self.battery)))
            }
            PacketKind::InfoResponse | PacketKind::LocationResponse => {
                let token = self.peer_at(from).ok_or(Error::UnknownSender(from))?;
                self.refresh(token, packet)?;
                Ok(None)
            }
        }
    }

    fn refresh(&mut self, token: PeerToken, packet: &PacketData) -> Result<()> {
        let position = packet.position();
        self.directory.update(token, |r| {
            r.update_battery_level(packet.value);
            r.update_coordinate(position);
        })?;
        Ok(())
    }
}

/// A player bound to a socket.
///
/// Clones share state and socket, so one clone can serve requests while
/// another feeds observations.
#[derive(Debug, Clone)]
pub struct PlayerNode {
    transport: TransportHandle,
    state: Arc<RwLock<PlayerState>>,
}

impl PlayerNode {
    /// Bind the player's socket.
    pub async fn new(config: PlayerConfig) -> Result<Self> {
        let locator = Locator::new(config.locator)?;
        let transport = TransportHandle::new(config.transport).await?;
        info!(
            player = %config.token,
            addr = %transport.local_addr()?,
            best_k = locator.config().best_k,
            "player ready"
        );
        let state = PlayerState::new(config.token, config.position, config.battery, locator);
        Ok(Self {
            transport,
            state: Arc::new(RwLock::new(state)),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Shared state of this player.
    pub fn state(&self) -> &Arc<RwLock<PlayerState>> {
        &self.state
    }

    pub async fn position(&self) -> Point {
        self.state.read().await.position()
    }

    pub async fn add_player(&self, addr: SocketAddr, token: PeerToken, coordinate: Point) {
        self.state.write().await.add_player(addr, token, coordinate);
    }

    pub async fn add_anchor(&self, addr: SocketAddr, token: PeerToken, position: Point) {
        self.state.write().await.add_anchor(addr, token, position);
    }

    pub async fn observe(&self, token: PeerToken, signal: f64, distance: f64) -> Result<()> {
        self.state.write().await.observe(token, signal, distance)
    }

    pub async fn set_battery(&self, battery: f64) {
        self.state.write().await.set_battery(battery);
    }

    /// Handle one packet and send the reply, if any.
    pub async fn handle(&self, from: SocketAddr, packet: &PacketData) -> Result<()> {
        let reply = self.state.write().await.handle(from, packet)?;
        if let Some(reply) = reply {
            self.transport.send_packet(from, &reply).await?;
        }
        Ok(())
    }

    /// Ask every registered player for its position and battery.
    ///
    /// Anchors are fixed and are not polled. Returns how many requests went out.
    pub async fn poll_peers(&self) -> Result<usize> {
        let (request, targets) = {
            let state = self.state.read().await;
            let request = PacketData::info_request(state.position(), state.battery());
            let targets: Vec<SocketAddr> = state
                .peer_addrs()
                .filter(|addr| {
                    state
                        .peer_at(*addr)
                        .and_then(|token| state.directory.get(token))
                        .is_some_and(|r| !r.is_anchor())
                })
                .collect();
            (request, targets)
        };

        for addr in &targets {
            self.transport.send_packet(*addr, &request).await?;
        }
        Ok(targets.len())
    }

    /// Serve the socket until a receive fails or the task is aborted.
    pub async fn run(self) -> Result<()> {
        loop {
            let (from, packet) = self.transport.recv_packet().await?;
            if let Err(e) = self.handle(from, &packet).await {
                warn!(from = %from, "failed to handle {:?}: {}", packet.kind, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use footmesh_locate::EstimatorConfig;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    fn state(zone_radius: f64) -> PlayerState {
        let locator = Locator::new(LocatorConfig {
            estimator: EstimatorConfig {
                zone_radius,
                ..EstimatorConfig::default()
            },
            ..LocatorConfig::default()
        })
        .unwrap();
        PlayerState::new(PeerToken(1), Point::new(10.0, 10.0), 90.0, locator)
    }

    #[test]
    fn info_request_replies_with_own_state() {
        let mut player = state(0.0);
        let reply = player
            .handle(addr(1), &PacketData::info_request(Point::ORIGIN, 50.0))
            .unwrap()
            .unwrap();
        assert_eq!(reply, PacketData::info_response(Point::new(10.0, 10.0), 90.0));
    }

    #[test]
    fn location_request_shifts_position() {
        let mut player = state(5.0);
        player.add_anchor(addr(100), PeerToken(100), Point::new(0.0, 0.0));
        player.add_anchor(addr(101), PeerToken(101), Point::new(6.0, 0.0));
        player.observe(PeerToken(101), -10.0, 5.0).unwrap();
        player.observe(PeerToken(101), -8.0, 5.0).unwrap();

        let reply = player
            .handle(addr(100), &PacketData::location_request(Point::ORIGIN))
            .unwrap()
            .unwrap();

        assert_eq!(reply.kind, PacketKind::LocationResponse);
        assert!(reply.position().distance(&Point::new(3.0, -4.0)) < 1e-9);
        assert_eq!(reply.value, 90.0);
        assert_eq!(player.previous_position(), Point::new(10.0, 10.0));
        assert_eq!(player.position(), reply.position());
    }

    #[test]
    fn location_request_without_peers_keeps_position() {
        let mut player = state(0.0);
        let reply = player
            .handle(addr(9), &PacketData::location_request(Point::ORIGIN))
            .unwrap()
            .unwrap();
        assert_eq!(reply.position(), Point::new(10.0, 10.0));
    }

    #[test]
    fn info_response_refreshes_peer() {
        let mut player = state(0.0);
        player.add_player(addr(2), PeerToken(2), Point::ORIGIN);

        let reply = player
            .handle(addr(2), &PacketData::info_response(Point::new(30.0, 40.0), 55.0))
            .unwrap();
        assert!(reply.is_none());

        let peer = player.directory().get(PeerToken(2)).unwrap();
        assert_eq!(peer.coordinate, Point::new(30.0, 40.0));
        assert_eq!(peer.battery_level, 55.0);
    }

    #[test]
    fn anchors_keep_their_position() {
        let mut player = state(0.0);
        player.add_anchor(addr(100), PeerToken(100), Point::new(61.0, 0.0));

        player
            .handle(addr(100), &PacketData::location_response(Point::new(1.0, 1.0), 70.0))
            .unwrap();

        let anchor = player.directory().get(PeerToken(100)).unwrap();
        assert_eq!(anchor.coordinate, Point::new(61.0, 0.0));
        assert_eq!(anchor.battery_level, 70.0);
    }

    #[test]
    fn response_from_stranger_is_an_error() {
        let mut player = state(0.0);
        let err = player
            .handle(addr(7), &PacketData::info_response(Point::ORIGIN, 1.0))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownSender(a) if a == addr(7)));
    }

    #[test]
    fn moved_peer_loses_its_old_address() {
        let mut player = state(0.0);
        player.add_player(addr(2), PeerToken(2), Point::ORIGIN);
        player.add_player(addr(3), PeerToken(2), Point::new(1.0, 1.0));

        assert_eq!(player.peer_at(addr(2)), None);
        assert_eq!(player.peer_at(addr(3)), Some(PeerToken(2)));
        assert_eq!(player.peer_addrs().count(), 1);
        assert_eq!(player.directory().len(), 1);

        // A reply from the old address is no longer attributed to the peer.
        assert!(matches!(
            player.handle(addr(2), &PacketData::info_response(Point::ORIGIN, 1.0)),
            Err(Error::UnknownSender(_))
        ));
    }

    #[test]
    fn new_token_takes_over_an_address() {
        let mut player = state(0.0);
        player.add_player(addr(2), PeerToken(2), Point::ORIGIN);
        player.add_player(addr(2), PeerToken(4), Point::ORIGIN);

        assert_eq!(player.peer_at(addr(2)), Some(PeerToken(4)));
        assert_eq!(player.peer_addrs().collect::<Vec<_>>(), vec![addr(2)]);

        // The displaced entry stays in the directory without an address.
        assert!(player.directory().contains(PeerToken(2)));
        assert!(player.directory().contains(PeerToken(4)));

        player
            .handle(addr(2), &PacketData::info_response(Point::new(9.0, 9.0), 20.0))
            .unwrap();
        assert_eq!(player.directory().get(PeerToken(4)).unwrap().coordinate, Point::new(9.0, 9.0));
        assert_eq!(player.directory().get(PeerToken(2)).unwrap().coordinate, Point::ORIGIN);
    }

    #[test]
    fn observe_unknown_token_fails() {
        let mut player = state(0.0);
        assert!(matches!(
            player.observe(PeerToken(3), 1.0, 1.0),
            Err(Error::Locate(footmesh_locate::Error::UnknownPeer(PeerToken(3))))
        ));
    }

    #[tokio::test]
    async fn serves_info_request_over_udp() {
        let node = PlayerNode::new(PlayerConfig {
            position: Point::new(5.0, 6.0),
            battery: 42.0,
            transport: TransportConfig::loopback(),
            ..PlayerConfig::default()
        })
        .await
        .unwrap();
        let player_addr = node.local_addr().unwrap();
        let server = tokio::spawn(node.clone().run());

        let client = TransportHandle::new(TransportConfig::loopback()).await.unwrap();
        client
            .send_packet(player_addr, &PacketData::info_request(Point::ORIGIN, 100.0))
            .await
            .unwrap();

        let (from, reply) = tokio::time::timeout(std::time::Duration::from_secs(5), client.recv_packet())
            .await
            .expect("reply in time")
            .unwrap();
        assert_eq!(from, player_addr);
        assert_eq!(reply, PacketData::info_response(Point::new(5.0, 6.0), 42.0));

        server.abort();
    }

    #[tokio::test]
    async fn poll_peers_skips_anchors() {
        let node = PlayerNode::new(PlayerConfig {
            transport: TransportConfig::loopback(),
            ..PlayerConfig::default()
        })
        .await
        .unwrap();
        let peer = TransportHandle::new(TransportConfig::loopback()).await.unwrap();
        let anchor = TransportHandle::new(TransportConfig::loopback()).await.unwrap();

        node.add_player(peer.local_addr().unwrap(), PeerToken(2), Point::ORIGIN).await;
        node.add_anchor(anchor.local_addr().unwrap(), PeerToken(100), Point::new(0.0, 45.0)).await;

        assert_eq!(node.poll_peers().await.unwrap(), 1);
        let (_, pkt) = peer.recv_packet().await.unwrap();
        assert_eq!(pkt.kind, PacketKind::InfoRequest);
    }
}
