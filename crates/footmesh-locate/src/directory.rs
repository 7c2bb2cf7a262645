//! The peer directory: every player and anchor a node knows about.
//!
//! Entries are created once and refreshed in place for the lifetime of the
//! owning node. Order of insertion is preserved; it breaks score ties in
//! selection and entry 0 is the estimator's reference.

use footmesh_geometry::Point;

use crate::error::{Error, Result};
use crate::estimate::RangeSample;

/// Opaque communication handle for a peer.
///
/// The core never dereferences it. Hosts map tokens to sockets or
/// addresses on their side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeerToken(pub u32);

impl std::fmt::Display for PeerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What kind of node an entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeerKind {
    /// A mobile player; its coordinate is whatever it last reported.
    Player,
    /// A fixed transmitter; its coordinate never changes.
    Anchor,
}

/// Battery level assumed for a peer that has not reported yet.
pub const FULL_BATTERY: f64 = 100.0;

/// Distance assigned before the first range reading.
///
/// Large enough that the distance term of the score vanishes.
pub const UNKNOWN_DISTANCE: f64 = f64::MAX;

/// One known peer or anchor, as seen from the local node.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborRecord {
    /// Identity of the peer
    pub token: PeerToken,
    /// Player or anchor
    pub kind: PeerKind,
    /// Last observed signal strength (higher = stronger)
    pub signal_strength: f64,
    /// The reading before `signal_strength`
    pub previous_signal_strength: f64,
    /// Reported battery level (higher = better)
    pub battery_level: f64,
    /// Cached range estimate in meters
    pub distance_from_me: f64,
    /// Last known or estimated position
    pub coordinate: Point,
}

impl NeighborRecord {
    /// A player that has not reported anything yet.
    pub fn player(token: PeerToken, coordinate: Point) -> Self {
        Self {
            token,
            kind: PeerKind::Player,
            signal_strength: 0.0,
            previous_signal_strength: 0.0,
            battery_level: FULL_BATTERY,
            distance_from_me: UNKNOWN_DISTANCE,
            coordinate,
        }
    }

    /// A fixed anchor at a surveyed position.
    pub fn anchor(token: PeerToken, position: Point) -> Self {
        Self {
            kind: PeerKind::Anchor,
            ..Self::player(token, position)
        }
    }

    /// Whether this entry is a fixed anchor.
    pub fn is_anchor(&self) -> bool {
        self.kind == PeerKind::Anchor
    }

    /// Record a new signal reading, keeping the previous one.
    pub fn update_signal_strength(&mut self, signal: f64) {
        self.previous_signal_strength = self.signal_strength;
        self.signal_strength = signal;
    }

    /// Record a new battery report.
    pub fn update_battery_level(&mut self, battery: f64) {
        self.battery_level = battery;
    }

    /// Move the entry. Anchors ignore this.
    pub fn update_coordinate(&mut self, coordinate: Point) {
        if !self.is_anchor() {
            self.coordinate = coordinate;
        }
    }

    /// Record a new range estimate.
    pub fn update_distance(&mut self, distance: f64) {
        self.distance_from_me = distance;
    }

    /// Refresh signal, battery and position at once.
    pub fn update_all(&mut self, signal: f64, battery: f64, coordinate: Point) {
        self.update_signal_strength(signal);
        self.update_battery_level(battery);
        self.update_coordinate(coordinate);
    }

    /// Signed strength differential between the last two readings.
    pub fn rssd(&self) -> f64 {
        self.signal_strength - self.previous_signal_strength
    }

    /// The range sample this entry contributes to an estimation pass.
    pub fn range_sample(&self) -> RangeSample {
        RangeSample {
            token: self.token,
            anchor_position: self.coordinate,
            signed_differential: self.rssd(),
            radius: self.distance_from_me,
        }
    }
}

/// The node-owned table of neighbors, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct PeerDirectory {
    entries: Vec<NeighborRecord>,
}

impl PeerDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record, or refresh the existing entry with the same token.
    ///
    /// A refreshed entry keeps its position in the directory.
    /// Returns `true` if the token was new.
    pub fn insert(&mut self, record: NeighborRecord) -> bool {
        match self.get_mut(record.token) {
            Some(existing) => {
                *existing = record;
                false
            }
            None => {
                self.entries.push(record);
                true
            }
        }
    }

    /// Look up an entry.
    pub fn get(&self, token: PeerToken) -> Option<&NeighborRecord> {
        self.entries.iter().find(|r| r.token == token)
    }

    /// Look up an entry for in-place update.
    pub fn get_mut(&mut self, token: PeerToken) -> Option<&mut NeighborRecord> {
        self.entries.iter_mut().find(|r| r.token == token)
    }

    /// Apply an update to an existing entry.
    pub fn update<F>(&mut self, token: PeerToken, f: F) -> Result<()>
    where
        F: FnOnce(&mut NeighborRecord),
    {
        let record = self.get_mut(token).ok_or(Error::UnknownPeer(token))?;
        f(record);
        Ok(())
    }

    /// Record a signal and range reading for a peer.
    pub fn observe(&mut self, token: PeerToken, signal: f64, distance: f64) -> Result<()> {
        self.update(token, |r| {
            r.update_signal_strength(signal);
            r.update_distance(distance);
        })
    }

    /// Whether the token is known.
    pub fn contains(&self, token: PeerToken) -> bool {
        self.get(token).is_some()
    }

    /// The estimator's reference entry (the first one inserted).
    pub fn reference(&self) -> Option<&NeighborRecord> {
        self.entries.first()
    }

    /// All entries in insertion order.
    pub fn as_slice(&self) -> &[NeighborRecord] {
        &self.entries
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, NeighborRecord> {
        self.entries.iter()
    }

    /// Only the fixed anchors.
    pub fn anchors(&self) -> impl Iterator<Item = &NeighborRecord> {
        self.entries.iter().filter(|r| r.is_anchor())
    }

    /// Only the players.
    pub fn players(&self) -> impl Iterator<Item = &NeighborRecord> {
        self.entries.iter().filter(|r| !r.is_anchor())
    }

    /// One range sample per entry, in insertion order.
    pub fn range_samples(&self) -> Vec<RangeSample> {
        self.entries.iter().map(NeighborRecord::range_sample).collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the directory is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a PeerDirectory {
    type Item = &'a NeighborRecord;
    type IntoIter = std::slice::Iter<'a, NeighborRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<NeighborRecord> for PeerDirectory {
    fn from_iter<I: IntoIterator<Item = NeighborRecord>>(iter: I) -> Self {
        let mut directory = Self::new();
        for record in iter {
            directory.insert(record);
        }
        directory
    }
}
