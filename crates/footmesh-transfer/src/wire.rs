//! Wire format for footmesh packets
//!
//! Every packet is a fixed 28-byte frame in network byte order:
//!
//! ```text
//! +--------+----------+----------+----------+
//! | kind   | x        | y        | value    |
//! | u32 BE | f64 BE   | f64 BE   | f64 BE   |
//! +--------+----------+----------+----------+
//! ```
//!
//! `value` carries the battery level for every kind in use today.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use footmesh_geometry::Point;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Encoded size of one packet.
pub const WIRE_SIZE: usize = 4 + 3 * 8;

/// Packet type tag
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum PacketKind {
    /// Anchor asks a player for its estimated position
    LocationRequest = 1,
    /// Player asks a peer for its position and battery
    InfoRequest = 2,
    /// Reply to `InfoRequest`
    InfoResponse = 3,
    /// Reply to `LocationRequest`
    LocationResponse = 4,
}

impl TryFrom<u32> for PacketKind {
    type Error = Error;

    fn try_from(tag: u32) -> Result<Self> {
        match tag {
            1 => Ok(Self::LocationRequest),
            2 => Ok(Self::InfoRequest),
            3 => Ok(Self::InfoResponse),
            4 => Ok(Self::LocationResponse),
            other => Err(Error::UnknownPacketKind(other)),
        }
    }
}

impl From<PacketKind> for u32 {
    fn from(kind: PacketKind) -> u32 {
        kind as u32
    }
}

/// One decoded packet.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PacketData {
    /// Packet type
    pub kind: PacketKind,
    /// X coordinate in meters
    pub x: f64,
    /// Y coordinate in meters
    pub y: f64,
    /// Battery level of the sender
    pub value: f64,
}

impl PacketData {
    /// Create a packet from its parts
    pub fn new(kind: PacketKind, position: Point, value: f64) -> Self {
        Self {
            kind,
            x: position.x,
            y: position.y,
            value,
        }
    }

    /// Location request sent by an anchor at `anchor`
    pub fn location_request(anchor: Point) -> Self {
        Self::new(PacketKind::LocationRequest, anchor, 0.0)
    }

    /// Info request carrying the sender's own position and battery
    pub fn info_request(position: Point, battery: f64) -> Self {
        Self::new(PacketKind::InfoRequest, position, battery)
    }

    /// Info response with the responder's position and battery
    pub fn info_response(position: Point, battery: f64) -> Self {
        Self::new(PacketKind::InfoResponse, position, battery)
    }

    /// Location response with the estimated position
    pub fn location_response(position: Point, battery: f64) -> Self {
        Self::new(PacketKind::LocationResponse, position, battery)
    }

    /// The carried coordinate
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Encode into a 28-byte frame
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(WIRE_SIZE);
        buf.put_u32(self.kind.into());
        buf.put_f64(self.x);
        buf.put_f64(self.y);
        buf.put_f64(self.value);
        buf.freeze()
    }

    /// Decode the first 28 bytes of `data`. Trailing bytes are ignored.
    pub fn decode(mut data: &[u8]) -> Result<Self> {
        if data.len() < WIRE_SIZE {
            return Err(Error::Truncated {
                expected: WIRE_SIZE,
                actual: data.len(),
            });
        }
        let kind = PacketKind::try_from(data.get_u32())?;
        Ok(Self {
            kind,
            x: data.get_f64(),
            y: data.get_f64(),
            value: data.get_f64(),
        })
    }
}

impl std::fmt::Display for PacketData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:?} x={:.3} y={:.3} value={:.1}",
            self.kind, self.x, self.y, self.value
        )
    }
}
