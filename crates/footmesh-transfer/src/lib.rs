//! Footmesh Transfer - UDP transport and node roles
//!
//! This crate provides:
//! - A fixed 28-byte wire codec for the four packet kinds
//! - A UDP transport with configurable socket buffers
//! - [`PlayerNode`], which answers location and info requests
//! - [`AnchorNode`], which tracks players round-robin
//!
//! # Protocol
//!
//! An anchor sends LOCATION_REQUEST to one player per interval. The
//! player runs a selection and estimation pass over its directory and
//! replies LOCATION_RESPONSE with the estimate. Players keep each other's
//! coordinates fresh with INFO_REQUEST / INFO_RESPONSE.
//!
//! # Example
//!
//! ```rust,ignore
//! use footmesh_transfer::{AnchorConfig, AnchorNode, PlayerConfig, PlayerNode, TransportConfig};
//!
//! let player = PlayerNode::new(PlayerConfig {
//!     transport: TransportConfig::loopback(),
//!     ..Default::default()
//! })
//! .await?;
//! let mut anchor = AnchorNode::new(AnchorConfig::default()).await?;
//! anchor.add_player(player.local_addr()?);
//! tokio::spawn(player.run());
//! anchor.track_once().await?;
//! let fix = anchor.next_fix().await?;
//! ```

pub mod anchor;
pub mod error;
pub mod player;
pub mod transport;
pub mod wire;

// Re-export main types at crate root
pub use anchor::{AnchorConfig, AnchorNode, LocationFix, DEFAULT_TRACK_INTERVAL};
pub use error::{Error, Result};
pub use player::{PlayerConfig, PlayerNode, PlayerState};
pub use transport::{TransportConfig, TransportHandle};
pub use wire::{PacketData, PacketKind, WIRE_SIZE};
