//! Error types for footmesh-transfer.

use std::net::SocketAddr;

use thiserror::Error;

/// Result type for transport and node operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while decoding packets, serving sockets or updating peers.
#[derive(Debug, Error)]
pub enum Error {
    /// Datagram shorter than a packet.
    #[error("packet truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    /// Type tag outside the known packet kinds.
    #[error("unknown packet kind {0}")]
    UnknownPacketKind(u32),

    /// Socket failure.
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),

    /// A response came from an address no peer is registered at.
    #[error("no peer registered at {0}")]
    UnknownSender(SocketAddr),

    /// Directory or locator failure.
    #[error(transparent)]
    Locate(#[from] footmesh_locate::Error),
}
