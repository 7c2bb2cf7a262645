//! Error types for footmesh-locate.

use thiserror::Error;

use crate::PeerToken;

/// Result type for footmesh-locate operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by directory updates and configuration checks.
///
/// The scoring, selection and estimation passes themselves never fail;
/// degenerate geometry and thin data resolve to defined fallbacks.
#[derive(Debug, Error)]
pub enum Error {
    /// No directory entry carries this token.
    #[error("unknown peer {0}")]
    UnknownPeer(PeerToken),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
