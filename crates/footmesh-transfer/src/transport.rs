//! UDP transport for footmesh packets
//!
//! A thin wrapper around tokio's UdpSocket with:
//! - Configurable send/receive buffer sizes
//! - Fixed-size packet framing via [`PacketData`]
//! - Malformed datagrams logged and dropped on receive

use std::net::SocketAddr;
use std::sync::Arc;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tracing::{debug, warn};

use crate::error::Result;
use crate::wire::{PacketData, WIRE_SIZE};

/// Largest datagram read in one call. Anything past the first frame is ignored.
const RECV_BUFFER: usize = 512;

/// Transport configuration
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Address to bind to
    pub bind: SocketAddr,
    /// Send buffer size in bytes
    pub sndbuf: usize,
    /// Receive buffer size in bytes
    pub rcvbuf: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 9000)),
            sndbuf: 256 * 1024,
            rcvbuf: 256 * 1024,
        }
    }
}

impl TransportConfig {
    /// Bind to an ephemeral port on loopback
    pub fn loopback() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 0)),
            ..Self::default()
        }
    }
}

/// Bind a UDP socket with the configured buffer sizes
fn bind_socket(cfg: &TransportConfig) -> Result<UdpSocket> {
    let domain = if cfg.bind.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;

    // Buffer sizes must be set before binding
    socket.set_send_buffer_size(cfg.sndbuf)?;
    socket.set_recv_buffer_size(cfg.rcvbuf)?;
    socket.set_reuse_address(true)?;

    socket.bind(&cfg.bind.into())?;
    socket.set_nonblocking(true)?;

    let std_socket: std::net::UdpSocket = socket.into();
    Ok(UdpSocket::from_std(std_socket)?)
}

/// Handle for sending and receiving packets. Clones share the socket.
#[derive(Debug, Clone)]
pub struct TransportHandle {
    socket: Arc<UdpSocket>,
}

impl TransportHandle {
    /// Create a new transport handle with the given configuration
    pub async fn new(cfg: TransportConfig) -> Result<Self> {
        let socket = bind_socket(&cfg)?;
        tracing::info!(
            "UDP transport bound to {} (sndbuf={}, rcvbuf={})",
            socket.local_addr()?,
            cfg.sndbuf,
            cfg.rcvbuf
        );
        Ok(Self {
            socket: Arc::new(socket),
        })
    }

    /// Send one packet
    pub async fn send_packet(&self, addr: SocketAddr, pkt: &PacketData) -> Result<()> {
        debug!(to = %addr, "send {}", pkt);
        self.socket.send_to(&pkt.encode(), addr).await?;
        Ok(())
    }

    /// Send raw bytes to the given address (no framing)
    pub async fn send_raw(&self, addr: SocketAddr, data: &[u8]) -> Result<()> {
        self.socket.send_to(data, addr).await?;
        Ok(())
    }

    /// Wait for the next well-formed packet
    ///
    /// Datagrams that fail to decode are logged and skipped.
    pub async fn recv_packet(&self) -> Result<(SocketAddr, PacketData)> {
        let mut buf = [0u8; RECV_BUFFER];
        loop {
            let (len, from) = self.socket.recv_from(&mut buf).await?;
            match PacketData::decode(&buf[..len]) {
                Ok(pkt) => {
                    debug!(from = %from, "recv {}", pkt);
                    return Ok((from, pkt));
                }
                Err(e) => {
                    warn!(from = %from, len, "dropping malformed datagram: {}", e);
                }
            }
        }
    }

    /// Get the local address this transport is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }
}

// A full frame always fits
const _: () = assert!(WIRE_SIZE <= RECV_BUFFER);
