//! Non-blocking datagram transport feeding the client message loop.

use anyhow::{Context, Result};
use demoreel_core::{NetMessage, MAX_MSGLEN};
use std::io;
use std::net::{SocketAddr, UdpSocket};
use tracing::{debug, info, warn};

/// Source of live server messages.
///
/// Implementations must never block: the client polls once per tick.
pub trait Transport {
    /// Receive one pending message, or `Ok(None)` when nothing has arrived.
    fn try_recv(&mut self) -> io::Result<Option<NetMessage>>;
}

/// UDP socket transport.
///
/// Datagrams larger than [`MAX_MSGLEN`] are dropped, so every message handed
/// upward is safe to record.
pub struct UdpTransport {
    socket: UdpSocket,
    buffer: Vec<u8>,
    last_sender: Option<SocketAddr>,
    dropped: u64,
}

impl UdpTransport {
    /// Bind a non-blocking socket on `addr`.
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        let socket =
            UdpSocket::bind(addr).with_context(|| format!("Failed to bind UDP socket on {addr}"))?;
        socket
            .set_nonblocking(true)
            .context("Failed to make UDP socket non-blocking")?;
        info!("UDP transport bound to {}", socket.local_addr()?);

        Ok(Self {
            socket,
            // One spare byte reveals datagrams that are too large.
            buffer: vec![0; MAX_MSGLEN + 1],
            last_sender: None,
            dropped: 0,
        })
    }

    /// Address the socket is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Sender of the most recent accepted datagram.
    pub fn last_sender(&self) -> Option<SocketAddr> {
        self.last_sender
    }

    /// Number of oversized datagrams discarded.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl Transport for UdpTransport {
    fn try_recv(&mut self) -> io::Result<Option<NetMessage>> {
        loop {
            match self.socket.recv_from(&mut self.buffer) {
                Ok((len, from)) if len > MAX_MSGLEN => {
                    self.dropped += 1;
                    warn!("Dropping oversized datagram from {} ({}+ bytes)", from, len);
                }
                Ok((len, from)) => {
                    debug!(len, %from, "datagram received");
                    self.last_sender = Some(from);
                    let message = NetMessage::from_slice(&self.buffer[..len])
                        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                    return Ok(Some(message));
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(None),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}
