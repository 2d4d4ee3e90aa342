//! Size-checked protocol message buffers.

use crate::{MAX_MSGLEN, SVC_DISCONNECT, SVC_NOP};
use thiserror::Error;

/// Errors raised when building a [`NetMessage`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    /// Payload is larger than [`MAX_MSGLEN`].
    #[error("message of {len} bytes exceeds MAX_MSGLEN ({max})", max = MAX_MSGLEN)]
    TooLarge {
        /// Offending payload length.
        len: usize,
    },
}

/// One opaque server-to-client protocol message.
///
/// The payload length never exceeds [`MAX_MSGLEN`]; construction enforces it,
/// so anything holding a `NetMessage` may write it to a demo without
/// re-checking.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NetMessage {
    data: Vec<u8>,
}

impl NetMessage {
    /// Wrap `data`, rejecting payloads over [`MAX_MSGLEN`].
    pub fn new(data: Vec<u8>) -> Result<Self, MessageError> {
        if data.len() > MAX_MSGLEN {
            return Err(MessageError::TooLarge { len: data.len() });
        }
        Ok(Self { data })
    }

    /// Copy `bytes` into a new message.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, MessageError> {
        Self::new(bytes.to_vec())
    }

    /// The single-byte disconnect marker written at the end of every recording.
    pub fn disconnect() -> Self {
        Self {
            data: vec![SVC_DISCONNECT],
        }
    }

    /// Payload bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// A lone `svc_nop` byte, sent by servers to keep the connection alive.
    pub fn is_keepalive(&self) -> bool {
        self.data.as_slice() == [SVC_NOP]
    }

    /// A lone `svc_disconnect` byte.
    pub fn is_disconnect(&self) -> bool {
        self.data.as_slice() == [SVC_DISCONNECT]
    }
}
