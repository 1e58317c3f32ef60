//! # Transport Implementations
//!
//! The two socket variants of the client transport layer.
//!
//! ## Responsibilities
//! - Own the network endpoint and the per-call deadline
//! - Provide the raw send/receive primitives via the [`Transport`] trait
//! - Layer protocol-specific framing on top: datagram reassembly for the
//!   query protocol, length-prefixed frames for the RCON stream

pub mod query;
pub mod rcon;

pub use query::QuerySocket;
pub use rcon::RconSocket;

use crate::error::Result;

/// Shared transport capability implemented by both socket variants.
///
/// Each variant supplies its own framing logic on top of these primitives:
/// the query socket reassembles split datagrams, the RCON socket
/// length-prefixes frames over the TCP stream. Sockets are not safe for
/// concurrent use; `&mut self` serializes one logical operation at a time.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Transmit raw bytes to the peer, returning the count written.
    async fn send(&mut self, payload: &[u8]) -> Result<usize>;

    /// Receive at most `max_len` bytes, bounded by the configured deadline.
    ///
    /// Callers combine multiple receive calls with application-level framing
    /// to assemble logical packets. Deadline expiry yields
    /// [`crate::error::ProtocolError::Timeout`]; other transport failures
    /// propagate as distinct connection errors.
    async fn receive(&mut self, max_len: usize) -> Result<Vec<u8>>;

    /// Release the connection resource. Idempotent: safe to call on an
    /// already-closed or never-opened socket.
    fn close(&mut self);
}
