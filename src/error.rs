//! # Error Types
//!
//! Error handling for the query and RCON transport layer.
//!
//! This module defines all error variants that can occur during transport
//! operations, from low-level I/O failures to protocol-level signals such as
//! authentication loss.
//!
//! ## Error Categories
//! - **I/O Errors**: socket and connection failures
//! - **Deadline Errors**: connection or receive timeouts
//! - **Protocol Errors**: truncated packets, unknown type tags, oversized frames
//! - **Session Errors**: RCON authentication loss and IP-ban detection
//!
//! All errors implement `std::error::Error` for interoperability.
//!
//! ## Propagation Policy
//! The transport layer never retries automatically except for the RCON
//! socket's implicit reconnect-before-send; every other failure propagates
//! unchanged to the caller, which decides on retry policy.

use std::io;
use thiserror::Error;

/// ProtocolError is the primary error type for all transport operations.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Connection establishment or data receipt exceeded the configured
    /// deadline. The socket is left in a safe, retryable state.
    #[error("Operation timed out")]
    Timeout,

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Connection closed")]
    ConnectionClosed,

    /// The RCON peer signalled loss of the authenticated session with a
    /// zero-length frame. The socket has closed itself; the caller must
    /// re-authenticate over a fresh connection.
    #[error("RCON authentication lost")]
    NoAuth,

    /// The RCON peer forcibly reset the connection, which the protocol
    /// treats as the client IP having been banned.
    #[error("RCON connection reset by peer, client IP is likely banned")]
    Banned,

    #[error("Packet truncated: needed {needed} bytes, {remaining} remaining")]
    Underflow { needed: usize, remaining: usize },

    #[error("Unrecognized packet type: {0:#04x}")]
    UnrecognizedPacket(u8),

    /// A split query reply terminated before every fragment arrived.
    #[error("Incomplete split reply: received {received} of {expected} fragments")]
    IncompleteAssembly { received: usize, expected: usize },

    #[error("Frame too large: {0} bytes")]
    OversizedFrame(usize),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
