//! # Core Protocol Components
//!
//! Low-level byte parsing, packet construction, and stream framing.
//!
//! This module provides the foundation both transports build on: the
//! sequential byte cursor used to pick apart datagram headers, the packet
//! factory contract that turns assembled payload bytes into typed packets,
//! and the length-prefixed codec for the RCON TCP stream.
//!
//! ## Wire Formats
//! ```text
//! Query datagram:  [Marker(4)] [Payload(N)]              marker -1 = single
//!                  [Marker(4)] [SplitHeader(8|12)] [...]  marker -2 = split
//! RCON frame:      [Length(4, LE)] [Payload(Length)]
//! ```

pub mod codec;
pub mod cursor;
pub mod packet;
