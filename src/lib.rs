//! # GameServer Protocol
//!
//! Client-side transport core for querying and controlling multiplayer game
//! servers over two binary protocols:
//!
//! - a UDP **query** protocol for fetching server state, with reassembly of
//!   multi-packet (split) replies into one logical packet;
//! - a TCP **RCON** protocol for authenticated administrative commands, with
//!   a lazily-established persistent session, length-prefixed framing, and
//!   detection of authentication loss and IP bans.
//!
//! Payload semantics are out of scope: assembled payload bytes are handed to
//! a [`PacketFactory`] collaborator, which produces the typed [`Packet`]
//! returned to the caller.
//!
//! ## Modules
//! - [`config`]: socket configuration (I/O deadline, datagram sizing)
//! - [`core`]: byte cursor, packet factory contract, RCON frame codec
//! - [`transport`]: the [`QuerySocket`] and [`RconSocket`] implementations
//! - [`error`]: the [`ProtocolError`] taxonomy
//!
//! ## Example
//! ```no_run
//! use gameserver_protocol::{PacketRegistry, QuerySocket, RawPacket, SocketConfig};
//!
//! # async fn run() -> gameserver_protocol::Result<()> {
//! let factory = PacketRegistry::new().with(0x49, RawPacket::construct);
//! let mut socket = QuerySocket::new("192.0.2.1:27015", SocketConfig::default(), factory);
//!
//! socket.send(&RawPacket::new(b"TSource Engine Query\0".to_vec())).await?;
//! let info = socket.get_reply().await?;
//! println!("reply tag: {:#04x}", info.type_tag());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod transport;
pub mod utils;

pub use config::SocketConfig;
pub use core::cursor::ByteCursor;
pub use core::packet::{Packet, PacketFactory, PacketRegistry, RawPacket};
pub use error::{ProtocolError, Result};
pub use transport::{QuerySocket, RconSocket, Transport};
