//! Packet construction contract.
//!
//! The transport layer hands assembled payload bytes to a [`PacketFactory`]
//! and carries the resulting [`Packet`] back to the caller without inspecting
//! anything past the payload. Payload semantics live entirely with the
//! factory implementation, which keeps the catalogue of packet types out of
//! the transport core.

use std::collections::HashMap;
use std::fmt;

use crate::error::{ProtocolError, Result};

/// Typed packet produced by a [`PacketFactory`].
///
/// Opaque to the transport: the sockets only ever forward the payload bytes
/// when framing an outbound request.
pub trait Packet: fmt::Debug + Send {
    /// Raw payload bytes, leading type tag included.
    fn payload(&self) -> &[u8];

    /// Leading type-tag byte.
    fn type_tag(&self) -> u8;
}

/// Collaborator that decodes assembled payload bytes into typed packets.
pub trait PacketFactory: Send + Sync {
    /// Produce a typed packet from raw payload bytes.
    ///
    /// Fails with [`ProtocolError::UnrecognizedPacket`] for unknown type
    /// tags and [`ProtocolError::Underflow`] for an empty payload.
    fn create_packet(&self, raw: &[u8]) -> Result<Box<dyn Packet>>;
}

type ConstructorFn = dyn Fn(&[u8]) -> Result<Box<dyn Packet>> + Send + Sync + 'static;

/// Packet factory with tagged-variant dispatch: the leading type-tag byte
/// routes to a registered constructor.
#[derive(Default)]
pub struct PacketRegistry {
    constructors: HashMap<u8, Box<ConstructorFn>>,
}

impl PacketRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor for a type-tag byte, replacing any previous
    /// registration for the same tag.
    pub fn register<F>(&mut self, tag: u8, constructor: F)
    where
        F: Fn(&[u8]) -> Result<Box<dyn Packet>> + Send + Sync + 'static,
    {
        self.constructors.insert(tag, Box::new(constructor));
    }

    /// Builder-style variant of [`PacketRegistry::register`].
    pub fn with<F>(mut self, tag: u8, constructor: F) -> Self
    where
        F: Fn(&[u8]) -> Result<Box<dyn Packet>> + Send + Sync + 'static,
    {
        self.register(tag, constructor);
        self
    }
}

impl PacketFactory for PacketRegistry {
    fn create_packet(&self, raw: &[u8]) -> Result<Box<dyn Packet>> {
        let tag = *raw.first().ok_or(ProtocolError::Underflow {
            needed: 1,
            remaining: 0,
        })?;

        self.constructors
            .get(&tag)
            .ok_or(ProtocolError::UnrecognizedPacket(tag))
            .and_then(|constructor| constructor(raw))
    }
}

/// Minimal packet that carries its raw bytes unchanged.
///
/// Useful for outbound requests and as the constructor target for payload
/// types the caller does not model further.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPacket {
    bytes: Vec<u8>,
}

impl RawPacket {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Boxed constructor suitable for [`PacketRegistry::register`].
    pub fn construct(raw: &[u8]) -> Result<Box<dyn Packet>> {
        Ok(Box::new(Self::new(raw.to_vec())))
    }
}

impl Packet for RawPacket {
    fn payload(&self) -> &[u8] {
        &self.bytes
    }

    fn type_tag(&self) -> u8 {
        self.bytes.first().copied().unwrap_or(0)
    }
}
