//! UDP query transport with split-packet reassembly.
//!
//! Query replies arrive as single datagrams marked `-1`, or split across
//! several datagrams marked `-2` when the logical reply exceeds the 1400-byte
//! datagram limit. [`QuerySocket::get_reply`] reassembles split replies into
//! one payload before handing it to the packet factory.
//!
//! ## Split header layout (after the marker)
//! ```text
//! [RequestId(4)] [Count(1)] [Index(1)] [FragmentSize(2)]
//! ```
//! The first fragment (index 0) carries an additional 4-byte field describing
//! the size/compression of the whole assembled message. It is consumed to
//! keep the payload aligned but not otherwise interpreted; reassembly of
//! compressed replies is not supported.

use std::collections::{BTreeMap, HashMap};

use tokio::net::UdpSocket;
use tracing::{debug, trace, warn};

use crate::config::SocketConfig;
use crate::core::cursor::ByteCursor;
use crate::core::packet::{Packet, PacketFactory};
use crate::error::{ProtocolError, Result};
use crate::transport::Transport;
use crate::utils::timeout::with_deadline;

/// Marker preceding a complete single-datagram reply.
pub const SINGLE_PACKET_MARKER: i32 = -1;

/// Marker preceding one fragment of a split reply.
pub const SPLIT_PACKET_MARKER: i32 = -2;

/// Reassembly state for one request identifier.
///
/// Local to a single [`QuerySocket::get_reply`] call; fragments of different
/// request identifiers never mix.
#[derive(Debug, Default)]
struct Assembly {
    expected: usize,
    fragments: BTreeMap<u8, Vec<u8>>,
}

impl Assembly {
    fn new(expected: usize) -> Self {
        Self {
            expected,
            fragments: BTreeMap::new(),
        }
    }

    /// Complete only when every index in `[0, expected)` has been filled.
    fn is_complete(&self) -> bool {
        (0..self.expected).all(|i| self.fragments.contains_key(&(i as u8)))
    }

    /// Concatenate fragments in ascending index order. The declared
    /// per-fragment size is advisory; joining uses the bytes actually
    /// received.
    fn join(self) -> Vec<u8> {
        let mut payload = Vec::new();
        for fragment in self.fragments.into_values() {
            payload.extend_from_slice(&fragment);
        }
        payload
    }
}

/// Client socket for the UDP query protocol.
///
/// Constructed unconnected; the underlying UDP socket is bound on first use
/// and kept for subsequent requests. One logical operation at a time.
pub struct QuerySocket<F: PacketFactory> {
    peer: String,
    config: SocketConfig,
    factory: F,
    socket: Option<UdpSocket>,
    cursor: ByteCursor,
}

impl<F: PacketFactory> QuerySocket<F> {
    pub fn new(peer: impl Into<String>, config: SocketConfig, factory: F) -> Self {
        Self {
            peer: peer.into(),
            config,
            factory,
            socket: None,
            cursor: ByteCursor::default(),
        }
    }

    /// Peer address this socket queries.
    pub fn peer(&self) -> &str {
        &self.peer
    }

    async fn ensure_socket(&mut self) -> Result<&UdpSocket> {
        if self.socket.is_none() {
            let socket = UdpSocket::bind("0.0.0.0:0").await?;
            with_deadline(self.config.timeout, socket.connect(self.peer.as_str())).await??;
            debug!(peer = %self.peer, "query socket bound");
            self.socket = Some(socket);
        }
        self.socket.as_ref().ok_or(ProtocolError::ConnectionClosed)
    }

    /// Frame and transmit an outbound request. Requests always fit a single
    /// datagram, so the single-packet marker is prefixed to the payload.
    pub async fn send(&mut self, packet: &dyn Packet) -> Result<usize> {
        let mut datagram = Vec::with_capacity(4 + packet.payload().len());
        datagram.extend_from_slice(&SINGLE_PACKET_MARKER.to_le_bytes());
        datagram.extend_from_slice(packet.payload());
        Transport::send(self, &datagram).await
    }

    /// Receive one logical reply, reassembling split packets as needed, and
    /// hand the payload to the packet factory.
    pub async fn get_reply(&mut self) -> Result<Box<dyn Packet>> {
        let max_len = self.config.max_packet_size;

        let datagram = self.receive(max_len).await?;
        self.cursor.write(&datagram);

        match self.cursor.read_i32()? {
            SINGLE_PACKET_MARKER => {
                let payload = self.cursor.remaining_bytes();
                trace!(len = payload.len(), "single-packet reply");
                return self.factory.create_packet(&payload);
            }
            SPLIT_PACKET_MARKER => {}
            other => {
                return Err(ProtocolError::Connection(format!(
                    "unexpected reply marker {other:#010x}"
                )))
            }
        }

        // Reassembly is scoped per request identifier: fragments observed for
        // an unrelated request are collected separately and never corrupt the
        // active assembly.
        let mut assemblies: HashMap<u32, Assembly> = HashMap::new();
        let active_id = self.collect_fragment(&mut assemblies)?;

        while !assemblies
            .get(&active_id)
            .map(Assembly::is_complete)
            .unwrap_or(false)
        {
            let datagram = self.receive(max_len).await?;
            if datagram.is_empty() {
                debug!(request_id = active_id, "zero-length receive ended reassembly");
                break;
            }
            self.cursor.write(&datagram);
            let marker = self.cursor.read_i32()?;
            if marker != SPLIT_PACKET_MARKER {
                warn!(
                    request_id = active_id,
                    marker, "non-split marker ended reassembly"
                );
                break;
            }
            self.collect_fragment(&mut assemblies)?;
        }

        let Some(assembly) = assemblies.remove(&active_id) else {
            return Err(ProtocolError::IncompleteAssembly {
                received: 0,
                expected: 0,
            });
        };
        if !assembly.is_complete() {
            return Err(ProtocolError::IncompleteAssembly {
                received: assembly.fragments.len(),
                expected: assembly.expected,
            });
        }

        let payload = assembly.join();
        debug!(
            request_id = active_id,
            len = payload.len(),
            "reassembled split reply"
        );
        self.factory.create_packet(&payload)
    }

    /// Parse the split header at the cursor and store the fragment payload
    /// under its request identifier. Returns the request identifier.
    fn collect_fragment(&mut self, assemblies: &mut HashMap<u32, Assembly>) -> Result<u32> {
        let request_id = self.cursor.read_u32()?;
        let total = self.cursor.read_u8()?;
        let index = self.cursor.read_u8()?;
        let declared_len = self.cursor.read_u16()?;

        if index == 0 {
            // Whole-message size/compression field, present only on the
            // first fragment. Consumed for alignment, not interpreted.
            let meta = self.cursor.read_u32()?;
            trace!(request_id, meta, "first-fragment metadata");
        }

        let payload = self.cursor.remaining_bytes();
        trace!(
            request_id,
            index,
            total,
            declared_len,
            actual_len = payload.len(),
            "collected fragment"
        );

        assemblies
            .entry(request_id)
            .or_insert_with(|| Assembly::new(total as usize))
            .fragments
            .insert(index, payload);

        Ok(request_id)
    }
}

impl<F: PacketFactory> Transport for QuerySocket<F> {
    async fn send(&mut self, payload: &[u8]) -> Result<usize> {
        let deadline = self.config.timeout;
        let socket = self.ensure_socket().await?;
        let written = with_deadline(deadline, socket.send(payload)).await??;
        Ok(written)
    }

    async fn receive(&mut self, max_len: usize) -> Result<Vec<u8>> {
        let deadline = self.config.timeout;
        let socket = self.ensure_socket().await?;
        let mut buf = vec![0u8; max_len];
        let received = with_deadline(deadline, socket.recv(&mut buf)).await??;
        buf.truncate(received);
        Ok(buf)
    }

    fn close(&mut self) {
        if self.socket.take().is_some() {
            debug!(peer = %self.peer, "query socket closed");
        }
    }
}
