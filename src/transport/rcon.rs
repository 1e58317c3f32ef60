//! TCP RCON transport with a persistent, lazily-established session.
//!
//! The session is modelled as an explicit state machine:
//!
//! ```text
//! {Unconnected} --connect()----------------------> {Connected}
//! {Connected}   --reply() sees zero-length frame-> {Unconnected}, NoAuth
//! {Connected}   --reset during reply()-----------> {Unconnected}, Banned
//! {Connected}   --close()------------------------> {Unconnected}
//! ```
//!
//! `send` performs the `{Unconnected} -> {Connected}` transition implicitly,
//! which makes the socket self-healing across idle periods and server-side
//! disconnects. The peer does not acknowledge authentication per request;
//! loss of the authenticated session is inferred from the zero-length frame.

use std::io;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::{debug, instrument, warn};

use crate::config::SocketConfig;
use crate::core::codec::RconCodec;
use crate::core::packet::{Packet, PacketFactory};
use crate::error::{ProtocolError, Result};
use crate::transport::Transport;
use crate::utils::timeout::with_deadline;

enum SessionState {
    Unconnected,
    Connected(Framed<TcpStream, RconCodec>),
}

/// Client socket for the TCP RCON protocol.
///
/// The connection persists across request/reply exchanges until explicitly
/// closed or until the peer signals loss of authentication or a ban.
pub struct RconSocket<F: PacketFactory> {
    peer: String,
    config: SocketConfig,
    factory: F,
    state: SessionState,
}

impl<F: PacketFactory> RconSocket<F> {
    pub fn new(peer: impl Into<String>, config: SocketConfig, factory: F) -> Self {
        Self {
            peer: peer.into(),
            config,
            factory,
            state: SessionState::Unconnected,
        }
    }

    /// Peer address this socket administers.
    pub fn peer(&self) -> &str {
        &self.peer
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, SessionState::Connected(_))
    }

    /// Resolve the peer (hostnames allowed) and open a TCP connection within
    /// the configured deadline. On expiry the socket is left unconnected.
    #[instrument(skip(self), fields(peer = %self.peer))]
    pub async fn connect(&mut self) -> Result<()> {
        let stream =
            with_deadline(self.config.timeout, TcpStream::connect(self.peer.as_str())).await??;
        debug!("RCON connection established");
        self.state = SessionState::Connected(Framed::new(stream, RconCodec));
        Ok(())
    }

    /// Release the connection. Idempotent.
    pub fn close(&mut self) {
        self.drop_connection();
    }

    fn drop_connection(&mut self) {
        if matches!(self.state, SessionState::Connected(_)) {
            debug!(peer = %self.peer, "RCON session closed");
        }
        self.state = SessionState::Unconnected;
    }

    /// Write one framed packet, connecting first if no live connection
    /// exists.
    pub async fn send(&mut self, packet: &dyn Packet) -> Result<()> {
        if !self.is_connected() {
            self.connect().await?;
        }

        let result = match &mut self.state {
            SessionState::Connected(framed) => framed.send(packet.payload()).await,
            SessionState::Unconnected => Err(ProtocolError::ConnectionClosed),
        };
        if result.is_err() {
            self.drop_connection();
        }
        result
    }

    /// Read one reply frame and hand its payload to the packet factory.
    ///
    /// A zero-length frame means the peer dropped the authenticated session:
    /// the socket closes itself and fails with
    /// [`ProtocolError::NoAuth`]. A connection reset while reading is
    /// interpreted as an IP ban and fails with [`ProtocolError::Banned`].
    pub async fn reply(&mut self) -> Result<Box<dyn Packet>> {
        let deadline = self.config.timeout;

        let framed = match &mut self.state {
            SessionState::Connected(framed) => framed,
            SessionState::Unconnected => return Err(ProtocolError::ConnectionClosed),
        };

        let next = with_deadline(deadline, framed.next()).await;
        let item = match next {
            Ok(item) => item,
            Err(timeout) => {
                // Deadline expiry leaves the session in a retryable,
                // unconnected state.
                self.drop_connection();
                return Err(timeout);
            }
        };

        let frame = match item {
            Some(Ok(frame)) => frame,
            Some(Err(e)) => {
                self.drop_connection();
                return Err(match e {
                    ProtocolError::NoAuth => {
                        warn!(peer = %self.peer, "RCON peer dropped the authenticated session");
                        ProtocolError::NoAuth
                    }
                    ProtocolError::Io(ref io_err)
                        if io_err.kind() == io::ErrorKind::ConnectionReset =>
                    {
                        warn!(peer = %self.peer, "RCON connection reset, treating as ban");
                        ProtocolError::Banned
                    }
                    other => other,
                });
            }
            None => {
                self.drop_connection();
                return Err(ProtocolError::ConnectionClosed);
            }
        };

        self.factory.create_packet(&frame)
    }
}

impl<F: PacketFactory> Transport for RconSocket<F> {
    async fn send(&mut self, payload: &[u8]) -> Result<usize> {
        if !self.is_connected() {
            self.connect().await?;
        }
        match &mut self.state {
            SessionState::Connected(framed) => {
                framed.get_mut().write_all(payload).await?;
                Ok(payload.len())
            }
            SessionState::Unconnected => Err(ProtocolError::ConnectionClosed),
        }
    }

    async fn receive(&mut self, max_len: usize) -> Result<Vec<u8>> {
        let deadline = self.config.timeout;
        match &mut self.state {
            SessionState::Connected(framed) => {
                // Serve bytes the codec has already buffered before touching
                // the wire again.
                let buffered = framed.read_buffer_mut();
                if !buffered.is_empty() {
                    let take = buffered.len().min(max_len);
                    return Ok(buffered.split_to(take).to_vec());
                }

                let mut buf = vec![0u8; max_len];
                let received = with_deadline(deadline, framed.get_mut().read(&mut buf)).await??;
                buf.truncate(received);
                Ok(buf)
            }
            SessionState::Unconnected => Err(ProtocolError::ConnectionClosed),
        }
    }

    fn close(&mut self) {
        self.drop_connection();
    }
}
