//! Length-prefixed frame codec for the RCON TCP stream.
//!
//! Wire format: `[u32 LE length][length bytes of payload]`. The decoder
//! accumulates however many TCP reads it takes to satisfy the declared
//! length before yielding a frame.
//!
//! A zero length prefix is not an empty frame: it is the peer's signal that
//! the authenticated session has been dropped, and decodes to
//! [`ProtocolError::NoAuth`].

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::ProtocolError;

/// Sanity cap on a single RCON frame (prevents unbounded allocation from a
/// corrupt length prefix).
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Codec framing RCON packets over a byte stream.
#[derive(Debug, Default)]
pub struct RconCodec;

impl Decoder for RconCodec {
    type Item = Bytes;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>, ProtocolError> {
        if src.len() < 4 {
            return Ok(None);
        }

        let len = u32::from_le_bytes([src[0], src[1], src[2], src[3]]) as usize;

        if len == 0 {
            src.advance(4);
            return Err(ProtocolError::NoAuth);
        }
        if len > MAX_FRAME_SIZE {
            return Err(ProtocolError::OversizedFrame(len));
        }
        if src.len() < 4 + len {
            // Not enough buffered yet; reserve and wait for the next read.
            src.reserve(4 + len - src.len());
            return Ok(None);
        }

        src.advance(4);
        Ok(Some(src.split_to(len).freeze()))
    }
}

impl Encoder<&[u8]> for RconCodec {
    type Error = ProtocolError;

    fn encode(&mut self, payload: &[u8], dst: &mut BytesMut) -> Result<(), ProtocolError> {
        if payload.len() > MAX_FRAME_SIZE {
            return Err(ProtocolError::OversizedFrame(payload.len()));
        }
        dst.reserve(4 + payload.len());
        dst.put_u32_le(payload.len() as u32);
        dst.put_slice(payload);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_waits_for_a_complete_frame() {
        let mut codec = RconCodec;
        let mut buf = BytesMut::new();

        buf.extend_from_slice(&[0x05, 0x00]);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(&[0x00, 0x00, b'p', b'o']);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(b"ng!");
        let frame = codec.decode(&mut buf).unwrap().expect("complete frame");
        assert_eq!(&frame[..], b"pong!");
        assert!(buf.is_empty());
    }

    #[test]
    fn zero_length_prefix_signals_auth_loss() {
        let mut codec = RconCodec;
        let mut buf = BytesMut::from(&[0u8; 4][..]);
        let result = codec.decode(&mut buf);
        assert!(matches!(result, Err(ProtocolError::NoAuth)));
    }

    #[test]
    fn oversized_length_prefix_is_rejected() {
        let mut codec = RconCodec;
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&((MAX_FRAME_SIZE as u32) + 1).to_le_bytes());
        let result = codec.decode(&mut buf);
        assert!(matches!(result, Err(ProtocolError::OversizedFrame(_))));
    }

    #[test]
    fn encode_then_decode_round_trips() {
        let mut codec = RconCodec;
        let mut buf = BytesMut::new();
        codec.encode(b"exec status", &mut buf).unwrap();
        assert_eq!(&buf[..4], &11u32.to_le_bytes());

        let frame = codec.decode(&mut buf).unwrap().expect("frame");
        assert_eq!(&frame[..], b"exec status");
    }

    #[test]
    fn back_to_back_frames_decode_separately() {
        let mut codec = RconCodec;
        let mut buf = BytesMut::new();
        codec.encode(b"one", &mut buf).unwrap();
        codec.encode(b"two", &mut buf).unwrap();

        let first = codec.decode(&mut buf).unwrap().expect("first frame");
        let second = codec.decode(&mut buf).unwrap().expect("second frame");
        assert_eq!(&first[..], b"one");
        assert_eq!(&second[..], b"two");
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }
}
