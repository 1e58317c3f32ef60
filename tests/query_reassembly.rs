#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! Query transport tests against a loopback UDP peer: single-datagram
//! round trips, split-packet reassembly, and failure-path behavior.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::UdpSocket;

use gameserver_protocol::{
    PacketRegistry, ProtocolError, QuerySocket, RawPacket, SocketConfig, Transport,
};

const INFO_TAG: u8 = 0x49;

fn factory() -> PacketRegistry {
    PacketRegistry::new().with(INFO_TAG, RawPacket::construct)
}

fn config() -> SocketConfig {
    SocketConfig::default().with_timeout(Duration::from_millis(500))
}

/// Bind a loopback peer that answers the first request with the given
/// datagrams, in order.
async fn reply_server(datagrams: Vec<Vec<u8>>) -> SocketAddr {
    let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(async move {
        let mut buf = [0u8; 2048];
        let (_, peer) = server.recv_from(&mut buf).await.unwrap();
        for datagram in datagrams {
            server.send_to(&datagram, peer).await.unwrap();
        }
    });
    addr
}

fn single(payload: &[u8]) -> Vec<u8> {
    let mut datagram = (-1i32).to_le_bytes().to_vec();
    datagram.extend_from_slice(payload);
    datagram
}

fn fragment(request_id: u32, total: u8, index: u8, declared: u16, payload: &[u8]) -> Vec<u8> {
    let mut datagram = (-2i32).to_le_bytes().to_vec();
    datagram.extend_from_slice(&request_id.to_le_bytes());
    datagram.push(total);
    datagram.push(index);
    datagram.extend_from_slice(&declared.to_le_bytes());
    if index == 0 {
        // Whole-message size field, present only on the first fragment.
        datagram.extend_from_slice(&0u32.to_le_bytes());
    }
    datagram.extend_from_slice(payload);
    datagram
}

async fn query(addr: SocketAddr, request: &[u8]) -> gameserver_protocol::Result<Box<dyn gameserver_protocol::Packet>> {
    let mut socket = QuerySocket::new(addr.to_string(), config(), factory());
    socket.send(&RawPacket::new(request.to_vec())).await?;
    socket.get_reply().await
}

#[tokio::test]
async fn single_datagram_round_trip() {
    let payload = [&[INFO_TAG][..], b"dedicated server, 24/32 players"].concat();
    let addr = reply_server(vec![single(&payload)]).await;

    let packet = query(addr, b"TSource Engine Query\0").await.unwrap();
    assert_eq!(packet.type_tag(), INFO_TAG);
    assert_eq!(packet.payload(), &payload[..]);
}

#[tokio::test]
async fn split_reply_reassembled_in_index_order() {
    let chunks: [&[u8]; 3] = [&[INFO_TAG, b'a', b'a'], b"bbbb", b"cc"];
    let addr = reply_server(vec![
        fragment(7, 3, 0, chunks[0].len() as u16, chunks[0]),
        fragment(7, 3, 1, chunks[1].len() as u16, chunks[1]),
        fragment(7, 3, 2, chunks[2].len() as u16, chunks[2]),
    ])
    .await;

    let packet = query(addr, b"players\0").await.unwrap();
    assert_eq!(packet.payload(), &chunks.concat()[..]);
}

#[tokio::test]
async fn out_of_order_fragments_still_join_ascending() {
    let head: &[u8] = &[INFO_TAG, b'h', b'e', b'a', b'd'];
    let tail: &[u8] = b"tail";
    let addr = reply_server(vec![
        fragment(3, 2, 1, tail.len() as u16, tail),
        fragment(3, 2, 0, head.len() as u16, head),
    ])
    .await;

    let packet = query(addr, b"rules\0").await.unwrap();
    assert_eq!(packet.payload(), &[head, tail].concat()[..]);
}

#[tokio::test]
async fn declared_fragment_size_is_advisory() {
    let head: &[u8] = &[INFO_TAG, b'x'];
    let tail: &[u8] = b"yz";
    // Declared sizes bear no relation to the actual fragment payloads.
    let addr = reply_server(vec![
        fragment(11, 2, 0, 999, head),
        fragment(11, 2, 1, 1, tail),
    ])
    .await;

    let packet = query(addr, b"rules\0").await.unwrap();
    assert_eq!(packet.payload(), &[head, tail].concat()[..]);
}

#[tokio::test]
async fn foreign_request_id_does_not_corrupt_assembly() {
    let head: &[u8] = &[INFO_TAG, b'1'];
    let tail: &[u8] = b"2";
    let foreign: &[u8] = b"???";
    let addr = reply_server(vec![
        fragment(7, 2, 0, head.len() as u16, head),
        fragment(9, 2, 0, foreign.len() as u16, foreign),
        fragment(7, 2, 1, tail.len() as u16, tail),
    ])
    .await;

    let packet = query(addr, b"players\0").await.unwrap();
    assert_eq!(packet.payload(), &[head, tail].concat()[..]);
}

#[tokio::test]
async fn non_split_marker_mid_assembly_fails_incomplete() {
    let head: &[u8] = &[INFO_TAG, b'h'];
    let addr = reply_server(vec![
        fragment(5, 3, 0, head.len() as u16, head),
        single(b"unrelated"),
    ])
    .await;

    let result = query(addr, b"players\0").await;
    match result {
        Err(ProtocolError::IncompleteAssembly { received, expected }) => {
            assert_eq!(received, 1);
            assert_eq!(expected, 3);
        }
        other => panic!("Unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn zero_length_receive_mid_assembly_fails_incomplete() {
    let head: &[u8] = &[INFO_TAG, b'h'];
    let addr = reply_server(vec![fragment(5, 2, 0, head.len() as u16, head), vec![]]).await;

    let result = query(addr, b"players\0").await;
    assert!(matches!(
        result,
        Err(ProtocolError::IncompleteAssembly {
            received: 1,
            expected: 2
        })
    ));
}

#[tokio::test]
async fn unexpected_marker_is_a_connection_error() {
    let mut datagram = 0x1234_5678i32.to_le_bytes().to_vec();
    datagram.extend_from_slice(b"noise");
    let addr = reply_server(vec![datagram]).await;

    let result = query(addr, b"ping\0").await;
    assert!(matches!(result, Err(ProtocolError::Connection(_))));
}

#[tokio::test]
async fn unknown_type_tag_is_rejected_by_factory() {
    let addr = reply_server(vec![single(&[0x7F, 0x00, 0x01])]).await;

    let result = query(addr, b"ping\0").await;
    assert!(matches!(
        result,
        Err(ProtocolError::UnrecognizedPacket(0x7F))
    ));
}

#[tokio::test]
async fn silent_server_times_out() {
    let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(async move {
        let mut buf = [0u8; 64];
        // Swallow the request, never answer.
        let _ = server.recv_from(&mut buf).await;
        tokio::time::sleep(Duration::from_secs(5)).await;
    });

    let mut socket = QuerySocket::new(
        addr.to_string(),
        config().with_timeout(Duration::from_millis(100)),
        factory(),
    );
    socket
        .send(&RawPacket::new(b"ping\0".to_vec()))
        .await
        .unwrap();
    let result = socket.get_reply().await;
    assert!(matches!(result, Err(ProtocolError::Timeout)));
}

#[tokio::test]
async fn raw_receive_yields_at_most_max_len() {
    let addr = reply_server(vec![vec![0xAB; 100]]).await;

    let mut socket = QuerySocket::new(addr.to_string(), config(), factory());
    Transport::send(&mut socket, b"ping").await.unwrap();
    let bytes = socket.receive(10).await.unwrap();
    assert_eq!(bytes.len(), 10);
    assert!(bytes.iter().all(|&b| b == 0xAB));
}
