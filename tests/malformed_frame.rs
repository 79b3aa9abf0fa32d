// Copyright 2024 Gossip Overlay Contributors
// SPDX-License-Identifier: Apache-2.0

//! Scenario 6 from spec.md §8: a malformed frame on one connection tears
//! down only that connection, while the API listener keeps serving others.

use std::sync::Arc;

use gossipd::queues::new_queues;
use gossipd::store::{ApiConnectionTable, MessageCache};
use gossipd::wire::{read_frame, write_frame, Announce, Notify};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};

async fn spawn_node() -> std::net::SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let cache = Arc::new(MessageCache::new());
    let api_table = Arc::new(ApiConnectionTable::new());
    let (queues, receivers) = new_queues();

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    std::mem::forget(shutdown_tx);

    tokio::spawn(gossipd::workers::api::run(listener, cache.clone(), queues.clone(), api_table.clone(), shutdown_rx));
    tokio::spawn(gossipd::workers::announce::run(receivers.announce, cache, api_table, queues.p2p_send));

    addr
}

#[tokio::test]
async fn malformed_frame_only_drops_the_offending_connection() {
    let addr = spawn_node().await;

    // A header advertising a 2-byte total size is below the minimum of 4
    // and must be rejected as `InvalidSize` without taking the listener
    // down with it.
    let mut bad = TcpStream::connect(addr).await.unwrap();
    bad.write_all(&[0u8, 2, 0, 1]).await.unwrap();
    bad.flush().await.unwrap();

    // The connection should close from the node's side shortly after.
    let mut buf = [0u8; 1];
    let closed = tokio::time::timeout(std::time::Duration::from_secs(2), bad.peek(&mut buf)).await;
    match closed {
        Ok(Ok(0)) => {}
        Ok(Err(_)) => {}
        other => panic!("expected malformed connection to be closed, got {other:?}"),
    }

    // A second, well-formed client on the same listener must still work.
    let mut good = TcpStream::connect(addr).await.unwrap();
    write_frame(&mut good, &Notify { data_type: 42 }.to_frame()).await.unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let mut other_client = TcpStream::connect(addr).await.unwrap();
    write_frame(&mut other_client, &Announce { ttl: 1, data_type: 42, payload: b"ok".to_vec() }.to_frame())
        .await
        .unwrap();

    let frame = tokio::time::timeout(std::time::Duration::from_secs(2), read_frame(&mut good)).await.unwrap().unwrap();
    assert_eq!(frame.msg_type, gossipd::wire::MessageType::Notification);
}
