// Copyright 2024 Gossip Overlay Contributors
// SPDX-License-Identifier: Apache-2.0

//! End-to-end scenario 4/5 from spec.md §8: a remote announce arriving via
//! `SEND_CONTENT` is delivered locally and re-broadcast with its TTL
//! decremented (or left at `0`, which means unlimited hops).

use std::sync::Arc;
use std::time::Duration;

use gossipd::queues::new_queues;
use gossipd::store::{ApiConnectionTable, MessageCache, PeerSet};
use gossipd::wire::{read_frame, write_frame, Announce, Message, MessageType, Notify, SendContent};
use tokio::net::{TcpListener, TcpStream};

struct Harness {
    api_addr: std::net::SocketAddr,
    p2p_addr: std::net::SocketAddr,
}

async fn spawn_node(degree: usize) -> Harness {
    let api_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let p2p_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let api_addr = api_listener.local_addr().unwrap();
    let p2p_addr = p2p_listener.local_addr().unwrap();

    let cache = Arc::new(MessageCache::new());
    let api_table = Arc::new(ApiConnectionTable::new());
    let p2p_table = Arc::new(gossipd::store::P2pConnectionTable::new());
    let peer_set = Arc::new(PeerSet::new());
    let (queues, receivers) = new_queues();

    let never_fires = || {
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        std::mem::forget(tx);
        rx
    };

    tokio::spawn(gossipd::workers::api::run(
        api_listener,
        cache.clone(),
        queues.clone(),
        api_table.clone(),
        never_fires(),
    ));
    tokio::spawn(gossipd::workers::p2p_listener::run(
        p2p_listener,
        p2p_table.clone(),
        queues.incoming.clone(),
        never_fires(),
    ));
    tokio::spawn(gossipd::workers::announce::run(
        receivers.announce,
        cache.clone(),
        api_table.clone(),
        queues.p2p_send.clone(),
    ));
    tokio::spawn(gossipd::workers::p2p_inbound::run(
        receivers.incoming,
        p2p_table.clone(),
        peer_set.clone(),
        degree,
        queues.announce.clone(),
        queues.p2p_send.clone(),
    ));
    tokio::spawn(gossipd::workers::p2p_outbound::run(
        receivers.p2p_send,
        p2p_table.clone(),
        queues.incoming.clone(),
        degree,
    ));

    Harness { api_addr, p2p_addr }
}

#[tokio::test]
async fn remote_announce_is_delivered_locally_and_forwarded_with_ttl_minus_one() {
    let harness = spawn_node(4).await;

    let mut subscriber = TcpStream::connect(harness.api_addr).await.unwrap();
    write_frame(&mut subscriber, &Notify { data_type: 1001 }.to_frame()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let mut peer = TcpStream::connect(harness.p2p_addr).await.unwrap();
    let inner = Announce { ttl: 2, data_type: 1001, payload: b"x".to_vec() }.to_frame();
    let envelope = SendContent { inner }.to_frame();
    write_frame(&mut peer, &envelope).await.unwrap();

    let notification_frame =
        tokio::time::timeout(Duration::from_secs(2), read_frame(&mut subscriber)).await.unwrap().unwrap();
    assert_eq!(notification_frame.msg_type, MessageType::Notification);
    let Message::Notification(n) = Message::parse(&notification_frame).unwrap() else { unreachable!() };
    assert_eq!(n.payload, b"x");

    let forwarded = tokio::time::timeout(Duration::from_secs(2), read_frame(&mut peer)).await.unwrap().unwrap();
    assert_eq!(forwarded.msg_type, MessageType::P2pSendContent);
    let Message::P2pSendContent(env) = Message::parse(&forwarded).unwrap() else { unreachable!() };
    assert_eq!(env.inner.msg_type, MessageType::Announce);
    let forwarded_announce = Announce::parse(&env.inner.body).unwrap();
    assert_eq!(forwarded_announce.ttl, 1);
    assert_eq!(forwarded_announce.payload, b"x");

    // Exactly one forward: a second, un-decremented rebroadcast would
    // defeat TTL-based loop prevention.
    let second =
        tokio::time::timeout(Duration::from_millis(200), read_frame(&mut peer)).await;
    assert!(second.is_err(), "remote announce was forwarded more than once");
}

#[tokio::test]
async fn ttl_zero_means_unlimited_and_is_not_decremented() {
    let harness = spawn_node(4).await;

    let mut peer = TcpStream::connect(harness.p2p_addr).await.unwrap();
    let inner = Announce { ttl: 0, data_type: 1001, payload: b"y".to_vec() }.to_frame();
    let envelope = SendContent { inner }.to_frame();
    write_frame(&mut peer, &envelope).await.unwrap();

    let forwarded = tokio::time::timeout(Duration::from_secs(2), read_frame(&mut peer)).await.unwrap().unwrap();
    let Message::P2pSendContent(env) = Message::parse(&forwarded).unwrap() else { unreachable!() };
    let forwarded_announce = Announce::parse(&env.inner.body).unwrap();
    assert_eq!(forwarded_announce.ttl, 0);

    let second =
        tokio::time::timeout(Duration::from_millis(200), read_frame(&mut peer)).await;
    assert!(second.is_err(), "remote announce was forwarded more than once");
}
