// Copyright 2024 Gossip Overlay Contributors
// SPDX-License-Identifier: Apache-2.0

//! Scenario 3 from spec.md §8: bootstrapping against a configured peer,
//! absorbing its `PULL_RESPONSE`, and growing the P2P connection table up
//! to the configured degree.

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use gossipd::config::HostPort;
use gossipd::queues::new_queues;
use gossipd::store::{P2pConnectionTable, PeerSet};
use gossipd::wire::{read_frame, write_frame, MessageType, PeerAddr, PullResponse};
use tokio::net::TcpListener;

#[tokio::test]
async fn bootstrap_pull_response_grows_peer_set_and_connections_within_degree() {
    let degree = 4;

    // Stand in for the bootstrapper: a bare listener that expects one
    // P2P_PULL and answers with a fixed two-peer PULL_RESPONSE.
    let bootstrapper_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let bootstrapper_addr = bootstrapper_listener.local_addr().unwrap();

    let p1_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let p2_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let p1_addr = match p1_listener.local_addr().unwrap().ip() {
        std::net::IpAddr::V4(ip) => PeerAddr::new(ip, p1_listener.local_addr().unwrap().port()),
        _ => unreachable!(),
    };
    let p2_addr = match p2_listener.local_addr().unwrap().ip() {
        std::net::IpAddr::V4(ip) => PeerAddr::new(ip, p2_listener.local_addr().unwrap().port()),
        _ => unreachable!(),
    };

    tokio::spawn(async move {
        let (mut sock, _) = bootstrapper_listener.accept().await.unwrap();
        let frame = read_frame(&mut sock).await.unwrap();
        assert_eq!(frame.msg_type, MessageType::P2pPull);
        let response = PullResponse { peers: vec![p1_addr, p2_addr] };
        write_frame(&mut sock, &response.to_frame()).await.unwrap();
    });

    // P1 and P2 each just need to accept one connection and observe what
    // kind of frame they're greeted with (PUSH or PULL — either is valid
    // fresh-peer augmentation per §4.8).
    let p1_handle = tokio::spawn(async move {
        let (mut sock, _) = p1_listener.accept().await.unwrap();
        read_frame(&mut sock).await.unwrap().msg_type
    });
    let p2_handle = tokio::spawn(async move {
        let (mut sock, _) = p2_listener.accept().await.unwrap();
        read_frame(&mut sock).await.unwrap().msg_type
    });

    let p2p_table = Arc::new(P2pConnectionTable::new());
    let peer_set = Arc::new(PeerSet::new());
    let (queues, receivers) = new_queues();

    let own_service_address = PeerAddr::new(Ipv4Addr::new(127, 0, 0, 1), 9999);
    let bootstrapper = HostPort { host: "127.0.0.1".to_string(), port: bootstrapper_addr.port() };

    tokio::spawn(gossipd::workers::bootstrap::run(bootstrapper, own_service_address, queues.p2p_send.clone()));
    tokio::spawn(gossipd::workers::p2p_outbound::run(
        receivers.p2p_send,
        p2p_table.clone(),
        queues.incoming.clone(),
        degree,
    ));
    tokio::spawn(gossipd::workers::p2p_inbound::run(
        receivers.incoming,
        p2p_table.clone(),
        peer_set.clone(),
        degree,
        queues.announce.clone(),
        queues.p2p_send.clone(),
    ));

    let (push_or_pull_1, push_or_pull_2) = tokio::time::timeout(
        Duration::from_secs(2),
        futures_join(p1_handle, p2_handle),
    )
    .await
    .expect("timed out waiting for fresh-peer augmentation");

    for kind in [push_or_pull_1, push_or_pull_2] {
        assert!(matches!(kind, MessageType::P2pPush | MessageType::P2pPull));
    }

    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(peer_set.contains(&p1_addr));
    assert!(peer_set.contains(&p2_addr));
    assert_eq!(peer_set.len(), 2);

    // One connection for the bootstrapper's own PULL reply plus one each
    // for P1 and P2 dialed during augmentation; never more than `degree`.
    assert!(p2p_table.len() <= degree.min(3));
}

async fn futures_join(
    a: tokio::task::JoinHandle<MessageType>,
    b: tokio::task::JoinHandle<MessageType>,
) -> (MessageType, MessageType) {
    let (a, b) = tokio::join!(a, b);
    (a.unwrap(), b.unwrap())
}
