// Copyright 2024 Gossip Overlay Contributors
// SPDX-License-Identifier: Apache-2.0

//! P2P outbound handler (C9): the single consumer of `p2p_send`, and the
//! only place new outbound peer sockets are created.

use std::sync::Arc;

use log::{debug, warn};
use tokio::net::TcpStream;

use crate::queues::{IncomingSender, P2pSendItem, P2pSendReceiver};
use crate::store::P2pConnectionTable;
use crate::wire::{MessageType, SendContent};

pub async fn run(
    mut p2p_send_rx: P2pSendReceiver,
    p2p_table: Arc<P2pConnectionTable>,
    incoming_tx: IncomingSender,
    degree: usize,
) {
    while let Some(item) = p2p_send_rx.recv().await {
        match item {
            P2pSendItem::Send { to, frame } => {
                send_or_dial(&p2p_table, &incoming_tx, degree, to, frame).await;
            }
            P2pSendItem::SendAll { announce_body } => {
                broadcast(&p2p_table, announce_body);
            }
        }
    }
    debug!("P2P outbound handler exiting: queue closed");
}

async fn send_or_dial(
    p2p_table: &Arc<P2pConnectionTable>,
    incoming_tx: &IncomingSender,
    degree: usize,
    to: crate::wire::PeerAddr,
    frame: crate::wire::Frame,
) {
    if let Some(sender) = p2p_table.find_sender(&to) {
        let _ = sender.send(frame);
        return;
    }

    if p2p_table.len() >= degree {
        debug!("dropping send to {to}: connection degree {degree} already reached");
        return;
    }

    let addr = std::net::SocketAddr::from((to.ip, to.port));
    match TcpStream::connect(addr).await {
        Ok(stream) => {
            let sender = crate::workers::p2p_listener::spawn_connection(
                stream,
                to.to_string(),
                p2p_table.clone(),
                incoming_tx.clone(),
            );
            let _ = sender.send(frame);
        }
        Err(e) => {
            warn!("failed to dial {to}: {e}");
        }
    }
}

fn broadcast(p2p_table: &P2pConnectionTable, announce_body: Vec<u8>) {
    let inner = crate::wire::Frame::new(MessageType::Announce, announce_body);
    let envelope = SendContent { inner }.to_frame();
    for (_caddr, entry) in p2p_table.snapshot() {
        // A closed connection's mailbox send fails silently; its reader
        // task will enqueue the matching ConnectionClosed shortly.
        let _ = entry.sender.send(envelope.clone());
    }
}
