// Copyright 2024 Gossip Overlay Contributors
// SPDX-License-Identifier: Apache-2.0

//! P2P inbound handler (C8): the single consumer of `incoming`.
//!
//! Drives the membership sub-protocol (PUSH/PULL/PULL_RESPONSE) and hands
//! remote announcements into the local delivery + forwarding path. This is
//! the only place the peer set grows and the only place fresh-peer
//! augmentation is decided; actual dialing is left entirely to the
//! outbound handler (C9), which this worker talks to only by enqueueing
//! `p2p_send` intents.

use std::sync::Arc;

use log::{debug, warn};
use rand::Rng;

use crate::queues::{AnnounceItem, AnnounceSender, IncomingItem, IncomingReceiver, P2pSendItem, P2pSendSender};
use crate::store::{P2pConnectionTable, PeerSet};
use crate::wire::{Advertise, Message, MessageType, PullResponse};

pub async fn run(
    mut incoming_rx: IncomingReceiver,
    p2p_table: Arc<P2pConnectionTable>,
    peer_set: Arc<PeerSet>,
    degree: usize,
    announce_tx: AnnounceSender,
    p2p_send: P2pSendSender,
) {
    while let Some(item) = incoming_rx.recv().await {
        if let Err(e) = handle_item(item, &p2p_table, &peer_set, degree, &announce_tx, &p2p_send) {
            warn!("dropping malformed incoming item: {e}");
        }
    }
    debug!("P2P inbound handler exiting: queue closed");
}

fn handle_item(
    item: IncomingItem,
    p2p_table: &P2pConnectionTable,
    peer_set: &PeerSet,
    degree: usize,
    announce_tx: &AnnounceSender,
    p2p_send: &P2pSendSender,
) -> Result<(), crate::error::FrameError> {
    match item {
        IncomingItem::ConnectionClosed { sender } => {
            augment_connections(p2p_table, peer_set, degree, p2p_send);
            debug!("P2P connection {sender} closed; attempted replacement dialing");
            Ok(())
        }
        IncomingItem::Frame { sender, frame } => match frame.msg_type {
            MessageType::P2pPush => {
                let Message::P2pPush(Advertise { addr }) = Message::parse(&frame)? else { unreachable!() };
                p2p_table.set_server_address(&sender, addr);
                peer_set.insert(addr);
                Ok(())
            }
            MessageType::P2pPull => {
                let Message::P2pPull(Advertise { addr }) = Message::parse(&frame)? else { unreachable!() };
                p2p_table.set_server_address(&sender, addr);
                let response = PullResponse { peers: peer_set.snapshot() };
                let to: crate::wire::PeerAddr = sender
                    .parse()
                    .map_err(|_| crate::error::FrameError::MalformedBody("sender is not a valid peer address"))?;
                let _ = p2p_send.send(P2pSendItem::Send { to, frame: response.to_frame() });
                Ok(())
            }
            MessageType::P2pPullResponse => {
                let Message::P2pPullResponse(PullResponse { peers }) = Message::parse(&frame)? else {
                    unreachable!()
                };
                peer_set.merge(peers);
                augment_connections(p2p_table, peer_set, degree, p2p_send);
                Ok(())
            }
            MessageType::P2pSendContent => {
                let Message::P2pSendContent(envelope) = Message::parse(&frame)? else { unreachable!() };
                if envelope.inner.msg_type == MessageType::Announce {
                    let announce = crate::wire::Announce::parse(&envelope.inner.body)?;
                    // ttl=0 stays 0 (unlimited hops), so fanout is bounded by
                    // peer-set topology rather than TTL in that case.
                    let reduced = announce.reduce_ttl().to_frame();
                    // Hand the already-TTL-reduced body to the announce
                    // worker, which always broadcasts once per accepted
                    // item (see workers::announce) — enqueueing the raw,
                    // un-decremented body here would defeat TTL-based loop
                    // prevention by re-forwarding at the original hop count.
                    let _ = announce_tx.send(AnnounceItem { body: reduced.body, resend: false });
                }
                Ok(())
            }
            other => Err(crate::error::FrameError::InvalidMessageType(other as u16)),
        },
    }
}

/// Attempt to grow the P2P connection count up to `degree` by picking
/// fresh peer-set entries (not already a connection key or advertised
/// server address) and asking the outbound handler to PUSH or PULL to each,
/// chosen with equal probability.
fn augment_connections(
    p2p_table: &P2pConnectionTable,
    peer_set: &PeerSet,
    degree: usize,
    p2p_send: &P2pSendSender,
) {
    let mut current = p2p_table.len();
    if current >= degree {
        return;
    }
    let mut rng = rand::thread_rng();
    for candidate in peer_set.snapshot() {
        if current >= degree {
            break;
        }
        if p2p_table.has_server_address_or_key(&candidate) {
            continue;
        }
        let advertise = Advertise { addr: candidate };
        let msg_type = if rng.gen_bool(0.5) { MessageType::P2pPush } else { MessageType::P2pPull };
        let _ = p2p_send.send(P2pSendItem::Send { to: candidate, frame: advertise.to_frame(msg_type) });
        current += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queues::new_queues;
    use crate::wire::PeerAddr;
    use std::net::Ipv4Addr;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn push_updates_server_address_and_peer_set() {
        let (queues, mut receivers) = new_queues();
        let p2p_table = Arc::new(P2pConnectionTable::new());
        let peer_set = Arc::new(PeerSet::new());

        let (tx, _rx) = mpsc::unbounded_channel();
        let caddr = "10.0.0.5:4000".to_string();
        p2p_table.insert(caddr.clone(), tx, PeerAddr::new(Ipv4Addr::new(10, 0, 0, 5), 4000));

        let advertised = PeerAddr::new(Ipv4Addr::new(10, 0, 0, 5), 9000);
        let push = Advertise { addr: advertised }.to_frame(MessageType::P2pPush);
        queues.incoming.send(IncomingItem::Frame { sender: caddr.clone(), frame: push }).unwrap();
        drop(queues.incoming);

        run(receivers.incoming, p2p_table.clone(), peer_set.clone(), 4, queues.announce, queues.p2p_send).await;

        assert!(peer_set.contains(&advertised));
        assert_eq!(p2p_table.get(&caddr).unwrap().p2p_server_address, advertised);
        assert!(receivers.p2p_send.try_recv().is_err());
    }
}
