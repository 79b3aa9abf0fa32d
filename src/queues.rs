// Copyright 2024 Gossip Overlay Contributors
// SPDX-License-Identifier: Apache-2.0

//! The three inter-worker queues: `announce`, `incoming`, `p2p_send`.
//!
//! Each is a single-consumer, multi-producer, unbounded FIFO — `spec.md`
//! calls these "bounded-optional, unbounded-semantics", which an
//! `mpsc::unbounded_channel` models directly: producers never block, and
//! the one consumer task owns ordering.

use tokio::sync::mpsc;

use crate::wire::{Frame, PeerAddr};

/// Item enqueued onto `announce`. `resend` distinguishes a
/// locally-originated announce (must be forwarded to peers) from one the
/// P2P inbound handler has already TTL-reduced for forwarding — see
/// `workers::announce` for the broadcast convention this fixes.
#[derive(Debug, Clone)]
pub struct AnnounceItem {
    pub body: Vec<u8>,
    pub resend: bool,
}

/// Item enqueued onto `incoming` by a P2P client worker, or synthesized by
/// one on connection close so the inbound handler can attempt replacement
/// dialing.
#[derive(Debug, Clone)]
pub enum IncomingItem {
    Frame { sender: String, frame: Frame },
    ConnectionClosed { sender: String },
}

/// Item enqueued onto `p2p_send`, consumed by the P2P outbound handler.
#[derive(Debug, Clone)]
pub enum P2pSendItem {
    /// Unicast `frame` to `to`, dialing it first if no connection exists
    /// (bounded by `degree`).
    Send { to: PeerAddr, frame: Frame },
    /// Broadcast an `ANNOUNCE` body, wrapped in a `P2P_SEND_CONTENT`
    /// envelope, to every live P2P connection. Never dials.
    SendAll { announce_body: Vec<u8> },
}

pub type AnnounceSender = mpsc::UnboundedSender<AnnounceItem>;
pub type AnnounceReceiver = mpsc::UnboundedReceiver<AnnounceItem>;
pub type IncomingSender = mpsc::UnboundedSender<IncomingItem>;
pub type IncomingReceiver = mpsc::UnboundedReceiver<IncomingItem>;
pub type P2pSendSender = mpsc::UnboundedSender<P2pSendItem>;
pub type P2pSendReceiver = mpsc::UnboundedReceiver<P2pSendItem>;

/// The three queues' producer handles, cheaply cloned and handed to every
/// worker that needs to enqueue intents.
#[derive(Clone)]
pub struct QueueHandles {
    pub announce: AnnounceSender,
    pub incoming: IncomingSender,
    pub p2p_send: P2pSendSender,
}

/// The matching consumer halves, each owned by exactly one worker.
pub struct QueueReceivers {
    pub announce: AnnounceReceiver,
    pub incoming: IncomingReceiver,
    pub p2p_send: P2pSendReceiver,
}

pub fn new_queues() -> (QueueHandles, QueueReceivers) {
    let (announce_tx, announce_rx) = mpsc::unbounded_channel();
    let (incoming_tx, incoming_rx) = mpsc::unbounded_channel();
    let (p2p_send_tx, p2p_send_rx) = mpsc::unbounded_channel();
    (
        QueueHandles { announce: announce_tx, incoming: incoming_tx, p2p_send: p2p_send_tx },
        QueueReceivers { announce: announce_rx, incoming: incoming_rx, p2p_send: p2p_send_rx },
    )
}
