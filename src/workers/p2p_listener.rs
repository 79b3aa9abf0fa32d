// Copyright 2024 Gossip Overlay Contributors
// SPDX-License-Identifier: Apache-2.0

//! P2P listener + per-connection worker (C6).
//!
//! [`spawn_connection`] is shared with the outbound handler (C9): both an
//! accepted and a freshly dialed socket become the same kind of worker —
//! one reader task enqueueing onto `incoming`, one writer task draining a
//! `Frame` mailbox — so the P2P connection table never hands out a raw
//! socket to more than one task.

use std::sync::Arc;

use log::{debug, info, warn};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use crate::error::FrameError;
use crate::queues::{IncomingItem, IncomingSender};
use crate::store::connections::FrameSender;
use crate::store::P2pConnectionTable;
use crate::wire::{read_frame, PeerAddr};

/// Accepts peer connections on an already-bound `listener` in a loop.
pub async fn run(
    listener: TcpListener,
    p2p_table: Arc<P2pConnectionTable>,
    incoming_tx: IncomingSender,
    mut shutdown: crate::shutdown::ShutdownRx,
) -> Result<(), FrameError> {
    info!("P2P listener running on {}", listener.local_addr()?);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("P2P listener shutting down");
                return Ok(());
            }
            accepted = listener.accept() => {
                let (socket, peer) = match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        warn!("P2P accept failed: {e}");
                        continue;
                    }
                };
                let caddr = peer.to_string();
                spawn_connection(socket, caddr, p2p_table.clone(), incoming_tx.clone());
            }
        }
    }
}

/// Register `socket` (accepted or dialed) under `caddr` in the P2P
/// connection table, with its service-address initially equal to the
/// connection-address, and spawn its reader/writer task pair. Returns the
/// mailbox so a fresh dial can send its first PUSH/PULL immediately.
pub fn spawn_connection(
    socket: TcpStream,
    caddr: String,
    p2p_table: Arc<P2pConnectionTable>,
    incoming_tx: IncomingSender,
) -> FrameSender {
    let initial_server_address: PeerAddr = caddr
        .parse()
        .unwrap_or_else(|_| PeerAddr::new(std::net::Ipv4Addr::UNSPECIFIED, 0));

    let (mut read_half, mut write_half) = socket.into_split();
    let (tx, mut rx) = mpsc::unbounded_channel();
    p2p_table.insert(caddr.clone(), tx.clone(), initial_server_address);

    let writer_caddr = caddr.clone();
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if let Err(e) = crate::wire::write_frame(&mut write_half, &frame).await {
                debug!("write to P2P peer {writer_caddr} failed: {e}");
                break;
            }
        }
        let _ = write_half.shutdown().await;
    });

    let reader_caddr = caddr.clone();
    let reader_table = p2p_table.clone();
    let reader_incoming = incoming_tx.clone();
    tokio::spawn(async move {
        loop {
            match read_frame(&mut read_half).await {
                Ok(frame) => {
                    let _ = reader_incoming
                        .send(IncomingItem::Frame { sender: reader_caddr.clone(), frame });
                }
                Err(e) => {
                    debug!("P2P connection {reader_caddr} closed: {e}");
                    break;
                }
            }
        }
        reader_table.remove(&reader_caddr);
        let _ = reader_incoming.send(IncomingItem::ConnectionClosed { sender: reader_caddr });
    });

    tx
}
