// Copyright 2024 Gossip Overlay Contributors
// SPDX-License-Identifier: Apache-2.0

//! API listener + per-connection worker (C5).

use std::net::SocketAddr;
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use crate::error::FrameError;
use crate::queues::{AnnounceItem, QueueHandles};
use crate::store::MessageCache;
use crate::wire::{read_frame, Frame, Message, MessageType};

/// Accepts connections on an already-bound `listener` in a loop, handing
/// each socket to its own API client worker task. Teardown closes the
/// listening socket only — accepted-connection workers self-terminate on
/// socket close and are not owned by this loop.
pub async fn run(
    listener: TcpListener,
    cache: Arc<MessageCache>,
    queues: QueueHandles,
    api_table: Arc<crate::store::ApiConnectionTable>,
    mut shutdown: crate::shutdown::ShutdownRx,
) -> Result<(), FrameError> {
    info!("API listener running on {}", listener.local_addr()?);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("API listener shutting down");
                return Ok(());
            }
            accepted = listener.accept() => {
                let (socket, peer) = match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        warn!("API accept failed: {e}");
                        continue;
                    }
                };
                let cache = cache.clone();
                let queues = queues.clone();
                let api_table = api_table.clone();
                tokio::spawn(async move {
                    handle_connection(socket, peer, cache, queues, api_table).await;
                });
            }
        }
    }
}

async fn handle_connection(
    socket: TcpStream,
    peer: SocketAddr,
    cache: Arc<MessageCache>,
    queues: QueueHandles,
    api_table: Arc<crate::store::ApiConnectionTable>,
) {
    let oaddr = peer.to_string();
    debug!("API connection accepted from {oaddr}");

    let (mut read_half, mut write_half) = socket.into_split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Frame>();
    api_table.insert(oaddr.clone(), tx);

    let writer_oaddr = oaddr.clone();
    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if let Err(e) = crate::wire::write_frame(&mut write_half, &frame).await {
                debug!("write to API client {writer_oaddr} failed: {e}");
                break;
            }
        }
        let _ = write_half.shutdown().await;
    });

    loop {
        match read_frame(&mut read_half).await {
            Ok(frame) => {
                if let Err(e) = dispatch(&frame, &oaddr, &cache, &queues) {
                    debug!("API client {oaddr} sent an invalid message: {e}");
                    break;
                }
            }
            Err(e) => {
                debug!("API connection {oaddr} closed: {e}");
                break;
            }
        }
    }

    api_table.remove(&oaddr);
    cache.remove_subscriber(&oaddr);
    writer.abort();
}

fn dispatch(
    frame: &Frame,
    oaddr: &str,
    cache: &MessageCache,
    queues: &QueueHandles,
) -> Result<(), FrameError> {
    match frame.msg_type {
        MessageType::Announce => {
            // A locally-originated announce must be forwarded to peers,
            // unlike one arriving via P2P ingress.
            queues
                .announce
                .send(AnnounceItem { body: frame.body.clone(), resend: true })
                .ok();
            Ok(())
        }
        MessageType::Notify => {
            let notify = Message::parse(frame)?;
            if let Message::Notify(n) = notify {
                cache.add_subscriber(n.data_type, oaddr.to_string());
            }
            Ok(())
        }
        MessageType::Validation => {
            let validation = Message::parse(frame)?;
            if let Message::Validation(v) = validation {
                if !v.valid {
                    cache.make_invalid(v.msg_id);
                }
            }
            Ok(())
        }
        other => Err(FrameError::InvalidMessageType(other as u16)),
    }
}
