// Copyright 2024 Gossip Overlay Contributors
// SPDX-License-Identifier: Apache-2.0

//! Announce worker (C7): the single consumer of the `announce` queue.
//!
//! Storage is kept serial and simple; notification sends and the peer
//! broadcast run without holding the cache lock, per §4.5's rationale.

use std::sync::Arc;

use log::{debug, warn};

use crate::queues::{AnnounceItem, AnnounceReceiver, P2pSendItem, P2pSendSender};
use crate::store::{ApiConnectionTable, MessageCache};
use crate::wire::{Announce, Notification};

pub async fn run(
    mut announce_rx: AnnounceReceiver,
    cache: Arc<MessageCache>,
    api_table: Arc<ApiConnectionTable>,
    p2p_send: P2pSendSender,
) {
    while let Some(item) = announce_rx.recv().await {
        if let Err(e) = handle_item(item, &cache, &api_table, &p2p_send) {
            warn!("dropping malformed announce item: {e}");
        }
    }
    debug!("announce worker exiting: queue closed");
}

fn handle_item(
    item: AnnounceItem,
    cache: &MessageCache,
    api_table: &ApiConnectionTable,
    p2p_send: &P2pSendSender,
) -> Result<(), crate::error::FrameError> {
    let announce = Announce::parse(&item.body)?;
    let msg_id = cache.add_data(announce.data_type, announce.payload.clone(), announce.ttl);

    for sub in cache.get_subscribers(announce.data_type) {
        if let Some(sender) = api_table.get(&sub) {
            let notification = Notification {
                msg_id,
                data_type: announce.data_type,
                payload: announce.payload.clone(),
            };
            // One send per subscriber, concurrently, without the cache
            // lock held — a full mailbox or a since-closed connection is
            // not this worker's problem.
            let _ = sender.send(notification.to_frame());
        }
        // Socket no longer exists: drop silently, matching §4.5.
    }

    // The announce worker always broadcasts once per accepted item — loop
    // prevention relies on TTL, which the inbound handler has already
    // applied before enqueueing P2P-origin items (see workers::p2p_inbound).
    let _ = p2p_send.send(P2pSendItem::SendAll { announce_body: item.body });

    Ok(())
}
