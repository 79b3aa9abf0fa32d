// Copyright 2024 Gossip Overlay Contributors
// SPDX-License-Identifier: Apache-2.0

//! Bootstrap driver (C10): sends one `P2P_PULL` to the configured
//! bootstrapper on startup. The reply drives peer-set growth through the
//! standard inbound path (C8) like any other `PULL_RESPONSE`.

use log::{info, warn};

use crate::config::HostPort;
use crate::queues::{P2pSendItem, P2pSendSender};
use crate::wire::{Advertise, MessageType, PeerAddr};

pub async fn run(bootstrapper: HostPort, own_service_address: PeerAddr, p2p_send: P2pSendSender) {
    let resolved = match bootstrapper.resolve().await {
        Ok(addr) => addr,
        Err(e) => {
            warn!("bootstrapper {}:{} unreachable ({e}); starting isolated", bootstrapper.host, bootstrapper.port);
            return;
        }
    };

    let to = match resolved.ip() {
        std::net::IpAddr::V4(ip) => PeerAddr::new(ip, resolved.port()),
        std::net::IpAddr::V6(_) => {
            warn!("bootstrapper resolved to an IPv6 address, which the P2P wire format cannot represent; starting isolated");
            return;
        }
    };

    let pull = Advertise { addr: own_service_address }.to_frame(MessageType::P2pPull);
    info!("bootstrapping against {to}");
    let _ = p2p_send.send(P2pSendItem::Send { to, frame: pull });
}
