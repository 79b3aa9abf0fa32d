// Copyright 2024 Gossip Overlay Contributors
// SPDX-License-Identifier: Apache-2.0

//! Node orchestration: binds both listeners, wires the three queues and
//! the shared stores to the six workers (C5-C10), and drives graceful
//! shutdown.

use std::sync::Arc;

use log::info;
use tokio::net::TcpListener;

use crate::config::GossipConfig;
use crate::error::GossipError;
use crate::queues::{
    new_queues, AnnounceReceiver, AnnounceSender, IncomingReceiver, IncomingSender, P2pSendReceiver,
    P2pSendSender,
};
use crate::shutdown::{Runnable, ShutdownBus, ShutdownRx, Spawner};
use crate::store::{ApiConnectionTable, MessageCache, P2pConnectionTable, PeerSet};
use crate::workers;

/// The node's fixed worker count: API listener, P2P listener, announce,
/// P2P inbound, P2P outbound. (Bootstrap is a one-shot startup step, not a
/// long-running worker, and does not hold a shutdown slot.)
const WORKER_COUNT: usize = 5;

pub struct Node {
    config: GossipConfig,
    cache: Arc<MessageCache>,
    peer_set: Arc<PeerSet>,
    api_table: Arc<ApiConnectionTable>,
    p2p_table: Arc<P2pConnectionTable>,
}

impl Node {
    pub fn new(config: GossipConfig) -> Self {
        Self {
            config,
            cache: Arc::new(MessageCache::new()),
            peer_set: Arc::new(PeerSet::new()),
            api_table: Arc::new(ApiConnectionTable::new()),
            p2p_table: Arc::new(P2pConnectionTable::new()),
        }
    }

    /// Binds both listeners, starts every worker, sends the bootstrap
    /// PULL, then waits for ctrl-c before signalling graceful shutdown.
    pub async fn run(self) -> Result<(), GossipError> {
        let api_listener = TcpListener::bind(self.config.api_address).await?;
        let p2p_listener = TcpListener::bind(self.config.p2p_address).await?;
        info!("API plane listening on {}", self.config.api_address);
        info!("P2P plane listening on {}", self.config.p2p_address);

        let (queues, receivers) = new_queues();
        let (bus, mut registry) = ShutdownBus::<WORKER_COUNT>::new();

        let api = Spawner::spawn(
            ApiWorker {
                listener: api_listener,
                cache: self.cache.clone(),
                queues: queues.clone(),
                api_table: self.api_table.clone(),
            },
            registry.register(),
        );

        let p2p_listener_worker = Spawner::spawn(
            P2pListenerWorker {
                listener: p2p_listener,
                p2p_table: self.p2p_table.clone(),
                incoming: queues.incoming.clone(),
            },
            registry.register(),
        );

        let announce = Spawner::spawn(
            AnnounceWorker {
                announce_rx: receivers.announce,
                cache: self.cache.clone(),
                api_table: self.api_table.clone(),
                p2p_send: queues.p2p_send.clone(),
            },
            registry.register(),
        );

        let inbound = Spawner::spawn(
            InboundWorker {
                incoming_rx: receivers.incoming,
                p2p_table: self.p2p_table.clone(),
                peer_set: self.peer_set.clone(),
                degree: self.config.degree,
                announce_tx: queues.announce.clone(),
                p2p_send: queues.p2p_send.clone(),
            },
            registry.register(),
        );

        let outbound = Spawner::spawn(
            OutboundWorker {
                p2p_send_rx: receivers.p2p_send,
                p2p_table: self.p2p_table.clone(),
                incoming: queues.incoming.clone(),
                degree: self.config.degree,
            },
            registry.register(),
        );

        // Bootstrap is invoked once the P2P listener above has confirmed
        // its bind succeeded, so this node can itself accept inbound
        // connections before it first reaches out.
        let own_service_address = self.config.p2p_service_address()?;
        tokio::spawn(workers::bootstrap::run(
            self.config.bootstrapper.clone(),
            own_service_address,
            queues.p2p_send.clone(),
        ));

        tokio::signal::ctrl_c().await.ok();
        info!("shutdown requested");
        bus.shutdown_all();

        let _ = tokio::join!(api, p2p_listener_worker, announce, inbound, outbound);
        Ok(())
    }
}

struct ApiWorker {
    listener: TcpListener,
    cache: Arc<MessageCache>,
    queues: crate::queues::QueueHandles,
    api_table: Arc<ApiConnectionTable>,
}

#[async_trait::async_trait]
impl Runnable for ApiWorker {
    const NAME: &'static str = "api-listener";

    async fn run(self, shutdown: ShutdownRx) {
        if let Err(e) = workers::api::run(self.listener, self.cache, self.queues, self.api_table, shutdown).await {
            log::warn!("API listener exited: {e}");
        }
    }
}

struct P2pListenerWorker {
    listener: TcpListener,
    p2p_table: Arc<P2pConnectionTable>,
    incoming: IncomingSender,
}

#[async_trait::async_trait]
impl Runnable for P2pListenerWorker {
    const NAME: &'static str = "p2p-listener";

    async fn run(self, shutdown: ShutdownRx) {
        if let Err(e) = workers::p2p_listener::run(self.listener, self.p2p_table, self.incoming, shutdown).await {
            log::warn!("P2P listener exited: {e}");
        }
    }
}

struct AnnounceWorker {
    announce_rx: AnnounceReceiver,
    cache: Arc<MessageCache>,
    api_table: Arc<ApiConnectionTable>,
    p2p_send: P2pSendSender,
}

#[async_trait::async_trait]
impl Runnable for AnnounceWorker {
    const NAME: &'static str = "announce-worker";

    async fn run(self, mut shutdown: ShutdownRx) {
        tokio::select! {
            _ = workers::announce::run(self.announce_rx, self.cache, self.api_table, self.p2p_send) => {}
            _ = &mut shutdown => {}
        }
    }
}

struct InboundWorker {
    incoming_rx: IncomingReceiver,
    p2p_table: Arc<P2pConnectionTable>,
    peer_set: Arc<PeerSet>,
    degree: usize,
    announce_tx: AnnounceSender,
    p2p_send: P2pSendSender,
}

#[async_trait::async_trait]
impl Runnable for InboundWorker {
    const NAME: &'static str = "p2p-inbound-handler";

    async fn run(self, mut shutdown: ShutdownRx) {
        tokio::select! {
            _ = workers::p2p_inbound::run(
                self.incoming_rx,
                self.p2p_table,
                self.peer_set,
                self.degree,
                self.announce_tx,
                self.p2p_send,
            ) => {}
            _ = &mut shutdown => {}
        }
    }
}

struct OutboundWorker {
    p2p_send_rx: P2pSendReceiver,
    p2p_table: Arc<P2pConnectionTable>,
    incoming: IncomingSender,
    degree: usize,
}

#[async_trait::async_trait]
impl Runnable for OutboundWorker {
    const NAME: &'static str = "p2p-outbound-handler";

    async fn run(self, mut shutdown: ShutdownRx) {
        tokio::select! {
            _ = workers::p2p_outbound::run(self.p2p_send_rx, self.p2p_table, self.incoming, self.degree) => {}
            _ = &mut shutdown => {}
        }
    }
}
