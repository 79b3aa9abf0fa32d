// Copyright 2024 Gossip Overlay Contributors
// SPDX-License-Identifier: Apache-2.0

//! Connection tables (C4): one per plane, keyed by the socket's observed
//! remote endpoint ("connection-address").
//!
//! Per §9's discipline, no worker shares a raw socket handle: each
//! connection's write side is a `Frame` mailbox drained by a writer task
//! that owns the actual `TcpStream` half. The table only ever holds that
//! mailbox (plus, for the P2P plane, the peer's advertised service
//! address), never the socket itself.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::mpsc;

use crate::wire::{Frame, PeerAddr};

/// Outbound mailbox for one connection's writer task.
pub type FrameSender = mpsc::UnboundedSender<Frame>;

/// API-plane connection table: connection-address → write mailbox.
#[derive(Default)]
pub struct ApiConnectionTable {
    inner: Mutex<HashMap<String, FrameSender>>,
}

impl ApiConnectionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, caddr: String, sender: FrameSender) {
        self.inner.lock().expect("api connection table mutex poisoned").insert(caddr, sender);
    }

    pub fn remove(&self, caddr: &str) {
        self.inner.lock().expect("api connection table mutex poisoned").remove(caddr);
    }

    pub fn get(&self, caddr: &str) -> Option<FrameSender> {
        self.inner.lock().expect("api connection table mutex poisoned").get(caddr).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("api connection table mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A P2P connection's table entry: its write mailbox and the peer's
/// advertised service-address (initially equal to the connection-address,
/// rewritten on the first PUSH or PULL it sends).
#[derive(Clone)]
pub struct P2pEntry {
    pub sender: FrameSender,
    pub p2p_server_address: PeerAddr,
}

/// P2P-plane connection table.
#[derive(Default)]
pub struct P2pConnectionTable {
    inner: Mutex<HashMap<String, P2pEntry>>,
}

impl P2pConnectionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, caddr: String, sender: FrameSender, p2p_server_address: PeerAddr) {
        self.inner
            .lock()
            .expect("p2p connection table mutex poisoned")
            .insert(caddr, P2pEntry { sender, p2p_server_address });
    }

    pub fn remove(&self, caddr: &str) {
        self.inner.lock().expect("p2p connection table mutex poisoned").remove(caddr);
    }

    pub fn get(&self, caddr: &str) -> Option<P2pEntry> {
        self.inner.lock().expect("p2p connection table mutex poisoned").get(caddr).cloned()
    }

    /// Rewrite the advertised service-address for `caddr`, e.g. on receipt
    /// of its first PUSH/PULL. No-op if the connection has since closed.
    pub fn set_server_address(&self, caddr: &str, addr: PeerAddr) {
        if let Some(entry) = self.inner.lock().expect("p2p connection table mutex poisoned").get_mut(caddr) {
            entry.p2p_server_address = addr;
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("p2p connection table mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Find the mailbox for `addr`, matching either a connection-address
    /// key (the common case: replying on the connection a message arrived
    /// on) or an already-rewritten advertised service-address.
    pub fn find_sender(&self, addr: &PeerAddr) -> Option<FrameSender> {
        let inner = self.inner.lock().expect("p2p connection table mutex poisoned");
        let addr_str = addr.to_string();
        if let Some(entry) = inner.get(&addr_str) {
            return Some(entry.sender.clone());
        }
        inner.values().find(|e| e.p2p_server_address == *addr).map(|e| e.sender.clone())
    }

    /// Snapshot of every live entry, safe to iterate (and send over, one
    /// socket write at a time) without holding the table lock.
    pub fn snapshot(&self) -> Vec<(String, P2pEntry)> {
        self.inner
            .lock()
            .expect("p2p connection table mutex poisoned")
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Whether any live entry already advertises `addr` as its service
    /// address or is itself keyed by it — used to decide whether a
    /// candidate peer is "fresh" before dialing.
    pub fn has_server_address_or_key(&self, addr: &PeerAddr) -> bool {
        let inner = self.inner.lock().expect("p2p connection table mutex poisoned");
        let addr_str = addr.to_string();
        inner.contains_key(&addr_str) || inner.values().any(|e| e.p2p_server_address == *addr)
    }
}
