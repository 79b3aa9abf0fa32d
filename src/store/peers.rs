// Copyright 2024 Gossip Overlay Contributors
// SPDX-License-Identifier: Apache-2.0

//! Peer set (C3): the set of advertised P2P service-addresses this node
//! knows about, insertion-order preserved for broadcast determinism.

use std::sync::Mutex;

use crate::wire::PeerAddr;

#[derive(Default)]
pub struct PeerSet {
    inner: Mutex<Vec<PeerAddr>>,
}

impl PeerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `addr` if not already present. Returns whether it was new.
    pub fn insert(&self, addr: PeerAddr) -> bool {
        let mut inner = self.inner.lock().expect("peer set mutex poisoned");
        if inner.contains(&addr) {
            false
        } else {
            inner.push(addr);
            true
        }
    }

    /// Merge a peer list, preserving the order new entries were seen in.
    pub fn merge(&self, addrs: impl IntoIterator<Item = PeerAddr>) {
        for addr in addrs {
            self.insert(addr);
        }
    }

    /// Snapshot copy, safe to iterate without holding the lock.
    pub fn snapshot(&self) -> Vec<PeerAddr> {
        self.inner.lock().expect("peer set mutex poisoned").clone()
    }

    pub fn contains(&self, addr: &PeerAddr) -> bool {
        self.inner.lock().expect("peer set mutex poisoned").contains(addr)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("peer set mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
