// Copyright 2024 Gossip Overlay Contributors
// SPDX-License-Identifier: Apache-2.0

//! Shared mutable stores (C2-C4): message cache, peer set, connection
//! tables. Each lives behind its own mutex, held only across
//! pointer-shuffling — never across socket I/O.

pub mod cache;
pub mod connections;
pub mod peers;

pub use cache::{CacheEntry, MessageCache};
pub use connections::{ApiConnectionTable, P2pConnectionTable, P2pEntry};
pub use peers::PeerSet;
