// Copyright 2024 Gossip Overlay Contributors
// SPDX-License-Identifier: Apache-2.0

//! The cooperating workers (C5-C10) that make up the node's concurrency
//! engine. See `node.rs` for how they're wired together.

pub mod announce;
pub mod api;
pub mod bootstrap;
pub mod p2p_inbound;
pub mod p2p_listener;
pub mod p2p_outbound;
