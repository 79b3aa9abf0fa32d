// Copyright 2024 Gossip Overlay Contributors
// SPDX-License-Identifier: Apache-2.0

//! A gossip overlay node: a local API plane for announce/notify/validate,
//! and a P2P plane for dissemination and peer-set exchange.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod node;
pub mod queues;
pub mod shutdown;
pub mod store;
pub mod wire;
pub mod workers;

pub use config::GossipConfig;
pub use error::GossipError;
pub use node::Node;
