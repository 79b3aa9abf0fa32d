// Copyright 2024 Gossip Overlay Contributors
// SPDX-License-Identifier: Apache-2.0

//! The framed-message codec (C1): wire-level framing plus per-kind bodies.

pub mod frame;
pub mod message;

pub use frame::{read_frame, write_frame, Frame, MessageType, MAX_TYPE, MIN_TYPE};
pub use message::{
    Advertise, Announce, Message, Notification, Notify, PeerAddr, PullResponse, SendContent,
    Validation,
};
