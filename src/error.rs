// Copyright 2024 Gossip Overlay Contributors
// SPDX-License-Identifier: Apache-2.0

//! Crate-wide error types.

use std::net::AddrParseError;
use thiserror::Error;

/// Error produced while reading or writing a single framed message.
///
/// These are always local to one connection: the caller's job is to log the
/// error, drop the connection, and remove it from the connection table. They
/// must never be allowed to tear down a listener or another connection.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("client disconnected")]
    ClientDisconnected,

    #[error("invalid frame header")]
    InvalidHeader,

    #[error("invalid frame size")]
    InvalidSize,

    #[error("invalid message type {0}")]
    InvalidMessageType(u16),

    #[error("malformed message body: {0}")]
    MalformedBody(&'static str),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level error type for configuration, setup, and dial failures.
#[derive(Debug, Error)]
pub enum GossipError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid address: {0}")]
    Addr(#[from] AddrParseError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to dial {addr}: {source}")]
    Dial {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("wire protocol error: {0}")]
    Frame(#[from] FrameError),
}
