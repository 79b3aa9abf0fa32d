// Copyright 2024 Gossip Overlay Contributors
// SPDX-License-Identifier: Apache-2.0

//! Length-prefixed big-endian frame I/O.
//!
//! Every wire frame is `size(u16 BE) | type(u16 BE) | body[size-4]`, where
//! `size` counts the whole frame including its own header.

use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::error::FrameError;

/// Inclusive range of valid wire message type codes.
pub const MIN_TYPE: u16 = MessageType::Announce as u16;
pub const MAX_TYPE: u16 = MessageType::P2pSendContent as u16;

/// Wire-level message kind, as carried in the frame header.
///
/// Assigning this an exhaustive, closed set of discriminants is what lets
/// every dispatch site match on it instead of chaining integer comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum MessageType {
    Announce = 1,
    Notify = 2,
    Notification = 3,
    Validation = 4,
    P2pPush = 5,
    P2pPull = 6,
    P2pPullResponse = 7,
    P2pSendContent = 8,
}

impl MessageType {
    pub fn from_u16(raw: u16) -> Result<Self, FrameError> {
        match raw {
            1 => Ok(Self::Announce),
            2 => Ok(Self::Notify),
            3 => Ok(Self::Notification),
            4 => Ok(Self::Validation),
            5 => Ok(Self::P2pPush),
            6 => Ok(Self::P2pPull),
            7 => Ok(Self::P2pPullResponse),
            8 => Ok(Self::P2pSendContent),
            other => Err(FrameError::InvalidMessageType(other)),
        }
    }
}

/// A frame as read off the wire: its type and raw body bytes.
///
/// The codec deliberately stops here — semantic parsing of `body` is the
/// job of the per-kind readers in `wire::message`.
#[derive(Debug, Clone)]
pub struct Frame {
    pub msg_type: MessageType,
    pub body: Vec<u8>,
}

impl Frame {
    pub fn new(msg_type: MessageType, body: Vec<u8>) -> Self {
        Self { msg_type, body }
    }

    /// Total on-wire size of this frame, header included.
    pub fn wire_size(&self) -> usize {
        4 + self.body.len()
    }

    /// Serialize to the exact bytes a conformant peer would send.
    pub fn to_bytes(&self) -> Vec<u8> {
        let size = self.wire_size() as u16;
        let mut out = Vec::with_capacity(self.wire_size());
        out.extend_from_slice(&size.to_be_bytes());
        out.extend_from_slice(&(self.msg_type as u16).to_be_bytes());
        out.extend_from_slice(&self.body);
        out
    }
}

/// Read exactly one frame from `conn`.
///
/// `len == 0` header bytes read means the peer disconnected cleanly
/// (`ClientDisconnected`); fewer than 4 header bytes is `InvalidHeader`;
/// `size < 4` is `InvalidSize`; a type outside `[MIN_TYPE, MAX_TYPE]` is
/// `InvalidMessageType`. Bodies are read in full or not at all — a short
/// body read surfaces as the underlying I/O error.
pub async fn read_frame<R>(conn: &mut R) -> Result<Frame, FrameError>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut header = [0u8; 4];
    let n = read_partial(conn, &mut header).await?;
    if n == 0 {
        return Err(FrameError::ClientDisconnected);
    }
    if n < 4 {
        return Err(FrameError::InvalidHeader);
    }

    let size = u16::from_be_bytes([header[0], header[1]]);
    let raw_type = u16::from_be_bytes([header[2], header[3]]);

    if size < 4 {
        return Err(FrameError::InvalidSize);
    }
    let msg_type = MessageType::from_u16(raw_type)?;

    let body_len = (size - 4) as usize;
    let mut body = vec![0u8; body_len];
    if body_len > 0 {
        conn.read_exact(&mut body).await?;
    }

    Ok(Frame::new(msg_type, body))
}

/// Write one frame in full.
pub async fn write_frame<W>(conn: &mut W, frame: &Frame) -> Result<(), FrameError>
where
    W: tokio::io::AsyncWrite + Unpin,
{
    conn.write_all(&frame.to_bytes()).await?;
    conn.flush().await?;
    Ok(())
}

/// Read up to `buf.len()` bytes, stopping early (without erroring) on EOF.
///
/// Used only for the 4-byte header, where a zero-length read distinguishes
/// a clean disconnect from a truncated header.
async fn read_partial<R>(conn: &mut R, buf: &mut [u8]) -> Result<usize, FrameError>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut total = 0;
    while total < buf.len() {
        let n = conn.read(&mut buf[total..]).await?;
        if n == 0 {
            break;
        }
        total += n;
    }
    Ok(total)
}
