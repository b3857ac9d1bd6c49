//! Blocking process-group transport.
//!
//! A [`Communicator`] connects one node to every other node of a fixed-size
//! group. Messages between any ordered pair of nodes arrive in send order;
//! every receive blocks until the message arrives or the peer is gone.

/// In-process group backed by channels, one thread per node.
pub mod local;

pub use local::LocalGroup;

use crate::error::{IoError, Result};
use std::fmt;

/// Protocol position of a message. A receive that finds a different tag
/// than expected means the peers disagree on the step protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Handshake,
    Population,
    Partition,
    MoveCount,
    Moves,
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    F32(Vec<f32>),
    I32(Vec<i32>),
    Bytes(Vec<u8>),
}

impl Payload {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::F32(_) => "f32",
            Self::I32(_) => "i32",
            Self::Bytes(_) => "bytes",
        }
    }

    pub fn into_f32(self) -> Result<Vec<f32>> {
        match self {
            Self::F32(v) => Ok(v),
            other => Err(IoError::KindMismatch {
                expected: "f32",
                found: other.kind(),
            }),
        }
    }

    pub fn into_i32(self) -> Result<Vec<i32>> {
        match self {
            Self::I32(v) => Ok(v),
            other => Err(IoError::KindMismatch {
                expected: "i32",
                found: other.kind(),
            }),
        }
    }

    pub fn into_bytes(self) -> Result<Vec<u8>> {
        match self {
            Self::Bytes(v) => Ok(v),
            other => Err(IoError::KindMismatch {
                expected: "bytes",
                found: other.kind(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub tag: Tag,
    pub payload: Payload,
}

/// One node's endpoint in a fixed process group.
///
/// Implementors supply point-to-point `send`/`recv`; typed receives and the
/// root-to-all broadcasts are built on top of them.
pub trait Communicator: Send {
    fn rank(&self) -> usize;
    fn size(&self) -> usize;

    /// Queues `message` for `dest`. Does not wait for the receiver.
    fn send(&self, dest: usize, message: Message) -> Result<()>;

    /// Blocks for the next message from `source`.
    fn recv(&self, source: usize) -> Result<Message>;

    fn check_peer(&self, peer: usize) -> Result<()> {
        if peer >= self.size() || peer == self.rank() {
            return Err(IoError::InvalidRank {
                rank: peer,
                size: self.size(),
            });
        }
        Ok(())
    }

    /// Receives from `source` and checks the message sits at `tag`.
    fn recv_tagged(&self, source: usize, tag: Tag) -> Result<Payload> {
        let message = self.recv(source)?;
        if message.tag != tag {
            return Err(IoError::TagMismatch {
                peer: source,
                expected: tag.to_string(),
                found: message.tag.to_string(),
            });
        }
        Ok(message.payload)
    }

    /// Receives exactly `buf.len()` floats into `buf`.
    fn recv_f32_into(&self, source: usize, tag: Tag, buf: &mut [f32]) -> Result<()> {
        let data = self.recv_tagged(source, tag)?.into_f32()?;
        if data.len() != buf.len() {
            return Err(IoError::SizeMismatch {
                expected: buf.len(),
                found: data.len(),
            });
        }
        buf.copy_from_slice(&data);
        Ok(())
    }

    /// Receives exactly `buf.len()` integers into `buf`.
    fn recv_i32_into(&self, source: usize, tag: Tag, buf: &mut [i32]) -> Result<()> {
        let data = self.recv_tagged(source, tag)?.into_i32()?;
        if data.len() != buf.len() {
            return Err(IoError::SizeMismatch {
                expected: buf.len(),
                found: data.len(),
            });
        }
        buf.copy_from_slice(&data);
        Ok(())
    }

    /// Root sends `payload` to every other rank; everyone else receives it.
    /// Returns the payload on all ranks.
    fn broadcast(&self, root: usize, tag: Tag, payload: Option<Payload>) -> Result<Payload> {
        if self.rank() == root {
            let payload = payload.ok_or_else(|| {
                IoError::malformed(format!("broadcast root {root} has no payload"))
            })?;
            for dest in (0..self.size()).filter(|&r| r != root) {
                self.send(
                    dest,
                    Message {
                        tag,
                        payload: payload.clone(),
                    },
                )?;
            }
            Ok(payload)
        } else {
            self.check_peer(root)?;
            self.recv_tagged(root, tag)
        }
    }

    /// Broadcast of a buffer whose length every rank already agrees on.
    fn broadcast_f32(&self, root: usize, tag: Tag, buf: &mut [f32]) -> Result<()> {
        if self.rank() == root {
            self.broadcast(root, tag, Some(Payload::F32(buf.to_vec())))?;
            Ok(())
        } else {
            self.check_peer(root)?;
            self.recv_f32_into(root, tag, buf)
        }
    }

    /// Integer counterpart of [`Communicator::broadcast_f32`].
    fn broadcast_i32(&self, root: usize, tag: Tag, buf: &mut [i32]) -> Result<()> {
        if self.rank() == root {
            self.broadcast(root, tag, Some(Payload::I32(buf.to_vec())))?;
            Ok(())
        } else {
            self.check_peer(root)?;
            self.recv_i32_into(root, tag, buf)
        }
    }
}
