use super::{Communicator, Message};
use crate::error::{IoError, Result};
use std::sync::mpsc::{self, Receiver, Sender};

/// Endpoint of an in-process group: one unbounded channel per ordered pair
/// of ranks, so per-peer FIFO order matches the send order.
///
/// Dropping an endpoint (e.g. because its node failed) disconnects it from
/// every peer; peers blocked on it get [`IoError::Disconnected`] instead of
/// waiting forever.
pub struct LocalGroup {
    rank: usize,
    size: usize,
    senders: Vec<Option<Sender<Message>>>,
    receivers: Vec<Option<Receiver<Message>>>,
}

impl LocalGroup {
    /// Creates the endpoints of a fully connected group of `size` nodes,
    /// indexed by rank.
    #[must_use]
    pub fn create(size: usize) -> Vec<LocalGroup> {
        let mut senders: Vec<Vec<Option<Sender<Message>>>> =
            (0..size).map(|_| (0..size).map(|_| None).collect()).collect();
        let mut receivers: Vec<Vec<Option<Receiver<Message>>>> =
            (0..size).map(|_| (0..size).map(|_| None).collect()).collect();

        for from in 0..size {
            for to in (0..size).filter(|&to| to != from) {
                let (tx, rx) = mpsc::channel();
                senders[from][to] = Some(tx);
                receivers[to][from] = Some(rx);
            }
        }

        senders
            .into_iter()
            .zip(receivers)
            .enumerate()
            .map(|(rank, (senders, receivers))| LocalGroup {
                rank,
                size,
                senders,
                receivers,
            })
            .collect()
    }
}

impl Communicator for LocalGroup {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn send(&self, dest: usize, message: Message) -> Result<()> {
        self.check_peer(dest)?;
        let tx = self.senders[dest]
            .as_ref()
            .ok_or(IoError::Disconnected { peer: dest })?;
        tx.send(message)
            .map_err(|_| IoError::Disconnected { peer: dest })
    }

    fn recv(&self, source: usize) -> Result<Message> {
        self.check_peer(source)?;
        let rx = self.receivers[source]
            .as_ref()
            .ok_or(IoError::Disconnected { peer: source })?;
        rx.recv().map_err(|_| IoError::Disconnected { peer: source })
    }
}
