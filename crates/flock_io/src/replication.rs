//! Collective exchange of agent state and index deltas.
//!
//! These helpers pair a transport call with the matching wire encoding, so
//! the step drivers deal in agents and [`CellMove`]s rather than buffers.
//! Every helper blocks until its half of the exchange completes.

use crate::error::{IoError, Result};
use crate::network::{Communicator, Message, Payload, Tag};
use crate::serialization::{
    decode_moves, deserialize_agents, encode_moves, serialize_agents, AGENT_RECORD_LEN,
};
use flock_core::config::AppConfig;
use flock_data::{Agent, CellMove};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// What every node must agree on before the first step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handshake {
    pub fingerprint: String,
    pub nodes: usize,
    pub population: usize,
}

impl Handshake {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            fingerprint: config.fingerprint(),
            nodes: config.run.nodes,
            population: config.world.population,
        }
    }
}

/// Root announces its handshake; every other rank compares it with its own
/// and fails with [`IoError::ConfigMismatch`] on any difference.
pub fn exchange_handshake<C: Communicator + ?Sized>(
    comm: &C,
    root: usize,
    local: &Handshake,
) -> Result<()> {
    if comm.rank() == root {
        let bytes = serde_json::to_vec(local)?;
        comm.broadcast(root, Tag::Handshake, Some(Payload::Bytes(bytes)))?;
        return Ok(());
    }
    let bytes = comm.broadcast(root, Tag::Handshake, None)?.into_bytes()?;
    let remote: Handshake = serde_json::from_slice(&bytes)?;
    if &remote != local {
        tracing::warn!(
            rank = comm.rank(),
            coordinator = %remote.fingerprint,
            local = %local.fingerprint,
            "Configuration differs from coordinator"
        );
        return Err(IoError::ConfigMismatch {
            coordinator: format!(
                "{} ({} nodes, {} agents)",
                remote.fingerprint, remote.nodes, remote.population
            ),
            local: format!(
                "{} ({} nodes, {} agents)",
                local.fingerprint, local.nodes, local.population
            ),
        });
    }
    Ok(())
}

/// Broadcasts the whole population from `root`; other ranks overwrite
/// position and velocity of every agent with the received state.
///
/// `buf` is scratch space reused across steps.
pub fn broadcast_agents<C: Communicator + ?Sized>(
    comm: &C,
    root: usize,
    agents: &mut [Agent],
    buf: &mut Vec<f32>,
) -> Result<()> {
    let all = 0..agents.len();
    buf.resize(agents.len() * AGENT_RECORD_LEN, 0.0);
    if comm.rank() == root {
        serialize_agents(agents, all, buf)?;
        comm.broadcast_f32(root, Tag::Population, buf)
    } else {
        comm.broadcast_f32(root, Tag::Population, buf)?;
        deserialize_agents(agents, all, buf)
    }
}

/// Sends the authoritative state of `agents[range]` to `dest`.
pub fn send_partition<C: Communicator + ?Sized>(
    comm: &C,
    dest: usize,
    agents: &[Agent],
    range: Range<usize>,
    buf: &mut Vec<f32>,
) -> Result<()> {
    buf.resize(range.len() * AGENT_RECORD_LEN, 0.0);
    serialize_agents(agents, range, buf)?;
    comm.send(
        dest,
        Message {
            tag: Tag::Partition,
            payload: Payload::F32(buf.clone()),
        },
    )
}

/// Receives `source`'s partition into `agents[range]`.
pub fn recv_partition<C: Communicator + ?Sized>(
    comm: &C,
    source: usize,
    agents: &mut [Agent],
    range: Range<usize>,
    buf: &mut Vec<f32>,
) -> Result<()> {
    buf.resize(range.len() * AGENT_RECORD_LEN, 0.0);
    comm.recv_f32_into(source, Tag::Partition, buf)
        .map_err(|e| e.with_context(format!("partition from node {source}")))?;
    deserialize_agents(agents, range, buf)
}

/// Sends index deltas to `dest`: a slot count, then the triples when any.
pub fn send_moves<C: Communicator + ?Sized>(
    comm: &C,
    dest: usize,
    moves: &[CellMove],
) -> Result<()> {
    let wire = encode_moves(moves)?;
    comm.send(
        dest,
        Message {
            tag: Tag::MoveCount,
            payload: Payload::I32(vec![slot_count(&wire)?]),
        },
    )?;
    if !wire.is_empty() {
        comm.send(
            dest,
            Message {
                tag: Tag::Moves,
                payload: Payload::I32(wire),
            },
        )?;
    }
    Ok(())
}

/// Receives index deltas sent with [`send_moves`].
pub fn recv_moves<C: Communicator + ?Sized>(comm: &C, source: usize) -> Result<Vec<CellMove>> {
    let mut count = [0i32];
    comm.recv_i32_into(source, Tag::MoveCount, &mut count)?;
    let slots = parse_count(count[0])?;
    if slots == 0 {
        return Ok(Vec::new());
    }
    let mut wire = vec![0i32; slots];
    comm.recv_i32_into(source, Tag::Moves, &mut wire)?;
    decode_moves(&wire)
}

/// Broadcasts index deltas from `root`. The slot count goes out through
/// the same collective first so receivers can size their buffer.
pub fn broadcast_moves<C: Communicator + ?Sized>(
    comm: &C,
    root: usize,
    moves: &mut Vec<CellMove>,
) -> Result<()> {
    if comm.rank() == root {
        let mut wire = encode_moves(moves)?;
        let mut count = [slot_count(&wire)?];
        comm.broadcast_i32(root, Tag::MoveCount, &mut count)?;
        if !wire.is_empty() {
            comm.broadcast_i32(root, Tag::Moves, &mut wire)?;
        }
        return Ok(());
    }
    let mut count = [0i32];
    comm.broadcast_i32(root, Tag::MoveCount, &mut count)?;
    let slots = parse_count(count[0])?;
    moves.clear();
    if slots > 0 {
        let mut wire = vec![0i32; slots];
        comm.broadcast_i32(root, Tag::Moves, &mut wire)?;
        moves.extend(decode_moves(&wire)?);
    }
    Ok(())
}

fn slot_count(wire: &[i32]) -> Result<i32> {
    i32::try_from(wire.len())
        .map_err(|_| IoError::malformed(format!("{} delta slots exceed i32", wire.len())))
}

fn parse_count(count: i32) -> Result<usize> {
    usize::try_from(count).map_err(|_| IoError::malformed(format!("negative slot count {count}")))
}
