//! Flat wire encodings for bulk transport.
//!
//! Agent record: six consecutive `f32` slots `[px, py, pz, vx, vy, vz]`, one
//! record per agent in id order. Only position and velocity travel; the grid
//! coordinate is reconstructed from the index deltas sent alongside.
//!
//! Index delta: three consecutive `i32` slots `[old_cell, new_cell, agent]`.

use crate::error::{IoError, Result};
use flock_data::{Agent, CellMove, Vec3};
use std::ops::Range;

/// Slots per agent record.
pub const AGENT_RECORD_LEN: usize = 6;
/// Slots per index-delta record.
pub const MOVE_RECORD_LEN: usize = 3;

/// Writes one agent's position and velocity at `offset`.
#[inline]
pub fn pack_agent(agent: &Agent, buf: &mut [f32], offset: usize) -> Result<()> {
    let record = record_slots(buf.len(), offset)?;
    buf[record.start..record.start + 3].copy_from_slice(&agent.position.to_array());
    buf[record.start + 3..record.end].copy_from_slice(&agent.velocity.to_array());
    Ok(())
}

/// Exact inverse of [`pack_agent`].
#[inline]
pub fn unpack_agent(agent: &mut Agent, buf: &[f32], offset: usize) -> Result<()> {
    let record = record_slots(buf.len(), offset)?;
    agent.position = Vec3::from_slice(&buf[record.start..record.start + 3]);
    agent.velocity = Vec3::from_slice(&buf[record.start + 3..record.end]);
    Ok(())
}

/// Packs `agents[range]` into `buf`, first agent at slot 0.
pub fn serialize_agents(agents: &[Agent], range: Range<usize>, buf: &mut [f32]) -> Result<()> {
    check_record_buffer(range.len(), buf.len())?;
    for (slot, agent) in agents[range].iter().enumerate() {
        pack_agent(agent, buf, slot * AGENT_RECORD_LEN)?;
    }
    Ok(())
}

/// Unpacks `buf` into `agents[range]`.
pub fn deserialize_agents(agents: &mut [Agent], range: Range<usize>, buf: &[f32]) -> Result<()> {
    check_record_buffer(range.len(), buf.len())?;
    for (slot, agent) in agents[range].iter_mut().enumerate() {
        unpack_agent(agent, buf, slot * AGENT_RECORD_LEN)?;
    }
    Ok(())
}

fn record_slots(len: usize, offset: usize) -> Result<Range<usize>> {
    match offset.checked_add(AGENT_RECORD_LEN) {
        Some(end) if end <= len => Ok(offset..end),
        _ => Err(IoError::SizeMismatch {
            expected: offset.saturating_add(AGENT_RECORD_LEN),
            found: len,
        }),
    }
}

fn check_record_buffer(records: usize, len: usize) -> Result<()> {
    let expected = records * AGENT_RECORD_LEN;
    if len != expected {
        return Err(IoError::SizeMismatch {
            expected,
            found: len,
        });
    }
    Ok(())
}

fn to_wire(value: usize, what: &str) -> Result<i32> {
    i32::try_from(value).map_err(|_| IoError::malformed(format!("{what} {value} exceeds i32")))
}

fn from_wire(value: i32, what: &str) -> Result<usize> {
    usize::try_from(value).map_err(|_| IoError::malformed(format!("negative {what} {value}")))
}

/// Flattens index deltas into `i32` triples.
pub fn encode_moves(moves: &[CellMove]) -> Result<Vec<i32>> {
    let mut out = Vec::with_capacity(moves.len() * MOVE_RECORD_LEN);
    for mv in moves {
        out.push(to_wire(mv.from, "cell index")?);
        out.push(to_wire(mv.to, "cell index")?);
        out.push(to_wire(mv.agent, "agent id")?);
    }
    Ok(out)
}

/// Parses `i32` triples back into index deltas.
pub fn decode_moves(buf: &[i32]) -> Result<Vec<CellMove>> {
    if buf.len() % MOVE_RECORD_LEN != 0 {
        return Err(IoError::malformed(format!(
            "delta buffer of {} slots is not a whole number of triples",
            buf.len()
        )));
    }
    buf.chunks_exact(MOVE_RECORD_LEN)
        .map(|triple| {
            Ok(CellMove {
                from: from_wire(triple[0], "cell index")?,
                to: from_wire(triple[1], "cell index")?,
                agent: from_wire(triple[2], "agent id")?,
            })
        })
        .collect()
}
