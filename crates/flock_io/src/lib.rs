//! # Flock IO
//!
//! Transport and replication layer for multi-node flocking runs.
//!
//! This crate provides:
//! - Structured error handling with custom error types
//! - Flat wire encoding of agent state and index deltas
//! - A blocking process-group abstraction with an in-process implementation
//! - Collective helpers that keep replicas of the population and grid aligned

/// Error types and result aliases for transport operations
pub mod error;
/// Process-group transport: the `Communicator` trait and its implementations
pub mod network;
/// Collective exchange of agent state and index deltas
pub mod replication;
/// Flat f32/i32 wire encodings
pub mod serialization;

pub use error::{IoError, Result};
pub use network::{Communicator, LocalGroup, Message, Payload, Tag};
pub use serialization::{
    decode_moves, deserialize_agents, encode_moves, pack_agent, serialize_agents, unpack_agent,
    AGENT_RECORD_LEN,
};
pub use replication::{
    broadcast_agents, broadcast_moves, exchange_handshake, recv_moves, recv_partition,
    send_moves, send_partition, Handshake,
};
