//! Error types for flock_io crate.
//!
//! Every variant is fatal for a lock-step run: no node can make progress
//! once an exchange with any peer fails.

use flock_core::error::StepError;
use thiserror::Error;

/// Main error type for flock_io operations.
#[derive(Error, Debug)]
pub enum IoError {
    /// Peer endpoint went away
    #[error("Node {peer} disconnected")]
    Disconnected { peer: usize },

    /// Message arrived out of protocol order
    #[error("Expected {expected} message from node {peer}, got {found}")]
    TagMismatch {
        peer: usize,
        expected: String,
        found: String,
    },

    /// Payload element type differs from what the protocol expects
    #[error("Expected {expected} payload, got {found}")]
    KindMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// Buffer length disagrees with the pre-agreed size
    #[error("Buffer size mismatch: expected {expected}, found {found}")]
    SizeMismatch { expected: usize, found: usize },

    /// Buffer content cannot be decoded
    #[error("Malformed buffer: {0}")]
    MalformedBuffer(String),

    /// Rank outside the process group
    #[error("Invalid rank {rank} for group of {size}")]
    InvalidRank { rank: usize, size: usize },

    /// Nodes were started with different simulation parameters
    #[error("Configuration mismatch: coordinator {coordinator}, local {local}")]
    ConfigMismatch { coordinator: String, local: String },

    /// Replaying replicated state failed
    #[error("Step error: {0}")]
    Step(#[from] StepError),

    /// JSON encoding errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{context}: {source}")]
    Context {
        context: String,
        source: Box<IoError>,
    },
}

/// Result type alias for flock_io operations.
pub type Result<T> = std::result::Result<T, IoError>;

impl IoError {
    /// Creates a new malformed-buffer error.
    #[must_use]
    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        Self::MalformedBuffer(msg.into())
    }

    /// Wraps an error with additional context.
    #[must_use]
    pub fn with_context<S: Into<String>>(self, context: S) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error beneath any context wrappers.
    #[must_use]
    pub fn root(&self) -> &IoError {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether the root cause is a vanished peer rather than a local fault.
    #[must_use]
    pub fn is_disconnect(&self) -> bool {
        matches!(self.root(), Self::Disconnected { .. })
    }
}
