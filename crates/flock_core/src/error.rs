//! Error types for flock_core.
//!
//! A step either completes or the run is over; none of these are retried.

use flock_data::AgentId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StepError {
    /// More agents in sensing range than the neighbor buffer allows
    #[error("Agent {agent} sensed more than {capacity} neighbors")]
    NeighborOverflow { agent: AgentId, capacity: usize },

    /// Linear cell index outside the grid
    #[error("Cell index {index} out of range (grid has {cells} cells)")]
    CellOutOfRange { index: usize, cells: usize },

    /// An index delta named a cell the agent is not a member of
    #[error("Agent {agent} is not a member of cell {cell}")]
    NotInCell { agent: AgentId, cell: usize },

    /// Agent id outside the population
    #[error("Agent {agent} out of range (population {population})")]
    AgentOutOfRange { agent: AgentId, population: usize },

    /// Grid construction errors
    #[error("Grid error: {0}")]
    Grid(String),
}

pub type Result<T> = std::result::Result<T, StepError>;

impl StepError {
    #[must_use]
    pub fn grid<S: Into<String>>(msg: S) -> Self {
        Self::Grid(msg.into())
    }
}
