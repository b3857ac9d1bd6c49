//! Static split of the population into contiguous per-node ranges.

use flock_data::AgentId;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Rank of the coordinating node.
pub const COORDINATOR_RANK: usize = 0;

/// Contiguous block of agent ids one node is authoritative for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    pub start: AgentId,
    pub end: AgentId,
}

impl Partition {
    /// Partition owned by `rank` in a fleet of `nodes`.
    ///
    /// Participants `1..nodes` each own `floor(population / nodes)` agents in
    /// rank order; the coordinator owns the final block, remainder included.
    /// A single node owns everything.
    #[must_use]
    pub fn for_rank(population: usize, nodes: usize, rank: usize) -> Self {
        debug_assert!(nodes > 0 && rank < nodes);
        let per_node = population / nodes;
        if rank == COORDINATOR_RANK {
            Self {
                start: (nodes - 1) * per_node,
                end: population,
            }
        } else {
            Self {
                start: (rank - 1) * per_node,
                end: rank * per_node,
            }
        }
    }

    /// All partitions in ascending id order: participants first, then the
    /// coordinator.
    #[must_use]
    pub fn all(population: usize, nodes: usize) -> Vec<(usize, Self)> {
        (1..nodes)
            .chain(std::iter::once(COORDINATOR_RANK))
            .map(|rank| (rank, Self::for_rank(population, nodes, rank)))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    #[must_use]
    pub fn range(&self) -> Range<AgentId> {
        self.start..self.end
    }

    #[must_use]
    pub fn contains(&self, id: AgentId) -> bool {
        self.range().contains(&id)
    }
}
