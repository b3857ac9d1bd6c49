use super::grid::{GridCoord, Neighborhood};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Stable arena index of an agent. Cells and neighbor buffers store these,
/// never references into the population.
pub type AgentId = usize;

/// Read-only copy of the kinematic state other agents steer against.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub position: Vec3,
    pub velocity: Vec3,
}

/// One sensed neighbor together with its precomputed distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub id: AgentId,
    pub distance: f32,
}

/// Scratch buffer holding the neighbors sensed during the current step.
///
/// The capacity is explicit: callers decide what happens once `is_full`
/// reports true instead of the buffer silently dropping entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NeighborBuffer {
    entries: Vec<Neighbor>,
    capacity: usize,
}

impl NeighborBuffer {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    #[inline]
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    /// Appends a neighbor. Returns `false` without writing when full.
    #[inline]
    pub fn push(&mut self, neighbor: Neighbor) -> bool {
        if self.is_full() {
            return false;
        }
        self.entries.push(neighbor);
        true
    }

    /// Raises the capacity bound, reserving storage up front.
    pub fn grow_to(&mut self, capacity: usize) {
        if capacity > self.capacity {
            self.entries
                .reserve(capacity.saturating_sub(self.entries.len()));
            self.capacity = capacity;
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Neighbor] {
        &self.entries
    }
}

/// A single boid.
///
/// `grid_coord` is owned by the spatial index: it always names the cell whose
/// member list contains `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub position: Vec3,
    pub velocity: Vec3,
    /// Transient, zero between steps.
    pub acceleration: Vec3,
    pub grid_coord: GridCoord,
    #[serde(skip)]
    pub neighborhood: Neighborhood,
    #[serde(skip)]
    pub neighbors: NeighborBuffer,
}

impl Agent {
    #[must_use]
    pub fn new(id: AgentId, position: Vec3, velocity: Vec3, neighbor_capacity: usize) -> Self {
        Self {
            id,
            position,
            velocity,
            acceleration: Vec3::ZERO,
            grid_coord: GridCoord::default(),
            neighborhood: Neighborhood::default(),
            neighbors: NeighborBuffer::with_capacity(neighbor_capacity),
        }
    }

    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            position: self.position,
            velocity: self.velocity,
        }
    }
}
