use super::agent::AgentId;
use serde::{Deserialize, Serialize};

/// Number of cells in a full 3x3x3 neighborhood.
pub const NEIGHBORHOOD_CELLS: usize = 27;

/// Integer cell coordinate inside the uniform grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridCoord {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl GridCoord {
    #[must_use]
    pub const fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }
}

/// Index delta: one agent leaving cell `from` for cell `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellMove {
    pub from: usize,
    pub to: usize,
    pub agent: AgentId,
}

/// Linear indices of the cells surrounding an agent's cell, itself included.
///
/// Holds 27 entries unless the grid has fewer than three cells per axis, in
/// which case wrapped duplicates are collapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighborhood {
    cells: [usize; NEIGHBORHOOD_CELLS],
    len: usize,
}

impl Default for Neighborhood {
    fn default() -> Self {
        Self {
            cells: [0; NEIGHBORHOOD_CELLS],
            len: 0,
        }
    }
}

impl Neighborhood {
    /// Builds a neighborhood from cell indices, dropping repeats.
    #[must_use]
    pub fn from_cells(cells: impl IntoIterator<Item = usize>) -> Self {
        let mut hood = Self::default();
        for cell in cells {
            if hood.len == NEIGHBORHOOD_CELLS {
                break;
            }
            if !hood.as_slice().contains(&cell) {
                hood.cells[hood.len] = cell;
                hood.len += 1;
            }
        }
        hood
    }

    /// Builds a full neighborhood from 27 cell indices known to be distinct.
    #[inline]
    #[must_use]
    pub fn from_distinct(cells: [usize; NEIGHBORHOOD_CELLS]) -> Self {
        Self {
            cells,
            len: NEIGHBORHOOD_CELLS,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[usize] {
        &self.cells[..self.len]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
