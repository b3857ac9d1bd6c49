use crate::config::AppConfig;
use crate::error::{Result, StepError};
use flock_data::{Agent, AgentId, CellMove, GridCoord, Neighborhood, NEIGHBORHOOD_CELLS};
use glam::Vec3;
use rayon::prelude::*;

/// Uniform 3-D grid over the cubic simulation volume.
///
/// Cells are stored in one flat vector addressed by the mixed-radix index
/// `x * N² + y * N + z`. Each cell keeps the ids of its members in insertion
/// order; agents live in a separate arena and are never referenced directly.
///
/// # Invariants
/// - Every agent id appears in exactly one cell.
/// - `Agent::grid_coord` names that cell, except between detecting a move and
///   replaying it on a multi-node run.
/// - The grid is never resized after construction.
///
/// # Sizing
/// `cells_per_axis = floor(length / sensing_radius)`, so each cell is at least
/// one sensing radius wide and the 27 cells around an agent cover its whole
/// sensing sphere.
///
/// # Examples
/// ```
/// use flock_core::spatial_grid::SpatialGrid;
/// use flock_data::{Agent, Vec3};
///
/// let mut grid = SpatialGrid::new(100.0, 10.0).unwrap();
/// let mut agents = vec![
///     Agent::new(0, Vec3::new(5.0, 5.0, 5.0), Vec3::ZERO, 4),
///     Agent::new(1, Vec3::new(95.0, 5.0, 5.0), Vec3::ZERO, 4),
/// ];
/// grid.build(&mut agents);
/// assert_eq!(grid.cell(0), &[0]);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct SpatialGrid {
    pub length: f32,
    pub cells_per_axis: usize,
    pub cell_length: f32,
    cells: Vec<Vec<AgentId>>,
}

impl SpatialGrid {
    /// Creates an empty grid for a cube of edge `length`.
    pub fn new(length: f32, sensing_radius: f32) -> Result<Self> {
        if !(length.is_finite() && length > 0.0) {
            return Err(StepError::grid(format!("invalid length {length}")));
        }
        if !(sensing_radius.is_finite() && sensing_radius > 0.0) {
            return Err(StepError::grid(format!(
                "invalid sensing radius {sensing_radius}"
            )));
        }
        let cells_per_axis = ((length / sensing_radius).floor() as usize).max(1);
        let cell_count = cells_per_axis
            .checked_pow(3)
            .ok_or_else(|| StepError::grid(format!("{cells_per_axis}^3 cells overflow")))?;
        Ok(Self {
            length,
            cells_per_axis,
            cell_length: length / cells_per_axis as f32,
            cells: vec![Vec::new(); cell_count],
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(config.world.length, config.world.sensing_radius)
    }

    /// Places every agent into the cell matching its position and caches the
    /// coordinate on the agent. Any previous membership is discarded.
    ///
    /// Coordinates are computed in parallel; insertion is serial in id order
    /// so member lists come out identical on every node.
    pub fn build(&mut self, agents: &mut [Agent]) {
        for cell in &mut self.cells {
            cell.clear();
        }
        let coords: Vec<GridCoord> = agents
            .par_iter()
            .map(|agent| self.coord_of(agent.position))
            .collect();
        for (agent, coord) in agents.iter_mut().zip(coords) {
            let idx = self.linear_index(coord);
            self.cells[idx].push(agent.id);
            agent.grid_coord = coord;
        }
    }

    #[inline]
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    #[must_use]
    pub fn cell(&self, index: usize) -> &[AgentId] {
        &self.cells[index]
    }

    #[must_use]
    pub fn cells(&self) -> &[Vec<AgentId>] {
        &self.cells
    }

    /// Total number of memberships across all cells.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.cells.iter().map(Vec::len).sum()
    }

    /// Cells whose member list contains `id`. Exactly one when consistent.
    #[must_use]
    pub fn locate(&self, id: AgentId) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, members)| members.contains(&id))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Cell coordinate containing `position`.
    ///
    /// A position exactly on the far boundary (or anything past it) clamps to
    /// the last cell; negative or non-finite components clamp to the first.
    #[inline]
    #[must_use]
    pub fn coord_of(&self, position: Vec3) -> GridCoord {
        let last = self.cells_per_axis - 1;
        let axis = |p: f32| -> usize {
            let c = (p / self.cell_length).floor();
            if c >= 0.0 {
                (c as usize).min(last)
            } else {
                0
            }
        };
        GridCoord::new(axis(position.x), axis(position.y), axis(position.z))
    }

    #[inline]
    #[must_use]
    pub fn linear_index(&self, coord: GridCoord) -> usize {
        let n = self.cells_per_axis;
        coord.x * n * n + coord.y * n + coord.z
    }

    #[inline]
    #[must_use]
    pub fn coord_of_index(&self, index: usize) -> GridCoord {
        let n = self.cells_per_axis;
        let x = index / (n * n);
        let y = (index - x * n * n) / n;
        let z = index - x * n * n - y * n;
        GridCoord::new(x, y, z)
    }

    /// The 3x3x3 block of cells around `coord` with periodic wraparound:
    /// coordinate -1 maps to the last cell and `cells_per_axis` maps to 0.
    #[must_use]
    pub fn neighborhood(&self, coord: GridCoord) -> Neighborhood {
        let n = self.cells_per_axis;
        let wrap = |c: usize, d: usize| (c + n + d - 1) % n;
        let mut cells = [0usize; NEIGHBORHOOD_CELLS];
        let mut i = 0;
        for dx in 0..3 {
            for dy in 0..3 {
                for dz in 0..3 {
                    cells[i] = self.linear_index(GridCoord::new(
                        wrap(coord.x, dx),
                        wrap(coord.y, dy),
                        wrap(coord.z, dz),
                    ));
                    i += 1;
                }
            }
        }
        if n >= 3 {
            Neighborhood::from_distinct(cells)
        } else {
            Neighborhood::from_cells(cells)
        }
    }

    /// Caches the agent's current neighborhood on the agent. Read-only with
    /// respect to the grid, so it can run for many agents in parallel.
    #[inline]
    pub fn refresh_neighborhood(&self, agent: &mut Agent) {
        agent.neighborhood = self.neighborhood(agent.grid_coord);
    }

    /// Compares the agent's position-derived cell with its cached one and
    /// returns the move that would reconcile them, without applying it.
    #[must_use]
    pub fn detect_move(&self, agent: &Agent) -> Option<CellMove> {
        let current = self.coord_of(agent.position);
        if current == agent.grid_coord {
            return None;
        }
        Some(CellMove {
            from: self.linear_index(agent.grid_coord),
            to: self.linear_index(current),
            agent: agent.id,
        })
    }

    /// Detects a cell change and applies it immediately.
    pub fn detect_and_apply(&mut self, agent: &mut Agent) -> Result<Option<CellMove>> {
        let Some(mv) = self.detect_move(agent) else {
            return Ok(None);
        };
        self.relink(mv)?;
        agent.grid_coord = self.coord_of_index(mv.to);
        Ok(Some(mv))
    }

    /// Replays a move computed elsewhere, trusting its indices rather than
    /// recomputing them from the agent's position.
    pub fn apply_remote_move(&mut self, agents: &mut [Agent], mv: CellMove) -> Result<()> {
        let population = agents.len();
        let agent = agents.get_mut(mv.agent).ok_or(StepError::AgentOutOfRange {
            agent: mv.agent,
            population,
        })?;
        self.relink(mv)?;
        agent.grid_coord = self.coord_of_index(mv.to);
        Ok(())
    }

    fn relink(&mut self, mv: CellMove) -> Result<()> {
        let cells = self.cells.len();
        for index in [mv.from, mv.to] {
            if index >= cells {
                return Err(StepError::CellOutOfRange { index, cells });
            }
        }
        let old = &mut self.cells[mv.from];
        let pos = old
            .iter()
            .position(|&id| id == mv.agent)
            .ok_or(StepError::NotInCell {
                agent: mv.agent,
                cell: mv.from,
            })?;
        old.remove(pos);
        self.cells[mv.to].push(mv.agent);
        Ok(())
    }
}
