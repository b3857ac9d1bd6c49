use crate::model::config::AppConfig;
use crate::model::metrics::{Metrics, RunReport};
use crate::model::partition::Partition;
use crate::model::spatial_grid::SpatialGrid;
use flock_data::{Agent, AgentSnapshot, Vec3};
use sha2::{Digest, Sha256};
use std::sync::Arc;

pub mod init;
pub mod update;

/// One node's full replica of the population and spatial grid.
///
/// On a single node the world owns every agent. Inside a fleet it computes
/// only its `owned` partition and receives the rest through replication.
pub struct World {
    pub config: AppConfig,
    pub agents: Vec<Agent>,
    pub grid: SpatialGrid,
    pub step: u64,
    pub metrics: Metrics,
    /// Positions of the owned agents after each step, when enabled.
    pub paths: Vec<Vec<Vec3>>,
    owned: Partition,
    snapshots: Vec<AgentSnapshot>,
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl World {
    #[must_use]
    pub fn owned(&self) -> Partition {
        self.owned
    }

    /// Worker threads used by the parallel phases.
    #[must_use]
    pub fn threads(&self) -> usize {
        self.pool
            .as_ref()
            .map_or_else(rayon::current_num_threads, |pool| pool.current_num_threads())
    }

    /// SHA-256 over agent state bits, cached cell coordinates and every cell
    /// member list. Equal fingerprints mean bit-identical replicas.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for agent in &self.agents {
            for v in [agent.position, agent.velocity] {
                for c in v.to_array() {
                    hasher.update(c.to_bits().to_le_bytes());
                }
            }
            let coord = agent.grid_coord;
            for c in [coord.x, coord.y, coord.z] {
                hasher.update((c as u64).to_le_bytes());
            }
        }
        for cell in self.grid.cells() {
            hasher.update((cell.len() as u64).to_le_bytes());
            for &id in cell {
                hasher.update((id as u64).to_le_bytes());
            }
        }
        hex::encode(hasher.finalize())
    }

    #[must_use]
    pub fn report(&self, rank: usize, nodes: usize) -> RunReport {
        RunReport {
            rank,
            agents: self.agents.len(),
            owned_agents: self.owned.len(),
            steps: self.step,
            nodes,
            threads: self.threads(),
            cell_moves: self.metrics.cell_moves(),
            elapsed_secs: self.metrics.elapsed().as_secs_f64(),
        }
    }
}
