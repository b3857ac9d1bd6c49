use crate::model::config::AppConfig;
use crate::model::metrics::Metrics;
use crate::model::partition::Partition;
use crate::model::population::{population_rng, spawn_population};
use crate::model::spatial_grid::SpatialGrid;
use crate::model::world::World;
use anyhow::Context;
use flock_data::Agent;
use std::sync::Arc;

impl World {
    /// Validates `config` and spawns its initial population.
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let mut rng = population_rng(&config);
        let agents = spawn_population(&config, &mut rng);
        Self::from_agents(config, agents)
    }

    /// Builds a world around existing agents. Ids must equal positions in
    /// `agents`; the grid is built from their current positions.
    pub fn from_agents(config: AppConfig, mut agents: Vec<Agent>) -> anyhow::Result<Self> {
        config.validate()?;
        anyhow::ensure!(
            agents.len() == config.world.population,
            "Config expects {} agents, got {}",
            config.world.population,
            agents.len()
        );
        if let Some((index, agent)) = agents.iter().enumerate().find(|(i, a)| a.id != *i) {
            anyhow::bail!("Agent at index {index} has id {}", agent.id);
        }
        let mut grid = SpatialGrid::from_config(&config)?;
        grid.build(&mut agents);

        let pool = match config.run.threads {
            Some(threads) => Some(Arc::new(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .context("Failed to build worker pool")?,
            )),
            None => None,
        };

        tracing::debug!(
            agents = agents.len(),
            cells_per_axis = grid.cells_per_axis,
            cell_length = grid.cell_length,
            "World initialised"
        );

        Ok(Self {
            owned: Partition {
                start: 0,
                end: agents.len(),
            },
            snapshots: Vec::with_capacity(agents.len()),
            metrics: Metrics::new(config.run.log_interval),
            paths: Vec::new(),
            step: 0,
            config,
            agents,
            grid,
            pool,
        })
    }

    /// Restricts computation to `partition`; everything else becomes a
    /// read-only replica.
    pub fn set_owned(&mut self, partition: Partition) -> anyhow::Result<()> {
        anyhow::ensure!(
            partition.start <= partition.end && partition.end <= self.agents.len(),
            "Partition {}..{} outside population of {}",
            partition.start,
            partition.end,
            self.agents.len()
        );
        self.owned = partition;
        Ok(())
    }
}
