pub mod macros;

use flock_data::{Agent, Vec3};
use flock_lib::model::config::AppConfig;
use flock_lib::model::world::World;

#[allow(dead_code)]
pub struct WorldBuilder {
    config: AppConfig,
    agents: Vec<(Vec3, Vec3)>,
}

#[allow(dead_code)]
impl WorldBuilder {
    /// Small deterministic world: 100-unit cube, 10-unit sensing radius.
    pub fn new() -> Self {
        let mut config = AppConfig::default();
        config.world.length = 100.0;
        config.world.sensing_radius = 10.0;
        config.world.population = 0;
        config.world.seed = Some(1);
        config.steering.neighbor_capacity = Some(64);
        config.run.log_interval = 1_000;
        Self {
            config,
            agents: Vec::new(),
        }
    }

    pub fn with_config<F>(mut self, modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        modifier(&mut self.config);
        self
    }

    pub fn with_agent(mut self, position: Vec3, velocity: Vec3) -> Self {
        self.agents.push((position, velocity));
        self
    }

    pub fn config(&self) -> AppConfig {
        let mut config = self.config.clone();
        if !self.agents.is_empty() {
            config.world.population = self.agents.len();
        }
        config
    }

    /// Explicit agents when any were added, otherwise a seeded population.
    pub fn build(self) -> World {
        let config = self.config();
        if self.agents.is_empty() {
            return World::new(config).expect("Failed to create world in test builder");
        }
        let capacity = config.neighbor_capacity();
        let agents = self
            .agents
            .into_iter()
            .enumerate()
            .map(|(id, (p, v))| Agent::new(id, p, v, capacity))
            .collect();
        World::from_agents(config, agents).expect("Failed to create world in test builder")
    }
}

/// Seeded config for replication tests.
#[allow(dead_code)]
pub fn fleet_config(population: usize, nodes: usize, steps: u64) -> AppConfig {
    WorldBuilder::new()
        .with_config(|c| {
            c.world.population = population;
            c.world.seed = Some(2024);
            c.steering.neighbor_capacity = Some(population.max(1));
            c.run.nodes = nodes;
            c.run.steps = steps;
        })
        .config()
}
