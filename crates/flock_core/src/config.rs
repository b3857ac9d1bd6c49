//! Configuration management for simulation parameters.
//!
//! This module provides strongly-typed configuration structures that map to
//! the `config.toml` file. Every driver receives an [`AppConfig`] at
//! construction; nothing reads process-wide constants.
//!
//! ## Configuration Hierarchy
//!
//! 1. Default values (hardcoded in `Default` impls)
//! 2. `config.toml` file (overrides defaults)
//! 3. Command line flags (applied by the binary)
//!
//! ## Example `config.toml`
//!
//! ```toml
//! [world]
//! length = 1000.0
//! sensing_radius = 100.0
//! population = 1000
//! seed = 42
//!
//! [steering]
//! max_speed = 3.0
//! max_force = 0.6
//! separation_weight = 1.05
//! overflow = "grow"
//!
//! [run]
//! steps = 500
//! nodes = 4
//! ```

use serde::{Deserialize, Serialize};

/// Simulation volume and population.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    /// Edge length of the cubic volume.
    pub length: f32,
    pub sensing_radius: f32,
    pub population: usize,
    pub seed: Option<u64>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            length: 1000.0,
            sensing_radius: 100.0,
            population: 1000,
            seed: None,
        }
    }
}

/// What to do when more agents are in range than the neighbor buffer holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Abort the step with an error.
    #[default]
    Fail,
    /// Double the buffer and keep going.
    Grow,
}

/// Steering limits and rule weights.
///
/// Weights are named after what each rule computes: matching the average
/// neighbor velocity, seeking the neighbor centroid, and inverse-distance
/// repulsion.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SteeringConfig {
    pub max_speed: f32,
    pub max_force: f32,
    pub velocity_matching_weight: f32,
    pub centroid_seeking_weight: f32,
    pub separation_weight: f32,
    /// Neighbor buffer size. `None` sizes it to a quarter of the population.
    pub neighbor_capacity: Option<usize>,
    pub overflow: OverflowPolicy,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            max_speed: 3.0,
            max_force: 0.6,
            velocity_matching_weight: 1.0,
            centroid_seeking_weight: 1.0,
            separation_weight: 1.05,
            neighbor_capacity: None,
            overflow: OverflowPolicy::Fail,
        }
    }
}

/// Run length, fleet size and bookkeeping.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RunConfig {
    pub steps: u64,
    pub nodes: usize,
    /// Worker threads per node. `None` uses the global rayon pool.
    pub threads: Option<usize>,
    pub log_interval: u64,
    pub record_paths: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            steps: 1000,
            nodes: 1,
            threads: None,
            log_interval: 100,
            record_paths: false,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct AppConfig {
    pub world: WorldConfig,
    pub steering: SteeringConfig,
    pub run: RunConfig,
}

impl AppConfig {
    /// Number of cells along one axis: the largest count whose cells are
    /// still at least one sensing radius wide, so a 27-cell neighborhood
    /// always covers the full sensing sphere.
    #[must_use]
    pub fn cells_per_axis(&self) -> usize {
        ((self.world.length / self.world.sensing_radius).floor() as usize).max(1)
    }

    #[must_use]
    pub fn neighbor_capacity(&self) -> usize {
        self.steering
            .neighbor_capacity
            .unwrap_or(self.world.population / 4)
            .max(1)
    }

    /// Validates configuration values.
    ///
    /// Returns an error if any value is out of range. Agent ids and cell
    /// indices travel as 32-bit integers, which bounds both counts.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.world.length.is_finite() && self.world.length > 0.0,
            "World length must be positive and finite"
        );
        anyhow::ensure!(
            self.world.sensing_radius.is_finite() && self.world.sensing_radius > 0.0,
            "Sensing radius must be positive and finite"
        );
        anyhow::ensure!(
            self.world.sensing_radius <= self.world.length,
            "Sensing radius must not exceed the world length"
        );
        anyhow::ensure!(self.world.population > 0, "Population must be positive");
        anyhow::ensure!(
            self.world.population <= i32::MAX as usize,
            "Population too large for 32-bit agent ids"
        );
        let cells = self.cells_per_axis();
        anyhow::ensure!(
            cells
                .checked_pow(3)
                .is_some_and(|total| total <= i32::MAX as usize),
            "Grid too fine: {cells}^3 cells exceed 32-bit cell indices"
        );

        anyhow::ensure!(
            self.steering.max_speed.is_finite() && self.steering.max_speed > 0.0,
            "Max speed must be positive"
        );
        anyhow::ensure!(
            self.steering.max_force.is_finite() && self.steering.max_force > 0.0,
            "Max force must be positive"
        );
        for (name, weight) in [
            ("Velocity matching", self.steering.velocity_matching_weight),
            ("Centroid seeking", self.steering.centroid_seeking_weight),
            ("Separation", self.steering.separation_weight),
        ] {
            anyhow::ensure!(
                weight.is_finite() && weight >= 0.0,
                "{name} weight must be non-negative"
            );
        }
        if let Some(capacity) = self.steering.neighbor_capacity {
            anyhow::ensure!(capacity > 0, "Neighbor capacity must be positive");
        }

        anyhow::ensure!(self.run.nodes > 0, "Node count must be positive");
        if let Some(threads) = self.run.threads {
            anyhow::ensure!(threads > 0, "Thread count must be positive");
        }
        anyhow::ensure!(self.run.log_interval > 0, "Log interval must be positive");

        Ok(())
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Digest of everything that influences the simulated trajectory.
    ///
    /// Thread count, logging and path recording are excluded: nodes may
    /// differ there and still stay bit-identical.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(format!("{:?}", self.world).as_bytes());
        hasher.update(format!("{:?}", self.steering).as_bytes());
        hasher.update(self.run.steps.to_le_bytes());
        hasher.update(self.run.nodes.to_le_bytes());
        hex::encode(hasher.finalize())
    }
}
