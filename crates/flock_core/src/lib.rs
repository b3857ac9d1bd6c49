//! # Flock Core
//!
//! The simulation engine for distributed boid flocking.
//!
//! This crate contains the deterministic per-step logic:
//! - Uniform 3-D spatial grid with 27-cell periodic neighborhoods
//! - Steering rules (velocity matching, centroid seeking, separation)
//! - Toroidal kinematic integration
//! - Static contiguous partitioning of agents across nodes
//! - Typed configuration, step metrics and structured logging
//!
//! ## Example
//!
//! ```
//! use flock_core::config::AppConfig;
//! use flock_core::population::{population_rng, spawn_population};
//! use flock_core::spatial_grid::SpatialGrid;
//!
//! let mut config = AppConfig::default();
//! config.world.population = 32;
//! config.world.seed = Some(42);
//!
//! let mut agents = spawn_population(&config, &mut population_rng(&config));
//! let mut grid = SpatialGrid::from_config(&config).unwrap();
//! grid.build(&mut agents);
//! assert_eq!(grid.member_count(), 32);
//! ```

/// Configuration management for simulation parameters
pub mod config;
/// Error taxonomy for grid and steering failures
pub mod error;
/// Step metrics, run reports and logging setup
pub mod metrics;
/// Per-node ownership ranges
pub mod partition;
/// Initial population generation
pub mod population;
/// Uniform spatial grid for neighbor queries
pub mod spatial_grid;
/// Steering rules and kinematic integration
pub mod steering;

pub use config::{AppConfig, OverflowPolicy};
pub use error::StepError;
pub use metrics::{init_logging, Metrics, RunReport};
pub use partition::{Partition, COORDINATOR_RANK};
pub use spatial_grid::SpatialGrid;
pub use steering::{SteeringContext, SteeringForces, SteeringLogic};
