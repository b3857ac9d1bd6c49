//! # Flock
//!
//! Boids flocking on one node or across a lock-step fleet of nodes that
//! keep full replicas of the population and spatial grid.
//!
//! ```
//! use flock_lib::model::config::AppConfig;
//! use flock_lib::model::world::World;
//!
//! let mut config = AppConfig::default();
//! config.world.population = 50;
//! config.world.seed = Some(7);
//!
//! let mut world = World::new(config).unwrap();
//! world.update().unwrap();
//! assert_eq!(world.step, 1);
//! assert_eq!(world.grid.member_count(), 50);
//! ```

pub mod model;
