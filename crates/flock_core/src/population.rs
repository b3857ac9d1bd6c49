//! Initial population generation.

use crate::config::AppConfig;
use flock_data::{Agent, Vec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seeded generator for the configured population, entropy-seeded when the
/// config carries no seed.
#[must_use]
pub fn population_rng(config: &AppConfig) -> ChaCha8Rng {
    match config.world.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

/// Creates `config.world.population` agents.
///
/// Positions are uniform in the middle half of the volume on every axis.
/// Velocity components are uniform in `[-max_speed, max_speed)`, then capped
/// to `max_speed` in magnitude.
pub fn spawn_population<R: Rng>(config: &AppConfig, rng: &mut R) -> Vec<Agent> {
    let length = config.world.length;
    let max_speed = config.steering.max_speed;
    let capacity = config.neighbor_capacity();

    (0..config.world.population)
        .map(|id| {
            let mut velocity = Vec3::ZERO;
            let mut position = Vec3::ZERO;
            for axis in 0..3 {
                velocity[axis] = rng.gen_range(-max_speed..max_speed);
                position[axis] = rng.gen_range(length / 4.0..3.0 * length / 4.0);
            }
            Agent::new(id, position, velocity.clamp_length_max(max_speed), capacity)
        })
        .collect()
}
