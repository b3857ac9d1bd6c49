//! Agent kinematics and the three local steering rules.
//!
//! Every rule reads neighbor state from a per-step snapshot slice, so one
//! agent's update never observes another agent's half-finished step.

use crate::config::{AppConfig, OverflowPolicy, SteeringConfig};
use crate::error::{Result, StepError};
use crate::spatial_grid::SpatialGrid;
use flock_data::{Agent, AgentSnapshot, Neighbor};
use glam::Vec3;

/// Shared, read-only inputs of the integration phase.
pub struct SteeringContext<'a> {
    pub grid: &'a SpatialGrid,
    pub snapshots: &'a [AgentSnapshot],
    pub config: &'a AppConfig,
}

/// Unweighted output of each rule for one step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SteeringForces {
    pub velocity_matching: Vec3,
    pub centroid_seeking: Vec3,
    pub separation: Vec3,
}

impl SteeringForces {
    #[must_use]
    pub fn weighted_sum(&self, steering: &SteeringConfig) -> Vec3 {
        self.velocity_matching * steering.velocity_matching_weight
            + self.centroid_seeking * steering.centroid_seeking_weight
            + self.separation * steering.separation_weight
    }
}

/// Scales `v` to length `magnitude`. The zero vector stays zero.
#[inline]
#[must_use]
pub fn normalize_to(v: Vec3, magnitude: f32) -> Vec3 {
    v.normalize_or_zero() * magnitude
}

/// Whether an agent at squared distance `dist_sq` is sensed. Agents at the
/// exact same position are not, since no repulsion direction exists.
#[inline]
#[must_use]
pub fn in_sensing_range(dist_sq: f32, radius: f32) -> bool {
    dist_sq > 0.0 && dist_sq < radius * radius
}

/// Wraps each coordinate into `[0, length)` (toroidal volume).
#[must_use]
pub fn wrap_position(position: Vec3, length: f32) -> Vec3 {
    let wrap = |p: f32| {
        if (0.0..length).contains(&p) {
            return p;
        }
        let w = p.rem_euclid(length);
        // rem_euclid can round up to `length` for tiny negative inputs
        if w >= length {
            0.0
        } else {
            w
        }
    };
    Vec3::new(wrap(position.x), wrap(position.y), wrap(position.z))
}

pub trait SteeringLogic {
    /// Fills the neighbor buffer from the cached neighborhood. Returns the
    /// number of neighbors found.
    fn gather_neighbors(&mut self, ctx: &SteeringContext) -> Result<usize>;

    /// Steer toward the average neighbor velocity.
    fn velocity_matching(&self, snapshots: &[AgentSnapshot], steering: &SteeringConfig) -> Vec3;

    /// Steer toward the centroid of neighbor positions.
    fn centroid_seeking(&self, snapshots: &[AgentSnapshot], steering: &SteeringConfig) -> Vec3;

    /// Steer away from neighbors, closer ones weighing more.
    fn separation(&self, snapshots: &[AgentSnapshot], steering: &SteeringConfig) -> Vec3;

    fn steering_forces(
        &self,
        snapshots: &[AgentSnapshot],
        steering: &SteeringConfig,
    ) -> SteeringForces {
        SteeringForces {
            velocity_matching: self.velocity_matching(snapshots, steering),
            centroid_seeking: self.centroid_seeking(snapshots, steering),
            separation: self.separation(snapshots, steering),
        }
    }

    /// Applies the weighted forces and advances one step.
    fn integrate(&mut self, forces: &SteeringForces, config: &AppConfig);

    /// Full per-step update: sense, steer, integrate.
    fn update(&mut self, ctx: &SteeringContext) -> Result<SteeringForces>;
}

impl SteeringLogic for Agent {
    fn gather_neighbors(&mut self, ctx: &SteeringContext) -> Result<usize> {
        let radius = ctx.config.world.sensing_radius;
        let policy = ctx.config.steering.overflow;
        self.neighbors.clear();

        for &cell in self.neighborhood.as_slice() {
            for &other in ctx.grid.cell(cell) {
                if other == self.id {
                    continue;
                }
                let dist_sq = (ctx.snapshots[other].position - self.position).length_squared();
                if !in_sensing_range(dist_sq, radius) {
                    continue;
                }
                // Square root only for agents actually in range.
                let neighbor = Neighbor {
                    id: other,
                    distance: dist_sq.sqrt(),
                };
                if !self.neighbors.push(neighbor) {
                    let capacity = self.neighbors.capacity();
                    match policy {
                        OverflowPolicy::Fail => {
                            return Err(StepError::NeighborOverflow {
                                agent: self.id,
                                capacity,
                            });
                        }
                        OverflowPolicy::Grow => {
                            let grown = capacity.max(1) * 2;
                            tracing::debug!(agent = self.id, capacity, grown, "Growing neighbor buffer");
                            self.neighbors.grow_to(grown);
                            self.neighbors.push(neighbor);
                        }
                    }
                }
            }
        }
        Ok(self.neighbors.len())
    }

    fn velocity_matching(&self, snapshots: &[AgentSnapshot], steering: &SteeringConfig) -> Vec3 {
        let neighbors = self.neighbors.as_slice();
        if neighbors.is_empty() {
            return Vec3::ZERO;
        }
        let average = neighbors
            .iter()
            .map(|n| snapshots[n.id].velocity)
            .sum::<Vec3>()
            / neighbors.len() as f32;
        let desired = normalize_to(average, steering.max_speed);
        normalize_to(desired - self.velocity, steering.max_force)
    }

    fn centroid_seeking(&self, snapshots: &[AgentSnapshot], steering: &SteeringConfig) -> Vec3 {
        let neighbors = self.neighbors.as_slice();
        if neighbors.is_empty() {
            return Vec3::ZERO;
        }
        let centroid = neighbors
            .iter()
            .map(|n| snapshots[n.id].position)
            .sum::<Vec3>()
            / neighbors.len() as f32;
        let desired = normalize_to(centroid - self.position, steering.max_speed);
        (desired - self.velocity).clamp_length_max(steering.max_force)
    }

    fn separation(&self, snapshots: &[AgentSnapshot], steering: &SteeringConfig) -> Vec3 {
        let neighbors = self.neighbors.as_slice();
        if neighbors.is_empty() {
            return Vec3::ZERO;
        }
        let push = neighbors
            .iter()
            .map(|n| {
                let away = (self.position - snapshots[n.id].position) / n.distance;
                away / n.distance
            })
            .sum::<Vec3>()
            / neighbors.len() as f32;
        let desired = normalize_to(push, steering.max_speed);
        (desired - self.velocity).clamp_length_max(steering.max_force)
    }

    fn integrate(&mut self, forces: &SteeringForces, config: &AppConfig) {
        self.acceleration = forces.weighted_sum(&config.steering);
        self.velocity = (self.velocity + self.acceleration).clamp_length_max(config.steering.max_speed);
        self.position = wrap_position(self.position + self.velocity, config.world.length);
        self.acceleration = Vec3::ZERO;
    }

    fn update(&mut self, ctx: &SteeringContext) -> Result<SteeringForces> {
        self.gather_neighbors(ctx)?;
        let forces = self.steering_forces(ctx.snapshots, &ctx.config.steering);
        self.integrate(&forces, ctx.config);
        Ok(forces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.world.length = 100.0;
        config.world.sensing_radius = 10.0;
        config.world.population = 8;
        config
    }

    fn prepare(agents: &mut [Agent], config: &AppConfig) -> (SpatialGrid, Vec<AgentSnapshot>) {
        let mut grid = SpatialGrid::from_config(config).unwrap();
        grid.build(agents);
        for agent in agents.iter_mut() {
            grid.refresh_neighborhood(agent);
        }
        let snapshots = agents.iter().map(Agent::snapshot).collect();
        (grid, snapshots)
    }

    #[test]
    fn test_normalize_zero_is_zero() {
        assert_eq!(normalize_to(Vec3::ZERO, 3.0), Vec3::ZERO);
        let v = normalize_to(Vec3::new(0.0, 4.0, 0.0), 3.0);
        assert!((v - Vec3::new(0.0, 3.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_wrap_position() {
        let p = wrap_position(Vec3::new(100.0, -1.0, 101.5), 100.0);
        assert_eq!(p.x, 0.0);
        assert!((p.y - 99.0).abs() < 1e-4);
        assert!((p.z - 1.5).abs() < 1e-4);
        assert_eq!(wrap_position(Vec3::splat(50.0), 100.0), Vec3::splat(50.0));
        assert!(wrap_position(Vec3::new(-1e-9, 0.0, 0.0), 100.0).x < 100.0);
    }

    #[test]
    fn test_gather_excludes_self_and_far_agents() {
        let config = config();
        let mut agents = vec![
            Agent::new(0, Vec3::splat(50.0), Vec3::ZERO, 4),
            Agent::new(1, Vec3::new(55.0, 50.0, 50.0), Vec3::ZERO, 4),
            Agent::new(2, Vec3::new(65.0, 50.0, 50.0), Vec3::ZERO, 4),
        ];
        let (grid, snapshots) = prepare(&mut agents, &config);
        let ctx = SteeringContext {
            grid: &grid,
            snapshots: &snapshots,
            config: &config,
        };
        assert_eq!(agents[0].gather_neighbors(&ctx).unwrap(), 1);
        assert_eq!(agents[0].neighbors.as_slice()[0].id, 1);
        assert!((agents[0].neighbors.as_slice()[0].distance - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_overflow_fails_by_default() {
        let config = config();
        let mut agents: Vec<Agent> = (0..4)
            .map(|i| Agent::new(i, Vec3::new(50.0 + i as f32, 50.0, 50.0), Vec3::ZERO, 2))
            .collect();
        let (grid, snapshots) = prepare(&mut agents, &config);
        let ctx = SteeringContext {
            grid: &grid,
            snapshots: &snapshots,
            config: &config,
        };
        assert_eq!(
            agents[0].gather_neighbors(&ctx),
            Err(StepError::NeighborOverflow {
                agent: 0,
                capacity: 2
            })
        );
    }

    #[test]
    fn test_overflow_grows_when_configured() {
        let mut config = config();
        config.steering.overflow = OverflowPolicy::Grow;
        let mut agents: Vec<Agent> = (0..6)
            .map(|i| Agent::new(i, Vec3::new(50.0 + i as f32, 50.0, 50.0), Vec3::ZERO, 1))
            .collect();
        let (grid, snapshots) = prepare(&mut agents, &config);
        let ctx = SteeringContext {
            grid: &grid,
            snapshots: &snapshots,
            config: &config,
        };
        assert_eq!(agents[0].gather_neighbors(&ctx).unwrap(), 5);
        assert!(agents[0].neighbors.capacity() >= 5);
    }

    #[test]
    fn test_no_neighbors_means_zero_forces() {
        let config = config();
        let agent = Agent::new(0, Vec3::splat(50.0), Vec3::new(1.0, 0.0, 0.0), 4);
        let forces = agent.steering_forces(&[agent.snapshot()], &config.steering);
        assert_eq!(forces, SteeringForces::default());
    }

    #[test]
    fn test_velocity_matching_is_normalized_to_max_force() {
        let config = config();
        let mut agents = vec![
            Agent::new(0, Vec3::splat(50.0), Vec3::ZERO, 4),
            Agent::new(1, Vec3::new(52.0, 50.0, 50.0), Vec3::new(0.0, 2.0, 0.0), 4),
        ];
        let (grid, snapshots) = prepare(&mut agents, &config);
        let ctx = SteeringContext {
            grid: &grid,
            snapshots: &snapshots,
            config: &config,
        };
        agents[0].gather_neighbors(&ctx).unwrap();
        let force = agents[0].velocity_matching(&snapshots, &config.steering);
        assert!((force.length() - config.steering.max_force).abs() < 1e-5);
        assert!(force.y > 0.0);
    }

    #[test]
    fn test_integrate_resets_acceleration_and_wraps() {
        let config = config();
        let mut agent = Agent::new(0, Vec3::new(99.5, 50.0, 50.0), Vec3::new(1.0, 0.0, 0.0), 4);
        agent.integrate(&SteeringForces::default(), &config);
        assert_eq!(agent.acceleration, Vec3::ZERO);
        assert!((agent.position.x - 0.5).abs() < 1e-4);
        assert_eq!(agent.velocity, Vec3::new(1.0, 0.0, 0.0));
    }
}
