mod common;

use common::WorldBuilder;
use flock_data::{Agent, AgentSnapshot, Vec3};
use flock_lib::model::config::AppConfig;
use flock_lib::model::spatial_grid::SpatialGrid;
use flock_lib::model::steering::{SteeringContext, SteeringForces};
use flock_lib::model::SteeringLogic;
use proptest::prelude::*;

fn forces_for(agents: &mut [Agent], config: &AppConfig) -> Vec<SteeringForces> {
    let mut grid = SpatialGrid::from_config(config).unwrap();
    grid.build(agents);
    let snapshots: Vec<AgentSnapshot> = agents.iter().map(Agent::snapshot).collect();
    let ctx = SteeringContext {
        grid: &grid,
        snapshots: &snapshots,
        config,
    };
    agents
        .iter_mut()
        .map(|agent| {
            grid.refresh_neighborhood(agent);
            agent.gather_neighbors(&ctx).unwrap();
            agent.steering_forces(&snapshots, &config.steering)
        })
        .collect()
}

#[test]
fn test_two_resting_agents_push_apart() {
    let builder = WorldBuilder::new()
        .with_agent(Vec3::splat(50.0), Vec3::ZERO)
        .with_agent(Vec3::new(51.0, 50.0, 50.0), Vec3::ZERO);
    let config = builder.config();
    let mut world = builder.build();

    let mut agents = world.agents.clone();
    let forces = forces_for(&mut agents, &config);
    let max_force = config.steering.max_force;

    // Identical velocities: nothing to match.
    assert_eq!(forces[0].velocity_matching, Vec3::ZERO);
    assert_eq!(forces[1].velocity_matching, Vec3::ZERO);

    // Repulsion along the axis joining them, equal and opposite.
    assert!((forces[0].separation - Vec3::new(-max_force, 0.0, 0.0)).length() < 1e-6);
    assert_eq!(forces[0].separation, -forces[1].separation);

    // With a single neighbor the centroid is that neighbor.
    assert!((forces[0].centroid_seeking - Vec3::new(max_force, 0.0, 0.0)).length() < 1e-6);
    assert_eq!(forces[0].centroid_seeking, -forces[1].centroid_seeking);

    // Separation weighs slightly more than centroid seeking, so they part.
    world.update().unwrap();
    let gap = world.agents[1].position - world.agents[0].position;
    assert!(gap.x > 1.0, "agents drew together: {gap}");
    assert_eq!(gap.y, 0.0);
    assert_eq!(world.agents[0].velocity, -world.agents[1].velocity);
    assert!(world.agents.iter().all(|a| a.acceleration == Vec3::ZERO));
}

#[test]
fn test_lone_agent_drifts_on_inertia() {
    let velocity = Vec3::new(2.0, -1.5, 0.75);
    let mut world = WorldBuilder::new()
        .with_agent(Vec3::new(98.0, 1.0, 50.0), velocity)
        .build();

    for _ in 0..500 {
        world.update().unwrap();
        let agent = &world.agents[0];
        assert_eq!(agent.velocity, velocity);
        assert_eq!(agent.acceleration, Vec3::ZERO);
        assert!(agent.neighbors.is_empty());
        for c in agent.position.to_array() {
            assert!((0.0..100.0).contains(&c));
        }
    }
    assert_grid_consistent!(world);
}

#[test]
fn test_speed_cap_holds_in_a_dense_flock() {
    let mut world = WorldBuilder::new()
        .with_config(|c| {
            c.world.population = 300;
            c.world.length = 60.0;
            c.steering.neighbor_capacity = Some(300);
        })
        .build();
    let max_speed = world.config.steering.max_speed;
    for _ in 0..30 {
        world.update().unwrap();
        for agent in &world.agents {
            assert!(agent.velocity.length() <= max_speed + 1e-4);
        }
    }
    assert_grid_consistent!(world);
}

prop_compose! {
    fn arb_agent_state()(
        px in 40.0f32..60.0,
        py in 40.0f32..60.0,
        pz in 40.0f32..60.0,
        vx in -3.0f32..3.0,
        vy in -3.0f32..3.0,
        vz in -3.0f32..3.0
    ) -> (Vec3, Vec3) {
        (Vec3::new(px, py, pz), Vec3::new(vx, vy, vz))
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_rule_forces_never_exceed_max_force(
        states in prop::collection::vec(arb_agent_state(), 1..40)
    ) {
        let config = WorldBuilder::new()
            .with_config(|c| {
                c.world.population = states.len();
                c.steering.neighbor_capacity = Some(states.len());
            })
            .config();
        let max_force = config.steering.max_force;
        let mut agents: Vec<Agent> = states
            .iter()
            .enumerate()
            .map(|(id, &(p, v))| Agent::new(id, p, v, states.len()))
            .collect();

        let forces = forces_for(&mut agents, &config);
        for (agent, forces) in agents.iter().zip(&forces) {
            for force in [forces.velocity_matching, forces.centroid_seeking, forces.separation] {
                prop_assert!(force.is_finite());
                prop_assert!(force.length() <= max_force + 1e-4, "agent {}: {}", agent.id, force);
            }
            if agent.neighbors.is_empty() {
                prop_assert_eq!(*forces, SteeringForces::default());
            }
        }
    }
}
