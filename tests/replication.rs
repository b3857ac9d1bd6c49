mod common;

use common::fleet_config;
use flock_data::{Agent, CellMove, Vec3};
use flock_lib::model::config::AppConfig;
use flock_lib::model::error::StepError;
use flock_lib::model::fleet::{run_local_fleet, FleetNode, Role};
use flock_lib::model::partition::Partition;
use flock_lib::model::replication::{
    broadcast_agents, exchange_handshake, send_moves, send_partition, Handshake,
};
use flock_lib::model::world::World;
use flock_io::{IoError, LocalGroup};
use std::thread;

fn io_error(err: &anyhow::Error) -> Option<&IoError> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<IoError>())
        .map(IoError::root)
}

#[test]
fn test_fleet_replicas_are_bit_identical() {
    for nodes in [2, 3, 4] {
        let config = fleet_config(90, nodes, 15);
        let outcomes = run_local_fleet(&config).unwrap();
        assert_eq!(outcomes.len(), nodes);

        let reference = &outcomes[0].world;
        for outcome in &outcomes {
            assert_same_replica!(outcome.world, reference);
            assert_grid_consistent!(outcome.world);
            assert_eq!(outcome.world.step, 15);
        }
        let owned: usize = outcomes.iter().map(|o| o.report.owned_agents).sum();
        assert_eq!(owned, 90);
    }
}

#[test]
fn test_fleet_matches_single_node_run() {
    let steps = 25;
    let fleet = run_local_fleet(&fleet_config(120, 3, steps)).unwrap();

    let mut single = World::new(fleet_config(120, 1, steps)).unwrap();
    single.run().unwrap();

    for outcome in &fleet {
        assert_same_replica!(outcome.world, single);
    }
    assert_eq!(
        fleet[0].report.cell_moves,
        single.metrics.cell_moves(),
        "merged delta counts differ"
    );
}

#[test]
fn test_fleet_paths_cover_population_in_partition_order() {
    let mut config = fleet_config(40, 3, 6);
    config.run.record_paths = true;
    let fleet = run_local_fleet(&config).unwrap();

    let mut single_config = config.clone();
    single_config.run.nodes = 1;
    let mut single = World::new(single_config).unwrap();
    single.run().unwrap();
    assert_eq!(single.paths.len(), 6);

    for step in 0..6 {
        let stitched: Vec<Vec3> = Partition::all(40, 3)
            .into_iter()
            .flat_map(|(rank, _)| fleet[rank].world.paths[step].clone())
            .collect();
        assert_eq!(stitched, single.paths[step]);
    }
}

fn drive_node(comm: LocalGroup, config: AppConfig, steps: u64) -> World {
    let mut node = FleetNode::join(comm, config).unwrap();
    for step in 1..=steps {
        node.step().unwrap();
        assert_eq!(node.world().step, step);
    }
    node.into_world()
}

#[test]
fn test_hand_driven_nodes_stay_in_lockstep() {
    let config = fleet_config(30, 2, 4);
    let mut group = LocalGroup::create(2);
    let participant = group.pop().unwrap();
    let coordinator = group.pop().unwrap();

    let participant_config = config.clone();
    let handle = thread::spawn(move || drive_node(participant, participant_config, 4));
    let coordinator_world = drive_node(coordinator, config, 4);
    let participant_world = handle.join().unwrap();

    assert_eq!(coordinator_world.owned(), Partition::for_rank(30, 2, 0));
    assert_eq!(participant_world.owned(), Partition::for_rank(30, 2, 1));
    assert_same_replica!(coordinator_world, participant_world);

    let mut single = World::new(fleet_config(30, 1, 4)).unwrap();
    single.run().unwrap();
    assert_same_replica!(coordinator_world, single);
}

#[test]
fn test_population_smaller_than_fleet() {
    let outcomes = run_local_fleet(&fleet_config(3, 4, 5)).unwrap();
    assert_eq!(outcomes[0].report.owned_agents, 3);
    for outcome in &outcomes[1..] {
        assert_eq!(outcome.report.owned_agents, 0);
        assert_same_replica!(outcome.world, outcomes[0].world);
    }
}

#[test]
fn test_handshake_rejects_mismatched_config() {
    let config = fleet_config(20, 2, 1);
    let mut other = config.clone();
    other.steering.separation_weight = 2.0;

    let mut group = LocalGroup::create(2);
    let participant = group.pop().unwrap();
    let coordinator = group.pop().unwrap();

    let handle = thread::spawn(move || FleetNode::join(coordinator, config).map(|_| ()));
    let err = FleetNode::join(participant, other).err().unwrap();
    assert!(matches!(io_error(&err), Some(IoError::ConfigMismatch { .. })));
    // The coordinator may or may not notice before its broadcast completes.
    let _ = handle.join().unwrap();
}

/// Drives rank 1 by hand so it can misbehave after a valid join.
fn rogue_participant(
    comm: LocalGroup,
    config: AppConfig,
    partition_len: usize,
    moves: Vec<CellMove>,
) {
    exchange_handshake(&comm, 0, &Handshake::from_config(&config)).unwrap();
    let mut agents: Vec<Agent> = (0..config.world.population)
        .map(|id| Agent::new(id, Vec3::ZERO, Vec3::ZERO, 1))
        .collect();
    let mut buf = Vec::new();
    broadcast_agents(&comm, 0, &mut agents, &mut buf).unwrap();
    send_partition(&comm, 0, &agents, 0..partition_len, &mut buf).unwrap();
    send_moves(&comm, 0, &moves).unwrap();
}

#[test]
fn test_coordinator_rejects_delta_outside_sender_partition() {
    let config = fleet_config(20, 2, 1);
    let mut group = LocalGroup::create(2);
    let participant = group.pop().unwrap();
    let coordinator = group.pop().unwrap();

    let rogue_config = config.clone();
    let rogue = thread::spawn(move || {
        let stolen = CellMove {
            from: 0,
            to: 1,
            agent: 15,
        };
        rogue_participant(participant, rogue_config, 10, vec![stolen]);
    });

    let mut node = FleetNode::join(coordinator, config).unwrap();
    assert_eq!(node.role(), Role::Coordinator);
    let err = node.step().unwrap_err();
    assert!(matches!(io_error(&err), Some(IoError::MalformedBuffer(_))));
    rogue.join().unwrap();
}

#[test]
fn test_coordinator_rejects_wrong_partition_size() {
    let config = fleet_config(20, 2, 1);
    let mut group = LocalGroup::create(2);
    let participant = group.pop().unwrap();
    let coordinator = group.pop().unwrap();

    let rogue_config = config.clone();
    let rogue = thread::spawn(move || {
        rogue_participant(participant, rogue_config, 7, Vec::new());
    });

    let mut node = FleetNode::join(coordinator, config).unwrap();
    let err = node.step().unwrap_err();
    assert!(
        matches!(
            io_error(&err),
            Some(IoError::SizeMismatch {
                expected: 60,
                found: 42
            })
        ),
        "unexpected error: {err:#}"
    );
    rogue.join().unwrap();
}

#[test]
fn test_failing_node_fails_the_whole_fleet() {
    let mut config = fleet_config(200, 3, 10);
    config.world.length = 40.0;
    config.steering.neighbor_capacity = Some(1);

    let err = match run_local_fleet(&config) {
        Ok(_) => panic!("dense fleet with one neighbor slot should overflow"),
        Err(e) => e,
    };
    let overflow = err
        .chain()
        .any(|cause| matches!(cause.downcast_ref::<StepError>(), Some(StepError::NeighborOverflow { .. })));
    assert!(overflow, "unexpected error: {err:#}");
}
