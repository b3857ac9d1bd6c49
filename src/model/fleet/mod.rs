//! Multi-node step driver.
//!
//! Every node holds a full replica of the population and grid but computes
//! only its own partition. One step:
//! 1. every node advances its partition and detects cell changes
//! 2. participants send partition state and deltas to the coordinator
//! 3. the coordinator merges deltas in ascending partition order, applies
//!    them, then broadcasts the merged deltas and the whole population
//! 4. participants apply the same deltas and overwrite their population

use crate::model::config::AppConfig;
use crate::model::partition::{Partition, COORDINATOR_RANK};
use crate::model::population::{population_rng, spawn_population};
use crate::model::world::World;
use anyhow::Context;
use flock_data::{Agent, CellMove, Vec3};
use flock_io::replication::{
    broadcast_agents, broadcast_moves, exchange_handshake, recv_moves, recv_partition,
    send_moves, send_partition, Handshake,
};
use flock_io::{Communicator, IoError};
use std::time::Instant;

pub mod runner;

pub use runner::{run_local_fleet, NodeOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Coordinator,
    Participant,
}

impl Role {
    #[must_use]
    pub fn of_rank(rank: usize) -> Self {
        if rank == COORDINATOR_RANK {
            Self::Coordinator
        } else {
            Self::Participant
        }
    }
}

/// One node of a lock-step fleet.
pub struct FleetNode<C: Communicator> {
    comm: C,
    role: Role,
    world: World,
    buf: Vec<f32>,
}

impl<C: Communicator> FleetNode<C> {
    /// Handshake, initial distribution and grid build.
    ///
    /// The coordinator spawns the population and broadcasts it; participants
    /// start from placeholders that the broadcast overwrites.
    pub fn join(comm: C, config: AppConfig) -> anyhow::Result<Self> {
        config.validate()?;
        anyhow::ensure!(
            comm.size() == config.run.nodes,
            "Group has {} nodes, config expects {}",
            comm.size(),
            config.run.nodes
        );
        let rank = comm.rank();
        let role = Role::of_rank(rank);

        exchange_handshake(&comm, COORDINATOR_RANK, &Handshake::from_config(&config))?;
        tracing::debug!(rank, ?role, "Handshake complete");

        let mut agents = match role {
            Role::Coordinator => spawn_population(&config, &mut population_rng(&config)),
            Role::Participant => {
                let capacity = config.neighbor_capacity();
                (0..config.world.population)
                    .map(|id| Agent::new(id, Vec3::ZERO, Vec3::ZERO, capacity))
                    .collect()
            }
        };
        let mut buf = Vec::new();
        broadcast_agents(&comm, COORDINATOR_RANK, &mut agents, &mut buf)
            .context("Initial population distribution failed")?;

        let partition = Partition::for_rank(config.world.population, config.run.nodes, rank);
        let mut world = World::from_agents(config, agents)?;
        world.set_owned(partition)?;
        world.metrics.restart_clock();

        Ok(Self {
            comm,
            role,
            world,
            buf,
        })
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn rank(&self) -> usize {
        self.comm.rank()
    }

    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    #[must_use]
    pub fn into_world(self) -> World {
        self.world
    }

    /// One full step-and-sync cycle. Returns the merged delta count.
    pub fn step(&mut self) -> anyhow::Result<usize> {
        let started = Instant::now();
        let local = self.world.advance_partition()?;
        let merged = match self.role {
            Role::Coordinator => self.coordinate(&local)?,
            Role::Participant => self.participate(&local)?,
        };
        tracing::debug!(
            rank = self.rank(),
            step = self.world.step + 1,
            moves = merged.len(),
            "Step synchronised"
        );
        self.world.finish_step(started, merged.len());
        Ok(merged.len())
    }

    /// Runs `config.run.steps` steps and reports.
    pub fn run(mut self) -> anyhow::Result<NodeOutcome> {
        let rank = self.rank();
        for _ in 0..self.world.config.run.steps {
            self.step()
                .with_context(|| format!("Node {rank} failed at step {}", self.world.step + 1))?;
        }
        let report = self.world.report(rank, self.comm.size());
        Ok(NodeOutcome {
            report,
            world: self.world,
        })
    }

    /// Gathers every participant's partition and deltas and merges them in
    /// [`Partition::all`] order: participants 1.. first, the coordinator's own
    /// deltas last. That is ascending agent id, the order the single-node
    /// driver applies moves in, so fleet and single-node runs stay
    /// bit-identical. Appending the coordinator's deltas first would break
    /// that equivalence.
    fn coordinate(&mut self, local: &[CellMove]) -> anyhow::Result<Vec<CellMove>> {
        let population = self.world.agents.len();
        let mut merged = Vec::with_capacity(local.len());

        for (rank, partition) in Partition::all(population, self.comm.size()) {
            if rank == COORDINATOR_RANK {
                merged.extend_from_slice(local);
                continue;
            }
            recv_partition(
                &self.comm,
                rank,
                &mut self.world.agents,
                partition.range(),
                &mut self.buf,
            )?;
            let moves = recv_moves(&self.comm, rank)?;
            if let Some(mv) = moves.iter().find(|mv| !partition.contains(mv.agent)) {
                return Err(IoError::malformed(format!(
                    "node {rank} sent a delta for agent {} outside {}..{}",
                    mv.agent, partition.start, partition.end
                ))
                .into());
            }
            merged.extend(moves);
        }

        self.world.apply_moves(&merged)?;
        broadcast_moves(&self.comm, COORDINATOR_RANK, &mut merged)?;
        broadcast_agents(
            &self.comm,
            COORDINATOR_RANK,
            &mut self.world.agents,
            &mut self.buf,
        )?;
        Ok(merged)
    }

    fn participate(&mut self, local: &[CellMove]) -> anyhow::Result<Vec<CellMove>> {
        let owned = self.world.owned().range();
        send_partition(
            &self.comm,
            COORDINATOR_RANK,
            &self.world.agents,
            owned,
            &mut self.buf,
        )?;
        send_moves(&self.comm, COORDINATOR_RANK, local)?;

        let mut merged = Vec::new();
        broadcast_moves(&self.comm, COORDINATOR_RANK, &mut merged)?;
        broadcast_agents(
            &self.comm,
            COORDINATOR_RANK,
            &mut self.world.agents,
            &mut self.buf,
        )?;
        self.world.apply_moves(&merged)?;
        Ok(merged)
    }
}
