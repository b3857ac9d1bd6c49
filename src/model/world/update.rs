use crate::model::error::StepError;
use crate::model::steering::{SteeringContext, SteeringLogic};
use crate::model::world::World;
use flock_data::{Agent, CellMove};
use rayon::prelude::*;
use std::time::Instant;

impl World {
    /// Advances every agent by one step on this node.
    ///
    /// Phases:
    /// - Snapshot the population so rules read start-of-step state
    /// - Refresh cached neighborhoods (parallel, grid read-only)
    /// - Sense, steer and integrate (parallel, one agent per task)
    /// - Reconcile grid membership in ascending id order (serial)
    ///
    /// # Returns
    /// Number of agents that changed cell.
    pub fn update(&mut self) -> anyhow::Result<usize> {
        let started = Instant::now();
        let all = 0..self.agents.len();
        self.integrate_range(all)?;

        let mut moves = 0;
        for agent in &mut self.agents {
            if self.grid.detect_and_apply(agent)?.is_some() {
                moves += 1;
            }
        }

        self.finish_step(started, moves);
        Ok(moves)
    }

    /// Runs `config.run.steps` single-node steps.
    pub fn run(&mut self) -> anyhow::Result<()> {
        self.metrics.restart_clock();
        for _ in 0..self.config.run.steps {
            self.update()?;
        }
        Ok(())
    }

    /// Fleet half of a step: advances only the owned partition and reports
    /// the cell changes it would cause without touching the grid.
    pub fn advance_partition(&mut self) -> anyhow::Result<Vec<CellMove>> {
        let owned = self.owned().range();
        self.integrate_range(owned.clone())?;
        Ok(self.agents[owned]
            .iter()
            .filter_map(|agent| self.grid.detect_move(agent))
            .collect())
    }

    /// Replays index deltas in order. Every replica applies the same merged
    /// list, so every grid ends up identical.
    pub fn apply_moves(&mut self, moves: &[CellMove]) -> anyhow::Result<()> {
        for &mv in moves {
            self.grid.apply_remote_move(&mut self.agents, mv)?;
        }
        Ok(())
    }

    /// Closes a step: counters, progress log, path recording.
    pub fn finish_step(&mut self, started: Instant, moves: usize) {
        self.step += 1;
        self.metrics
            .record_step(started.elapsed(), self.agents.len(), moves);
        if self.config.run.record_paths {
            let owned = self.owned().range();
            self.paths
                .push(self.agents[owned].iter().map(|a| a.position).collect());
        }
        if tracing::enabled!(tracing::Level::TRACE) {
            tracing::trace!(step = self.step, fingerprint = %self.fingerprint(), "World state");
        }
    }

    fn capture_snapshots(&mut self) {
        self.agents
            .par_iter()
            .map(Agent::snapshot)
            .collect_into_vec(&mut self.snapshots);
    }

    fn integrate_range(&mut self, range: std::ops::Range<usize>) -> Result<(), StepError> {
        self.capture_snapshots();

        let ctx = SteeringContext {
            grid: &self.grid,
            snapshots: &self.snapshots,
            config: &self.config,
        };
        let step = |agents: &mut [Agent]| -> Result<(), StepError> {
            agents
                .par_iter_mut()
                .for_each(|agent| ctx.grid.refresh_neighborhood(agent));
            agents
                .par_iter_mut()
                .try_for_each(|agent| agent.update(&ctx).map(|_| ()))
        };

        let agents = &mut self.agents[range];
        match &self.pool {
            Some(pool) => pool.install(|| step(agents)),
            None => step(agents),
        }
    }
}
