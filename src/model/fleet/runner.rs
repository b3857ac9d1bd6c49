use crate::model::config::AppConfig;
use crate::model::fleet::FleetNode;
use crate::model::metrics::RunReport;
use crate::model::world::World;
use flock_io::{IoError, LocalGroup};
use std::thread;

/// Final state of one fleet node.
pub struct NodeOutcome {
    pub report: RunReport,
    pub world: World,
}

/// Runs a whole fleet in this process, one thread per node, connected by a
/// [`LocalGroup`]. Outcomes come back in rank order.
///
/// A failing node drops its endpoints, so every peer waiting on it fails
/// with a disconnect instead of blocking. The error reported is the one
/// that caused the cascade.
pub fn run_local_fleet(config: &AppConfig) -> anyhow::Result<Vec<NodeOutcome>> {
    config.validate()?;
    let group = LocalGroup::create(config.run.nodes);
    tracing::info!(nodes = config.run.nodes, agents = config.world.population, "Starting fleet");

    let results: Vec<anyhow::Result<NodeOutcome>> = thread::scope(|scope| {
        let handles: Vec<_> = group
            .into_iter()
            .map(|comm| {
                let config = config.clone();
                scope.spawn(move || FleetNode::join(comm, config)?.run())
            })
            .collect();
        handles
            .into_iter()
            .enumerate()
            .map(|(rank, handle)| {
                handle
                    .join()
                    .unwrap_or_else(|_| Err(anyhow::anyhow!("Node {rank} panicked")))
            })
            .collect()
    });

    let mut outcomes = Vec::with_capacity(results.len());
    let mut failures = Vec::new();
    for result in results {
        match result {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => failures.push(e),
        }
    }
    if failures.is_empty() {
        return Ok(outcomes);
    }
    for e in &failures {
        tracing::debug!(error = %format!("{e:#}"), "Fleet node failed");
    }
    let root = failures
        .iter()
        .position(|e| !is_disconnect(e))
        .unwrap_or(0);
    Err(failures.swap_remove(root))
}

fn is_disconnect(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<IoError>())
        .any(IoError::is_disconnect)
}
