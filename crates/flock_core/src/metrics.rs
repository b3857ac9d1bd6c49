//! Step metrics and structured logging for the simulation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Per-node step statistics.
pub struct Metrics {
    step_count: AtomicU64,
    cell_moves: AtomicU64,
    log_interval: u64,
    start_time: Instant,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Metrics {
    #[must_use]
    pub fn new(log_interval: u64) -> Self {
        Self {
            step_count: AtomicU64::new(0),
            cell_moves: AtomicU64::new(0),
            log_interval: log_interval.max(1),
            start_time: Instant::now(),
        }
    }

    /// Records a completed step.
    pub fn record_step(&self, duration: Duration, agents: usize, moves: usize) {
        let step = self.step_count.fetch_add(1, Ordering::Relaxed) + 1;
        self.cell_moves.fetch_add(moves as u64, Ordering::Relaxed);

        if step % self.log_interval == 0 {
            tracing::info!(
                step = step,
                agents = agents,
                moves = moves,
                duration_ms = duration.as_millis() as u64,
                "Simulation step"
            );
        }
    }

    #[must_use]
    pub fn step_count(&self) -> u64 {
        self.step_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn cell_moves(&self) -> u64 {
        self.cell_moves.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Restarts the wall clock, e.g. once initial distribution is done.
    pub fn restart_clock(&mut self) {
        self.start_time = Instant::now();
    }
}

/// End-of-run summary for one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub rank: usize,
    pub agents: usize,
    pub owned_agents: usize,
    pub steps: u64,
    pub nodes: usize,
    pub threads: usize,
    pub cell_moves: u64,
    pub elapsed_secs: f64,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = " --------------------------------";
        writeln!(f, "{rule}")?;
        writeln!(f, "|  Number of Boids   |{:>10}|", self.agents)?;
        writeln!(f, "{rule}")?;
        writeln!(f, "|  Number of Steps   |{:>10}|", self.steps)?;
        writeln!(f, "{rule}")?;
        writeln!(f, "|   Number of Nodes  |{:>10}|", self.nodes)?;
        writeln!(f, "{rule}")?;
        writeln!(f, "|Number of Processors|{:>10}|", self.threads)?;
        writeln!(f, "{rule}")?;
        writeln!(f, "|  Total Processors  |{:>10}|", self.nodes * self.threads)?;
        writeln!(f, "{rule}")?;
        writeln!(f, "|    Time taken/s    |{:>10.4}|", self.elapsed_secs)?;
        write!(f, "{rule}")
    }
}

/// Initialize tracing subscriber for logging. `RUST_LOG` overrides the
/// default `info` level.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_env_filter(filter)
            .finish(),
    )
    .ok();
}
