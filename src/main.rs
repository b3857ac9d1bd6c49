use anyhow::{Context, Result};
use clap::Parser;
use flock_lib::model::config::load_config;
use flock_lib::model::fleet::run_local_fleet;
use flock_lib::model::metrics::init_logging;
use flock_lib::model::partition::COORDINATOR_RANK;
use flock_lib::model::world::World;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Custom config file path
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Number of simulation steps
    #[arg(long)]
    steps: Option<u64>,

    /// Number of nodes in the fleet (1 runs the single-node driver)
    #[arg(short, long)]
    nodes: Option<usize>,

    /// Worker threads per node
    #[arg(short, long)]
    threads: Option<usize>,

    /// Seed for the initial population
    #[arg(long)]
    seed: Option<u64>,

    /// Print the run report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let mut config = load_config(&args.config)?;
    if let Some(steps) = args.steps {
        config.run.steps = steps;
    }
    if let Some(nodes) = args.nodes {
        config.run.nodes = nodes;
    }
    if let Some(threads) = args.threads {
        config.run.threads = Some(threads);
    }
    if let Some(seed) = args.seed {
        config.world.seed = Some(seed);
    }
    config.validate()?;

    tracing::info!(
        agents = config.world.population,
        steps = config.run.steps,
        nodes = config.run.nodes,
        "Starting simulation"
    );

    let report = if config.run.nodes == 1 {
        let mut world = World::new(config)?;
        world.run()?;
        world.report(COORDINATOR_RANK, 1)
    } else {
        run_local_fleet(&config)?
            .into_iter()
            .map(|outcome| outcome.report)
            .find(|report| report.rank == COORDINATOR_RANK)
            .context("Coordinator produced no report")?
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{report}");
    }
    Ok(())
}
