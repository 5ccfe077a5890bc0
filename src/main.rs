//! `flagtune` command line.
//!
//! Usage:
//!   flagtune [OPTIONS] <INFILE>
//!
//! Exit status: 0 after a completed run (result file written), 1 on a fatal
//! error, 130 when cancelled by a signal.

use clap::{Parser, Subcommand};
use flagtune::orchestrator::{self, Orchestrator, TuneConfig, WorkerInput};
use flagtune::params::Catalog;
use flagtune::search::Strategy;
use flagtune::{CancelToken, Result, TuneError};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "flagtune")]
#[command(author, version, about, long_about = None)]
#[command(subcommand_negates_reqs = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Input file, passed to the tool as its last argument
    #[arg(required = true)]
    infile: Option<PathBuf>,

    /// Number of worker processes
    #[arg(long, default_value_t = 1)]
    workers: usize,

    /// Timeout of one target tool run
    #[arg(long, value_name = "SECS", default_value_t = 600)]
    target_tool_timeout: u64,

    /// Random-search iterations or GA generations
    #[arg(long, default_value_t = 6)]
    iterations: usize,

    /// Search strategy: random, ga
    #[arg(long, default_value = "random")]
    strategy: String,

    /// Target tool command, split on spaces
    #[arg(long, default_value = "z3")]
    tool: String,

    /// Declaration file, one `key = value (type)` per line
    #[arg(long, value_name = "FILE")]
    catalog: Option<PathBuf>,

    /// GA population size
    #[arg(long, default_value_t = 10)]
    population: usize,

    /// GA parent selection: tournament[:K], roulette, rank
    #[arg(long, default_value = "tournament:3")]
    selection: String,

    /// Address-space limit of the tool
    #[arg(long, value_name = "MIB")]
    memory_limit: Option<u64>,

    /// Base random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Directory receiving the result file
    #[arg(long, value_name = "DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Log every evaluation
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Run one search from a JSON job on stdin (used by the worker pool)
    #[command(hide = true)]
    Worker,
}

impl Cli {
    fn tune_config(&self, infile: PathBuf) -> Result<TuneConfig> {
        let catalog = match &self.catalog {
            Some(path) => Catalog::from_path(path)?,
            None => Catalog::builtin(),
        };
        let mut config = TuneConfig::new(infile)
            .with_tool(&self.tool)
            .with_declarations(catalog.declarations().to_vec())
            .with_strategy(Strategy::from_name(&self.strategy))
            .with_iterations(self.iterations)
            .with_workers(self.workers)
            .with_tool_timeout(Duration::from_secs(self.target_tool_timeout))
            .with_population_size(self.population)
            .with_selection(self.selection.parse().map_err(TuneError::InvalidConfig)?)
            .with_output_dir(&self.output_dir);
        if let Some(mib) = self.memory_limit {
            config = config.with_memory_limit(mib.saturating_mul(1 << 20));
        }
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        Ok(config)
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn tune(cli: &Cli, cancel: &CancelToken) -> Result<()> {
    let infile = cli
        .infile
        .clone()
        .ok_or_else(|| TuneError::InvalidConfig("missing input file".into()))?;
    if !infile.is_file() {
        return Err(TuneError::InputNotFound(infile));
    }

    let config = cli.tune_config(infile)?;
    let report = Orchestrator::run(&config, cancel).await?;

    info!("writing result file");
    let path = report.write_to(&config.output_dir)?;
    info!(path = %path.display(), min_time = report.min_time, "done");
    Ok(())
}

async fn work(cancel: &CancelToken) -> Result<()> {
    let mut raw = Vec::new();
    tokio::io::stdin().read_to_end(&mut raw).await?;
    let input: WorkerInput = serde_json::from_slice(&raw)?;

    let report = orchestrator::run_worker(input, cancel).await?;

    let mut stdout = tokio::io::stdout();
    stdout.write_all(&serde_json::to_vec(&report)?).await?;
    stdout.flush().await?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cancel = CancelToken::new();
    let result = match orchestrator::signals::listen(cancel.clone()) {
        Ok(_) => match cli.command {
            Some(Command::Worker) => work(&cancel).await,
            None => tune(&cli, &cancel).await,
        },
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(TuneError::Cancelled) => {
            info!("cancelled, no result written");
            ExitCode::from(130)
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
