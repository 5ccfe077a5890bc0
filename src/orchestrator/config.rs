//! Run configuration.
//!
//! [`TuneConfig`] is built once from the command line, validated, and
//! passed by reference to the orchestrator and as JSON to each worker.

use crate::error::Result;
use crate::harness::{Harness, KILL_GRACE};
use crate::params::{Catalog, BUILTIN_DECLARATIONS};
use crate::search::genetic::{GaConfig, Selection};
use crate::search::{RandomConfig, Strategy};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Everything one tuning run needs.
///
/// # Builder Pattern
///
/// ```
/// use flagtune::orchestrator::TuneConfig;
/// use flagtune::search::Strategy;
/// use std::time::Duration;
///
/// let config = TuneConfig::new("query.smt2")
///     .with_tool("z3 -T:30")
///     .with_strategy(Strategy::Genetic)
///     .with_workers(4)
///     .with_tool_timeout(Duration::from_secs(60));
/// assert_eq!(config.tool, ["z3", "-T:30"]);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuneConfig {
    /// Target tool command line; flags and the input are appended.
    pub tool: Vec<String>,

    /// Input file handed to the tool as its last argument.
    pub input: PathBuf,

    /// `key = value (type)` declarations describing the search space.
    pub declarations: Vec<String>,

    pub strategy: Strategy,

    /// Random-search iterations, or GA generations.
    pub iterations: usize,

    /// Number of worker processes. `1` runs in-process.
    pub workers: usize,

    /// Wall-clock budget for one run of the tool.
    pub tool_timeout: Duration,

    /// Address-space ceiling for the tool, in bytes.
    pub memory_limit: Option<u64>,

    /// GA population size. Ignored by random search.
    pub population_size: usize,

    /// GA parent selection. Ignored by random search.
    pub selection: Selection,

    /// Base seed; worker `i` uses `seed + i`.
    pub seed: Option<u64>,

    /// Directory receiving the result file.
    pub output_dir: PathBuf,

    /// Grace period between SIGTERM and SIGKILL.
    pub kill_grace: Duration,
}

impl TuneConfig {
    /// Defaults: `z3`, built-in catalog, random search, 6 iterations, one
    /// worker, 600 s timeout.
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            tool: vec!["z3".to_string()],
            input: input.into(),
            declarations: BUILTIN_DECLARATIONS.iter().map(|d| d.to_string()).collect(),
            strategy: Strategy::Random,
            iterations: 6,
            workers: 1,
            tool_timeout: Duration::from_secs(600),
            memory_limit: None,
            population_size: 10,
            selection: Selection::default(),
            seed: None,
            output_dir: PathBuf::from("."),
            kill_grace: KILL_GRACE,
        }
    }

    /// Sets the tool from a command string, split on whitespace.
    pub fn with_tool(mut self, command: &str) -> Self {
        self.tool = command.split_whitespace().map(str::to_string).collect();
        self
    }

    pub fn with_declarations(mut self, declarations: Vec<String>) -> Self {
        self.declarations = declarations;
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_iterations(mut self, n: usize) -> Self {
        self.iterations = n;
        self
    }

    pub fn with_workers(mut self, n: usize) -> Self {
        self.workers = n;
        self
    }

    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    pub fn with_memory_limit(mut self, bytes: u64) -> Self {
        self.memory_limit = Some(bytes);
        self
    }

    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_kill_grace(mut self, grace: Duration) -> Self {
        self.kill_grace = grace;
        self
    }

    /// Validates the configuration.
    ///
    /// Returns `Err` with a description if any parameter is invalid.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.tool.is_empty() {
            return Err("tool command must not be empty".into());
        }
        if self.iterations == 0 {
            return Err("iterations must be at least 1".into());
        }
        if self.workers == 0 {
            return Err("workers must be at least 1".into());
        }
        if self.tool_timeout.is_zero() {
            return Err("target tool timeout must be positive".into());
        }
        if self.declarations.is_empty() {
            return Err("catalog declares no parameters".into());
        }
        if self.strategy == Strategy::Genetic {
            self.ga_config(None).validate()?;
        }
        Ok(())
    }

    /// Parses the declarations.
    pub fn catalog(&self) -> Result<Catalog> {
        Catalog::new(&self.declarations)
    }

    pub fn harness(&self) -> Harness {
        let harness = Harness::default().with_kill_grace(self.kill_grace);
        match self.memory_limit {
            Some(bytes) => harness.with_memory_limit(bytes),
            None => harness,
        }
    }

    /// Seed for worker `index`.
    pub fn worker_seed(&self, index: usize) -> Option<u64> {
        self.seed.map(|seed| seed.wrapping_add(index as u64))
    }

    pub fn random_config(&self, seed: Option<u64>) -> RandomConfig {
        RandomConfig {
            iterations: self.iterations,
            seed,
        }
    }

    pub fn ga_config(&self, seed: Option<u64>) -> GaConfig {
        let config = GaConfig::default()
            .with_population_size(self.population_size)
            .with_generations(self.iterations)
            .with_selection(self.selection);
        match seed {
            Some(seed) => config.with_seed(seed),
            None => config,
        }
    }
}
