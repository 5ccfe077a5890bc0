//! Top-level tuning run.

use super::config::TuneConfig;
use super::pool::WorkerPool;
use super::report::TuneReport;
use super::worker::reduce_reports;
use crate::cancel::CancelToken;
use crate::error::{Result, TuneError};
use crate::harness::Outcome;
use crate::search::genetic::GaRunner;
use crate::search::{RandomSearch, SearchResult, Strategy, ToolEvaluator};
use tokio::runtime::Handle;
use tracing::{info, warn};

/// Runs baseline, search and reduction for one [`TuneConfig`].
///
/// # Usage
///
/// ```ignore
/// let config = TuneConfig::new("query.smt2").with_workers(4);
/// let report = Orchestrator::run(&config, &cancel).await?;
/// report.write_to(&config.output_dir)?;
/// ```
pub struct Orchestrator;

impl Orchestrator {
    /// Executes a complete run.
    ///
    /// With one worker the search runs on a blocking thread of this
    /// process; with more, each search runs in its own worker process and
    /// the fastest report wins.
    ///
    /// # Errors
    /// - [`TuneError::InvalidConfig`], [`TuneError::InputNotFound`] or a
    ///   catalog error before anything runs
    /// - [`TuneError::BaselineTimeout`] / [`TuneError::BaselineFailed`] if
    ///   the default run does not complete
    /// - [`TuneError::Cancelled`] if `cancel` fires
    pub async fn run(config: &TuneConfig, cancel: &CancelToken) -> Result<TuneReport> {
        config.validate().map_err(TuneError::InvalidConfig)?;
        if !config.input.is_file() {
            return Err(TuneError::InputNotFound(config.input.clone()));
        }
        let catalog = config.catalog()?;
        catalog.check_mutable()?;

        info!(
            input = %config.input.display(),
            tool = %config.tool.join(" "),
            strategy = config.strategy.name(),
            iterations = config.iterations,
            workers = config.workers,
            parameters = catalog.len(),
            "starting"
        );

        let default_time = Self::baseline(config, cancel).await?;
        info!(default_time, "finished the default run");

        let (min_time, min_opt, evaluations) = if config.workers <= 1 {
            let result = Self::search(config, 0, default_time, cancel).await?;
            (result.best_fitness, result.best_flags(), result.evaluations)
        } else {
            let reports = WorkerPool::current()?
                .with_kill_grace(config.kill_grace)
                .run(config, default_time, cancel)
                .await?;
            let evaluations = reports.iter().map(|r| r.evaluations).sum();
            let best = reduce_reports(&reports)
                .ok_or_else(|| TuneError::Worker("no worker reported a result".into()))?;
            (best.best_fitness, best.best_flags.clone(), evaluations)
        };

        info!(min_time, min_opt = ?min_opt, evaluations, "search finished");
        Ok(TuneReport {
            input: config.input.clone(),
            strategy: config.strategy,
            iterations: config.iterations,
            default_time,
            min_time,
            min_opt,
            evaluations,
        })
    }

    /// Times the tool with no extra flags.
    pub async fn baseline(config: &TuneConfig, cancel: &CancelToken) -> Result<f64> {
        let mut argv = config.tool.clone();
        argv.push(config.input.to_string_lossy().into_owned());

        let measurement = config
            .harness()
            .run(&argv, config.tool_timeout, cancel)
            .await
            .map_err(|error| match error {
                TuneError::Cancelled => TuneError::Cancelled,
                other => {
                    warn!(error = %other, "default run could not be started");
                    TuneError::BaselineFailed
                }
            })?;

        match measurement.outcome(config.tool_timeout) {
            Outcome::Measured(seconds) => Ok(seconds),
            Outcome::TimedOut => Err(TuneError::BaselineTimeout(config.tool_timeout)),
            Outcome::Failed => Err(TuneError::BaselineFailed),
        }
    }

    /// Runs one search in this process, on a blocking thread.
    ///
    /// `index` selects the seed offset; the orchestrator uses 0, worker `i`
    /// uses `i`.
    pub async fn search(
        config: &TuneConfig,
        index: usize,
        baseline: f64,
        cancel: &CancelToken,
    ) -> Result<SearchResult> {
        let catalog = config.catalog()?;
        let evaluator = ToolEvaluator::new(
            config.tool.clone(),
            config.input.clone(),
            config.tool_timeout,
            config.harness(),
            Handle::current(),
            cancel.clone(),
        );
        let seed = config.worker_seed(index);
        let strategy = config.strategy;
        let random = config.random_config(seed);
        let ga = config.ga_config(seed);
        let token = cancel.clone();

        let result = tokio::task::spawn_blocking(move || match strategy {
            Strategy::Random => RandomSearch::run(&catalog, &evaluator, baseline, &random, &token),
            Strategy::Genetic => GaRunner::run(&catalog, &evaluator, baseline, &ga, &token),
        })
        .await
        .map_err(|e| TuneError::Worker(format!("search task failed: {e}")))??;

        if result.cancelled {
            return Err(TuneError::Cancelled);
        }
        Ok(result)
    }
}
