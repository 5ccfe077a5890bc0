//! Worker processes for parallel runs.

use super::config::TuneConfig;
use super::worker::{WorkerInput, WorkerReport};
use crate::cancel::CancelToken;
use crate::error::{Result, TuneError};
use crate::harness::KILL_GRACE;
use nix::errno::Errno;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::ffi::OsString;
use std::os::unix::process::CommandExt;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::task::JoinSet;
use tracing::{debug, info, warn, Level};

/// Grace periods the pool waits for signalled workers to exit.
const WORKER_DRAIN_GRACES: u32 = 3;

/// Runs one search per worker process and collects their reports.
///
/// Each worker is started as `<launcher...> worker` in a process group of
/// its own. The target tool a worker measures runs in yet another group,
/// which the worker's harness terminates when the worker is signalled.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    launcher: Vec<OsString>,
    kill_grace: Duration,
}

impl WorkerPool {
    /// `launcher` is the command line that starts this program; the pool
    /// appends the `worker` subcommand.
    pub fn new(launcher: Vec<OsString>) -> Self {
        Self {
            launcher,
            kill_grace: KILL_GRACE,
        }
    }

    /// A pool re-executing the running binary.
    pub fn current() -> Result<Self> {
        Ok(Self::new(vec![std::env::current_exe()?.into_os_string()]))
    }

    pub fn with_kill_grace(mut self, grace: Duration) -> Self {
        self.kill_grace = grace;
        self
    }

    /// Starts `config.workers` workers and waits for all of them.
    ///
    /// Workers that exit unsuccessfully or print an unreadable report are
    /// logged and skipped.
    ///
    /// # Errors
    /// - [`TuneError::Cancelled`] if `cancel` fires; every worker group is
    ///   terminated first
    /// - [`TuneError::Worker`] if no worker produced a report
    pub async fn run(
        &self,
        config: &TuneConfig,
        baseline: f64,
        cancel: &CancelToken,
    ) -> Result<Vec<WorkerReport>> {
        if cancel.is_cancelled() {
            return Err(TuneError::Cancelled);
        }

        let mut groups = Vec::with_capacity(config.workers);
        let mut tasks = JoinSet::new();
        for index in 0..config.workers {
            let input = WorkerInput {
                index,
                baseline,
                config: config.clone(),
            };
            match self.spawn(&input).await {
                Ok((group, child)) => {
                    groups.extend(group);
                    tasks.spawn(collect(index, child));
                }
                Err(error) => {
                    self.terminate(&groups, &mut tasks).await;
                    return Err(error);
                }
            }
        }
        info!(workers = groups.len(), "worker pool started");

        let gathered = tokio::select! {
            reports = gather(&mut tasks) => Some(reports),
            _ = cancel.cancelled() => None,
        };

        match gathered {
            Some(reports) if reports.is_empty() => {
                Err(TuneError::Worker("no worker reported a result".into()))
            }
            Some(reports) => Ok(reports),
            None => {
                self.terminate(&groups, &mut tasks).await;
                Err(TuneError::Cancelled)
            }
        }
    }

    async fn spawn(&self, input: &WorkerInput) -> Result<(Option<Pid>, Child)> {
        let (program, args) = self
            .launcher
            .split_first()
            .ok_or_else(|| TuneError::InvalidConfig("empty worker launcher".into()))?;

        let mut command = std::process::Command::new(program);
        command.args(args).arg("worker");
        if tracing::enabled!(Level::DEBUG) {
            command.arg("--verbose");
        }
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .process_group(0);

        let mut command = Command::from(command);
        command.kill_on_drop(true);
        let mut child = command.spawn().map_err(|source| TuneError::ProcessSpawn {
            program: program.to_string_lossy().into_owned(),
            source,
        })?;

        // The group id equals the leader's pid.
        let group = child.id().map(|pid| Pid::from_raw(pid as i32));
        debug!(index = input.index, ?group, "worker started");

        let payload = serde_json::to_vec(input)?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&payload).await?;
        }
        Ok((group, child))
    }

    /// SIGTERM every group, give the workers time to stop their tools, then
    /// SIGKILL whatever is left.
    ///
    /// A worker may itself spend one grace period escalating against its
    /// tool, so the pool waits [`WORKER_DRAIN_GRACES`] of them.
    async fn terminate(&self, groups: &[Pid], tasks: &mut JoinSet<Result<WorkerReport>>) {
        info!(workers = groups.len(), "terminating worker pool");
        signal_groups(groups, Signal::SIGTERM);

        let drain = self.kill_grace.saturating_mul(WORKER_DRAIN_GRACES);
        let drained = tokio::time::timeout(drain, async {
            while tasks.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            warn!("workers still running after grace period, killing");
        }

        // Grandchildren can outlive their worker.
        signal_groups(groups, Signal::SIGKILL);
        tasks.shutdown().await;
    }
}

fn signal_groups(groups: &[Pid], signal: Signal) {
    for &group in groups {
        match killpg(group, signal) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(e) => warn!("failed to send {:?} to worker group {}: {}", signal, group, e),
        }
    }
}

async fn gather(tasks: &mut JoinSet<Result<WorkerReport>>) -> Vec<WorkerReport> {
    let mut reports = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(report)) => reports.push(report),
            Ok(Err(error)) => warn!(%error, "skipping worker"),
            Err(error) => warn!(%error, "worker task failed"),
        }
    }
    reports
}

async fn collect(index: usize, mut child: Child) -> Result<WorkerReport> {
    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| TuneError::Worker(format!("worker {index} has no stdout")))?;
    let mut raw = Vec::new();
    stdout.read_to_end(&mut raw).await?;

    let status = child.wait().await?;
    if !status.success() {
        return Err(TuneError::Worker(format!("worker {index} exited with {status}")));
    }

    let report: WorkerReport = serde_json::from_slice(&raw)?;
    debug!(
        index,
        fitness = report.best_fitness,
        evaluations = report.evaluations,
        "worker finished"
    );
    Ok(WorkerReport { index, ..report })
}
