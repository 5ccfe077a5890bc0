//! Process execution with a wall-clock budget.

use super::types::{Measurement, Outcome};
use crate::cancel::CancelToken;
use crate::error::{Result, TuneError};
use nix::errno::Errno;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::os::unix::process::CommandExt;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::AsyncRead;
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Time a terminated process gets between SIGTERM and SIGKILL.
pub const KILL_GRACE: Duration = Duration::from_secs(1);

/// Spawns, bounds and times external commands.
///
/// # Usage
///
/// ```ignore
/// let harness = Harness::default().with_memory_limit(4 << 30);
/// let argv = vec!["z3".to_string(), "input.smt2".to_string()];
/// let m = harness.run(&argv, Duration::from_secs(600), &cancel).await?;
/// println!("took {:?}", m.elapsed);
/// ```
#[derive(Debug, Clone)]
pub struct Harness {
    /// Address-space ceiling in bytes for the spawned process.
    pub memory_limit: Option<u64>,

    /// Grace period between SIGTERM and SIGKILL.
    pub kill_grace: Duration,
}

impl Default for Harness {
    fn default() -> Self {
        Self {
            memory_limit: None,
            kill_grace: KILL_GRACE,
        }
    }
}

enum Race {
    Exited(std::io::Result<ExitStatus>),
    Expired,
    Cancelled,
}

impl Harness {
    /// Sets the address-space ceiling (bytes) applied to each child.
    pub fn with_memory_limit(mut self, bytes: u64) -> Self {
        self.memory_limit = Some(bytes);
        self
    }

    pub fn with_kill_grace(mut self, grace: Duration) -> Self {
        self.kill_grace = grace;
        self
    }

    /// Runs `argv` until it exits or `timeout` elapses.
    ///
    /// Output is drained and discarded so the child never blocks on a full
    /// pipe. On expiry the child is terminated and the measurement is
    /// flagged `timed_out`; the elapsed time then covers the termination.
    ///
    /// The child leads a process group of its own. Whatever it forked is
    /// killed with the group before `run` returns, on every path.
    ///
    /// # Errors
    /// - [`TuneError::ProcessSpawn`] if the program cannot be started
    /// - [`TuneError::Cancelled`] if `cancel` fires first (the child is
    ///   terminated before returning)
    pub async fn run(
        &self,
        argv: &[String],
        timeout: Duration,
        cancel: &CancelToken,
    ) -> Result<Measurement> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| TuneError::InvalidConfig("empty command line".into()))?;

        debug!(command = %argv.join(" "), ?timeout, "spawning");
        let start = Instant::now();
        let mut child = self
            .command(program, args)
            .spawn()
            .map_err(|source| TuneError::ProcessSpawn {
                program: program.clone(),
                source,
            })?;
        let pid = child.id();
        let drains = [drain(child.stdout.take()), drain(child.stderr.take())];

        let group = pid.map(|pid| Pid::from_raw(pid as i32));

        let race = tokio::select! {
            status = child.wait() => Race::Exited(status),
            _ = tokio::time::sleep(timeout) => Race::Expired,
            _ = cancel.cancelled() => Race::Cancelled,
        };

        let result = match race {
            Race::Exited(status) => status.map(|s| (s, false)).map_err(TuneError::from),
            Race::Expired => {
                debug!(?pid, "budget expired, terminating");
                self.terminate(&mut child, group).await.map(|s| (s, true))
            }
            Race::Cancelled => {
                debug!(?pid, "cancelled, terminating");
                self.terminate(&mut child, group).await.and(Err(TuneError::Cancelled))
            }
        };
        let elapsed = start.elapsed();
        // Background processes left by a tool that exited on its own.
        signal_group(group, Signal::SIGKILL);
        for handle in drains.into_iter().flatten() {
            handle.abort();
        }

        let (status, timed_out) = result?;
        Ok(Measurement {
            elapsed,
            timed_out,
            exit_code: status.code(),
            pid,
        })
    }

    /// Runs `argv` and folds every failure into an [`Outcome`].
    ///
    /// Spawn errors, I/O errors and cancellation all become
    /// [`Outcome::Failed`]; callers that care about cancellation check their
    /// token afterwards.
    pub async fn measure(&self, argv: &[String], timeout: Duration, cancel: &CancelToken) -> Outcome {
        match self.run(argv, timeout, cancel).await {
            Ok(measurement) => measurement.outcome(timeout),
            Err(TuneError::Cancelled) => Outcome::Failed,
            Err(error) if error.is_per_evaluation() => {
                debug!(%error, "evaluation failed");
                Outcome::Failed
            }
            Err(error) => {
                warn!(%error, "evaluation failed");
                Outcome::Failed
            }
        }
    }

    fn command(&self, program: &str, args: &[String]) -> Command {
        let mut command = std::process::Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .process_group(0);

        if let Some(bytes) = self.memory_limit {
            let limit = nix::libc::rlim_t::try_from(bytes).unwrap_or(nix::libc::rlim_t::MAX);
            // SAFETY: setrlimit is async-signal-safe and touches no shared state.
            unsafe {
                command.pre_exec(move || {
                    nix::sys::resource::setrlimit(
                        nix::sys::resource::Resource::RLIMIT_AS,
                        limit,
                        limit,
                    )
                    .map_err(std::io::Error::from)
                });
            }
        }

        let mut command = Command::from(command);
        command.kill_on_drop(true);
        command
    }

    /// SIGTERM the group, wait up to the grace period for the leader, then
    /// SIGKILL the group. Always reaps the leader.
    async fn terminate(&self, child: &mut Child, group: Option<Pid>) -> Result<ExitStatus> {
        if group.is_none() || child.id().is_none() {
            // Already reaped.
            signal_group(group, Signal::SIGKILL);
            return Ok(child.wait().await?);
        }

        if signal_group(group, Signal::SIGTERM) {
            if let Ok(status) = tokio::time::timeout(self.kill_grace, child.wait()).await {
                signal_group(group, Signal::SIGKILL);
                return Ok(status?);
            }
        }

        signal_group(group, Signal::SIGKILL);
        child.start_kill().or_else(|e| match e.kind() {
            std::io::ErrorKind::InvalidInput => Ok(()),
            _ => Err(e),
        })?;
        Ok(child.wait().await?)
    }
}

/// Sends `signal` to the process group; false if it could not be delivered.
fn signal_group(group: Option<Pid>, signal: Signal) -> bool {
    let Some(group) = group else {
        return false;
    };
    match killpg(group, signal) {
        Ok(()) => true,
        Err(Errno::ESRCH) => false,
        Err(e) => {
            warn!("failed to send {:?} to process group {}: {}", signal, group, e);
            false
        }
    }
}

fn drain<R>(reader: Option<R>) -> Option<JoinHandle<()>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    reader.map(|mut reader| {
        tokio::spawn(async move {
            let _ = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await;
        })
    })
}
