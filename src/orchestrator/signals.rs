//! Termination signals.

use crate::cancel::CancelToken;
use crate::error::Result;
use tokio::signal::unix::{signal, SignalKind};
use tokio::task::JoinHandle;
use tracing::warn;

/// Cancels `cancel` on the first SIGINT, SIGTERM, SIGQUIT or SIGHUP.
///
/// Handlers are installed before this returns, so a signal delivered
/// afterwards is never lost. Must be called inside a tokio runtime.
pub fn listen(cancel: CancelToken) -> Result<JoinHandle<()>> {
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut quit = signal(SignalKind::quit())?;
    let mut hangup = signal(SignalKind::hangup())?;

    Ok(tokio::spawn(async move {
        let name = tokio::select! {
            _ = interrupt.recv() => "SIGINT",
            _ = terminate.recv() => "SIGTERM",
            _ = quit.recv() => "SIGQUIT",
            _ = hangup.recv() => "SIGHUP",
        };
        warn!(signal = name, "received signal, shutting down");
        cancel.cancel();
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::sys::signal::{raise, Signal};
    use std::time::Duration;

    #[tokio::test]
    async fn test_signal_cancels_token() {
        let cancel = CancelToken::new();
        let listener = listen(cancel.clone()).unwrap();
        raise(Signal::SIGHUP).unwrap();
        tokio::time::timeout(Duration::from_secs(5), cancel.cancelled())
            .await
            .expect("token cancelled by SIGHUP");
        listener.await.unwrap();
        assert!(cancel.is_cancelled());
    }
}
