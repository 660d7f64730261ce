//! Cancellable periodic probe-and-diff loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::Shared;

/// A running auto-update loop.
pub(super) struct AutoUpdate {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl AutoUpdate {
    pub(super) fn spawn(shared: Arc<Shared>, interval: Duration) -> Self {
        let (stop, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(run_loop(shared, interval, stop_rx));
        Self { stop, handle }
    }

    pub(super) fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Signals the loop and waits for it to exit.
    ///
    /// A probe cycle in flight finishes first; the loop never sleeps again.
    pub(super) async fn stop(self) {
        let _ = self.stop.send(true);
        match self.handle.await {
            Err(e) if e.is_panic() => tracing::error!("Auto-update loop panicked: {e}"),
            _ => {}
        }
    }

    /// Stops without waiting.
    pub(super) fn abort(&self) {
        let _ = self.stop.send(true);
        self.handle.abort();
    }
}

async fn run_loop(shared: Arc<Shared>, interval: Duration, mut stop: watch::Receiver<bool>) {
    tracing::info!("Auto-update started, interval {interval:?}");

    loop {
        if *stop.borrow() {
            break;
        }

        shared.run_cycle().await;

        tokio::select! {
            biased;
            _ = stop.changed() => break,
            () = tokio::time::sleep(interval) => {}
        }
    }

    tracing::info!("Auto-update stopped");
}
