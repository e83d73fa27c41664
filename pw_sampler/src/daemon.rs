// ABOUTME: Collector daemon lifecycle: start a sampler task, stop it exactly once.
// ABOUTME: Stop waits for the task to exit; an optional reset zeroes downstream gauges.
use async_trait::async_trait;
use pw_core::{Collector, Error, PoolStats, Result, StatsGetter};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::sampler::run_sampler;

/// Stops a running collection, with or without resetting metrics
#[async_trait]
pub trait CollectorStopper: Send + Sync {
    /// Stop collecting and wait for the sampler to exit
    async fn stop(&self);

    /// Stop collecting, then send one all-zero [`PoolStats`] to the collector
    async fn stop_and_reset_metrics(&self);
}

#[derive(Debug, Default)]
struct DaemonState {
    stopped: bool,
    reset_sent: bool,
    worker: Option<JoinHandle<()>>,
}

/// Handle to one running sampler task
///
/// Returned by [`start_collect`]. The handle moves from running to stopped on
/// the first call to [`stop`](Self::stop) or
/// [`stop_and_reset_metrics`](Self::stop_and_reset_metrics) and never goes
/// back; call [`start_collect`] again for a new session.
///
/// Dropping the handle signals the sampler to exit but does not wait for it.
pub struct CollectorDaemon {
    stop: CancellationToken,
    state: Mutex<DaemonState>,
    collector: Arc<dyn Collector>,
}

/// Start sampling `source` every `interval` into `collector`.
///
/// Spawns the sampler on the current tokio runtime and returns at once; the
/// first sample is taken by the spawned task without waiting for a tick.
/// Fails if `interval` is zero or if called outside a tokio runtime.
pub fn start_collect<S, C>(source: S, interval: Duration, collector: C) -> Result<CollectorDaemon>
where
    S: StatsGetter,
    C: Collector,
{
    if interval.is_zero() {
        return Err(Error::Config(
            "sampling interval must be greater than zero".to_string(),
        ));
    }

    let runtime = tokio::runtime::Handle::try_current()
        .map_err(|e| Error::Runtime(format!("pool sampling needs a tokio runtime: {}", e)))?;

    let stop = CancellationToken::new();
    let collector: Arc<dyn Collector> = Arc::new(collector);
    let worker = runtime.spawn(run_sampler(
        source,
        interval,
        collector.clone(),
        stop.clone(),
    ));

    debug!(?interval, "collector daemon started");

    Ok(CollectorDaemon {
        stop,
        state: Mutex::new(DaemonState {
            worker: Some(worker),
            ..Default::default()
        }),
        collector,
    })
}

impl CollectorDaemon {
    /// Stop the sampler and wait until its task has exited.
    ///
    /// Only the first call does any work. Later or concurrent calls wait for
    /// that one to finish (if it is still running) and then return.
    pub async fn stop(&self) {
        let mut state = self.state.lock().await;
        self.stop_locked(&mut state).await;
    }

    /// Stop the sampler, then forward one all-zero snapshot.
    ///
    /// The reset goes out at most once per handle and always after the last
    /// regular sample. A prior plain [`stop`](Self::stop) does not suppress it.
    pub async fn stop_and_reset_metrics(&self) {
        let send_reset = {
            let mut state = self.state.lock().await;
            self.stop_locked(&mut state).await;
            !std::mem::replace(&mut state.reset_sent, true)
        };

        if send_reset {
            self.collector.collect(&PoolStats::default());
            debug!("pool metrics reset");
        }
    }

    /// False as soon as a stop has been requested, even while the sampler winds down
    ///
    /// Never blocks, unlike [`is_stopped`](Self::is_stopped) which waits out an
    /// in-progress stop.
    pub fn is_running(&self) -> bool {
        !self.stop.is_cancelled()
    }

    /// Whether a stop has completed on this handle
    pub async fn is_stopped(&self) -> bool {
        self.state.lock().await.stopped
    }

    async fn stop_locked(&self, state: &mut DaemonState) {
        if state.stopped {
            return;
        }

        self.stop.cancel();

        // Keep the handle until the join completes so a caller that gives up
        // mid-wait leaves the next stop something to wait on.
        if let Some(worker) = state.worker.as_mut() {
            if let Err(e) = worker.await {
                error!(error = %e, "sampler task did not exit cleanly");
            }
            state.worker = None;
        }

        state.stopped = true;
        info!("collector daemon stopped");
    }
}

impl Drop for CollectorDaemon {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}

impl std::fmt::Debug for CollectorDaemon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectorDaemon")
            .field("cancelled", &self.stop.is_cancelled())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CollectorStopper for CollectorDaemon {
    async fn stop(&self) {
        CollectorDaemon::stop(self).await
    }

    async fn stop_and_reset_metrics(&self) {
        CollectorDaemon::stop_and_reset_metrics(self).await
    }
}
