// ABOUTME: The sampling loop run by each collector daemon task.
// ABOUTME: Forwards one snapshot immediately and one per timer tick until cancelled.
use pw_core::{Collector, StatsGetter};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Sample `source` into `collector` until `stop` is cancelled.
///
/// The first sample is taken before the stop signal is ever looked at, so a
/// daemon stopped right after start still reports once. Missed ticks are
/// skipped rather than replayed.
pub(crate) async fn run_sampler<S: StatsGetter>(
    source: S,
    interval: Duration,
    collector: Arc<dyn Collector>,
    stop: CancellationToken,
) {
    debug!(?interval, "sampler loop starting");

    collector.collect(&source.stats());
    let mut samples: u64 = 1;

    // An interval past the clock's range never ticks; only a stop can end it.
    let Some(first_tick) = Instant::now().checked_add(interval) else {
        debug!(?interval, "interval exceeds timer range, waiting for stop");
        stop.cancelled().await;
        debug!(samples, "sampler loop exited");
        return;
    };
    let mut ticker = time::interval_at(first_tick, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            // A stop racing a ready tick must win.
            biased;
            _ = stop.cancelled() => break,
            _ = ticker.tick() => {
                let stats = source.stats();
                collector.collect(&stats);
                samples += 1;
                trace!(
                    samples,
                    open = stats.open_connections,
                    in_use = stats.in_use,
                    idle = stats.idle,
                    "pool stats sampled"
                );
            }
        }
    }

    debug!(samples, "sampler loop exited");
}
