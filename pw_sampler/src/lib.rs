//! ABOUTME: Background pool statistics sampler with idempotent shutdown
//! ABOUTME: Samples a stats source on a fixed interval and feeds a collector
//!
//! ```text
//! start_collect(source, interval, collector) -> CollectorDaemon
//!   └── spawned sampler task: sample now, then on every tick, until stopped
//!
//! CollectorDaemon
//!   ├── stop()                   cancel + join, exactly once
//!   └── stop_and_reset_metrics() stop, then one all-zero PoolStats
//! ```

pub mod daemon;
mod sampler;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use daemon::{start_collect, CollectorDaemon, CollectorStopper};
pub use pw_core::{Collector, PoolStats, StatsGetter};
