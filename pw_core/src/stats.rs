// ABOUTME: Pool statistics snapshot and the source/sink capabilities around it.
// ABOUTME: Sources produce PoolStats on demand, collectors consume them.
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Point-in-time reading of connection pool statistics
///
/// Counters marked cumulative only ever grow over the lifetime of the pool
/// that produced them. The [`Default`] value is the all-zero snapshot used to
/// reset downstream gauges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    /// Maximum number of open connections the pool allows (0 = unlimited)
    pub max_open_connections: u64,
    /// Connections currently open, in use or idle
    pub open_connections: u64,
    /// Connections currently checked out
    pub in_use: u64,
    /// Connections currently sitting idle in the pool
    pub idle: u64,
    /// Total number of connections waited for (cumulative)
    pub wait_count: u64,
    /// Total time spent waiting for connections (cumulative)
    pub wait_duration: Duration,
    /// Connections closed because of the idle limit (cumulative)
    pub max_idle_closed: u64,
    /// Connections closed because of the lifetime limit (cumulative)
    pub max_lifetime_closed: u64,
}

impl PoolStats {
    /// True when every field holds its zero value
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

/// Produces pool statistics on demand
///
/// Implementations must be cheap and must not block: the sampler calls
/// `stats` from its own task on every tick.
pub trait StatsGetter: Send + Sync + 'static {
    fn stats(&self) -> PoolStats;
}

impl<T: StatsGetter + ?Sized> StatsGetter for Arc<T> {
    fn stats(&self) -> PoolStats {
        (**self).stats()
    }
}

/// Accepts pool statistics for export
///
/// Fire-and-forget: any failure must be handled inside the implementation.
pub trait Collector: Send + Sync + 'static {
    fn collect(&self, stats: &PoolStats);
}

impl<T: Collector + ?Sized> Collector for Arc<T> {
    fn collect(&self, stats: &PoolStats) {
        (**self).collect(stats)
    }
}
