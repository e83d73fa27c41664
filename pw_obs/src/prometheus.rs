//! ABOUTME: Prometheus registry and the pool statistics gauge collector
//! ABOUTME: One labeled gauge family shared by every database being sampled

use prometheus_client::{
    encoding::{text::encode, EncodeLabelSet},
    metrics::{family::Family, gauge::Gauge},
    registry::Registry,
};
use pw_core::{Collector, Error, PoolStats, Result, StatsGetter};
use pw_sampler::{start_collect, CollectorDaemon};
use std::sync::{atomic::AtomicU64, Arc, Mutex, OnceLock};
use std::time::Duration;

const DB_STATS_METRIC: &str = "sql_db_stats";
const DB_STATS_HELP: &str = "SQL database stats";

/// Label set for the pool statistics gauges
#[derive(Debug, Clone, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct DbStatsLabels {
    pub db_name: String,
    pub metric: String,
}

/// Gauge family keyed by database name and metric name
pub type DbStatsGauges = Family<DbStatsLabels, Gauge<f64, AtomicU64>>;

/// Process-scoped metrics registry for Prometheus
///
/// Create one per process and share it. The pool statistics family is
/// registered lazily, exactly once, the first time any collector asks for it.
#[derive(Debug)]
pub struct Metrics {
    registry: Arc<Mutex<Registry>>,
    db_stats: OnceLock<DbStatsGauges>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry::default())),
            db_stats: OnceLock::new(),
        }
    }

    /// The shared pool statistics family, registering it on first use
    pub fn db_stats_gauges(&self) -> DbStatsGauges {
        self.db_stats
            .get_or_init(|| {
                let gauges = DbStatsGauges::default();
                match self.registry.lock() {
                    Ok(mut registry) => {
                        registry.register(DB_STATS_METRIC, DB_STATS_HELP, gauges.clone());
                        tracing::debug!(metric = DB_STATS_METRIC, "Registered pool stats gauges");
                    }
                    Err(e) => {
                        tracing::error!("Failed to lock metrics registry: {}", e);
                    }
                }
                gauges
            })
            .clone()
    }

    pub fn encode(&self) -> Result<String> {
        let registry = self
            .registry
            .lock()
            .map_err(|e| Error::Metrics(format!("Failed to lock metrics registry: {}", e)))?;

        let mut buffer = String::new();
        encode(&mut buffer, &registry)
            .map_err(|e| Error::Metrics(format!("Failed to encode metrics: {}", e)))?;

        Ok(buffer)
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Collector that mirrors each [`PoolStats`] into eight gauges for one database
#[derive(Debug, Clone)]
pub struct PrometheusCollector {
    db_name: String,
    gauges: DbStatsGauges,
}

impl PrometheusCollector {
    pub fn new(metrics: &Metrics, db_name: impl Into<String>) -> Self {
        Self {
            db_name: db_name.into(),
            gauges: metrics.db_stats_gauges(),
        }
    }

    pub fn db_name(&self) -> &str {
        &self.db_name
    }

    fn set(&self, metric: &str, value: f64) {
        self.gauges
            .get_or_create(&DbStatsLabels {
                db_name: self.db_name.clone(),
                metric: metric.to_string(),
            })
            .set(value);
    }
}

impl Collector for PrometheusCollector {
    fn collect(&self, stats: &PoolStats) {
        self.set("max_open_connections", stats.max_open_connections as f64);
        self.set("open_connections", stats.open_connections as f64);
        self.set("in_use_connections", stats.in_use as f64);
        self.set("idle_connections", stats.idle as f64);
        self.set("wait_count", stats.wait_count as f64);
        self.set("wait_duration_seconds", stats.wait_duration.as_secs_f64());
        self.set("idle_connections_closed", stats.max_idle_closed as f64);
        self.set("lifetime_connections_closed", stats.max_lifetime_closed as f64);
    }
}

/// Start sampling `source` into the shared Prometheus gauges under `db_name`
pub fn start_collect_prometheus_metrics<S: StatsGetter>(
    source: S,
    interval: Duration,
    db_name: &str,
    metrics: &Metrics,
) -> Result<CollectorDaemon> {
    tracing::info!(
        db_name = %db_name,
        ?interval,
        "Starting Prometheus pool stats collection"
    );
    start_collect(source, interval, PrometheusCollector::new(metrics, db_name))
}
