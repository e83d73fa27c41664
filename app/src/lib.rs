//! ABOUTME: Application wiring shared by the poolwatch binary and its tests
//! ABOUTME: Opens the sampled pool and starts or stops Prometheus collection

use pw_config::{Config, DatabaseConfig};
use pw_core::{Error, Result};
use pw_obs::{start_collect_prometheus_metrics, Metrics};
use pw_sampler::CollectorDaemon;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

/// Open the connection pool whose statistics are sampled
pub async fn open_pool(database: &DatabaseConfig) -> Result<SqlitePool> {
    SqlitePoolOptions::new()
        .max_connections(database.max_connections)
        .connect(&database.url)
        .await
        .map_err(|e| Error::Database(format!("Failed to open {}: {}", database.url, e)))
}

/// Start exporting `pool` statistics into `metrics` as configured
pub fn start_sampling(
    config: &Config,
    pool: SqlitePool,
    metrics: &Metrics,
) -> Result<CollectorDaemon> {
    start_collect_prometheus_metrics(
        pool,
        config.sampler.interval(),
        &config.database.name,
        metrics,
    )
}

/// Stop sampling, zeroing the exported gauges if configured to
pub async fn stop_sampling(config: &Config, daemon: &CollectorDaemon) {
    if config.sampler.reset_on_shutdown {
        daemon.stop_and_reset_metrics().await;
    } else {
        daemon.stop().await;
    }
    tracing::info!(db_name = %config.database.name, "Pool sampling stopped");
}
