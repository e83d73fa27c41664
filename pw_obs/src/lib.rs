//! ABOUTME: Observability services: Prometheus pool gauges and health endpoints
//! ABOUTME: Exports sampled pool statistics for scraping

pub mod prometheus;
pub mod server;

pub use prometheus::{
    start_collect_prometheus_metrics, DbStatsGauges, DbStatsLabels, Metrics, PrometheusCollector,
};
pub use server::{routes, run_server, ObsState};
