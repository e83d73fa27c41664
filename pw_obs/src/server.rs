//! ABOUTME: HTTP surface for scraping pool gauges and checking sampler state
//! ABOUTME: Readiness is derived from the collector daemons the app registers

use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer, Responder};
use pw_core::{Error, Result};
use pw_sampler::CollectorDaemon;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::prometheus::Metrics;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Shared state behind the observability endpoints
///
/// Holds the metrics registry and the daemons sampling into it, keyed by the
/// `db_name` label they export under.
#[derive(Debug, Clone, Default)]
pub struct ObsState {
    pub metrics: Arc<Metrics>,
    samplers: Arc<RwLock<BTreeMap<String, Arc<CollectorDaemon>>>>,
}

impl ObsState {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self {
            metrics,
            samplers: Arc::default(),
        }
    }

    /// Report `daemon` on `/readyz` under `db_name`, replacing any previous entry
    pub fn track(&self, db_name: impl Into<String>, daemon: Arc<CollectorDaemon>) {
        if let Ok(mut samplers) = self.samplers.write() {
            samplers.insert(db_name.into(), daemon);
        }
    }

    /// `db_name` → whether its sampler is still running
    pub fn sampler_states(&self) -> BTreeMap<String, bool> {
        self.samplers
            .read()
            .map(|samplers| {
                samplers
                    .iter()
                    .map(|(name, daemon)| (name.clone(), daemon.is_running()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Ready when at least one sampler is tracked and none has been stopped
    pub fn is_ready(&self) -> bool {
        let states = self.sampler_states();
        !states.is_empty() && states.values().all(|running| *running)
    }
}

async fn healthz() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

async fn readyz(state: web::Data<ObsState>) -> impl Responder {
    let samplers: Map<String, Value> = state
        .sampler_states()
        .into_iter()
        .map(|(name, running)| {
            let label = if running { "running" } else { "stopped" };
            (name, Value::from(label))
        })
        .collect();

    if state.is_ready() {
        HttpResponse::Ok().json(json!({ "status": "ready", "samplers": samplers }))
    } else {
        tracing::debug!(?samplers, "Readiness check failed");
        HttpResponse::ServiceUnavailable()
            .json(json!({ "status": "not ready", "samplers": samplers }))
    }
}

async fn scrape(state: web::Data<ObsState>) -> impl Responder {
    match state.metrics.encode() {
        Ok(body) => HttpResponse::Ok()
            .content_type(PROMETHEUS_CONTENT_TYPE)
            .body(body),
        Err(e) => {
            tracing::error!(error = %e, "Metrics scrape failed");
            HttpResponse::InternalServerError().finish()
        }
    }
}

/// Register `/healthz`, `/readyz` and `/metrics`
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/healthz", web::get().to(healthz))
        .route("/readyz", web::get().to(readyz))
        .route("/metrics", web::get().to(scrape));
}

/// Serve the endpoints until the server receives SIGINT or SIGTERM
///
/// A single worker is plenty for scrape traffic.
pub async fn run_server(bind_addr: &str, state: ObsState) -> Result<()> {
    let data = web::Data::new(state);
    let server = HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .wrap(Logger::default())
            .configure(routes)
    })
    .workers(1)
    .bind(bind_addr)
    .map_err(|e| Error::Config(format!("Failed to bind {}: {}", bind_addr, e)))?;

    tracing::info!(addr = %bind_addr, "Observability server listening");
    server.run().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prometheus::start_collect_prometheus_metrics;
    use actix_web::test;
    use std::time::Duration;
    use test_support::CountingSource;

    async fn get(state: &ObsState, uri: &str) -> (u16, actix_web::web::Bytes) {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(routes),
        )
        .await;
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        let status = resp.status().as_u16();
        (status, test::read_body(resp).await)
    }

    fn start_tracked(state: &ObsState, db_name: &str) -> Arc<CollectorDaemon> {
        let daemon = Arc::new(
            start_collect_prometheus_metrics(
                CountingSource::new(),
                Duration::from_secs(60),
                db_name,
                &state.metrics,
            )
            .unwrap(),
        );
        state.track(db_name, daemon.clone());
        daemon
    }

    #[tokio::test]
    async fn test_healthz() {
        let (status, body) = get(&ObsState::default(), "/healthz").await;
        assert_eq!(status, 200);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_not_ready_without_samplers() {
        let (status, body) = get(&ObsState::default(), "/readyz").await;
        assert_eq!(status, 503);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["status"], "not ready");
    }

    #[tokio::test]
    async fn test_readiness_follows_sampler_lifecycle() {
        let state = ObsState::default();
        let daemon = start_tracked(&state, "main");

        let (status, body) = get(&state, "/readyz").await;
        assert_eq!(status, 200);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["samplers"]["main"], "running");

        daemon.stop_and_reset_metrics().await;

        let (status, body) = get(&state, "/readyz").await;
        assert_eq!(status, 503);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["samplers"]["main"], "stopped");
    }

    #[tokio::test]
    async fn test_one_stopped_sampler_fails_readiness() {
        let state = ObsState::default();
        let _orders = start_tracked(&state, "orders");
        let users = start_tracked(&state, "users");

        assert!(state.is_ready());
        users.stop().await;
        assert!(!state.is_ready());
        assert_eq!(state.sampler_states().get("orders"), Some(&true));
    }

    #[tokio::test]
    async fn test_metrics_scrape_serves_sampled_gauges() {
        let state = ObsState::default();
        let daemon = start_tracked(&state, "main");
        tokio::task::yield_now().await;

        let (status, body) = get(&state, "/metrics").await;
        assert_eq!(status, 200);
        let text = std::str::from_utf8(&body).unwrap();
        assert!(text.contains(r#"sql_db_stats{db_name="main",metric="open_connections"} 1"#));

        daemon.stop().await;
    }
}
