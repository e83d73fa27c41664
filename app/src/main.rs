use pw_config::Config;
use pw_core::telemetry;
use pw_obs::ObsState;
use std::process;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Load configuration - exit with non-zero if invalid
    let config = match Config::load() {
        Ok(config) => {
            telemetry::init_tracing(&config.telemetry.env, "poolwatch");
            tracing::debug!(?config, "Configuration loaded successfully");
            config
        }
        Err(e) => {
            telemetry::init_tracing("development", "poolwatch");
            tracing::error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    tracing::info!(
        db_name = %config.database.name,
        interval_ms = config.sampler.interval_ms,
        obs_addr = %config.server.bind_addr(),
        "poolwatch starting"
    );

    let pool = match poolwatch::open_pool(&config.database).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to initialize database pool: {}", e);
            process::exit(1);
        }
    };

    let obs_state = ObsState::default();

    let daemon = match poolwatch::start_sampling(&config, pool.clone(), &obs_state.metrics) {
        Ok(daemon) => Arc::new(daemon),
        Err(e) => {
            tracing::error!("Failed to start pool sampling: {}", e);
            process::exit(1);
        }
    };
    obs_state.track(config.database.name.clone(), daemon.clone());

    // Returns once the server has handled SIGINT/SIGTERM
    let result = pw_obs::run_server(&config.server.bind_addr(), obs_state).await;

    poolwatch::stop_sampling(&config, &daemon).await;
    pool.close().await;

    if let Err(e) = result {
        tracing::error!("Observability server error: {}", e);
        process::exit(1);
    }

    tracing::info!("poolwatch stopped");
}
