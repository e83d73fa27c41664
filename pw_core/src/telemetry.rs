// ABOUTME: Process-wide tracing subscriber setup.
// ABOUTME: JSON logs in production, human-readable logs everywhere else.
use std::sync::Once;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// sqlx logs every statement at info; sampling only needs its warnings
const DEFAULT_FILTER: &str = "info,sqlx=warn";

/// Log output format selected by deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    pub fn for_env(env: &str) -> Self {
        if env.eq_ignore_ascii_case("production") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Initialize tracing - safe to call multiple times, only the first call wins
///
/// `RUST_LOG` overrides the default filter.
pub fn init_tracing(env: &str, service: &str) {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        let format = LogFormat::for_env(env);

        let registry = tracing_subscriber::registry().with(env_filter);
        match format {
            LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
            LogFormat::Pretty => registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .init(),
        }

        tracing::info!(service = %service, ?format, "Tracing initialized");
    });
}
