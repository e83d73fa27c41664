//! ABOUTME: Core pool statistics types, collaborator traits, errors, and tracing
//! ABOUTME: Foundation crate used by all other poolwatch components

pub mod error;
pub mod stats;
pub mod telemetry;

pub use error::{Error, Result};
pub use stats::{Collector, PoolStats, StatsGetter};
