pub mod appinsights;
pub mod config;
pub mod log;
pub mod observer;
pub mod types;

use anyhow::Result;
use std::sync::Arc;

pub use appinsights::{AppInsightsObserver, ConnectionString};
pub use config::{init_tracing, LogFormat, TelemetryConfig};
pub use log::LogObserver;
pub use observer::Observer;
pub use types::{
    new_span_id, ChatObservation, ObservedMessage, RunObservation, TokenUsage, TraceContext,
    AZURE_AGENTS_SYSTEM, AZURE_AI_SYSTEM,
};

/// Application Insights when a connection string is configured, logs otherwise
pub fn observer_from_config(config: &TelemetryConfig) -> Result<Arc<dyn Observer>> {
    match config.app_insights_connection_string.as_deref() {
        Some(connection_string) => {
            tracing::info!("Exporting traces to Application Insights");
            Ok(Arc::new(AppInsightsObserver::new(connection_string, config)?))
        }
        None => Ok(Arc::new(LogObserver::new(config))),
    }
}
