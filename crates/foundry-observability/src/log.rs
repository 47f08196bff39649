use anyhow::Result;
use async_trait::async_trait;

use crate::config::TelemetryConfig;
use crate::observer::Observer;
use crate::types::{ChatObservation, RunObservation};

/// Writes observations through `tracing` when no exporter is configured
pub struct LogObserver {
    capture_message_content: bool,
}

impl LogObserver {
    pub fn new(config: &TelemetryConfig) -> Self {
        Self { capture_message_content: config.capture_message_content }
    }
}

#[async_trait]
impl Observer for LogObserver {
    async fn trace_start(&self, run_id: String, name: String) -> Result<()> {
        tracing::info!(run_id = %run_id, "Trace started: {}", name);
        Ok(())
    }

    async fn record_chat(&self, observation: ChatObservation) -> Result<()> {
        let attributes = observation.attributes(self.capture_message_content);
        tracing::info!(
            run_id = %observation.run_id,
            span_id = %observation.span_id,
            duration_ms = observation.duration_ms,
            "chat {}: {:?}",
            observation.model,
            attributes
        );
        Ok(())
    }

    async fn record_run(&self, observation: RunObservation) -> Result<()> {
        let attributes = observation.attributes(self.capture_message_content);
        tracing::info!(
            run_id = %observation.run_id,
            span_id = %observation.span_id,
            duration_ms = observation.duration_ms,
            "process_thread_run {}: {:?}",
            observation.agent_id,
            attributes
        );
        Ok(())
    }

    async fn trace_end(&self, run_id: String, status: String, total_duration_ms: u64) -> Result<()> {
        tracing::info!(run_id = %run_id, total_duration_ms, "Trace ended: {}", status);
        Ok(())
    }
}
