use anyhow::Result;
use async_trait::async_trait;

use crate::types::{ChatObservation, RunObservation};

/// Core trait for telemetry backends
///
/// A trace groups the calls one sample makes under a single operation.
/// Export failures are returned to the caller, which logs and carries on.
#[async_trait]
pub trait Observer: Send + Sync {
    /// Open a trace for `run_id`
    ///
    /// # Arguments
    /// * `run_id` - Caller-chosen identifier, used to key later calls
    /// * `name` - Operation name shown for the trace (e.g. the sample name)
    async fn trace_start(&self, run_id: String, name: String) -> Result<()>;

    /// Record one chat completion call
    async fn record_chat(&self, observation: ChatObservation) -> Result<()>;

    /// Record one agent run, from creation to terminal status
    async fn record_run(&self, observation: RunObservation) -> Result<()>;

    /// Close the trace
    ///
    /// # Arguments
    /// * `status` - "success" or "error"
    /// * `total_duration_ms` - Wall time of the whole operation
    async fn trace_end(&self, run_id: String, status: String, total_duration_ms: u64) -> Result<()>;
}
