use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError};

use super::client::AppInsightsClient;
use super::connection_string::ConnectionString;
use super::types::{format_duration, Envelope, RemoteDependencyData, RequestData};
use crate::config::TelemetryConfig;
use crate::observer::Observer;
use crate::types::{ChatObservation, RunObservation, TraceContext};

const TAG_OPERATION_ID: &str = "ai.operation.id";
const TAG_OPERATION_PARENT_ID: &str = "ai.operation.parentId";
const TAG_OPERATION_NAME: &str = "ai.operation.name";
const TAG_CLOUD_ROLE: &str = "ai.cloud.role";

/// Application Insights implementation of the Observer trait
///
/// Each chat call and agent run becomes a `RemoteDependency` under the trace's
/// `Request`, sent as soon as it is recorded.
pub struct AppInsightsObserver {
    client: AppInsightsClient,
    service_name: String,
    capture_message_content: bool,
    /// Active traces by run id
    traces: Mutex<HashMap<String, TraceContext>>,
}

impl AppInsightsObserver {
    pub fn new(connection_string: &str, config: &TelemetryConfig) -> Result<Self> {
        let connection: ConnectionString = connection_string
            .parse()
            .context("Invalid Application Insights connection string")?;

        Ok(Self {
            client: AppInsightsClient::new(connection)?,
            service_name: config.service_name.clone(),
            capture_message_content: config.capture_message_content,
            traces: Mutex::new(HashMap::new()),
        })
    }

    fn trace(&self, run_id: &str) -> Option<TraceContext> {
        let traces = self.traces.lock().unwrap_or_else(PoisonError::into_inner);
        traces.get(run_id).cloned()
    }

    /// Tag a span envelope with its trace, or leave it standalone for an unknown run
    fn tag(&self, envelope: Envelope, run_id: &str) -> Envelope {
        let envelope = envelope.with_tag(TAG_CLOUD_ROLE, self.service_name.clone());
        match self.trace(run_id) {
            Some(ctx) => envelope
                .with_tag(TAG_OPERATION_ID, ctx.trace_id)
                .with_tag(TAG_OPERATION_PARENT_ID, ctx.root_span_id)
                .with_tag(TAG_OPERATION_NAME, ctx.name),
            None => {
                tracing::debug!("No active trace for run {}, sending span standalone", run_id);
                envelope
            }
        }
    }
}

#[async_trait]
impl Observer for AppInsightsObserver {
    async fn trace_start(&self, run_id: String, name: String) -> Result<()> {
        let ctx = TraceContext::new(run_id.clone(), name);
        tracing::info!("Starting trace: trace_id={}, run_id={}", ctx.trace_id, run_id);

        let mut traces = self.traces.lock().unwrap_or_else(PoisonError::into_inner);
        traces.insert(run_id, ctx);
        Ok(())
    }

    async fn record_chat(&self, observation: ChatObservation) -> Result<()> {
        let data = RemoteDependencyData {
            ver: 2,
            name: format!("chat {}", observation.model),
            id: observation.span_id.clone(),
            duration: format_duration(observation.duration_ms),
            result_code: if observation.error.is_some() { "error" } else { "200" }.to_string(),
            success: observation.error.is_none(),
            dependency_type: "GenAI".to_string(),
            target: Some(observation.system.clone()),
            properties: observation.attributes(self.capture_message_content),
        };

        let envelope = self.tag(
            Envelope::dependency(self.client.instrumentation_key(), observation.started_at, data),
            &observation.run_id,
        );
        self.client.track(&[envelope]).await
    }

    async fn record_run(&self, observation: RunObservation) -> Result<()> {
        let data = RemoteDependencyData {
            ver: 2,
            name: format!("process_thread_run {}", observation.agent_id),
            id: observation.span_id.clone(),
            duration: format_duration(observation.duration_ms),
            result_code: observation.status.clone(),
            success: observation.succeeded(),
            dependency_type: "GenAI".to_string(),
            target: None,
            properties: observation.attributes(self.capture_message_content),
        };

        let envelope = self.tag(
            Envelope::dependency(self.client.instrumentation_key(), observation.started_at, data),
            &observation.run_id,
        );
        self.client.track(&[envelope]).await
    }

    async fn trace_end(&self, run_id: String, status: String, total_duration_ms: u64) -> Result<()> {
        let ctx = {
            let mut traces = self.traces.lock().unwrap_or_else(PoisonError::into_inner);
            traces.remove(&run_id)
        };
        let Some(ctx) = ctx else {
            anyhow::bail!("No active trace for run {}", run_id);
        };

        tracing::info!(
            "Ending trace: trace_id={}, status={}, duration_ms={}",
            ctx.trace_id,
            status,
            total_duration_ms
        );

        let mut properties = BTreeMap::new();
        properties.insert("run_id".to_string(), run_id);
        properties.insert("status".to_string(), status.clone());

        let data = RequestData {
            ver: 2,
            id: ctx.root_span_id.clone(),
            name: ctx.name.clone(),
            duration: format_duration(total_duration_ms),
            response_code: if status == "success" { "0" } else { "1" }.to_string(),
            success: status == "success",
            properties,
        };

        let envelope = Envelope::request(self.client.instrumentation_key(), ctx.started_at, data)
            .with_tag(TAG_CLOUD_ROLE, self.service_name.clone())
            .with_tag(TAG_OPERATION_ID, ctx.trace_id)
            .with_tag(TAG_OPERATION_NAME, ctx.name);

        self.client.track(&[envelope]).await
    }
}
