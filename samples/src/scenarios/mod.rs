//! One module per sample program.
//!
//! Every scenario reads its settings into a typed config first, so a missing
//! variable fails before any request is sent.

pub mod agent_trace;
pub mod chat_trace;
pub mod evaluation;
pub mod local;
pub mod new_agent;
pub mod search_index;

use anyhow::Result;
use foundry_agents::{AgentsClient, Credential, MessageRole, PollConfig, ProjectClient, Run, ThreadMessage};
use foundry_observability::{observer_from_config, LogObserver, Observer, TelemetryConfig};
use std::sync::Arc;

use crate::console;

/// What a single-question conversation with an agent produced
#[derive(Debug, Clone)]
pub struct ConversationOutcome {
    pub thread_id: String,
    pub run: Run,
    pub messages: Vec<ThreadMessage>,
}

pub fn project_client(endpoint: &str, credential: Credential) -> Result<ProjectClient> {
    Ok(ProjectClient::builder()
        .endpoint(endpoint)
        .credential(credential)
        .build()?)
}

/// Thread, user message, run to completion, then the thread's messages.
///
/// A failed run is reported and the messages are still listed.
pub async fn run_conversation(
    agents: &AgentsClient,
    agent_id: &str,
    content: &str,
    poll: &PollConfig,
) -> Result<ConversationOutcome> {
    let thread = agents.create_thread().await?;
    println!("Created thread, ID: {}", thread.id);

    let message = agents.create_message(&thread.id, MessageRole::User, content).await?;
    println!("Created message, ID: {}", message.id);

    let run = agents.create_and_process_run(&thread.id, agent_id, poll).await?;
    console::print_run(&run);

    let messages = agents.list_messages(&thread.id).await?;

    Ok(ConversationOutcome { thread_id: thread.id, run, messages })
}

/// Exporter for the project's Application Insights resource, or logs when it has none
pub async fn connect_observer(project: &ProjectClient, mut telemetry: TelemetryConfig) -> Arc<dyn Observer> {
    if telemetry.app_insights_connection_string.is_none() {
        match project.telemetry().application_insights_connection_string().await {
            Ok(connection_string) => telemetry.app_insights_connection_string = Some(connection_string),
            Err(e) => tracing::warn!("Tracing to logs only: {}", e),
        }
    }

    match observer_from_config(&telemetry) {
        Ok(observer) => observer,
        Err(e) => {
            tracing::warn!("Tracing to logs only: {:#}", e);
            Arc::new(LogObserver::new(&telemetry))
        }
    }
}

/// Telemetry export never aborts a sample
pub(crate) fn log_export_error(result: Result<()>, what: &str) {
    if let Err(e) = result {
        tracing::warn!("Failed to export {}: {:#}", what, e);
    }
}
