use anyhow::Result;
use chrono::Utc;
use foundry_agents::{Credential, MessageRole, PollConfig, RunStatus};
use foundry_observability::{new_span_id, RunObservation, TelemetryConfig, TokenUsage};

use super::{connect_observer, log_export_error, project_client, run_conversation, ConversationOutcome};
use crate::console;
use crate::credentials::project_credential;
use crate::settings::{self, Settings};

pub const SERVICE_NAME: &str = "agent-chat-with-trace";
pub const QUESTION: &str = "What is Azure Frogger?";

#[derive(Debug, Clone)]
pub struct AgentTraceConfig {
    pub project_endpoint: String,
    pub model_deployment_name: String,
    /// Existing agent to talk to
    pub agent_id: String,
    pub credential: Credential,
    pub poll: PollConfig,
    pub telemetry: TelemetryConfig,
}

impl AgentTraceConfig {
    pub fn from_settings(settings: &Settings) -> settings::Result<Self> {
        Ok(Self {
            project_endpoint: settings.require("PROJECT_ENDPOINT")?,
            model_deployment_name: settings.require("MODEL_DEPLOYMENT_NAME")?,
            agent_id: settings.require("AI_FOUNDRY_AGENT_ID")?,
            credential: project_credential(settings),
            poll: settings.poll_config()?,
            telemetry: settings.trace_telemetry_config(SERVICE_NAME)?,
        })
    }
}

/// Ask an existing agent one question inside a trace exported to the project's telemetry
pub async fn run(config: AgentTraceConfig) -> Result<ConversationOutcome> {
    let project = project_client(&config.project_endpoint, config.credential)?;
    let observer = connect_observer(&project, config.telemetry).await;

    let trace_id = uuid::Uuid::new_v4().to_string();
    let trace_name = format!("{}_{}", SERVICE_NAME.replace('-', "_"), Utc::now().format("%Y-%m-%d %H:%M:%S"));
    log_export_error(observer.trace_start(trace_id.clone(), trace_name).await, "trace start");

    let started_at = Utc::now();
    let result = converse(&project, &config.agent_id, &config.poll).await;
    let duration_ms = (Utc::now() - started_at).num_milliseconds().max(0) as u64;

    if let Ok(outcome) = &result {
        let observation = RunObservation {
            span_id: new_span_id(),
            run_id: trace_id.clone(),
            agent_id: outcome.run.agent_id.clone(),
            thread_id: outcome.thread_id.clone(),
            remote_run_id: outcome.run.id.clone(),
            status: outcome.run.status.to_string(),
            started_at,
            duration_ms,
            input: Some(QUESTION.to_string()),
            output: outcome
                .messages
                .iter()
                .rev()
                .find(|m| m.role == MessageRole::Assistant)
                .map(|m| m.text()),
            last_error: outcome.run.last_error.as_ref().map(|e| e.to_string()),
            usage: outcome.run.usage.as_ref().map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
        };
        log_export_error(observer.record_run(observation).await, "run span");
    }

    let status = match &result {
        Ok(outcome) if outcome.run.status == RunStatus::Completed => "success",
        _ => "error",
    };
    log_export_error(
        observer.trace_end(trace_id, status.to_string(), duration_ms).await,
        "trace end",
    );

    let outcome = result?;
    for message in &outcome.messages {
        if let Some(line) = console::format_last_text(message) {
            println!("{}", line);
        }
    }
    Ok(outcome)
}

async fn converse(
    project: &foundry_agents::ProjectClient,
    agent_id: &str,
    poll: &PollConfig,
) -> Result<ConversationOutcome> {
    let agents = project.agents();
    let agent = agents.get_agent(agent_id).await?;
    tracing::info!(agent_id = %agent.id, model = %agent.model, "Using existing agent");
    run_conversation(&agents, &agent.id, QUESTION, poll).await
}
