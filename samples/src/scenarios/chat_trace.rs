use anyhow::Result;
use chrono::Utc;
use foundry_agents::Credential;
use foundry_llm::{ChatClient, ChatRequest, ChatResponse, Message};
use foundry_observability::{new_span_id, ChatObservation, TelemetryConfig, AZURE_AI_SYSTEM};

use super::{connect_observer, log_export_error, project_client};
use crate::credentials::project_credential;
use crate::settings::{self, Settings};

pub const SERVICE_NAME: &str = "chat-with-trace";
pub const DEFAULT_API_VERSION: &str = "2024-10-21";
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant.";
pub const QUESTION: &str = "What is Azure Frogger?";

#[derive(Debug, Clone)]
pub struct ChatTraceConfig {
    pub project_endpoint: String,
    pub model_deployment_name: String,
    pub api_version: String,
    pub credential: Credential,
    pub telemetry: TelemetryConfig,
}

impl ChatTraceConfig {
    pub fn from_settings(settings: &Settings) -> settings::Result<Self> {
        Ok(Self {
            project_endpoint: settings.require("PROJECT_ENDPOINT")?,
            model_deployment_name: settings.require("MODEL_DEPLOYMENT_NAME")?,
            api_version: settings
                .optional("AZURE_API_VERSION")
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            credential: project_credential(settings),
            telemetry: settings.trace_telemetry_config(SERVICE_NAME)?,
        })
    }
}

/// One traced chat completion against the project's Azure OpenAI deployment
pub async fn run(config: ChatTraceConfig) -> Result<ChatResponse> {
    let project = project_client(&config.project_endpoint, config.credential)?;
    let observer = connect_observer(&project, config.telemetry).await;
    let client = project.openai_client(&config.api_version)?;

    let trace_id = uuid::Uuid::new_v4().to_string();
    log_export_error(
        observer.trace_start(trace_id.clone(), SERVICE_NAME.to_string()).await,
        "trace start",
    );
    let started_at = Utc::now();

    let request = ChatRequest::new(
        &config.model_deployment_name,
        vec![Message::system(SYSTEM_PROMPT), Message::human(QUESTION)],
    );
    let observation = ChatObservation::from_request(&trace_id, new_span_id(), AZURE_AI_SYSTEM, &request);

    let result = client.chat(request).await;
    let observation = match &result {
        Ok(response) => observation.with_response(response),
        Err(e) => observation.with_error(e),
    };
    log_export_error(observer.record_chat(observation).await, "chat span");

    let duration_ms = (Utc::now() - started_at).num_milliseconds().max(0) as u64;
    let status = if result.is_ok() { "success" } else { "error" };
    log_export_error(
        observer.trace_end(trace_id, status.to_string(), duration_ms).await,
        "trace end",
    );

    let response = result?;
    println!(
        "Role: {}, Content: {}",
        response.role,
        response.content.as_deref().unwrap_or_default()
    );
    Ok(response)
}
