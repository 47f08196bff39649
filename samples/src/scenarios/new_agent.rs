use anyhow::Result;
use foundry_agents::{CodeInterpreterTool, CreateAgentRequest, Credential, PollConfig};

use super::{project_client, run_conversation, ConversationOutcome};
use crate::console;
use crate::credentials::project_credential;
use crate::settings::{self, Settings};

pub const AGENT_NAME: &str = "my-agent";
pub const INSTRUCTIONS: &str = "You are a helpful agent";
pub const QUESTION: &str = "What is the weather in Seattle today?";

#[derive(Debug, Clone)]
pub struct NewAgentConfig {
    pub project_endpoint: String,
    pub model_deployment_name: String,
    pub credential: Credential,
    pub poll: PollConfig,
}

impl NewAgentConfig {
    pub fn from_settings(settings: &Settings) -> settings::Result<Self> {
        Ok(Self {
            project_endpoint: settings.require("PROJECT_ENDPOINT")?,
            model_deployment_name: settings.require("MODEL_DEPLOYMENT_NAME")?,
            credential: project_credential(settings),
            poll: settings.poll_config()?,
        })
    }
}

/// Create a code-interpreter agent, ask it one question, then delete it
pub async fn run(config: NewAgentConfig) -> Result<ConversationOutcome> {
    let project = project_client(&config.project_endpoint, config.credential)?;
    let agents = project.agents();

    let code_interpreter = CodeInterpreterTool::new();
    let agent = agents
        .create_agent(
            CreateAgentRequest::new(&config.model_deployment_name)
                .with_name(AGENT_NAME)
                .with_instructions(INSTRUCTIONS)
                .with_tools(code_interpreter.definitions()),
        )
        .await?;
    println!("Created agent, ID: {}", agent.id);

    let outcome = run_conversation(&agents, &agent.id, QUESTION, &config.poll).await;
    if let Ok(outcome) = &outcome {
        console::print_messages(&outcome.messages);
    }

    // The agent is deleted whether or not the conversation succeeded
    match (agents.delete_agent(&agent.id).await, outcome) {
        (Ok(_), outcome) => {
            println!("Deleted agent");
            outcome
        }
        (Err(e), Ok(_)) => Err(e.into()),
        (Err(e), Err(conversation_error)) => {
            tracing::warn!(agent_id = %agent.id, error = %e, "Failed to delete agent");
            Err(conversation_error)
        }
    }
}
