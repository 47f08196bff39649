use anyhow::Result;
use foundry_agents::{AzureAiSearchQueryType, AzureAiSearchTool, CreateAgentRequest, Credential, PollConfig};

use super::{project_client, run_conversation, ConversationOutcome};
use crate::console;
use crate::credentials::project_credential;
use crate::settings::{self, Settings};

pub const AGENT_NAME: &str = "my-azure-agent";
pub const QUESTION: &str = "What is Azure Frogger?";
pub const TOP_K: u32 = 3;

pub const INSTRUCTIONS: &str = "\
# OBJECTIVE
    You are an agent which uses your knowledge stores to help users.
    You have access to an Azure AI Search index which you can use to answer user queries.

# PERSONA
    You are a helpful assistant.

# TOOLS
    You have access to the following tool: Azure AI Search. Use it to answer user queries.
    When using the tool, be sure to use the most specific search terms possible.
";

#[derive(Debug, Clone)]
pub struct SearchIndexConfig {
    pub project_endpoint: String,
    pub model_deployment_name: String,
    /// Name of the project's existing Azure AI Search connection
    pub connection_name: String,
    pub search_endpoint: String,
    pub search_key: String,
    pub index_name: String,
    pub credential: Credential,
    pub poll: PollConfig,
}

impl SearchIndexConfig {
    pub fn from_settings(settings: &Settings) -> settings::Result<Self> {
        Ok(Self {
            project_endpoint: settings.require("PROJECT_ENDPOINT")?,
            model_deployment_name: settings.require("MODEL_DEPLOYMENT_NAME")?,
            connection_name: settings.require("AI_FOUNDRY_WORKSPACE_SEARCH_CONNECTION_NAME")?,
            search_endpoint: settings.require("AI_SEARCH_ENDPOINT")?,
            search_key: settings.require("AI_SEARCH_KEY")?,
            index_name: settings.require("AI_SEARCH_INDEX_NAME")?,
            credential: project_credential(settings),
            poll: settings.poll_config()?,
        })
    }
}

/// Create an agent grounded on an existing search index and ask it one question.
///
/// The agent is left in place for further experiments.
pub async fn run(config: SearchIndexConfig) -> Result<ConversationOutcome> {
    let project = project_client(&config.project_endpoint, config.credential)?;

    let connection = project.connections().get(&config.connection_name).await?;
    tracing::info!(
        connection = %connection.name,
        target = %connection.target,
        "Using search service {}",
        config.search_endpoint
    );

    let search = AzureAiSearchTool::new(connection.id, &config.index_name)
        .with_query_type(AzureAiSearchQueryType::VectorSemanticHybrid)
        .with_top_k(TOP_K);

    let agents = project.agents();
    let agent = agents
        .create_agent(
            CreateAgentRequest::new(&config.model_deployment_name)
                .with_name(AGENT_NAME)
                .with_instructions(INSTRUCTIONS)
                .with_tools(search.definitions())
                .with_tool_resources(search.resources()),
        )
        .await?;
    println!("Created agent, ID: {}", agent.id);

    let outcome = run_conversation(&agents, &agent.id, QUESTION, &config.poll).await?;
    console::print_messages(&outcome.messages);
    Ok(outcome)
}
