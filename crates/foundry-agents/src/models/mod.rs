pub mod agent;
pub mod connection;
pub mod message;
pub mod run;
pub mod thread;
pub mod tool;

use serde::Deserialize;

pub use agent::{Agent, AgentDeletionStatus, CreateAgentRequest};
pub use connection::{Connection, ConnectionCredentials, ConnectionType};
pub use message::{CreateMessageRequest, ImageFile, MessageContent, MessageRole, TextContent, ThreadMessage};
pub use run::{CreateRunRequest, Run, RunError, RunStatus, RunUsage};
pub use thread::AgentThread;
pub use tool::{
    AiSearchIndexResource, AzureAiSearchQueryType, AzureAiSearchResource, AzureAiSearchTool,
    CodeInterpreterResource, CodeInterpreterTool, ToolDefinition, ToolResources,
};

/// Cursor-paginated list (`GET .../messages`)
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ListPage<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub last_id: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}
