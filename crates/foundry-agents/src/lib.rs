//! REST client for Azure AI Foundry projects.
//!
//! Covers the agent service surface (agents, threads, messages, runs), project
//! connections, and the Application Insights lookup used for tracing. Runs are
//! driven to completion by [`poll_run`], which is independent of HTTP through
//! the [`RunStatusSource`] trait.

pub mod client;
pub mod error;
pub mod models;
pub mod poll;

mod transport;

pub use client::{
    AgentsClient, ConnectionsClient, ProjectClient, ProjectClientBuilder, TelemetryClient,
    DEFAULT_API_VERSION,
};
pub use error::{AgentsError, Result};
pub use models::{
    Agent, AgentDeletionStatus, AgentThread, AiSearchIndexResource, AzureAiSearchQueryType,
    AzureAiSearchResource, AzureAiSearchTool, CodeInterpreterResource, CodeInterpreterTool,
    Connection, ConnectionCredentials, ConnectionType, CreateAgentRequest, MessageContent,
    MessageRole, Run, RunError, RunStatus, RunUsage, TextContent, ThreadMessage, ToolDefinition,
    ToolResources,
};
pub use poll::{poll_run, PollConfig, RetryPolicy, RunStatusSource};

// Callers construct credentials without depending on foundry-llm directly
pub use foundry_llm::{AzureCliCredential, Credential, StaticTokenCredential, TokenCredential};
