use async_trait::async_trait;
use foundry_llm::{AzureOpenAIClient, Credential};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{AgentsError, Result};
use crate::models::{
    Agent, AgentDeletionStatus, AgentThread, Connection, ConnectionType, CreateAgentRequest,
    CreateMessageRequest, CreateRunRequest, ListPage, MessageRole, Run, ThreadMessage,
};
use crate::models::connection::ConnectionPage;
use crate::poll::{poll_run, PollConfig, RunStatusSource};
use crate::transport::{Pipeline, Resource};

pub const DEFAULT_API_VERSION: &str = "v1";

const MESSAGE_PAGE_SIZE: &str = "100";

/// Authenticated handle to one Foundry project
#[derive(Debug, Clone)]
pub struct ProjectClient {
    pipeline: Arc<Pipeline>,
}

impl ProjectClient {
    pub fn builder() -> ProjectClientBuilder {
        ProjectClientBuilder::default()
    }

    pub fn endpoint(&self) -> &str {
        self.pipeline.endpoint()
    }

    pub fn agents(&self) -> AgentsClient {
        AgentsClient { pipeline: Arc::clone(&self.pipeline) }
    }

    pub fn connections(&self) -> ConnectionsClient {
        ConnectionsClient { pipeline: Arc::clone(&self.pipeline) }
    }

    pub fn telemetry(&self) -> TelemetryClient {
        TelemetryClient { connections: self.connections() }
    }

    /// Azure OpenAI client for the resource hosting this project, sharing its credential
    pub fn openai_client(&self, api_version: impl Into<String>) -> Result<AzureOpenAIClient> {
        let url = reqwest::Url::parse(self.pipeline.endpoint())
            .map_err(|e| AgentsError::InvalidConfig(format!("Invalid project endpoint: {}", e)))?;
        let origin = url.origin().ascii_serialization();

        AzureOpenAIClient::builder()
            .endpoint(origin)
            .api_version(api_version)
            .credential(self.pipeline.credential().clone())
            .build()
            .map_err(|e| AgentsError::InvalidConfig(e.to_string()))
    }
}

#[derive(Debug, Default)]
pub struct ProjectClientBuilder {
    endpoint: Option<String>,
    credential: Option<Credential>,
    api_version: Option<String>,
    timeout: Option<Duration>,
}

impl ProjectClientBuilder {
    /// e.g. `https://<resource>.services.ai.azure.com/api/projects/<project>`
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    pub fn api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = Some(api_version.into());
        self
    }

    /// Per-request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<ProjectClient> {
        let endpoint = self
            .endpoint
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| AgentsError::InvalidConfig("Project endpoint is required".into()))?;
        let credential = self
            .credential
            .ok_or_else(|| AgentsError::InvalidConfig("Credential is required".into()))?;

        let pipeline = Pipeline::new(
            endpoint,
            self.api_version.unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            credential,
            self.timeout.unwrap_or(Duration::from_secs(60)),
        )?;

        Ok(ProjectClient { pipeline: Arc::new(pipeline) })
    }
}

/// Agents, threads, messages and runs
#[derive(Debug, Clone)]
pub struct AgentsClient {
    pipeline: Arc<Pipeline>,
}

impl AgentsClient {
    pub async fn create_agent(&self, request: CreateAgentRequest) -> Result<Agent> {
        let agent: Agent = self.pipeline.post("assistants", &request, None).await?;
        tracing::info!(agent_id = %agent.id, model = %agent.model, "Created agent");
        Ok(agent)
    }

    pub async fn get_agent(&self, agent_id: &str) -> Result<Agent> {
        self.pipeline
            .get(
                &format!("assistants/{}", agent_id),
                &[],
                Some(Resource { kind: "Agent", id: agent_id }),
            )
            .await
    }

    pub async fn delete_agent(&self, agent_id: &str) -> Result<AgentDeletionStatus> {
        let status: AgentDeletionStatus = self
            .pipeline
            .delete(
                &format!("assistants/{}", agent_id),
                Some(Resource { kind: "Agent", id: agent_id }),
            )
            .await?;
        tracing::info!(agent_id = %status.id, deleted = status.deleted, "Deleted agent");
        Ok(status)
    }

    pub async fn create_thread(&self) -> Result<AgentThread> {
        let thread: AgentThread = self.pipeline.post("threads", &json!({}), None).await?;
        tracing::info!(thread_id = %thread.id, "Created thread");
        Ok(thread)
    }

    pub async fn create_message(
        &self,
        thread_id: &str,
        role: MessageRole,
        content: impl Into<String>,
    ) -> Result<ThreadMessage> {
        let request = CreateMessageRequest { role, content: content.into() };
        self.pipeline
            .post(
                &format!("threads/{}/messages", thread_id),
                &request,
                Some(Resource { kind: "Thread", id: thread_id }),
            )
            .await
    }

    /// Every message on the thread, oldest first
    pub async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>> {
        let path = format!("threads/{}/messages", thread_id);
        let mut messages = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let page: ListPage<ThreadMessage> = {
                let mut query = vec![("order", "asc"), ("limit", MESSAGE_PAGE_SIZE)];
                if let Some(cursor) = after.as_deref() {
                    query.push(("after", cursor));
                }
                self.pipeline
                    .get(&path, &query, Some(Resource { kind: "Thread", id: thread_id }))
                    .await?
            };

            let cursor = page
                .last_id
                .clone()
                .or_else(|| page.data.last().map(|m| m.id.clone()));
            let fetched = page.data.len();
            messages.extend(page.data);

            match cursor {
                Some(cursor) if page.has_more && fetched > 0 => after = Some(cursor),
                _ => break,
            }
        }

        tracing::debug!(thread_id, count = messages.len(), "Listed messages");
        Ok(messages)
    }

    pub async fn create_run(&self, thread_id: &str, agent_id: &str) -> Result<Run> {
        let request = CreateRunRequest { agent_id: agent_id.to_string() };
        let run: Run = self
            .pipeline
            .post(
                &format!("threads/{}/runs", thread_id),
                &request,
                Some(Resource { kind: "Thread", id: thread_id }),
            )
            .await?;
        tracing::info!(run_id = %run.id, thread_id, agent_id, "Created run");
        Ok(run)
    }

    pub async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        self.pipeline
            .get(
                &format!("threads/{}/runs/{}", thread_id, run_id),
                &[],
                Some(Resource { kind: "Run", id: run_id }),
            )
            .await
    }

    pub async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        self.pipeline
            .post(
                &format!("threads/{}/runs/{}/cancel", thread_id, run_id),
                &json!({}),
                Some(Resource { kind: "Run", id: run_id }),
            )
            .await
    }

    /// Start a run and wait for it to reach a terminal status
    pub async fn create_and_process_run(
        &self,
        thread_id: &str,
        agent_id: &str,
        config: &PollConfig,
    ) -> Result<Run> {
        let run = self.create_run(thread_id, agent_id).await?;
        poll_run(self, run, config).await
    }
}

#[async_trait]
impl RunStatusSource for AgentsClient {
    async fn fetch_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        self.get_run(thread_id, run_id).await
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        AgentsClient::cancel_run(self, thread_id, run_id).await
    }
}

/// Project connections to other Azure resources
#[derive(Debug, Clone)]
pub struct ConnectionsClient {
    pipeline: Arc<Pipeline>,
}

impl ConnectionsClient {
    /// Connection metadata, without secrets
    pub async fn get(&self, name: &str) -> Result<Connection> {
        self.pipeline
            .get(
                &format!("connections/{}", name),
                &[],
                Some(Resource { kind: "Connection", id: name }),
            )
            .await
    }

    pub async fn get_with_credentials(&self, name: &str) -> Result<Connection> {
        self.pipeline
            .post(
                &format!("connections/{}/getConnectionWithCredentials", name),
                &json!({}),
                Some(Resource { kind: "Connection", id: name }),
            )
            .await
    }

    pub async fn list(&self, connection_type: Option<ConnectionType>) -> Result<Vec<Connection>> {
        let mut query = Vec::new();
        if let Some(connection_type) = connection_type {
            query.push(("connectionType", connection_type.as_str()));
        }

        let mut page: ConnectionPage = self.pipeline.get("connections", &query, None).await?;
        let mut connections = std::mem::take(&mut page.value);

        while let Some(link) = page.next_link.take() {
            page = self.pipeline.get_link(&link).await?;
            connections.append(&mut page.value);
        }

        Ok(connections)
    }
}

/// Lookup of the project's telemetry destination
#[derive(Debug, Clone)]
pub struct TelemetryClient {
    connections: ConnectionsClient,
}

impl TelemetryClient {
    /// Connection string of the project's Application Insights resource
    pub async fn application_insights_connection_string(&self) -> Result<String> {
        let connections = self.connections.list(Some(ConnectionType::AppInsights)).await?;

        let connection = connections
            .iter()
            .find(|c| c.is_default)
            .or_else(|| connections.first())
            .ok_or_else(|| AgentsError::NotFound {
                kind: "Application Insights connection",
                id: self.connections.pipeline.endpoint().to_string(),
            })?;

        let connection = self.connections.get_with_credentials(&connection.name).await?;

        connection
            .credentials
            .and_then(|c| c.key)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| AgentsError::NotFound {
                kind: "Application Insights connection string",
                id: connection.name,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_endpoint_and_credential() {
        let err = ProjectClient::builder()
            .credential(Credential::api_key("key"))
            .build()
            .unwrap_err();
        assert!(matches!(err, AgentsError::InvalidConfig(_)));

        let err = ProjectClient::builder()
            .endpoint("https://res.services.ai.azure.com/api/projects/p1")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Credential is required"));
    }

    #[test]
    fn test_openai_client_uses_resource_origin() {
        let project = ProjectClient::builder()
            .endpoint("https://res.services.ai.azure.com/api/projects/p1/")
            .credential(Credential::api_key("key"))
            .build()
            .unwrap();

        assert_eq!(project.endpoint(), "https://res.services.ai.azure.com/api/projects/p1");

        let openai = project.openai_client("2024-10-21").unwrap();
        assert_eq!(
            openai.build_url("gpt-4o", "chat/completions"),
            "https://res.services.ai.azure.com/openai/deployments/gpt-4o/chat/completions?api-version=2024-10-21"
        );
    }
}
