// Azure OpenAI-specific client implementation

use crate::credential::{Credential, COGNITIVE_SERVICES_SCOPE};
use crate::traits::{ChatClient, ChatRequest, ChatResponse};
use crate::wire::{ensure_success, ChatCompletionPayload, ChatCompletionResponse};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};

/// Azure OpenAI client (HTTP direct, no SDK)
///
/// Azure OpenAI differs from OpenAI in endpoint structure and authentication:
/// - URL: https://{resource}.openai.azure.com/openai/deployments/{deployment}/...
/// - Auth: `api-key` header, or an Entra ID bearer token for the Cognitive Services scope
/// - Deployment name is passed via the model parameter in each request
#[derive(Debug, Clone)]
pub struct AzureOpenAIClient {
    http_client: reqwest::Client,
    endpoint: String,
    api_version: String,
    credential: Credential,
}

impl AzureOpenAIClient {
    pub fn builder() -> AzureOpenAIClientBuilder {
        AzureOpenAIClientBuilder::default()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Full URL for an Azure OpenAI operation on a deployment
    pub fn build_url(&self, deployment_name: &str, path: &str) -> String {
        format!(
            "{}/openai/deployments/{}/{}?api-version={}",
            self.endpoint, deployment_name, path, self.api_version
        )
    }
}

/// Builder for AzureOpenAIClient
#[derive(Default)]
pub struct AzureOpenAIClientBuilder {
    endpoint: Option<String>,
    api_version: Option<String>,
    credential: Option<Credential>,
}

impl AzureOpenAIClientBuilder {
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.credential = Some(Credential::api_key(api_key));
        self
    }

    pub fn credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Set the resource endpoint (base URL)
    /// Example: "https://my-resource.openai.azure.com"
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = Some(api_version.into());
        self
    }

    pub fn build(self) -> Result<AzureOpenAIClient> {
        let credential = self.credential.context("Credential (API key or token) is required")?;
        let endpoint = self.endpoint.context("Endpoint is required")?;
        let api_version = self.api_version.context("API version is required")?;

        let endpoint = endpoint.trim_end_matches('/').to_string();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(AzureOpenAIClient {
            http_client,
            endpoint,
            api_version,
            credential,
        })
    }
}

#[async_trait]
impl ChatClient for AzureOpenAIClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let url = self.build_url(&request.model, "chat/completions");
        let payload = ChatCompletionPayload::new(None, &request.messages, &request.options);

        tracing::debug!(deployment = %request.model, messages = request.messages.len(), "Sending Azure OpenAI chat completion");

        let builder = self.http_client.post(&url).json(&payload);
        let response = self
            .credential
            .authorize(builder, COGNITIVE_SERVICES_SCOPE)
            .await?
            .send()
            .await
            .context("Failed to send request")?;

        let raw: ChatCompletionResponse = ensure_success("Azure OpenAI", response)
            .await?
            .json()
            .await
            .context("Failed to parse response")?;

        raw.into_chat_response()
    }
}
