// OpenAI-compatible client implementation (OpenAI, Foundry Local, other /v1 servers)

use crate::traits::{ChatClient, ChatRequest, ChatResponse};
use crate::wire::{ensure_success, ChatCompletionPayload, ChatCompletionResponse};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// OpenAI client (HTTP direct, no SDK)
#[derive(Debug, Clone)]
pub struct OpenAIClient {
    http_client: reqwest::Client,
    base_url: String,
}

/// Entry of the `/models` listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelEntry {
    pub id: String,
    #[serde(default)]
    pub owned_by: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    data: Vec<ModelEntry>,
}

impl OpenAIClient {
    /// Client for api.openai.com
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(OPENAI_API_BASE, Some(api_key.into()))
    }

    /// Client for any OpenAI-compatible server. Local servers usually need no key.
    pub fn with_base_url(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(api_key) = api_key {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", api_key))
                    .context("Invalid API key format")?,
            );
        }

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List the models served by the endpoint
    pub async fn list_models(&self) -> Result<Vec<ModelEntry>> {
        let url = format!("{}/models", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .context("Failed to send request")?;

        let list: ModelList = ensure_success("OpenAI", response)
            .await?
            .json()
            .await
            .context("Failed to parse model list")?;

        Ok(list.data)
    }
}

#[async_trait]
impl ChatClient for OpenAIClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/chat/completions", self.base_url);
        let payload =
            ChatCompletionPayload::new(Some(&request.model), &request.messages, &request.options);

        tracing::debug!(model = %request.model, "Sending chat completion to {}", self.base_url);

        let response = self
            .http_client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .context("Failed to send request")?;

        let raw: ChatCompletionResponse = ensure_success("OpenAI", response)
            .await?
            .json()
            .await
            .context("Failed to parse response")?;

        raw.into_chat_response()
    }
}
