// Chat-completions request/response bodies shared by the Azure and OpenAI-compatible clients

use crate::traits::{ChatOptions, ChatResponse, TokenUsage};
use crate::types::Message;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionPayload<'a> {
    /// Azure carries the deployment in the URL, so the model is omitted there
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<&'a str>,
    pub messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<&'a [String]>,
    pub stream: bool,
}

impl<'a> ChatCompletionPayload<'a> {
    pub fn new(model: Option<&'a str>, messages: &'a [Message], options: &'a ChatOptions) -> Self {
        Self {
            model,
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            top_p: options.top_p,
            frequency_penalty: options.frequency_penalty,
            presence_penalty: options.presence_penalty,
            stop: options.stop.as_deref(),
            stream: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ChatCompletionResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Choice {
    #[serde(default)]
    pub index: u32,
    pub message: ResponseMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ResponseMessage {
    pub role: String,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl ChatCompletionResponse {
    pub fn into_chat_response(self) -> Result<ChatResponse> {
        let raw = serde_json::to_value(&self).context("Failed to re-encode chat response")?;
        let choice = self.choices.into_iter().next();

        Ok(ChatResponse {
            role: choice
                .as_ref()
                .map(|c| c.message.role.clone())
                .unwrap_or_else(|| "assistant".to_string()),
            content: choice.as_ref().and_then(|c| c.message.content.clone()),
            finish_reason: choice.and_then(|c| c.finish_reason),
            model: self.model,
            usage: self.usage.map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            raw,
        })
    }
}

/// Turn a non-success response into an error carrying the status and body
pub(crate) async fn ensure_success(provider: &str, response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let error_text = response.text().await.unwrap_or_default();
    anyhow::bail!("{} API error ({}): {}", provider, status, error_text)
}
