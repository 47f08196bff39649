use anyhow::{Context, Result};
use async_trait::async_trait;
use foundry_llm::{ChatClient, ChatOptions, ChatRequest, Message};
use std::sync::Arc;

use crate::simulator::{ChatMessage, SimulatorTarget, TargetRequest};

/// Chat-completion application answering each user turn from its context
pub struct ChatTarget {
    client: Arc<dyn ChatClient>,
    deployment: String,
    options: ChatOptions,
}

impl ChatTarget {
    pub fn new(client: Arc<dyn ChatClient>, deployment: impl Into<String>) -> Self {
        Self {
            client,
            deployment: deployment.into(),
            options: Self::default_options(),
        }
    }

    pub fn default_options() -> ChatOptions {
        ChatOptions::new()
            .max_tokens(800)
            .temperature(0.7)
            .top_p(0.95)
            .frequency_penalty(0.0)
            .presence_penalty(0.0)
    }

    pub fn system_prompt(context: &str) -> String {
        format!(
            "You are a user assistant who helps answer questions based on some context.\n\nContext: '{}'",
            context
        )
    }

    /// Answer `query` using only the completion's first choice
    pub async fn answer(&self, query: &str, context: &str) -> Result<String> {
        let request = ChatRequest::new(
            self.deployment.clone(),
            vec![Message::system(Self::system_prompt(context)), Message::human(query)],
        )
        .with_options(self.options.clone());

        let response = self.client.chat(request).await?;
        response
            .content
            .context("Chat completion returned no content")
    }
}

#[async_trait]
impl SimulatorTarget for ChatTarget {
    async fn respond(&self, mut request: TargetRequest) -> Result<TargetRequest> {
        let latest = request
            .messages
            .last()
            .cloned()
            .context("Simulator sent no messages")?;
        let context = latest.context.clone();

        let answer = self
            .answer(&latest.content, context.as_deref().unwrap_or(""))
            .await?;

        request.messages.push(ChatMessage::assistant(answer, context.clone()));
        request.context = context;
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foundry_llm::ChatResponse;
    use std::sync::Mutex;

    /// Records requests and answers with a fixed string
    struct RecordingClient {
        requests: Mutex<Vec<ChatRequest>>,
    }

    #[async_trait]
    impl ChatClient for RecordingClient {
        async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
            self.requests.lock().unwrap().push(request);
            Ok(ChatResponse {
                role: "assistant".into(),
                content: Some("About every 95 minutes.".into()),
                model: "gpt-4o".into(),
                usage: None,
                finish_reason: Some("stop".into()),
                raw: serde_json::Value::Null,
            })
        }
    }

    #[tokio::test]
    async fn test_respond_appends_answer_with_context() {
        let client = Arc::new(RecordingClient { requests: Mutex::new(Vec::new()) });
        let target = ChatTarget::new(client.clone(), "gpt-4o");

        let response = target
            .respond(TargetRequest {
                messages: vec![ChatMessage::user("How often does Hubble orbit?", Some("95 minutes".into()))],
                stream: false,
                session_state: None,
                context: None,
            })
            .await
            .unwrap();

        assert_eq!(response.messages.len(), 2);
        assert_eq!(response.messages[1].role, "assistant");
        assert_eq!(response.messages[1].content, "About every 95 minutes.");
        assert_eq!(response.messages[1].context.as_deref(), Some("95 minutes"));

        let requests = client.requests.lock().unwrap();
        let sent = &requests[0];
        assert_eq!(sent.model, "gpt-4o");
        assert_eq!(sent.options, ChatTarget::default_options());
        assert_eq!(
            sent.messages[0],
            Message::system("You are a user assistant who helps answer questions based on some context.\n\nContext: '95 minutes'")
        );
        assert_eq!(sent.messages[1], Message::human("How often does Hubble orbit?"));
    }
}
