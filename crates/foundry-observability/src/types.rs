use chrono::{DateTime, Utc};
use foundry_llm::{ChatRequest, ChatResponse, Message};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use foundry_llm::TokenUsage;

/// `gen_ai.system` for Azure-hosted models
pub const AZURE_AI_SYSTEM: &str = "az.ai.inference";
/// `gen_ai.system` for the agent service
pub const AZURE_AGENTS_SYSTEM: &str = "az.ai.agents";

/// A chat completion call, captured for tracing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatObservation {
    pub span_id: String,
    /// Trace this call belongs to, as passed to `trace_start`
    pub run_id: String,
    pub system: String,
    pub model: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub input_messages: Vec<ObservedMessage>,
    pub output: Option<String>,
    pub response_model: Option<String>,
    pub finish_reason: Option<String>,
    pub usage: Option<TokenUsage>,
    pub error: Option<String>,
}

impl ChatObservation {
    /// Start an observation from the outgoing request
    pub fn from_request(
        run_id: impl Into<String>,
        span_id: impl Into<String>,
        system: impl Into<String>,
        request: &ChatRequest,
    ) -> Self {
        Self {
            span_id: span_id.into(),
            run_id: run_id.into(),
            system: system.into(),
            model: request.model.clone(),
            started_at: Utc::now(),
            duration_ms: 0,
            input_messages: request.messages.iter().map(ObservedMessage::from).collect(),
            output: None,
            response_model: None,
            finish_reason: None,
            usage: None,
            error: None,
        }
    }

    pub fn with_response(mut self, response: &ChatResponse) -> Self {
        self.output = response.content.clone();
        self.response_model = Some(response.model.clone());
        self.finish_reason = response.finish_reason.clone();
        self.usage = response.usage.clone();
        self.finish()
    }

    pub fn with_error(mut self, error: &anyhow::Error) -> Self {
        self.error = Some(format!("{:#}", error));
        self.finish()
    }

    fn finish(mut self) -> Self {
        let elapsed = Utc::now() - self.started_at;
        self.duration_ms = elapsed.num_milliseconds().max(0) as u64;
        self
    }

    /// Span attributes in GenAI semantic-convention names
    pub fn attributes(&self, capture_content: bool) -> BTreeMap<String, String> {
        let mut attrs = BTreeMap::new();
        attrs.insert("gen_ai.operation.name".into(), "chat".into());
        attrs.insert("gen_ai.system".into(), self.system.clone());
        attrs.insert("gen_ai.request.model".into(), self.model.clone());

        if let Some(model) = &self.response_model {
            attrs.insert("gen_ai.response.model".into(), model.clone());
        }
        if let Some(reason) = &self.finish_reason {
            attrs.insert("gen_ai.response.finish_reasons".into(), reason.clone());
        }
        insert_usage(&mut attrs, self.usage.as_ref());
        if let Some(error) = &self.error {
            attrs.insert("error.type".into(), error.clone());
        }

        if capture_content {
            if let Ok(input) = serde_json::to_string(&self.input_messages) {
                attrs.insert("gen_ai.input.messages".into(), input);
            }
            if let Some(output) = &self.output {
                attrs.insert("gen_ai.output.text".into(), output.clone());
            }
        }

        attrs
    }
}

/// An agent run, captured for tracing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunObservation {
    pub span_id: String,
    pub run_id: String,
    pub agent_id: String,
    pub thread_id: String,
    /// Id the service assigned to the run
    pub remote_run_id: String,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub input: Option<String>,
    pub output: Option<String>,
    pub last_error: Option<String>,
    pub usage: Option<TokenUsage>,
}

impl RunObservation {
    pub fn succeeded(&self) -> bool {
        self.status == "completed"
    }

    pub fn attributes(&self, capture_content: bool) -> BTreeMap<String, String> {
        let mut attrs = BTreeMap::new();
        attrs.insert("gen_ai.operation.name".into(), "process_thread_run".into());
        attrs.insert("gen_ai.system".into(), AZURE_AGENTS_SYSTEM.into());
        attrs.insert("gen_ai.agent.id".into(), self.agent_id.clone());
        attrs.insert("gen_ai.thread.id".into(), self.thread_id.clone());
        attrs.insert("gen_ai.thread.run.id".into(), self.remote_run_id.clone());
        attrs.insert("gen_ai.thread.run.status".into(), self.status.clone());
        insert_usage(&mut attrs, self.usage.as_ref());
        if let Some(error) = &self.last_error {
            attrs.insert("error.type".into(), error.clone());
        }

        if capture_content {
            if let Some(input) = &self.input {
                attrs.insert("gen_ai.input.text".into(), input.clone());
            }
            if let Some(output) = &self.output {
                attrs.insert("gen_ai.output.text".into(), output.clone());
            }
        }

        attrs
    }
}

fn insert_usage(attrs: &mut BTreeMap<String, String>, usage: Option<&TokenUsage>) {
    if let Some(usage) = usage {
        attrs.insert("gen_ai.usage.input_tokens".into(), usage.input_tokens.to_string());
        attrs.insert("gen_ai.usage.output_tokens".into(), usage.output_tokens.to_string());
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedMessage {
    pub role: String,
    pub content: String,
}

impl From<&Message> for ObservedMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role().to_string(),
            content: message.content().to_plain_text(),
        }
    }
}

/// Ids for one trace and the spans recorded under it
#[derive(Debug, Clone)]
pub struct TraceContext {
    /// W3C trace id (32 hex chars); App Insights operation id
    pub trace_id: String,
    /// Id of the enclosing request span
    pub root_span_id: String,
    pub run_id: String,
    pub name: String,
    pub started_at: DateTime<Utc>,
}

impl TraceContext {
    pub fn new(run_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            trace_id: uuid::Uuid::new_v4().simple().to_string(),
            root_span_id: new_span_id(),
            run_id: run_id.into(),
            name: name.into(),
            started_at: Utc::now(),
        }
    }
}

/// W3C span id (16 hex chars)
pub fn new_span_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    id[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation() -> ChatObservation {
        let request = ChatRequest::new(
            "gpt-4o",
            vec![Message::system("You are helpful"), Message::human("Hey, can you help me with my taxes?")],
        );
        let mut obs = ChatObservation::from_request("trace-1", "span-1", AZURE_AI_SYSTEM, &request);
        obs.output = Some("Sure, I can help.".into());
        obs.usage = Some(TokenUsage { input_tokens: 20, output_tokens: 5, total_tokens: 25 });
        obs
    }

    #[test]
    fn test_chat_attributes_without_content() {
        let attrs = observation().attributes(false);

        assert_eq!(attrs["gen_ai.system"], "az.ai.inference");
        assert_eq!(attrs["gen_ai.request.model"], "gpt-4o");
        assert_eq!(attrs["gen_ai.usage.input_tokens"], "20");
        assert!(!attrs.contains_key("gen_ai.input.messages"));
        assert!(!attrs.contains_key("gen_ai.output.text"));
    }

    #[test]
    fn test_chat_attributes_with_content() {
        let attrs = observation().attributes(true);

        assert!(attrs["gen_ai.input.messages"].contains("Hey, can you help me with my taxes?"));
        assert_eq!(attrs["gen_ai.output.text"], "Sure, I can help.");
    }

    #[test]
    fn test_trace_ids_are_w3c_shaped() {
        let ctx = TraceContext::new("run-1", "agent-chat");
        assert_eq!(ctx.trace_id.len(), 32);
        assert_eq!(ctx.root_span_id.len(), 16);
        assert!(ctx.trace_id.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
