//! Conversation simulation.
//!
//! Conversations run concurrently up to `concurrent_async_tasks`; the turns of
//! one conversation run in order. Results come back in input order.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};

use crate::dataset::GroundingRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>, context: Option<String>) -> Self {
        Self { role: "user".into(), content: content.into(), context }
    }

    pub fn assistant(content: impl Into<String>, context: Option<String>) -> Self {
        Self { role: "assistant".into(), content: content.into(), context }
    }
}

/// What the simulator hands the application under test on every turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetRequest {
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    pub session_state: Option<String>,
    pub context: Option<String>,
}

/// The application under test
#[async_trait]
pub trait SimulatorTarget: Send + Sync {
    /// Return `request` with one assistant message appended
    async fn respond(&self, request: TargetRequest) -> Result<TargetRequest>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedConversation {
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponseLine {
    pub query: String,
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl SimulatedConversation {
    /// Each user message paired with the assistant reply that follows it
    pub fn query_response_pairs(&self) -> Vec<QueryResponseLine> {
        self.messages
            .windows(2)
            .filter(|pair| pair[0].role == "user" && pair[1].role == "assistant")
            .map(|pair| QueryResponseLine {
                query: pair[0].content.clone(),
                response: pair[1].content.clone(),
                context: pair[1].context.clone().or_else(|| pair[0].context.clone()),
            })
            .collect()
    }

    /// One newline-terminated JSON object per turn
    pub fn to_eval_qr_json_lines(&self) -> Result<String> {
        let mut out = String::new();
        for line in self.query_response_pairs() {
            out.push_str(&serde_json::to_string(&line)?);
            out.push('\n');
        }
        Ok(out)
    }
}

#[derive(Debug, Clone)]
pub struct Simulator {
    /// User turns replayed per conversation
    pub max_conversation_turns: usize,
    /// Conversations in flight at once
    pub concurrent_async_tasks: usize,
}

impl Default for Simulator {
    fn default() -> Self {
        Self { max_conversation_turns: 1, concurrent_async_tasks: 10 }
    }
}

impl Simulator {
    pub fn new(max_conversation_turns: usize, concurrent_async_tasks: usize) -> Self {
        Self { max_conversation_turns, concurrent_async_tasks }
    }

    pub async fn simulate<T>(
        &self,
        target: &T,
        conversation_turns: Vec<Vec<GroundingRecord>>,
    ) -> Result<Vec<SimulatedConversation>>
    where
        T: SimulatorTarget + ?Sized,
    {
        if self.concurrent_async_tasks == 0 {
            bail!("concurrent_async_tasks must be at least 1");
        }

        tracing::info!(
            conversations = conversation_turns.len(),
            concurrency = self.concurrent_async_tasks,
            "Simulating conversations"
        );

        stream::iter(conversation_turns.into_iter().enumerate())
            .map(|(index, turns)| async move {
                self.run_conversation(target, turns)
                    .await
                    .with_context(|| format!("Conversation {} failed", index))
            })
            .buffered(self.concurrent_async_tasks)
            .try_collect()
            .await
    }

    async fn run_conversation<T>(&self, target: &T, turns: Vec<GroundingRecord>) -> Result<SimulatedConversation>
    where
        T: SimulatorTarget + ?Sized,
    {
        let mut state = TargetRequest {
            messages: Vec::new(),
            stream: false,
            session_state: None,
            context: None,
        };

        for turn in turns.into_iter().take(self.max_conversation_turns) {
            state.messages.push(ChatMessage::user(turn.query, Some(turn.context)));
            let sent = state.messages.len();

            state = target.respond(state).await?;

            match state.messages.last() {
                Some(last) if state.messages.len() == sent + 1 && last.role == "assistant" => {}
                _ => bail!("Target did not append exactly one assistant message"),
            }
        }

        Ok(SimulatedConversation { messages: state.messages })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn record(n: usize) -> GroundingRecord {
        GroundingRecord { context: format!("context {}", n), query: format!("question {}", n) }
    }

    /// Echoes the query; earlier conversations take longer so completion order is reversed
    struct EchoTarget {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl EchoTarget {
        fn new() -> Self {
            Self { in_flight: AtomicUsize::new(0), peak: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl SimulatorTarget for EchoTarget {
        async fn respond(&self, mut request: TargetRequest) -> Result<TargetRequest> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            let last = request.messages.last().cloned().unwrap();
            let n: u64 = last.content.trim_start_matches("question ").parse().unwrap();
            tokio::time::sleep(Duration::from_millis(40 - n * 5)).await;

            request
                .messages
                .push(ChatMessage::assistant(format!("answer to {}", last.content), last.context));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(request)
        }
    }

    struct SilentTarget;

    #[async_trait]
    impl SimulatorTarget for SilentTarget {
        async fn respond(&self, request: TargetRequest) -> Result<TargetRequest> {
            Ok(request)
        }
    }

    #[tokio::test]
    async fn test_results_keep_input_order_under_bounded_concurrency() {
        let target = EchoTarget::new();
        let turns: Vec<_> = (0..6).map(|n| vec![record(n)]).collect();

        let conversations = Simulator::new(1, 3).simulate(&target, turns).await.unwrap();

        assert_eq!(conversations.len(), 6);
        for (n, conversation) in conversations.iter().enumerate() {
            assert_eq!(conversation.messages[0].content, format!("question {}", n));
            assert_eq!(conversation.messages[1].content, format!("answer to question {}", n));
        }
        assert!(target.peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_max_conversation_turns_caps_user_turns() {
        let target = EchoTarget::new();
        let conversations = Simulator::new(1, 10)
            .simulate(&target, vec![vec![record(1), record(2)]])
            .await
            .unwrap();

        assert_eq!(conversations[0].messages.len(), 2);
    }

    #[tokio::test]
    async fn test_target_without_reply_is_an_error() {
        let err = Simulator::default()
            .simulate(&SilentTarget, vec![vec![record(0)]])
            .await
            .unwrap_err();

        assert!(format!("{:#}", err).contains("assistant message"));
    }

    #[tokio::test]
    async fn test_zero_concurrency_is_rejected() {
        let result = Simulator::new(1, 0).simulate(&SilentTarget, vec![]).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_eval_lines_one_per_turn() {
        let conversation = SimulatedConversation {
            messages: vec![
                ChatMessage::user("q1", Some("c1".into())),
                ChatMessage::assistant("r1", Some("c1".into())),
                ChatMessage::user("q2", None),
                ChatMessage::assistant("r2", None),
            ],
        };

        let lines = conversation.to_eval_qr_json_lines().unwrap();
        let parsed: Vec<serde_json::Value> = lines
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert!(lines.ends_with('\n'));
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0], serde_json::json!({"query": "q1", "response": "r1", "context": "c1"}));
        assert_eq!(parsed[1], serde_json::json!({"query": "q2", "response": "r2"}));
    }
}
