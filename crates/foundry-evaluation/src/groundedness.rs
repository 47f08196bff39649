use anyhow::{Context, Result};
use foundry_llm::{ChatClient, ChatOptions, ChatRequest, Message};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub const DEFAULT_THRESHOLD: u8 = 3;

const JUDGE_INSTRUCTIONS: &str = "\
You are an evaluator checking whether a RESPONSE is grounded in a CONTEXT.
A grounded response makes only claims that the context supports. Rate it on a 1 to 5 scale:
1 - The response is unrelated to the context or contradicts it.
2 - The response is mostly unsupported, with at most incidental overlap.
3 - The response is partly supported but adds or distorts important details.
4 - The response is supported, with only minor unsupported details.
5 - Every claim in the response is supported by the context.

Reply in exactly this format:
<S0>step-by-step reasoning</S0>
<S1>one-sentence explanation of the score</S1>
<S2>the integer score</S2>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvalOutcome {
    Pass,
    Fail,
}

impl fmt::Display for EvalOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => f.write_str("pass"),
            Self::Fail => f.write_str("fail"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundednessResult {
    pub groundedness: u8,
    pub reason: String,
    pub result: EvalOutcome,
    pub threshold: u8,
}

/// LLM-judged groundedness of a response against its context
pub struct GroundednessEvaluator {
    client: Arc<dyn ChatClient>,
    deployment: String,
    threshold: u8,
}

impl GroundednessEvaluator {
    pub fn new(client: Arc<dyn ChatClient>, deployment: impl Into<String>) -> Self {
        Self {
            client,
            deployment: deployment.into(),
            threshold: DEFAULT_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    pub async fn evaluate(&self, query: Option<&str>, response: &str, context: &str) -> Result<GroundednessResult> {
        let mut prompt = format!("CONTEXT: {}\n\n", context);
        if let Some(query) = query {
            prompt.push_str(&format!("QUERY: {}\n\n", query));
        }
        prompt.push_str(&format!("RESPONSE: {}", response));

        let request = ChatRequest::new(
            self.deployment.clone(),
            vec![Message::system(JUDGE_INSTRUCTIONS), Message::human(prompt)],
        )
        .with_options(ChatOptions::new().temperature(0.0).max_tokens(800));

        let reply = self
            .client
            .chat(request)
            .await
            .context("Groundedness judge request failed")?
            .content
            .context("Groundedness judge returned no content")?;

        let score = parse_score(&reply)
            .with_context(|| format!("No score found in judge reply: {}", reply))?;

        Ok(GroundednessResult {
            groundedness: score,
            reason: extract_tag(&reply, "S1").unwrap_or_default().to_string(),
            result: if score >= self.threshold { EvalOutcome::Pass } else { EvalOutcome::Fail },
            threshold: self.threshold,
        })
    }
}

/// Score from the `<S2>` tag, else the first digit 1-5 in the reply
pub fn parse_score(reply: &str) -> Option<u8> {
    let tagged = extract_tag(reply, "S2").and_then(first_score_digit);
    tagged.or_else(|| first_score_digit(reply))
}

fn first_score_digit(text: &str) -> Option<u8> {
    text.chars()
        .filter_map(|c| c.to_digit(10))
        .find(|d| (1..=5).contains(d))
        .map(|d| d as u8)
}

fn extract_tag<'a>(text: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let start = text.find(&open)? + open.len();
    let end = text[start..].find(&close)? + start;
    Some(text[start..end].trim())
}
