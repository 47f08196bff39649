//! Groundedness evaluation over simulated conversations.
//!
//! A [`Simulator`] replays grounding records against a [`SimulatorTarget`], the
//! resulting turns are written as JSON lines, and [`evaluate_jsonl`] scores each
//! line with a [`GroundednessEvaluator`].

pub mod dataset;
pub mod evaluate;
pub mod groundedness;
pub mod output;
pub mod simulator;
pub mod target;

pub use dataset::{conversation_turns, load_bundled, load_file, GroundingRecord, DEFAULT_CONVERSATION_LIMIT};
pub use evaluate::{evaluate_jsonl, EvaluationMetrics, EvaluationReport, EvaluationRow};
pub use groundedness::{parse_score, EvalOutcome, GroundednessEvaluator, GroundednessResult, DEFAULT_THRESHOLD};
pub use output::{read_jsonl, write_jsonl, DEFAULT_EVALUATION_OUTPUT, DEFAULT_SIMULATION_OUTPUT};
pub use simulator::{
    ChatMessage, QueryResponseLine, SimulatedConversation, Simulator, SimulatorTarget, TargetRequest,
};
pub use target::ChatTarget;
