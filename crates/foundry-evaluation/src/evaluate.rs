use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::groundedness::{EvalOutcome, GroundednessEvaluator, GroundednessResult};
use crate::output::read_jsonl;
use crate::simulator::QueryResponseLine;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRow {
    #[serde(flatten)]
    pub input: QueryResponseLine,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groundedness: Option<GroundednessResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    /// Mean score over rows that were scored
    pub mean_groundedness: Option<f64>,
    pub pass_rate: Option<f64>,
    pub rows_scored: usize,
    pub rows_failed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub rows: Vec<EvaluationRow>,
    pub metrics: EvaluationMetrics,
}

impl EvaluationReport {
    pub fn from_rows(rows: Vec<EvaluationRow>) -> Self {
        let scores: Vec<&GroundednessResult> = rows.iter().filter_map(|r| r.groundedness.as_ref()).collect();
        let scored = scores.len();

        let (mean_groundedness, pass_rate) = if scored == 0 {
            (None, None)
        } else {
            let total: f64 = scores.iter().map(|s| s.groundedness as f64).sum();
            let passed = scores.iter().filter(|s| s.result == EvalOutcome::Pass).count();
            (Some(total / scored as f64), Some(passed as f64 / scored as f64))
        };

        let metrics = EvaluationMetrics {
            mean_groundedness,
            pass_rate,
            rows_scored: scored,
            rows_failed: rows.len() - scored,
        };

        Self { rows, metrics }
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
    }
}

/// Score every line of a simulation output file.
///
/// A row whose judge call fails is kept with its error and left out of the metrics.
pub async fn evaluate_jsonl(path: impl AsRef<Path>, evaluator: &GroundednessEvaluator) -> Result<EvaluationReport> {
    let lines = read_jsonl(path)?;
    let mut rows = Vec::with_capacity(lines.len());

    for (index, line) in lines.into_iter().enumerate() {
        let outcome = evaluator
            .evaluate(
                Some(line.query.as_str()),
                &line.response,
                line.context.as_deref().unwrap_or(""),
            )
            .await;

        let row = match outcome {
            Ok(result) => EvaluationRow { input: line, groundedness: Some(result), error: None },
            Err(e) => {
                tracing::warn!("Row {} could not be evaluated: {:#}", index, e);
                EvaluationRow { input: line, groundedness: None, error: Some(format!("{:#}", e)) }
            }
        };
        rows.push(row);
    }

    Ok(EvaluationReport::from_rows(rows))
}
