use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

const BUNDLED_GROUNDING: &str = include_str!("../data/grounding.json");

/// Number of conversations the groundedness sample simulates by default
pub const DEFAULT_CONVERSATION_LIMIT: usize = 2;

/// A query paired with the context an answer must be grounded in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundingRecord {
    pub context: String,
    pub query: String,
}

/// The sample records shipped with the crate
pub fn load_bundled() -> Result<Vec<GroundingRecord>> {
    serde_json::from_str(BUNDLED_GROUNDING).context("Bundled grounding data is not valid")
}

/// Records from a JSON array file of `{"context", "query"}` objects
pub fn load_file(path: impl AsRef<Path>) -> Result<Vec<GroundingRecord>> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read grounding data from {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse grounding data in {}", path.display()))
}

/// One single-turn conversation per record, for at most `limit` records
pub fn conversation_turns(records: &[GroundingRecord], limit: usize) -> Vec<Vec<GroundingRecord>> {
    records.iter().take(limit).map(|r| vec![r.clone()]).collect()
}
