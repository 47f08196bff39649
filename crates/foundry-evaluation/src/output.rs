use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::simulator::{QueryResponseLine, SimulatedConversation};

pub const DEFAULT_SIMULATION_OUTPUT: &str = "ground_sim_output.jsonl";
pub const DEFAULT_EVALUATION_OUTPUT: &str = "ground_eval_output.json";

/// Write every conversation's turns as JSON lines; returns the number of lines
pub fn write_jsonl(path: impl AsRef<Path>, conversations: &[SimulatedConversation]) -> Result<usize> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    let mut lines = 0;

    for conversation in conversations {
        let chunk = conversation.to_eval_qr_json_lines()?;
        lines += chunk.lines().count();
        writer.write_all(chunk.as_bytes())?;
    }

    writer.flush()?;
    tracing::info!("Wrote {} simulated turns to {}", lines, path.display());
    Ok(lines)
}

/// Read query/response lines back; blank lines are skipped
pub fn read_jsonl(path: impl AsRef<Path>) -> Result<Vec<QueryResponseLine>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

    let mut rows = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row = serde_json::from_str(&line)
            .with_context(|| format!("{}:{} is not a query/response object", path.display(), index + 1))?;
        rows.push(row);
    }

    Ok(rows)
}
