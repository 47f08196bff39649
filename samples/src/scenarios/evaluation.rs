use anyhow::Result;
use foundry_evaluation::{
    conversation_turns, evaluate_jsonl, load_bundled, write_jsonl, ChatTarget, EvaluationReport,
    GroundednessEvaluator, Simulator, DEFAULT_CONVERSATION_LIMIT, DEFAULT_EVALUATION_OUTPUT,
    DEFAULT_SIMULATION_OUTPUT,
};
use foundry_llm::{AzureOpenAIClient, ChatClient, Credential};
use std::path::PathBuf;
use std::sync::Arc;

use crate::credentials::openai_credential;
use crate::settings::{self, Settings};

pub const CONCURRENT_TASKS: usize = 10;
pub const MAX_CONVERSATION_TURNS: usize = 1;

#[derive(Debug, Clone)]
pub struct EvaluationConfig {
    pub azure_endpoint: String,
    /// Deployment used both to answer and to judge
    pub deployment_name: String,
    pub api_version: String,
    pub credential: Credential,
    pub simulation_output: PathBuf,
    pub evaluation_output: PathBuf,
    pub conversation_limit: usize,
}

impl EvaluationConfig {
    pub fn from_settings(settings: &Settings) -> settings::Result<Self> {
        Ok(Self {
            azure_endpoint: settings.require("AZURE_OPENAI_ENDPOINT")?,
            deployment_name: settings.require("AZURE_DEPLOYMENT_NAME")?,
            api_version: settings.require("AZURE_API_VERSION")?,
            credential: openai_credential(settings),
            simulation_output: settings
                .optional("EVAL_OUTPUT_FILE")
                .unwrap_or_else(|| DEFAULT_SIMULATION_OUTPUT.to_string())
                .into(),
            evaluation_output: settings
                .optional("EVAL_RESULT_FILE")
                .unwrap_or_else(|| DEFAULT_EVALUATION_OUTPUT.to_string())
                .into(),
            conversation_limit: settings
                .parse_optional("EVAL_CONVERSATION_LIMIT")?
                .unwrap_or(DEFAULT_CONVERSATION_LIMIT),
        })
    }
}

/// Simulate grounded conversations, write them as JSON lines, then score them
pub async fn run(config: EvaluationConfig) -> Result<EvaluationReport> {
    let client: Arc<dyn ChatClient> = Arc::new(
        AzureOpenAIClient::builder()
            .endpoint(&config.azure_endpoint)
            .api_version(&config.api_version)
            .credential(config.credential.clone())
            .build()?,
    );

    let records = load_bundled()?;
    let turns = conversation_turns(&records, config.conversation_limit);

    let target = ChatTarget::new(client.clone(), &config.deployment_name);
    let simulator = Simulator::new(MAX_CONVERSATION_TURNS, CONCURRENT_TASKS);
    let conversations = simulator.simulate(&target, turns).await?;

    let written = write_jsonl(&config.simulation_output, &conversations)?;
    println!(
        "Wrote {} simulated turns to {}",
        written,
        config.simulation_output.display()
    );

    let evaluator = GroundednessEvaluator::new(client, &config.deployment_name);
    let report = evaluate_jsonl(&config.simulation_output, &evaluator).await?;
    report.write(&config.evaluation_output)?;

    match report.metrics.mean_groundedness {
        Some(mean) => println!("Mean groundedness: {:.2}", mean),
        None => println!("Mean groundedness: n/a"),
    }
    if let Some(pass_rate) = report.metrics.pass_rate {
        println!("Pass rate: {:.2}", pass_rate);
    }
    println!(
        "Rows scored: {}, rows failed: {}",
        report.metrics.rows_scored, report.metrics.rows_failed
    );
    println!("Evaluation written to {}", config.evaluation_output.display());

    Ok(report)
}
