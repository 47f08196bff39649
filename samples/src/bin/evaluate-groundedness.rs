use foundry_observability::init_tracing;
use foundry_samples::scenarios::evaluation::{self, EvaluationConfig};
use foundry_samples::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    init_tracing(&settings.telemetry_config("evaluate-groundedness")?)?;

    let config = EvaluationConfig::from_settings(&settings)?;
    let report = evaluation::run(config).await?;

    if report.metrics.rows_failed > 0 {
        tracing::warn!("{} rows could not be evaluated", report.metrics.rows_failed);
    }
    Ok(())
}
