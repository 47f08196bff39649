use foundry_observability::init_tracing;
use foundry_samples::scenarios::agent_trace::{self, AgentTraceConfig};
use foundry_samples::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    let config = AgentTraceConfig::from_settings(&settings)?;
    init_tracing(&config.telemetry)?;

    agent_trace::run(config).await?;
    Ok(())
}
