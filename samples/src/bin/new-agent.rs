use foundry_observability::init_tracing;
use foundry_samples::scenarios::new_agent::{self, NewAgentConfig};
use foundry_samples::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    init_tracing(&settings.telemetry_config("new-agent")?)?;

    let config = NewAgentConfig::from_settings(&settings)?;
    new_agent::run(config).await?;
    Ok(())
}
