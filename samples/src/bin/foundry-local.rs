use foundry_observability::init_tracing;
use foundry_samples::scenarios::local::{self, LocalConfig};
use foundry_samples::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    init_tracing(&settings.telemetry_config("foundry-local")?)?;

    let config = LocalConfig::from_settings(&settings)?;
    local::run(config).await?;
    Ok(())
}
