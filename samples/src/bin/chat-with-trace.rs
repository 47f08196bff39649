use foundry_observability::init_tracing;
use foundry_samples::scenarios::chat_trace::{self, ChatTraceConfig};
use foundry_samples::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    let config = ChatTraceConfig::from_settings(&settings)?;
    init_tracing(&config.telemetry)?;

    chat_trace::run(config).await?;
    Ok(())
}
