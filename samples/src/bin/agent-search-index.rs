use foundry_observability::init_tracing;
use foundry_samples::scenarios::search_index::{self, SearchIndexConfig};
use foundry_samples::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    init_tracing(&settings.telemetry_config("agent-search-index")?)?;

    let config = SearchIndexConfig::from_settings(&settings)?;
    search_index::run(config).await?;
    Ok(())
}
