use anyhow::{anyhow, Result};
use foundry_llm::{ChatClient, ChatRequest, ChatResponse, FoundryLocal, Message, DEFAULT_LOCAL_ENDPOINT};

use crate::settings::{self, Settings};

pub const DEFAULT_MODEL_ALIAS: &str = "phi-3.5-mini";
pub const QUESTION: &str = "What is the golden ratio?";

#[derive(Debug, Clone)]
pub struct LocalConfig {
    pub endpoint: String,
    pub model_alias: String,
}

impl LocalConfig {
    pub fn from_settings(settings: &Settings) -> settings::Result<Self> {
        Ok(Self {
            endpoint: settings
                .optional("FOUNDRY_LOCAL_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_LOCAL_ENDPOINT.to_string()),
            model_alias: settings
                .optional("FOUNDRY_LOCAL_MODEL_ALIAS")
                .unwrap_or_else(|| DEFAULT_MODEL_ALIAS.to_string()),
        })
    }
}

/// Ask an on-device model one question through a running Foundry Local service
pub async fn run(config: LocalConfig) -> Result<ChatResponse> {
    let local = FoundryLocal::new(&config.endpoint)?;
    tracing::info!(endpoint = %local.endpoint(), "Connected to Foundry Local");

    let info = local
        .model_info(&config.model_alias)
        .await?
        .ok_or_else(|| anyhow!("Model info not found for alias: {}", config.model_alias))?;

    let response = local
        .client()
        .chat(ChatRequest::new(info.id, vec![Message::human(QUESTION)]))
        .await?;

    println!("{}", response.content.as_deref().unwrap_or_default());
    Ok(response)
}
