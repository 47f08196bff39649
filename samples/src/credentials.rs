use foundry_llm::{AzureCliCredential, Credential, StaticTokenCredential};

use crate::settings::Settings;

/// Credential for project (agents, connections) requests.
///
/// `PROJECT_API_KEY`, then `AZURE_ACCESS_TOKEN`, then the signed-in Azure CLI.
pub fn project_credential(settings: &Settings) -> Credential {
    select(settings, "PROJECT_API_KEY")
}

/// Credential for Azure OpenAI requests.
///
/// `AZURE_OPENAI_API_KEY`, then `AZURE_ACCESS_TOKEN`, then the signed-in Azure CLI.
pub fn openai_credential(settings: &Settings) -> Credential {
    select(settings, "AZURE_OPENAI_API_KEY")
}

fn select(settings: &Settings, key_variable: &str) -> Credential {
    if let Some(key) = settings.optional(key_variable) {
        tracing::debug!("Authenticating with {}", key_variable);
        return Credential::api_key(key);
    }
    if let Some(token) = settings.optional("AZURE_ACCESS_TOKEN") {
        tracing::debug!("Authenticating with AZURE_ACCESS_TOKEN");
        return Credential::token(StaticTokenCredential::new(token));
    }
    tracing::debug!("Authenticating with the Azure CLI");
    Credential::token(AzureCliCredential::new())
}
