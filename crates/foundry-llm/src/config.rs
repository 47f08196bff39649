// Configuration layer for provider-agnostic chat client creation

use crate::credential::Credential;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Type of chat provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    OpenAI,
    #[serde(rename = "azure_openai")]
    AzureOpenAI,
}

/// Configuration for an OpenAI-compatible provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Defaults to https://api.openai.com/v1
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Configuration for Azure OpenAI with key authentication
///
/// Token authentication goes through `AzureOpenAIClient::builder().credential(..)`
/// since a token source is not serializable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureConfig {
    pub api_key: String,
    pub endpoint: String,
    pub api_version: String,
}

/// Provider-specific configuration details
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    OpenAI(OpenAIConfig),
    #[serde(rename = "azure_openai")]
    AzureOpenAI(AzureConfig),
}

impl ProviderConfig {
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::OpenAI(OpenAIConfig {
            api_key: Some(api_key.into()),
            base_url: None,
        })
    }

    /// OpenAI-compatible server at `base_url`, e.g. a Foundry Local endpoint
    pub fn openai_compatible(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self::OpenAI(OpenAIConfig {
            api_key,
            base_url: Some(base_url.into()),
        })
    }

    /// # Arguments
    /// * `api_key` - Azure OpenAI API key
    /// * `endpoint` - resource base URL, e.g. "https://my-resource.openai.azure.com"
    /// * `api_version` - e.g. "2024-10-21"
    ///
    /// The deployment name is passed via the `model` field of each request.
    pub fn azure_openai(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self::AzureOpenAI(AzureConfig {
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            api_version: api_version.into(),
        })
    }

    pub fn provider_type(&self) -> ProviderType {
        match self {
            Self::OpenAI(_) => ProviderType::OpenAI,
            Self::AzureOpenAI(_) => ProviderType::AzureOpenAI,
        }
    }
}

/// Factory for creating chat clients from configuration
pub struct ClientFactory;

impl ClientFactory {
    pub fn create_chat_client(config: ProviderConfig) -> Result<Arc<dyn crate::traits::ChatClient>> {
        match config {
            ProviderConfig::OpenAI(openai_config) => {
                let client = match openai_config.base_url {
                    Some(base_url) => {
                        crate::openai::OpenAIClient::with_base_url(base_url, openai_config.api_key)?
                    }
                    None => {
                        let api_key = openai_config
                            .api_key
                            .ok_or_else(|| anyhow::anyhow!("API key is required for api.openai.com"))?;
                        crate::openai::OpenAIClient::new(api_key)?
                    }
                };
                Ok(Arc::new(client))
            }
            ProviderConfig::AzureOpenAI(azure_config) => {
                let client = crate::azure_openai::AzureOpenAIClient::builder()
                    .credential(Credential::api_key(azure_config.api_key))
                    .endpoint(azure_config.endpoint)
                    .api_version(azure_config.api_version)
                    .build()?;
                Ok(Arc::new(client))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_config() {
        let config = ProviderConfig::openai("test-key");
        assert_eq!(config.provider_type(), ProviderType::OpenAI);
    }

    #[test]
    fn test_azure_config() {
        let config = ProviderConfig::azure_openai(
            "test-key",
            "https://my-resource.openai.azure.com",
            "2024-10-21",
        );

        assert_eq!(config.provider_type(), ProviderType::AzureOpenAI);
    }

    #[test]
    fn test_serde_tagging() {
        let config = ProviderConfig::openai_compatible("http://localhost:5273/v1", None);

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["type"], "openai");
        assert_eq!(json["base_url"], "http://localhost:5273/v1");
        assert!(json.get("api_key").is_none());

        let deserialized: ProviderConfig = serde_json::from_value(json).unwrap();
        assert_eq!(deserialized.provider_type(), ProviderType::OpenAI);
    }

    #[test]
    fn test_factory_requires_key_for_public_openai() {
        let config = ProviderConfig::OpenAI(OpenAIConfig {
            api_key: None,
            base_url: None,
        });
        assert!(ClientFactory::create_chat_client(config).is_err());
    }

    #[test]
    fn test_factory_builds_local_client_without_key() {
        let config = ProviderConfig::openai_compatible("http://localhost:5273/v1", None);
        assert!(ClientFactory::create_chat_client(config).is_ok());
    }
}
