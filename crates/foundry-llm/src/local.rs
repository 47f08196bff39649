// Foundry Local: on-device models served behind an OpenAI-compatible endpoint

use crate::openai::OpenAIClient;
use anyhow::Result;

/// Default endpoint of a running Foundry Local service
pub const DEFAULT_LOCAL_ENDPOINT: &str = "http://localhost:5273/v1";

/// Placeholder key; the local service does not check it
pub const LOCAL_API_KEY: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    pub alias: String,
    pub id: String,
}

/// Handle on an already-running Foundry Local service
#[derive(Debug, Clone)]
pub struct FoundryLocal {
    client: OpenAIClient,
}

impl FoundryLocal {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = OpenAIClient::with_base_url(endpoint, Some(LOCAL_API_KEY.to_string()))?;
        Ok(Self { client })
    }

    pub fn endpoint(&self) -> &str {
        self.client.base_url()
    }

    /// Chat client bound to the local endpoint
    pub fn client(&self) -> &OpenAIClient {
        &self.client
    }

    /// Resolve an alias such as `phi-3.5-mini` to the id of a loaded model variant
    pub async fn model_info(&self, alias: &str) -> Result<Option<ModelInfo>> {
        let ids: Vec<String> = self
            .client
            .list_models()
            .await?
            .into_iter()
            .map(|m| m.id)
            .collect();

        Ok(resolve_alias(alias, &ids).map(|id| ModelInfo {
            alias: alias.to_string(),
            id: id.to_string(),
        }))
    }
}

/// Exact id match wins; otherwise the first id starting with `<alias>-` (case-insensitive)
fn resolve_alias<'a>(alias: &str, ids: &'a [String]) -> Option<&'a str> {
    let alias = alias.to_lowercase();

    ids.iter()
        .find(|id| id.to_lowercase() == alias)
        .or_else(|| {
            let prefix = format!("{}-", alias);
            ids.iter().find(|id| id.to_lowercase().starts_with(&prefix))
        })
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_resolve_alias_prefers_exact_match() {
        let ids = ids(&["phi-3.5-mini-instruct-cuda-gpu", "phi-3.5-mini"]);
        assert_eq!(resolve_alias("phi-3.5-mini", &ids), Some("phi-3.5-mini"));
    }

    #[test]
    fn test_resolve_alias_variant_case_insensitive() {
        let ids = ids(&["qwen2.5-0.5b-instruct", "Phi-3.5-mini-instruct-generic-cpu"]);
        assert_eq!(
            resolve_alias("phi-3.5-mini", &ids),
            Some("Phi-3.5-mini-instruct-generic-cpu")
        );
    }

    #[test]
    fn test_resolve_alias_does_not_match_longer_family() {
        let ids = ids(&["phi-3.5-mini2-instruct"]);
        assert_eq!(resolve_alias("phi-3.5-mini", &ids), None);
    }
}
