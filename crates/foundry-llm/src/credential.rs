// Credentials for Azure-hosted endpoints
//
// Azure services accept either a resource key (`api-key` header) or an Entra ID
// bearer token scoped to the service audience.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use reqwest::RequestBuilder;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Token audience for Azure OpenAI / Cognitive Services
pub const COGNITIVE_SERVICES_SCOPE: &str = "https://cognitiveservices.azure.com/.default";

/// Token audience for Azure AI Foundry projects (agents, connections)
pub const AI_AZURE_SCOPE: &str = "https://ai.azure.com/.default";

/// Tokens closer than this to expiry are refreshed
const REFRESH_MARGIN_SECS: i64 = 300;

#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub expires_on: DateTime<Utc>,
}

impl AccessToken {
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_on - now < Duration::seconds(REFRESH_MARGIN_SECS)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_on", &self.expires_on)
            .finish()
    }
}

/// Source of bearer tokens
#[async_trait]
pub trait TokenCredential: Send + Sync {
    async fn get_token(&self, scope: &str) -> Result<AccessToken>;
}

/// How a client authenticates its requests
#[derive(Clone)]
pub enum Credential {
    ApiKey(String),
    Token(Arc<dyn TokenCredential>),
}

impl Credential {
    pub fn api_key(key: impl Into<String>) -> Self {
        Self::ApiKey(key.into())
    }

    pub fn token(credential: impl TokenCredential + 'static) -> Self {
        Self::Token(Arc::new(credential))
    }

    /// Attach the authentication header for `scope` to a request
    pub async fn authorize(&self, request: RequestBuilder, scope: &str) -> Result<RequestBuilder> {
        match self {
            Self::ApiKey(key) => Ok(request.header("api-key", key)),
            Self::Token(source) => {
                let token = source
                    .get_token(scope)
                    .await
                    .with_context(|| format!("Failed to acquire token for {}", scope))?;
                Ok(request.bearer_auth(token.token))
            }
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiKey(_) => f.write_str("Credential::ApiKey(<redacted>)"),
            Self::Token(_) => f.write_str("Credential::Token"),
        }
    }
}

/// A pre-acquired token, e.g. from `AZURE_ACCESS_TOKEN`
pub struct StaticTokenCredential {
    token: String,
}

impl StaticTokenCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

#[async_trait]
impl TokenCredential for StaticTokenCredential {
    async fn get_token(&self, _scope: &str) -> Result<AccessToken> {
        Ok(AccessToken {
            token: self.token.clone(),
            expires_on: Utc::now() + Duration::hours(1),
        })
    }
}

/// Tokens from the signed-in Azure CLI (`az account get-access-token`), cached per scope
#[derive(Default)]
pub struct AzureCliCredential {
    cache: Mutex<HashMap<String, AccessToken>>,
}

impl AzureCliCredential {
    pub fn new() -> Self {
        Self::default()
    }

    async fn request_token(scope: &str) -> Result<AccessToken> {
        tracing::debug!("Requesting token from Azure CLI for {}", scope);

        let output = tokio::process::Command::new("az")
            .args(["account", "get-access-token", "--output", "json", "--scope", scope])
            .output()
            .await
            .context("Failed to run the Azure CLI; is `az` installed and on PATH?")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Azure CLI token request failed: {}", stderr.trim());
        }

        parse_cli_token(&output.stdout)
    }
}

#[async_trait]
impl TokenCredential for AzureCliCredential {
    async fn get_token(&self, scope: &str) -> Result<AccessToken> {
        let mut cache = self.cache.lock().await;
        if let Some(token) = cache.get(scope) {
            if !token.needs_refresh(Utc::now()) {
                return Ok(token.clone());
            }
        }

        let token = Self::request_token(scope).await?;
        cache.insert(scope.to_string(), token.clone());
        Ok(token)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliTokenOutput {
    access_token: String,
    /// Unix seconds, emitted by Azure CLI 2.54+
    #[serde(default, rename = "expires_on")]
    expires_on_unix: Option<i64>,
    /// Local time, e.g. "2024-05-01 13:45:10.000000"
    #[serde(default)]
    expires_on: Option<String>,
}

pub(crate) fn parse_cli_token(stdout: &[u8]) -> Result<AccessToken> {
    let output: CliTokenOutput =
        serde_json::from_slice(stdout).context("Unexpected Azure CLI token output")?;

    let expires_on = match (output.expires_on_unix, output.expires_on.as_deref()) {
        (Some(secs), _) => Utc
            .timestamp_opt(secs, 0)
            .single()
            .context("Invalid expires_on timestamp")?,
        (None, Some(local)) => {
            let naive = NaiveDateTime::parse_from_str(local, "%Y-%m-%d %H:%M:%S%.f")
                .with_context(|| format!("Invalid expiresOn value: {}", local))?;
            chrono::Local
                .from_local_datetime(&naive)
                .earliest()
                .context("Ambiguous expiresOn value")?
                .with_timezone(&Utc)
        }
        (None, None) => anyhow::bail!("Azure CLI token output has no expiry"),
    };

    Ok(AccessToken {
        token: output.access_token,
        expires_on,
    })
}
