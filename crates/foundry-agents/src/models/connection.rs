use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionType {
    AzureOpenAI,
    AzureAISearch,
    AzureBlob,
    AppInsights,
    CustomKeys,
    #[serde(other)]
    Other,
}

impl ConnectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AzureOpenAI => "AzureOpenAI",
            Self::AzureAISearch => "AzureAISearch",
            Self::AzureBlob => "AzureBlob",
            Self::AppInsights => "AppInsights",
            Self::CustomKeys => "CustomKeys",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A project connection to another Azure resource
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    /// Full ARM resource id; this is what tool resources reference
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub connection_type: ConnectionType,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub credentials: Option<ConnectionCredentials>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ConnectionCredentials {
    #[serde(rename = "type")]
    pub credential_type: String,
    #[serde(default)]
    pub key: Option<String>,
}

impl fmt::Debug for ConnectionCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionCredentials")
            .field("credential_type", &self.credential_type)
            .field("key", &self.key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ConnectionPage {
    pub value: Vec<Connection>,
    #[serde(default)]
    pub next_link: Option<String>,
}
