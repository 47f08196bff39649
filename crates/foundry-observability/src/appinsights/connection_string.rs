use anyhow::{bail, Result};
use std::str::FromStr;

/// Used when the connection string names no ingestion endpoint
pub const DEFAULT_INGESTION_ENDPOINT: &str = "https://dc.services.visualstudio.com";

/// Parsed `InstrumentationKey=...;IngestionEndpoint=...` connection string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionString {
    pub instrumentation_key: String,
    pub ingestion_endpoint: String,
}

impl ConnectionString {
    pub fn track_url(&self) -> String {
        format!("{}/v2/track", self.ingestion_endpoint)
    }
}

impl FromStr for ConnectionString {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut instrumentation_key = None;
        let mut ingestion_endpoint = None;

        for pair in s.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let Some((key, value)) = pair.split_once('=') else {
                bail!("Malformed connection string segment: {}", pair);
            };
            let value = value.trim();

            // Keys are case-insensitive
            match key.trim().to_ascii_lowercase().as_str() {
                "instrumentationkey" => instrumentation_key = Some(value.to_string()),
                "ingestionendpoint" => {
                    ingestion_endpoint = Some(value.trim_end_matches('/').to_string())
                }
                _ => {}
            }
        }

        let instrumentation_key = match instrumentation_key {
            Some(key) if !key.is_empty() => key,
            _ => bail!("Connection string has no InstrumentationKey"),
        };

        Ok(Self {
            instrumentation_key,
            ingestion_endpoint: ingestion_endpoint
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| DEFAULT_INGESTION_ENDPOINT.to_string()),
        })
    }
}
