use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;

use super::connection_string::ConnectionString;
use super::types::{Envelope, TrackResponse};

/// HTTP client for the Application Insights ingestion endpoint
pub struct AppInsightsClient {
    client: Client,
    connection: ConnectionString,
}

impl AppInsightsClient {
    pub fn new(connection: ConnectionString) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, connection })
    }

    pub fn instrumentation_key(&self) -> &str {
        &self.connection.instrumentation_key
    }

    /// Send a batch of envelopes; partial acceptance is an error
    pub async fn track(&self, envelopes: &[Envelope]) -> Result<()> {
        if envelopes.is_empty() {
            return Ok(());
        }

        let response = self
            .client
            .post(self.connection.track_url())
            .json(envelopes)
            .send()
            .await
            .context("Failed to send telemetry")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read response body".to_string());

        if !status.is_success() {
            tracing::error!("Application Insights ingestion failed: status={}, body={}", status, body);
            anyhow::bail!("Application Insights ingestion error: {} - {}", status, body);
        }

        // Older endpoints answer 200 with no body
        if let Ok(track) = serde_json::from_str::<TrackResponse>(&body) {
            if track.items_accepted < track.items_received {
                let reasons: Vec<_> = track.errors.iter().map(|e| e.message.as_str()).collect();
                anyhow::bail!(
                    "Application Insights accepted {} of {} items: {}",
                    track.items_accepted,
                    track.items_received,
                    reasons.join("; ")
                );
            }
        }

        tracing::debug!("Sent {} telemetry items", envelopes.len());
        Ok(())
    }
}
