use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One telemetry item posted to `/v2/track`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub name: String,
    pub time: String,
    #[serde(rename = "iKey")]
    pub instrumentation_key: String,
    pub tags: BTreeMap<String, String>,
    pub data: EnvelopeData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "baseType", content = "baseData")]
pub enum EnvelopeData {
    RemoteDependencyData(RemoteDependencyData),
    RequestData(RequestData),
}

impl Envelope {
    pub fn dependency(instrumentation_key: &str, time: DateTime<Utc>, data: RemoteDependencyData) -> Self {
        Self {
            name: "Microsoft.ApplicationInsights.RemoteDependency".to_string(),
            time: time.to_rfc3339(),
            instrumentation_key: instrumentation_key.to_string(),
            tags: BTreeMap::new(),
            data: EnvelopeData::RemoteDependencyData(data),
        }
    }

    pub fn request(instrumentation_key: &str, time: DateTime<Utc>, data: RequestData) -> Self {
        Self {
            name: "Microsoft.ApplicationInsights.Request".to_string(),
            time: time.to_rfc3339(),
            instrumentation_key: instrumentation_key.to_string(),
            tags: BTreeMap::new(),
            data: EnvelopeData::RequestData(data),
        }
    }

    pub fn with_tag(mut self, key: &str, value: impl Into<String>) -> Self {
        self.tags.insert(key.to_string(), value.into());
        self
    }
}

/// A span for an outgoing call (chat completion, agent run)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteDependencyData {
    pub ver: u8,
    pub name: String,
    pub id: String,
    pub duration: String,
    pub result_code: String,
    pub success: bool,
    #[serde(rename = "type")]
    pub dependency_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub properties: BTreeMap<String, String>,
}

/// The enclosing operation of a trace
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestData {
    pub ver: u8,
    pub id: String,
    pub name: String,
    pub duration: String,
    pub response_code: String,
    pub success: bool,
    pub properties: BTreeMap<String, String>,
}

/// Body of a `/v2/track` response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackResponse {
    pub items_received: u32,
    pub items_accepted: u32,
    #[serde(default)]
    pub errors: Vec<TrackError>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackError {
    pub index: u32,
    pub status_code: u16,
    pub message: String,
}

/// Duration in the `d.hh:mm:ss.fff` form the ingestion endpoint expects
pub fn format_duration(duration_ms: u64) -> String {
    let millis = duration_ms % 1000;
    let total_secs = duration_ms / 1000;
    let secs = total_secs % 60;
    let mins = (total_secs / 60) % 60;
    let hours = (total_secs / 3600) % 24;
    let days = total_secs / 86400;
    format!("{}.{:02}:{:02}:{:02}.{:03}", days, hours, mins, secs, millis)
}
