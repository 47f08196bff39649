use config::{Config as ConfigLoader, ConfigError, Environment, File};
use foundry_agents::PollConfig;
use foundry_observability::{LogFormat, TelemetryConfig};
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("The {0} environment variable must be set.")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("Failed to load configuration: {0}")]
    Load(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, SettingsError>;

/// Flat key/value settings for the samples
///
/// Hierarchy (weakest to strongest):
/// 1. `.env` in the working directory (copied into the process environment)
/// 2. `foundry.toml` (optional, keys in lower case)
/// 3. Process environment variables
///
/// Lookups are case-insensitive and an empty value counts as unset.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    values: HashMap<String, String>,
}

impl Settings {
    pub fn load() -> Result<Self> {
        // A missing .env is normal; the variables may come from the shell
        let _ = dotenvy::dotenv();

        let builder = ConfigLoader::builder()
            .add_source(File::with_name("foundry").required(false))
            .add_source(Environment::default());
        Self::build(builder)
    }

    /// Settings from an explicit variable map, ignoring the process environment
    pub fn from_vars<K, V>(vars: impl IntoIterator<Item = (K, V)>) -> Result<Self>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let vars = vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        let builder = ConfigLoader::builder().add_source(Environment::default().source(Some(vars)));
        Self::build(builder)
    }

    /// A settings file overlaid with a variable map
    pub fn from_file_and_vars<K, V>(path: impl Into<PathBuf>, vars: impl IntoIterator<Item = (K, V)>) -> Result<Self>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let vars = vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        let builder = ConfigLoader::builder()
            .add_source(File::from(path.into()))
            .add_source(Environment::default().source(Some(vars)));
        Self::build(builder)
    }

    fn build(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        let raw: HashMap<String, String> = builder.build()?.try_deserialize()?;
        let values = raw
            .into_iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v))
            .collect();
        Ok(Self { values })
    }

    pub fn optional(&self, name: &str) -> Option<String> {
        self.values
            .get(&name.to_ascii_lowercase())
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    pub fn require(&self, name: &'static str) -> Result<String> {
        self.optional(name).ok_or(SettingsError::Missing(name))
    }

    pub fn parse_optional<T>(&self, name: &'static str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(name)
            .map(|raw| {
                raw.parse::<T>().map_err(|e| SettingsError::Invalid {
                    name,
                    reason: e.to_string(),
                })
            })
            .transpose()
    }

    /// Run polling bounds, defaults overridden by `RUN_POLL_*`
    pub fn poll_config(&self) -> Result<PollConfig> {
        let mut poll = PollConfig::default();
        if let Some(ms) = self.parse_optional::<u64>("RUN_POLL_INTERVAL_MS")? {
            poll = poll.with_interval(Duration::from_millis(ms));
        }
        if let Some(attempts) = self.parse_optional::<u32>("RUN_POLL_MAX_ATTEMPTS")? {
            poll = poll.with_max_attempts(attempts);
        }
        if let Some(secs) = self.parse_optional::<u64>("RUN_POLL_TIMEOUT_SECS")? {
            poll = poll.with_timeout(Duration::from_secs(secs));
        }
        Ok(poll)
    }

    pub fn telemetry_config(&self, service_name: &str) -> Result<TelemetryConfig> {
        let mut telemetry = TelemetryConfig::new(service_name);
        if let Some(level) = self.optional("LOG_LEVEL") {
            telemetry = telemetry.with_log_level(level);
        }
        if let Some(format) = self.parse_optional::<LogFormat>("LOG_FORMAT")? {
            telemetry = telemetry.with_log_format(format);
        }
        if let Some(capture) = self.parse_optional::<bool>("TELEMETRY_CAPTURE_MESSAGE_CONTENT")? {
            telemetry = telemetry.with_capture_message_content(capture);
        }
        Ok(telemetry)
    }

    /// Telemetry for the trace samples: message content is captured unless
    /// `TELEMETRY_CAPTURE_MESSAGE_CONTENT` is set
    pub fn trace_telemetry_config(&self, service_name: &str) -> Result<TelemetryConfig> {
        let telemetry = self.telemetry_config(service_name)?;
        if self.optional("TELEMETRY_CAPTURE_MESSAGE_CONTENT").is_some() {
            return Ok(telemetry);
        }
        Ok(telemetry.with_capture_message_content(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_required_key_message() {
        let settings = Settings::from_vars([("MODEL_DEPLOYMENT_NAME", "gpt-4o")]).unwrap();

        let err = settings.require("PROJECT_ENDPOINT").unwrap_err();
        assert_eq!(err.to_string(), "The PROJECT_ENDPOINT environment variable must be set.");
        assert_eq!(settings.require("MODEL_DEPLOYMENT_NAME").unwrap(), "gpt-4o");
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let settings = Settings::from_vars([("PROJECT_ENDPOINT", "  ")]).unwrap();
        assert!(matches!(
            settings.require("PROJECT_ENDPOINT"),
            Err(SettingsError::Missing("PROJECT_ENDPOINT"))
        ));
    }

    #[test]
    fn test_poll_config_overrides() {
        let settings = Settings::from_vars([
            ("RUN_POLL_INTERVAL_MS", "250"),
            ("RUN_POLL_MAX_ATTEMPTS", "12"),
        ])
        .unwrap();

        let poll = settings.poll_config().unwrap();
        assert_eq!(poll.interval, Duration::from_millis(250));
        assert_eq!(poll.max_attempts, 12);
        assert_eq!(poll.timeout, PollConfig::default().timeout);
    }

    #[test]
    fn test_invalid_number_is_reported() {
        let settings = Settings::from_vars([("RUN_POLL_TIMEOUT_SECS", "soon")]).unwrap();
        let err = settings.poll_config().unwrap_err();
        assert!(err.to_string().starts_with("Invalid value for RUN_POLL_TIMEOUT_SECS"));
    }

    #[test]
    fn test_telemetry_config_from_settings() {
        let settings = Settings::from_vars([
            ("LOG_FORMAT", "json"),
            ("TELEMETRY_CAPTURE_MESSAGE_CONTENT", "true"),
        ])
        .unwrap();

        let telemetry = settings.telemetry_config("chat-with-trace").unwrap();
        assert_eq!(telemetry.log_format, LogFormat::Json);
        assert!(telemetry.capture_message_content);
        assert_eq!(telemetry.log_level, "info");
    }

    #[test]
    fn test_environment_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "project_endpoint = \"https://from-file\"").unwrap();
        writeln!(file, "model_deployment_name = \"gpt-4o-mini\"").unwrap();

        let settings =
            Settings::from_file_and_vars(file.path(), [("PROJECT_ENDPOINT", "https://from-env")]).unwrap();

        assert_eq!(settings.require("PROJECT_ENDPOINT").unwrap(), "https://from-env");
        assert_eq!(settings.require("MODEL_DEPLOYMENT_NAME").unwrap(), "gpt-4o-mini");
    }
}
