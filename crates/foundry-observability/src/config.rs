use anyhow::{anyhow, Result};
use std::str::FromStr;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" | "" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(anyhow!("Unknown log format: {}", other)),
        }
    }
}

/// Everything that decides how a sample is traced.
///
/// Built once at startup and handed to [`init_tracing`] and
/// [`crate::observer_from_config`]; nothing reads the process environment after that.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Reported as the cloud role of every envelope
    pub service_name: String,
    /// Attach prompt and completion text to spans
    pub capture_message_content: bool,
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub log_level: String,
    pub log_format: LogFormat,
    pub app_insights_connection_string: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "foundry-samples".to_string(),
            capture_message_content: false,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            app_insights_connection_string: None,
        }
    }
}

impl TelemetryConfig {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Self::default()
        }
    }

    pub fn with_capture_message_content(mut self, capture: bool) -> Self {
        self.capture_message_content = capture;
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    pub fn with_app_insights(mut self, connection_string: impl Into<String>) -> Self {
        self.app_insights_connection_string = Some(connection_string.into());
        self
    }
}

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins over the configured level. Calling this twice is an error.
pub fn init_tracing(config: &TelemetryConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()?,
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init()?,
    }

    Ok(())
}
