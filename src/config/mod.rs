use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::error::AppError;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub remote: RemoteConfig,
    pub assistant: AssistantConfig,
    pub dataset: DatasetConfig,
    pub logging: LoggingConfig,
}

/// Remote knowledge source configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteConfig {
    pub enabled: bool,
    pub endpoint: Option<String>,
    pub timeout_ms: u64,
    /// Attach the loaded dataset to each remote request
    pub send_dataset: bool,
    pub model_params: ModelParams,
}

/// Model parameters forwarded to the remote source verbatim
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

/// Local answering configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantConfig {
    /// Simulated latency applied to locally resolved answers
    pub local_delay_ms: u64,
}

/// Dataset configuration
#[derive(Debug, Clone)]
pub struct DatasetConfig {
    pub path: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, Default, PartialEq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Dataset file used when `DATASET_PATH` is unset
pub const DEFAULT_DATASET_PATH: &str = "./data/student_data.json";

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let endpoint = env::var("REMOTE_ENDPOINT")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let remote = RemoteConfig {
            enabled: parse_flag("REMOTE_ENABLED"),
            endpoint,
            timeout_ms: parse_or("REMOTE_TIMEOUT_MS", 10_000),
            send_dataset: parse_flag("REMOTE_SEND_DATASET"),
            model_params: ModelParams {
                model: env::var("AI_MODEL").ok().filter(|s| !s.is_empty()),
                max_tokens: env::var("MAX_TOKENS").ok().and_then(|s| s.parse().ok()),
                temperature: env::var("TEMPERATURE").ok().and_then(|s| s.parse().ok()),
            },
        };

        if remote.enabled && remote.endpoint.is_none() {
            return Err(AppError::Config {
                message: "REMOTE_ENDPOINT is required when REMOTE_ENABLED=true".to_string(),
            });
        }

        let assistant = AssistantConfig {
            local_delay_ms: parse_or("LOCAL_DELAY_MS", 1500),
        };

        let dataset = DatasetConfig {
            path: PathBuf::from(
                env::var("DATASET_PATH").unwrap_or_else(|_| DEFAULT_DATASET_PATH.to_string()),
            ),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        Ok(Config {
            remote,
            assistant,
            dataset,
            logging,
        })
    }
}

fn parse_or(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn parse_flag(key: &str) -> bool {
    matches!(
        env::var(key).map(|s| s.to_lowercase()).as_deref(),
        Ok("true") | Ok("1") | Ok("yes")
    )
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: None,
            timeout_ms: 10_000,
            send_dataset: false,
            model_params: ModelParams::default(),
        }
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            local_delay_ms: 1500,
        }
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DATASET_PATH),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl RemoteConfig {
    /// Remote config pointing at `endpoint`, enabled.
    pub fn enabled(endpoint: impl Into<String>) -> Self {
        Self {
            enabled: true,
            endpoint: Some(endpoint.into()),
            ..Self::default()
        }
    }

    /// Whether a remote call should be attempted at all.
    pub fn is_active(&self) -> bool {
        self.enabled && self.endpoint.is_some()
    }
}
