use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::AppError;

#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    #[serde(
        default = "default_log_level",
        deserialize_with = "deserialize_log_level"
    )]
    pub log_level: LogLevel,
    pub backend: BackendConfig,
    #[serde(default)]
    pub staging: StagingConfig,
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<LogLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.try_into().map_err(serde::de::Error::custom)
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    pub transport: TransportConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    /// Backend runs as a child process speaking JSON lines on stdio.
    Sidecar {
        program: String,
        #[serde(default)]
        args: Vec<String>,
    },
    /// Backend listens for `POST {base_url}/invoke/{command}`.
    Http {
        base_url: String,
        #[serde(default)]
        timeout_secs: Option<u64>,
    },
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StagingConfig {
    /// Where in-memory images are written before inference. Defaults to the OS temp dir.
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

impl StagingConfig {
    pub fn resolved_directory(&self) -> PathBuf {
        self.directory
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("infer-lens"))
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            other => Err(format!(
                "{} is not a supported minimum log level. Use either `debug` or `info`.",
                other
            )),
        }
    }
}

/// Reads `configuration/` under the working directory, layered with
/// `APP_ENVIRONMENT` and `INFER_*` variables.
pub fn get_configuration() -> Result<ClientConfig, AppError> {
    let base_path = std::env::current_dir()?;
    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(AppError::Validation)?;

    load_from(&base_path.join("configuration"), environment)
}

pub fn load_from(directory: &Path, environment: Environment) -> Result<ClientConfig, AppError> {
    let config = config::Config::builder()
        .add_source(config::File::from(directory.join("base.yaml")))
        .add_source(
            config::File::from(directory.join(format!("{}.yaml", environment.as_str())))
                .required(false),
        )
        .add_source(
            config::Environment::with_prefix("INFER")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    Ok(config.try_deserialize::<ClientConfig>()?)
}
