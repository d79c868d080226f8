//! Server configuration loading from file and environment variables.

use avatar_pipeline::PipelineConfig;
use avatar_voice::{CompletionConfig, SynthesisConfig, ToolConfig};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Language completion service.
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Speech synthesis service.
    #[serde(default)]
    pub synthesis: SynthesisConfig,

    /// External codec and lip sync executables.
    #[serde(default)]
    pub tools: ToolConfig,

    /// Draft cap and artifact locations.
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "avatar_pipeline=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// The `.env` file exists but is malformed.
    #[error("failed to load .env file: {0}")]
    Env(String),
}

/// Loads a `.env` file from the working directory or its parents.
///
/// Returns the path that was loaded, or `None` when no file exists.
pub fn load_env() -> Result<Option<PathBuf>, ConfigError> {
    match dotenvy::dotenv() {
        Ok(path) => Ok(Some(path)),
        Err(dotenvy::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(dotenvy::Error::LineParse(line, pos)) => Err(ConfigError::Env(format!(
            "parse error at line {line}, position {pos}"
        ))),
        Err(e) => Err(ConfigError::Env(e.to_string())),
    }
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `AVATAR_HOST` overrides `server.host`
/// - `AVATAR_PORT` overrides `server.port`
/// - `AVATAR_LOG_LEVEL` overrides `logging.level`
/// - `AVATAR_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `OPENAI_API_KEY` overrides `completion.api_key`
/// - `ELEVEN_LABS_API_KEY` overrides `synthesis.api_key`
/// - `AVATAR_VOICE_ID` overrides `synthesis.voice_id`
/// - `AVATAR_FFMPEG_PATH` overrides `tools.ffmpeg_path`
/// - `AVATAR_RHUBARB_PATH` overrides `tools.rhubarb_path`
/// - `AVATAR_ASSETS_DIR` overrides `pipeline.assets_dir`
/// - `AVATAR_WORK_DIR` overrides `pipeline.work_dir`
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Applies overrides from `lookup`, which maps a variable name to its value.
pub fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(host) = lookup("AVATAR_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Some(port) = lookup("AVATAR_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Some(level) = lookup("AVATAR_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = lookup("AVATAR_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Some(key) = lookup("OPENAI_API_KEY") {
        config.completion.api_key = Some(key);
    }
    if let Some(key) = lookup("ELEVEN_LABS_API_KEY") {
        config.synthesis.api_key = Some(key);
    }
    if let Some(voice_id) = lookup("AVATAR_VOICE_ID").filter(|v| !v.trim().is_empty()) {
        config.synthesis.voice_id = voice_id;
    }
    if let Some(path) = lookup("AVATAR_FFMPEG_PATH") {
        config.tools.ffmpeg_path = PathBuf::from(path);
    }
    if let Some(path) = lookup("AVATAR_RHUBARB_PATH") {
        config.tools.rhubarb_path = PathBuf::from(path);
    }
    if let Some(dir) = lookup("AVATAR_ASSETS_DIR") {
        config.pipeline.assets_dir = PathBuf::from(dir);
    }
    if let Some(dir) = lookup("AVATAR_WORK_DIR") {
        config.pipeline.work_dir = PathBuf::from(dir);
    }
}
