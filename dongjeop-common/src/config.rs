//! Configuration loading and resolution
//!
//! Every setting resolves in priority order:
//! 1. Command-line argument / environment variable (handled by the binary's clap parser)
//! 2. TOML config file
//! 3. Compiled default
//!
//! A missing or broken default config file is not fatal: the service warns
//! and starts on defaults. Only an explicitly requested file must load.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::{Error, Result};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_VISION_MODEL: &str = "gpt-4o";
pub const DEFAULT_VISION_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_API_KEY_FILE: &str = "api.txt";
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Older deployments set these instead of `DONGJEOP_HOST` / `DONGJEOP_PORT`
pub const LEGACY_HOST_ENV: &str = "API_HOST";
pub const LEGACY_PORT_ENV: &str = "API_PORT";

const DEFAULT_VISION_TIMEOUT_SECS: u64 = 60;
const DEFAULT_REQUEST_INTERVAL_MS: u64 = 1000;

/// Origins allowed by default (local frontend dev servers)
pub const DEFAULT_CORS_ORIGINS: [&str; 5] = [
    "http://localhost:3000",
    "http://localhost:8000",
    "http://127.0.0.1:8000",
    "http://localhost:8001",
    "http://127.0.0.1:8001",
];

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Base directory for the dataset and image folders
    pub data_dir: Option<PathBuf>,
    pub dataset_path: Option<PathBuf>,
    pub image_dir: Option<PathBuf>,
    pub collection_dir: Option<PathBuf>,
    pub cors_origins: Option<Vec<String>>,
    pub logging: LoggingConfig,
    pub vision: VisionConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Vision model section of `config.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    pub model: Option<String>,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub api_key_file: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    /// Pause between consecutive model calls in one batch
    pub request_interval_ms: Option<u64>,
}

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub data_dir: Option<PathBuf>,
}

impl CliOverrides {
    /// Fill host and port from `API_HOST` / `API_PORT` when neither a flag
    /// nor a `DONGJEOP_*` variable set them. An unparseable port is logged
    /// and ignored.
    pub fn with_legacy_env(mut self) -> Self {
        if self.host.is_none() {
            self.host = non_empty_env(LEGACY_HOST_ENV);
        }
        if self.port.is_none() {
            if let Some(raw) = non_empty_env(LEGACY_PORT_ENV) {
                match raw.parse::<u16>() {
                    Ok(port) => self.port = Some(port),
                    Err(_) => warn!("Ignoring {}={:?}: not a valid port", LEGACY_PORT_ENV, raw),
                }
            }
        }
        self
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Locations of the dataset and image folders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    /// Line-delimited JSON dataset
    pub dataset: PathBuf,
    /// Ground-truth images served under `/images`
    pub images: PathBuf,
    /// Root holding the `batch_*` collection folders
    pub collection: PathBuf,
}

impl DataPaths {
    /// Standard layout under one data directory
    pub fn under(data_dir: &Path) -> Self {
        Self {
            dataset: data_dir.join("gt").join("gt.jsonl"),
            images: data_dir.join("gt").join("img_gt"),
            collection: data_dir.join("spider"),
        }
    }
}

/// Resolved vision model settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisionSettings {
    /// `None` disables image analysis
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub timeout: Duration,
    pub request_interval: Duration,
}

/// Fully resolved service configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub paths: DataPaths,
    pub cors_origins: Vec<String>,
    pub log_level: String,
    pub vision: VisionSettings,
}

impl ServiceConfig {
    /// Merge overrides over the TOML file over compiled defaults
    pub fn resolve(cli: &CliOverrides, toml: TomlConfig) -> Self {
        let data_dir = cli
            .data_dir
            .clone()
            .or_else(|| toml.data_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let standard = DataPaths::under(&data_dir);

        let paths = DataPaths {
            dataset: toml.dataset_path.clone().unwrap_or(standard.dataset),
            images: toml.image_dir.clone().unwrap_or(standard.images),
            collection: toml.collection_dir.clone().unwrap_or(standard.collection),
        };

        let vision = VisionSettings {
            api_key: resolve_api_key(&toml.vision),
            model: toml
                .vision
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_VISION_MODEL.to_string()),
            endpoint: toml
                .vision
                .endpoint
                .clone()
                .unwrap_or_else(|| DEFAULT_VISION_ENDPOINT.to_string()),
            timeout: Duration::from_secs(
                toml.vision.timeout_secs.unwrap_or(DEFAULT_VISION_TIMEOUT_SECS),
            ),
            request_interval: Duration::from_millis(
                toml.vision
                    .request_interval_ms
                    .unwrap_or(DEFAULT_REQUEST_INTERVAL_MS),
            ),
        };

        Self {
            host: cli
                .host
                .clone()
                .or(toml.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: cli.port.or(toml.port).unwrap_or(DEFAULT_PORT),
            paths,
            cors_origins: toml.cors_origins.unwrap_or_else(|| {
                DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect()
            }),
            log_level: toml.logging.level,
            vision,
        }
    }
}

/// Default config file location: `<config_dir>/dongjeop/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("dongjeop").join("config.toml"))
}

/// Parse a TOML config file
pub fn read_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Where the TOML config came from
///
/// Loading happens before the tracing subscriber exists, so the loader
/// reports its outcome here and the caller logs it with [`ConfigSource::log`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Parsed from this file
    File(PathBuf),
    /// Default location has no file; compiled defaults apply
    NotFound(PathBuf),
    /// Default file exists but could not be read or parsed; defaults apply
    Invalid { path: PathBuf, reason: String },
    /// No per-user config directory on this platform
    NoConfigDir,
}

impl ConfigSource {
    pub fn log(&self) {
        match self {
            ConfigSource::File(path) => info!("Loaded config from {}", path.display()),
            ConfigSource::NotFound(path) => {
                info!("No config file at {}, using defaults", path.display())
            }
            ConfigSource::Invalid { reason, .. } => warn!("{} (using defaults)", reason),
            ConfigSource::NoConfigDir => {
                warn!("Could not determine config directory, using defaults")
            }
        }
    }
}

/// Load the TOML config from `--config` or the default location
pub fn load_toml_config(explicit: Option<&Path>) -> Result<(TomlConfig, ConfigSource)> {
    load_toml_config_from(explicit, default_config_path())
}

/// Load the TOML config
///
/// An explicit path must exist and parse. Without one, `default_path` is
/// tried and any problem there falls back to defaults.
pub fn load_toml_config_from(
    explicit: Option<&Path>,
    default_path: Option<PathBuf>,
) -> Result<(TomlConfig, ConfigSource)> {
    if let Some(path) = explicit {
        let config = read_toml_config(path)?;
        return Ok((config, ConfigSource::File(path.to_path_buf())));
    }

    let Some(path) = default_path else {
        return Ok((TomlConfig::default(), ConfigSource::NoConfigDir));
    };

    if !path.exists() {
        return Ok((TomlConfig::default(), ConfigSource::NotFound(path)));
    }

    match read_toml_config(&path) {
        Ok(config) => Ok((config, ConfigSource::File(path))),
        Err(e) => Ok((
            TomlConfig::default(),
            ConfigSource::Invalid {
                path,
                reason: e.to_string(),
            },
        )),
    }
}

/// Resolve the vision API key
///
/// **Priority:** ENV → TOML `api_key` → key file (default `api.txt`)
pub fn resolve_api_key(vision: &VisionConfig) -> Option<String> {
    if let Ok(key) = std::env::var(API_KEY_ENV) {
        if is_valid_key(&key) {
            info!("Vision API key loaded from environment variable");
            return Some(key.trim().to_string());
        }
    }

    if let Some(key) = &vision.api_key {
        if is_valid_key(key) {
            info!("Vision API key loaded from TOML config");
            return Some(key.trim().to_string());
        }
    }

    let key_file = vision
        .api_key_file
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_API_KEY_FILE));
    if let Ok(contents) = std::fs::read_to_string(&key_file) {
        if is_valid_key(&contents) {
            info!("Vision API key loaded from {}", key_file.display());
            return Some(contents.trim().to_string());
        }
        warn!("Vision API key file {} is empty", key_file.display());
    }

    info!(
        "Vision API key not configured (set {} or vision.api_key); image analysis disabled",
        API_KEY_ENV
    );
    None
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
