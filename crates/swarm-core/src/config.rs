//! Ranging configuration
//!
//! Stored as JSON. Every field has a default, so a partial file (or none at
//! all) is valid.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::protocol::{NodeAddress, DEFAULT_BAUD_RATE};
use crate::ranging::PipelineOptions;

/// Configuration file name inside the config directory
pub const CONFIG_FILE_NAME: &str = "ranging.json";

/// Errors loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Reading or writing the file failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Not valid JSON for this schema
    #[error("Invalid configuration file: {0}")]
    Json(#[from] serde_json::Error),

    /// Parsed but rejected by validation
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Serial settings for one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Serial port name; `None` means ask at startup
    pub port: Option<String>,

    /// Serial baud rate
    pub baud_rate: u32,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }
}

/// Full configuration of a ranging session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangingConfig {
    /// Port of the local node
    pub node: NodeConfig,

    /// Node to range against
    pub target_address: String,

    /// Milliseconds between ranging commands
    pub ranging_interval_ms: u64,

    /// Milliseconds between processing ticks
    pub tick_interval_ms: u64,

    /// Send `RATO 1` instead of `RATO 0`
    pub ranging_with_timeout: bool,

    /// Raw frame log
    pub output_path: PathBuf,

    /// File holding the latest distance line
    pub current_distance_path: Option<PathBuf>,

    /// Tick behaviour
    #[serde(flatten)]
    pub pipeline: PipelineOptions,
}

impl Default for RangingConfig {
    fn default() -> Self {
        Self {
            node: NodeConfig::default(),
            target_address: "00006A0F3FFC".to_string(),
            ranging_interval_ms: 500,
            tick_interval_ms: 1000,
            ranging_with_timeout: false,
            output_path: PathBuf::from("rato.txt"),
            current_distance_path: None,
            pipeline: PipelineOptions::default(),
        }
    }
}

impl RangingConfig {
    /// Default config file location
    pub fn default_path() -> io::Result<PathBuf> {
        let base = dirs::config_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, "Could not find home directory")
            })?;
        Ok(base.join("swarm-ranging").join(CONFIG_FILE_NAME))
    }

    /// Load and validate a config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        let config: RangingConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, defaults otherwise
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Write as pretty JSON, creating parent directories
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Parsed target address
    pub fn target(&self) -> Result<NodeAddress, ConfigError> {
        self.target_address
            .parse()
            .map_err(|e: crate::protocol::ProtocolError| ConfigError::Invalid(e.to_string()))
    }

    /// Reject zero intervals, zero baud rate and a bad target address
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.node.baud_rate == 0 {
            return Err(ConfigError::Invalid("baud_rate must be non-zero".into()));
        }
        if self.ranging_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "ranging_interval_ms must be non-zero".into(),
            ));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("tick_interval_ms must be non-zero".into()));
        }
        self.target()?;
        Ok(())
    }
}
