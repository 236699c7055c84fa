use crate::hardware::{FrequencyBand, TransceiverConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level station configuration, stored as JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    /// Radio receive settings
    pub radio: RadioConfig,
    /// Particulate UART settings
    pub particulate: ParticulateConfig,
    /// Pause between polling cycles (milliseconds)
    pub poll_interval_ms: u64,
    /// Number of cycles to run; 0 runs until stopped
    pub cycles: u64,
}

/// Radio receive settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadioConfig {
    /// Which of the two supported bands to listen on
    pub band: FrequencyBand,
    /// Wait for the rest of a packet after the first bytes arrive (milliseconds)
    pub settle_delay_ms: u32,
    /// Largest packet to drain from the FIFO (bytes)
    pub max_packet_len: usize,
    /// Reject frames whose family code is not the expected one
    pub strict_family_check: bool,
    /// Cycles between presence checks while the radio is missing; 0 disables
    pub reinit_interval_cycles: u32,
}

/// Particulate UART settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticulateConfig {
    /// Recorded UART stream to replay instead of the simulated sensor
    pub capture_path: Option<String>,
    /// Bytes pulled from the UART per cycle
    pub read_chunk_size: usize,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            radio: RadioConfig::default(),
            particulate: ParticulateConfig::default(),
            poll_interval_ms: 100,
            cycles: 0,
        }
    }
}

impl Default for RadioConfig {
    fn default() -> Self {
        let transceiver = TransceiverConfig::default();
        Self {
            band: transceiver.band,
            settle_delay_ms: transceiver.settle_delay_ms,
            max_packet_len: transceiver.max_packet_len,
            strict_family_check: false,
            reinit_interval_cycles: 500,
        }
    }
}

impl Default for ParticulateConfig {
    fn default() -> Self {
        Self {
            capture_path: None,
            read_chunk_size: 64,
        }
    }
}

impl RadioConfig {
    pub fn transceiver_config(&self) -> TransceiverConfig {
        TransceiverConfig {
            band: self.band,
            settle_delay_ms: self.settle_delay_ms,
            max_packet_len: self.max_packet_len,
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Invalid parameter value
    InvalidParameter { parameter: String, value: String, reason: String },
    /// Configuration file I/O error
    IoError { message: String },
    /// JSON serialization/deserialization error
    SerializationError { message: String },
}

impl StationConfig {
    /// Load and validate a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
            message: format!("Failed to read config file '{}': {}", path_str, e),
        })?;

        let config: StationConfig = serde_json::from_str(&content).map_err(|e| {
            ConfigError::SerializationError {
                message: format!("Failed to parse config file '{}': {}", path_str, e),
            }
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = serde_json::to_string_pretty(self).map_err(|e| ConfigError::SerializationError {
            message: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(&path, content).map_err(|e| ConfigError::IoError {
            message: format!("Failed to write config file '{}': {}", path_str, e),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Err(e) = self.radio.transceiver_config().validate() {
            return Err(ConfigError::InvalidParameter {
                parameter: "radio".to_string(),
                value: format!("{:?}", self.radio),
                reason: e.to_string(),
            });
        }

        if self.particulate.read_chunk_size == 0 {
            return Err(ConfigError::InvalidParameter {
                parameter: "particulate.read_chunk_size".to_string(),
                value: "0".to_string(),
                reason: "must read at least one byte per cycle".to_string(),
            });
        }

        Ok(())
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidParameter { parameter, value, reason } => {
                write!(f, "Invalid parameter '{}' = '{}': {}", parameter, value, reason)
            }
            ConfigError::IoError { message } => {
                write!(f, "I/O error: {}", message)
            }
            ConfigError::SerializationError { message } => {
                write!(f, "Serialization error: {}", message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
