//! # Device and Shaping Configuration
//!
//! All parameters for one send operation, loaded from TOML. Every table is
//! optional and falls back to the defaults of the bench setup.
//!
//! ## Example: TOML Configuration
//!
//! ```toml
//! [device]
//! port = "/dev/ttyUSB0"
//! read_timeout_ms = 500
//!
//! [shaping]
//! function = "hyperbolic sine"
//! tolerance = 10
//!
//! [frame]
//! amplitude = 200
//! frequency = 128
//! control_mode = "pt"
//!
//! [motion]
//! trajectory = "0 90 45"
//!
//! [transport]
//! mode = "write_then_read"
//! ```
//!
//! The baud rate is fixed by the firmware and is not configurable.

use crate::communication::frame::ControlMode;
use crate::hardware::transport::TransportMode;
use crate::motion::shaper::ShapingFunction;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub shaping: ShapingConfig,
    #[serde(default)]
    pub frame: FrameConfig,
    #[serde(default)]
    pub motion: MotionConfig,
    #[serde(default)]
    pub transport: TransportConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct DeviceConfig {
    #[serde(default = "default_port")]
    pub port: String,
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

impl DeviceConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// Torque curve parameters. `function` has no default: it must be chosen.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ShapingConfig {
    #[serde(default)]
    pub function: Option<ShapingFunction>,
    #[serde(default)]
    pub tolerance: u16,
    #[serde(default = "default_constant")]
    pub constant: i64,
}

impl Default for ShapingConfig {
    fn default() -> Self {
        Self {
            function: None,
            tolerance: 0,
            constant: default_constant(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct FrameConfig {
    #[serde(default = "default_amplitude")]
    pub amplitude: u8,
    #[serde(default = "default_frequency")]
    pub frequency: u8,
    #[serde(default)]
    pub control_mode: ControlMode,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            amplitude: default_amplitude(),
            frequency: default_frequency(),
            control_mode: ControlMode::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct MotionConfig {
    /// Whitespace separated stopping points, including the start point.
    #[serde(default = "default_trajectory")]
    pub trajectory: String,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            trajectory: default_trajectory(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct TransportConfig {
    #[serde(default)]
    pub mode: Option<TransportMode>,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device.port.trim().is_empty() {
            return Err(ConfigError::Invalid("device.port must not be empty".to_string()));
        }
        if self.device.read_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "device.read_timeout_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_port() -> String { "COM3".to_string() }
fn default_read_timeout_ms() -> u64 { 1000 }
fn default_constant() -> i64 { 3 }
fn default_amplitude() -> u8 { 255 }
fn default_frequency() -> u8 { 128 }
fn default_trajectory() -> String { "0 360".to_string() }

pub fn load_config(path: &str) -> Result<Config, ConfigError> {
    let config: Config = match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("Failed to parse config TOML: {}", e);
                return Err(ConfigError::Toml(e));
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file '{}': {}", path, e);
            return Err(ConfigError::Io(e));
        }
    };
    config.validate()?;
    Ok(config)
}
