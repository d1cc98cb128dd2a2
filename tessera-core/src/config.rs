//! Configuration type definitions
//!
//! These types mirror `tessera.toml`. Every field has a default, so a
//! partial file (or an empty one) is valid; range checks happen in the
//! tool's loader.

use serde::{Deserialize, Serialize};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub log: LogConfig,
    pub uart: UartSettings,
    pub frame: FrameSettings,
    pub net: NetConfig,
    pub drivers: DriverConfig,
}

/// `[log]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// Level name: off, error, warn, info, debug or trace
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Parity as written in the config file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParitySetting {
    #[default]
    None,
    Even,
    Odd,
}

/// `[uart]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UartSettings {
    /// Device path
    pub port: String,
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Data bits (5-8)
    pub data_bits: u8,
    pub parity: ParitySetting,
    /// Stop bits (1 or 2)
    pub stop_bits: u8,
    /// Read timeout in milliseconds
    pub timeout_ms: u32,
}

impl Default for UartSettings {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baudrate: 115200,
            data_bits: 8,
            parity: ParitySetting::None,
            stop_bits: 1,
            timeout_ms: 100,
        }
    }
}

/// `[frame]` section: identity stamped on outgoing frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FrameSettings {
    pub device_type: u8,
    pub frame_ver: u8,
    pub device_ver: u8,
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            device_type: 1,
            frame_ver: 1,
            device_ver: 1,
        }
    }
}

/// `[net]` section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetConfig {
    /// Connect and read timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self { timeout_ms: 2000 }
    }
}

/// `[drivers]` section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DriverConfig {
    /// Bytes the loopback driver can buffer (capped at build time)
    pub loopback_capacity: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            loopback_capacity: 256,
        }
    }
}
