//! Configuration loader
//!
//! Reads TOML into [`AppConfig`], then checks the ranges serde cannot
//! express. Falls back to the embedded default when no path is given.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::LevelFilter;
use tessera_core::config::{AppConfig, ParitySetting, UartSettings};
use tessera_core::logger::parse_level;
use tessera_hal::{DataBits, Parity, StopBits, UartConfig};
use thiserror::Error;

/// Embedded default configuration (compiled into the binary)
/// Edit tessera.toml and rebuild to change it
pub const EMBEDDED_CONFIG: &str = include_str!("../../tessera.toml");

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("[{section}] {message}")]
    Invalid {
        section: &'static str,
        message: String,
    },
}

fn invalid(section: &'static str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        section,
        message: message.into(),
    }
}

/// Load configuration from `path`, or the embedded default
pub fn load(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            let config = parse(&content)?;
            log::debug!("loaded configuration from {}", path.display());
            Ok(config)
        }
        None => parse(EMBEDDED_CONFIG),
    }
}

/// Parse and validate configuration text
pub fn parse(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &AppConfig) -> Result<(), ConfigError> {
    if parse_level(&config.log.level).is_none() {
        return Err(invalid(
            "log",
            format!("unknown level {:?}", config.log.level),
        ));
    }

    let uart = &config.uart;
    if uart.port.is_empty() {
        return Err(invalid("uart", "port must not be empty"));
    }
    if uart.baudrate == 0 {
        return Err(invalid("uart", "baudrate must be greater than zero"));
    }
    uart_config(uart)?;

    if config.drivers.loopback_capacity == 0 {
        return Err(invalid("drivers", "loopback_capacity must be greater than zero"));
    }

    Ok(())
}

/// Log level named in the configuration
pub fn log_level(config: &AppConfig) -> LevelFilter {
    parse_level(&config.log.level).unwrap_or(LevelFilter::Info)
}

/// Convert `[uart]` settings into the HAL's line configuration
pub fn uart_config(settings: &UartSettings) -> Result<UartConfig, ConfigError> {
    let data_bits = match settings.data_bits {
        5..=8 => DataBits::from_count(settings.data_bits),
        _ => None,
    }
    .ok_or_else(|| invalid("uart", format!("data_bits must be 5-8, got {}", settings.data_bits)))?;

    let stop_bits = StopBits::from_count(settings.stop_bits).ok_or_else(|| {
        invalid(
            "uart",
            format!("stop_bits must be 1 or 2, got {}", settings.stop_bits),
        )
    })?;

    let parity = match settings.parity {
        ParitySetting::None => Parity::None,
        ParitySetting::Even => Parity::Even,
        ParitySetting::Odd => Parity::Odd,
    };

    Ok(UartConfig {
        baudrate: settings.baudrate,
        data_bits,
        parity,
        stop_bits,
        read_timeout_ms: settings.timeout_ms,
    })
}
