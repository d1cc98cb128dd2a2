//! Build script for tessera-tools
//!
//! Validates the embedded tessera.toml at compile time, so a broken
//! default never makes it into the binary.

use std::fs;
use std::path::Path;

const LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

const PARITIES: [&str; 3] = ["none", "even", "odd"];

fn main() {
    println!("cargo:rerun-if-changed=tessera.toml");
    println!("cargo:rerun-if-changed=build.rs");

    let config_path = Path::new("tessera.toml");

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read tessera.toml                              ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in tessera.toml                      ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                {}\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&e.to_string())
            );
        }
    };

    let mut errors = Vec::new();
    validate_log(&config, &mut errors);
    validate_uart(&config, &mut errors);
    validate_frame(&config, &mut errors);

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid tessera.toml                                     ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn int_in_range(
    table: &toml::Value,
    section: &str,
    key: &str,
    min: i64,
    max: i64,
    errors: &mut Vec<String>,
) {
    match table.get(key) {
        None => {}
        Some(toml::Value::Integer(v)) if (min..=max).contains(v) => {}
        Some(_) => errors.push(format!("[{}] {} must be {}-{}", section, key, min, max)),
    }
}

fn validate_log(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(log) = config.get("log") else { return };
    match log.get("level") {
        None => {}
        Some(toml::Value::String(level)) if LEVELS.contains(&level.to_lowercase().as_str()) => {}
        Some(_) => errors.push("[log] level must be off/error/warn/info/debug/trace".into()),
    }
}

fn validate_uart(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(uart) = config.get("uart") else { return };

    int_in_range(uart, "uart", "baudrate", 1, 4_000_000, errors);
    int_in_range(uart, "uart", "data_bits", 5, 8, errors);
    int_in_range(uart, "uart", "stop_bits", 1, 2, errors);
    int_in_range(uart, "uart", "timeout_ms", 0, 60_000, errors);

    match uart.get("parity") {
        None => {}
        Some(toml::Value::String(p)) if PARITIES.contains(&p.as_str()) => {}
        Some(_) => errors.push("[uart] parity must be 'none', 'even', or 'odd'".into()),
    }

    if let Some(port) = uart.get("port") {
        if !matches!(port, toml::Value::String(p) if !p.is_empty()) {
            errors.push("[uart] port must be a non-empty path".into());
        }
    }
}

fn validate_frame(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(frame) = config.get("frame") else { return };
    for key in ["device_type", "frame_ver", "device_ver"] {
        int_in_range(frame, "frame", key, 0, 255, errors);
    }
}
