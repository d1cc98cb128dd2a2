//! Configuration loading and parsing
//!
//! Loads `tessera.toml` from a user-supplied path or falls back to the
//! copy embedded in the binary.

pub mod loader;

pub use loader::{load, log_level, uart_config};
