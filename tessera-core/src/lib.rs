//! Host-side core for the Tessera tools
//!
//! This crate contains the pieces that sit between the wire codecs and
//! the platform code:
//!
//! - Per-component loggers
//! - Driver model (trait, capabilities and name-keyed registry)
//! - Frame dispatch by message type
//! - Configuration type definitions

#![deny(unsafe_code)]

pub mod config;
pub mod dispatch;
pub mod driver;
pub mod logger;

pub use dispatch::{Dispatch, DispatchStats, Dispatcher};
pub use driver::{Capabilities, DeviceDriver, DriverError, DriverRegistry, RegistryError};
pub use logger::Logger;
