//! Device driver implementations
//!
//! This crate provides concrete implementations of the
//! `DeviceDriver` trait defined in tessera-core:
//!
//! - Null device (discards writes, reads nothing)
//! - Loopback device (ring buffer echo)
//! - UART adapter (any `tessera_hal::Uart`)

#![deny(unsafe_code)]

pub mod loopback;
pub mod null;
pub mod uart;

pub use loopback::LoopbackDriver;
pub use null::NullDriver;
pub use uart::UartDriver;
