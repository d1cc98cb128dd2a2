//! Subcommand workers
//!
//! Each module backs one or more `tessera` subcommands. Long-running
//! ones spawn their threads through `spawn_with_retry` and share only a
//! `StopFlag`.

pub mod codec;
pub mod drivers;
pub mod frames;
pub mod net;
pub mod tcp;
pub mod uart;
pub mod udp;
