//! Linux implementations for Tessera
//!
//! Host-side counterparts of the `tessera-hal` traits plus the socket
//! facilities the tool drives:
//!
//! - [`serial`] - tty access implementing `UartTx`/`UartRx`
//! - [`net`] - TCP/UDP helpers and host resolution
//! - [`ping`] - ICMP echo over datagram or raw sockets
//! - [`http`] - HTTP/1.0 GET client
//! - [`thread`] - thread spawning with retry on `EAGAIN`
//!
//! Each module stands alone; they only share the `log` facade.

pub mod http;
pub mod net;
pub mod ping;
pub mod serial;
pub mod thread;

pub use net::NetError;
pub use ping::{PingError, PingReply, Pinger};
pub use serial::{SerialError, SerialPort};
pub use thread::{spawn_with_retry, RetryPolicy};
