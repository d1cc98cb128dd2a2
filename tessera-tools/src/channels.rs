//! Shared state between worker threads
//!
//! Workers share nothing mutable except a stop flag. Frames and acks
//! between the UART reader and writer travel over an mpsc channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative shutdown flag, cloned into every worker
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every holder to wind down
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Work for the UART writer thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxRequest {
    /// Acknowledge the frame with this `msg_id`
    Ack(u8),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let flag = StopFlag::new();
        let worker = flag.clone();
        assert!(!worker.is_stopped());
        flag.stop();
        assert!(worker.is_stopped());
    }
}
