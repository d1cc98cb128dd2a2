//! Thread spawning with retry on resource exhaustion
//!
//! `pthread_create` fails with `EAGAIN` when the process is at its
//! thread or memory limit. That is often transient, so spawning backs
//! off and retries a few times before giving up.

use std::io;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// How often and how patiently to retry a failed spawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total spawn attempts, including the first
    pub attempts: u32,
    /// Delay before the first retry; doubles after each failure
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            backoff: Duration::from_millis(10),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (zero-based)
    pub fn delay(&self, retry: u32) -> Duration {
        self.backoff.saturating_mul(1u32 << retry.min(16))
    }
}

/// Spawn a named thread, retrying while the OS reports `EAGAIN`
///
/// Any other spawn error is returned immediately.
pub fn spawn_with_retry<F>(name: &str, policy: &RetryPolicy, f: F) -> io::Result<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    // A failed spawn drops its closure, so hand the body over through a
    // slot that survives the attempt.
    let slot = Arc::new(Mutex::new(Some(f)));
    spawn_attempts(policy, || {
        let slot = Arc::clone(&slot);
        thread::Builder::new().name(name.to_string()).spawn(move || {
            let body = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
            if let Some(body) = body {
                body();
            }
        })
    })
}

fn spawn_attempts<T>(
    policy: &RetryPolicy,
    mut attempt: impl FnMut() -> io::Result<T>,
) -> io::Result<T> {
    let attempts = policy.attempts.max(1);
    let mut retry = 0;
    loop {
        match attempt() {
            Ok(value) => return Ok(value),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock && retry + 1 < attempts => {
                let delay = policy.delay(retry);
                log::warn!(
                    "thread spawn failed ({}), retry {}/{} in {:?}",
                    e,
                    retry + 1,
                    attempts - 1,
                    delay
                );
                thread::sleep(delay);
                retry += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
