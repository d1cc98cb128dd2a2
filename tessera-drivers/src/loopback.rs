//! Loopback device
//!
//! Bytes written are buffered in a fixed ring and handed back by later
//! reads, oldest first.

use heapless::Deque;
use tessera_core::driver::{Capabilities, DeviceDriver, DriverError};

/// Discard everything buffered; returns the bytes dropped
pub const IOCTL_FLUSH: u32 = 0x01;

/// Bytes waiting to be read
pub const IOCTL_AVAILABLE: u32 = 0x02;

/// Usable buffer capacity
pub const IOCTL_CAPACITY: u32 = 0x03;

/// In-memory echo device with room for at most `N` bytes
///
/// A smaller runtime limit can be set with [`LoopbackDriver::with_limit`].
#[derive(Debug, Clone)]
pub struct LoopbackDriver<const N: usize> {
    name: String,
    ring: Deque<u8, N>,
    limit: usize,
}

impl<const N: usize> LoopbackDriver<N> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ring: Deque::new(),
            limit: N,
        }
    }

    /// Cap the buffer below `N` bytes; larger limits are clamped
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.min(N);
        self
    }

    /// Bytes waiting to be read
    pub fn available(&self) -> usize {
        self.ring.len()
    }

    pub fn capacity(&self) -> usize {
        self.limit
    }

    fn flush(&mut self) -> usize {
        let dropped = self.ring.len();
        self.ring.clear();
        dropped
    }
}

impl<const N: usize> DeviceDriver for LoopbackDriver<N> {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::all()
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, DriverError> {
        let mut n = 0;
        for slot in buf.iter_mut() {
            match self.ring.pop_front() {
                Some(byte) => {
                    *slot = byte;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }

    /// Accepts as many bytes as fit; a full buffer reports `Busy`
    fn write(&mut self, buf: &[u8]) -> Result<usize, DriverError> {
        let room = self.limit.saturating_sub(self.ring.len());
        if room == 0 && !buf.is_empty() {
            return Err(DriverError::Busy);
        }

        let take = buf.len().min(room);
        for &byte in &buf[..take] {
            self.ring.push_back(byte).map_err(|_| DriverError::Busy)?;
        }
        if take < buf.len() {
            log::debug!("{}: accepted {} of {} bytes", self.name, take, buf.len());
        }
        Ok(take)
    }

    fn ioctl(&mut self, cmd: u32, _arg: usize) -> Result<usize, DriverError> {
        match cmd {
            IOCTL_FLUSH => Ok(self.flush()),
            IOCTL_AVAILABLE => Ok(self.available()),
            IOCTL_CAPACITY => Ok(self.capacity()),
            other => Err(DriverError::UnknownIoctl(other)),
        }
    }
}
