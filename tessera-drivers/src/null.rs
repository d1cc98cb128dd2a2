//! Null device
//!
//! Reads return end-of-data, writes are accepted and discarded.

use tessera_core::driver::{Capabilities, DeviceDriver, DriverError};

/// Counterpart of `/dev/null`
#[derive(Debug, Clone, Default)]
pub struct NullDriver {
    name: String,
    discarded: usize,
}

impl NullDriver {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            discarded: 0,
        }
    }

    /// Bytes swallowed so far
    pub fn discarded(&self) -> usize {
        self.discarded
    }
}

impl DeviceDriver for NullDriver {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::READ | Capabilities::WRITE
    }

    fn read(&mut self, _buf: &mut [u8]) -> Result<usize, DriverError> {
        Ok(0)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, DriverError> {
        self.discarded += buf.len();
        Ok(buf.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_swallows_writes() {
        let mut null = NullDriver::new("null");
        assert_eq!(null.write(b"anything").unwrap(), 8);
        assert_eq!(null.discarded(), 8);

        let mut buf = [0xFFu8; 4];
        assert_eq!(null.read(&mut buf).unwrap(), 0);
        assert_eq!(buf, [0xFF; 4]);
    }

    #[test]
    fn test_null_has_no_ioctl() {
        let mut null = NullDriver::new("null");
        assert!(!null.capabilities().contains(Capabilities::IOCTL));
        assert_eq!(null.ioctl(0, 0), Err(DriverError::Unsupported));
    }
}
