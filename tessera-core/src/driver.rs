//! Driver model
//!
//! A device driver is anything implementing [`DeviceDriver`]: a name, a
//! capability set, and whichever of `read`, `write` and `ioctl` it
//! supports. The [`DriverRegistry`] maps names to boxed drivers and
//! forwards calls after checking the driver advertises the operation.

use std::collections::BTreeMap;

use bitflags::bitflags;
use thiserror::Error;

/// Longest accepted driver name
pub const MAX_NAME_LEN: usize = 32;

bitflags! {
    /// Operations a driver supports
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
        const IOCTL = 1 << 2;
    }
}

/// Errors reported by a driver
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    #[error("operation not supported")]
    Unsupported,

    #[error("device is not open")]
    NotOpen,

    #[error("device is busy")]
    Busy,

    #[error("unknown ioctl command {0:#x}")]
    UnknownIoctl(u32),

    #[error("device I/O error: {0}")]
    Io(String),
}

/// Errors reported by the registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("driver {0:?} is already registered")]
    AlreadyRegistered(String),

    #[error("no driver named {0:?}")]
    NotFound(String),

    #[error("invalid driver name {0:?}")]
    InvalidName(String),

    #[error(transparent)]
    Driver(#[from] DriverError),
}

/// A named device with optional read, write and control operations
///
/// Operations a driver does not override report
/// [`DriverError::Unsupported`].
pub trait DeviceDriver: Send {
    /// Registry key for this driver
    fn name(&self) -> &str;

    /// Operations this driver implements
    fn capabilities(&self) -> Capabilities;

    /// Prepare the device for use
    fn open(&mut self) -> Result<(), DriverError> {
        Ok(())
    }

    /// Release the device
    fn close(&mut self) -> Result<(), DriverError> {
        Ok(())
    }

    /// Read into `buf`, returning the bytes read
    fn read(&mut self, _buf: &mut [u8]) -> Result<usize, DriverError> {
        Err(DriverError::Unsupported)
    }

    /// Write `buf`, returning the bytes accepted
    fn write(&mut self, _buf: &[u8]) -> Result<usize, DriverError> {
        Err(DriverError::Unsupported)
    }

    /// Device-specific control command
    fn ioctl(&mut self, _cmd: u32, _arg: usize) -> Result<usize, DriverError> {
        Err(DriverError::Unsupported)
    }
}

fn valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_NAME_LEN
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
}

/// Name-keyed collection of drivers
#[derive(Default)]
pub struct DriverRegistry {
    drivers: BTreeMap<String, Box<dyn DeviceDriver>>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a driver under its own name
    pub fn register(&mut self, driver: Box<dyn DeviceDriver>) -> Result<(), RegistryError> {
        let name = driver.name().to_string();
        if !valid_name(&name) {
            return Err(RegistryError::InvalidName(name));
        }
        if self.drivers.contains_key(&name) {
            return Err(RegistryError::AlreadyRegistered(name));
        }

        log::debug!(
            "registered driver {} ({:?})",
            name,
            driver.capabilities()
        );
        self.drivers.insert(name, driver);
        Ok(())
    }

    /// Remove a driver, handing it back to the caller
    pub fn unregister(&mut self, name: &str) -> Result<Box<dyn DeviceDriver>, RegistryError> {
        let driver = self
            .drivers
            .remove(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        log::debug!("unregistered driver {}", name);
        Ok(driver)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.drivers.contains_key(name)
    }

    /// Registered names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.drivers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }

    /// Direct access to a registered driver
    pub fn get_mut(&mut self, name: &str) -> Option<&mut (dyn DeviceDriver + 'static)> {
        self.drivers.get_mut(name).map(|d| d.as_mut())
    }

    fn lookup(
        &mut self,
        name: &str,
        needed: Capabilities,
    ) -> Result<&mut (dyn DeviceDriver + 'static), RegistryError> {
        let driver = self
            .get_mut(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        if !driver.capabilities().contains(needed) {
            return Err(DriverError::Unsupported.into());
        }
        Ok(driver)
    }

    /// Open the named driver
    pub fn open(&mut self, name: &str) -> Result<(), RegistryError> {
        Ok(self.lookup(name, Capabilities::empty())?.open()?)
    }

    /// Close the named driver
    pub fn close(&mut self, name: &str) -> Result<(), RegistryError> {
        Ok(self.lookup(name, Capabilities::empty())?.close()?)
    }

    /// Read from the named driver
    pub fn read(&mut self, name: &str, buf: &mut [u8]) -> Result<usize, RegistryError> {
        Ok(self.lookup(name, Capabilities::READ)?.read(buf)?)
    }

    /// Write to the named driver
    pub fn write(&mut self, name: &str, buf: &[u8]) -> Result<usize, RegistryError> {
        Ok(self.lookup(name, Capabilities::WRITE)?.write(buf)?)
    }

    /// Issue a control command to the named driver
    pub fn ioctl(&mut self, name: &str, cmd: u32, arg: usize) -> Result<usize, RegistryError> {
        Ok(self.lookup(name, Capabilities::IOCTL)?.ioctl(cmd, arg)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Write-only sink counting bytes; ioctl 1 returns the count
    struct Counter {
        name: &'static str,
        total: usize,
    }

    impl DeviceDriver for Counter {
        fn name(&self) -> &str {
            self.name
        }

        fn capabilities(&self) -> Capabilities {
            Capabilities::WRITE | Capabilities::IOCTL
        }

        fn write(&mut self, buf: &[u8]) -> Result<usize, DriverError> {
            self.total += buf.len();
            Ok(buf.len())
        }

        fn ioctl(&mut self, cmd: u32, _arg: usize) -> Result<usize, DriverError> {
            match cmd {
                1 => Ok(self.total),
                other => Err(DriverError::UnknownIoctl(other)),
            }
        }
    }

    fn counter(name: &'static str) -> Box<dyn DeviceDriver> {
        Box::new(Counter { name, total: 0 })
    }

    #[test]
    fn test_register_and_forward() {
        let mut registry = DriverRegistry::new();
        registry.register(counter("count0")).unwrap();

        assert_eq!(registry.write("count0", b"abc").unwrap(), 3);
        assert_eq!(registry.write("count0", b"de").unwrap(), 2);
        assert_eq!(registry.ioctl("count0", 1, 0).unwrap(), 5);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = DriverRegistry::new();
        registry.register(counter("dup")).unwrap();
        assert_eq!(
            registry.register(counter("dup")),
            Err(RegistryError::AlreadyRegistered("dup".into()))
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_invalid_names_rejected() {
        let mut registry = DriverRegistry::new();
        assert!(matches!(
            registry.register(counter("")),
            Err(RegistryError::InvalidName(_))
        ));
        assert!(matches!(
            registry.register(counter("has space")),
            Err(RegistryError::InvalidName(_))
        ));
        let long: &'static str = "a-very-long-driver-name-exceeding-the-limit";
        assert!(matches!(
            registry.register(counter(long)),
            Err(RegistryError::InvalidName(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unknown_name() {
        let mut registry = DriverRegistry::new();
        let mut buf = [0u8; 4];
        assert_eq!(
            registry.read("missing", &mut buf),
            Err(RegistryError::NotFound("missing".into()))
        );
        assert!(registry.unregister("missing").is_err());
    }

    #[test]
    fn test_capability_checked_before_forwarding() {
        let mut registry = DriverRegistry::new();
        registry.register(counter("sink")).unwrap();

        let mut buf = [0u8; 4];
        assert_eq!(
            registry.read("sink", &mut buf),
            Err(RegistryError::Driver(DriverError::Unsupported))
        );
    }

    #[test]
    fn test_driver_errors_pass_through() {
        let mut registry = DriverRegistry::new();
        registry.register(counter("c")).unwrap();
        assert_eq!(
            registry.ioctl("c", 0x42, 0),
            Err(RegistryError::Driver(DriverError::UnknownIoctl(0x42)))
        );
    }

    #[test]
    fn test_names_sorted_and_unregister() {
        let mut registry = DriverRegistry::new();
        registry.register(counter("b")).unwrap();
        registry.register(counter("a")).unwrap();
        assert_eq!(registry.names().collect::<Vec<_>>(), ["a", "b"]);

        let driver = registry.unregister("a").unwrap();
        assert_eq!(driver.name(), "a");
        assert!(!registry.contains("a"));
        assert!(registry.contains("b"));
    }

    #[test]
    fn test_default_open_close_succeed() {
        let mut registry = DriverRegistry::new();
        registry.register(counter("c")).unwrap();
        assert!(registry.open("c").is_ok());
        assert!(registry.close("c").is_ok());
    }
}
