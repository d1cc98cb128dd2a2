//! UART-backed device
//!
//! Exposes any [`Uart`] through the driver model so registry users can
//! talk to a serial port by name.

use core::fmt::Debug;

use tessera_core::driver::{Capabilities, DeviceDriver, DriverError};
use tessera_hal::{Uart, UartRx, UartTx};

/// Flush the transmitter
pub const IOCTL_FLUSH: u32 = 0x01;

/// Driver wrapping a UART
pub struct UartDriver<U> {
    name: String,
    uart: U,
}

impl<U> UartDriver<U>
where
    U: Uart,
{
    pub fn new(name: impl Into<String>, uart: U) -> Self {
        Self {
            name: name.into(),
            uart,
        }
    }

    /// Give the UART back
    pub fn into_inner(self) -> U {
        self.uart
    }
}

fn io_error(e: impl Debug) -> DriverError {
    DriverError::Io(format!("{:?}", e))
}

impl<U> DeviceDriver for UartDriver<U>
where
    U: Uart + Send,
    <U as UartTx>::Error: Debug,
    <U as UartRx>::Error: Debug,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::all()
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, DriverError> {
        self.uart.read_blocking(buf).map_err(io_error)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, DriverError> {
        self.uart.write_blocking(buf).map_err(io_error)?;
        Ok(buf.len())
    }

    fn ioctl(&mut self, cmd: u32, _arg: usize) -> Result<usize, DriverError> {
        match cmd {
            IOCTL_FLUSH => {
                self.uart.flush().map_err(io_error)?;
                Ok(0)
            }
            other => Err(DriverError::UnknownIoctl(other)),
        }
    }

    fn close(&mut self) -> Result<(), DriverError> {
        self.uart.flush().map_err(io_error)
    }
}
