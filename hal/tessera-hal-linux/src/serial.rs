//! Serial port (tty) access
//!
//! Wraps a `serialport` handle and exposes it through the
//! `tessera-hal` UART traits. Line settings come from [`UartConfig`].

use std::io::{self, Read, Write};
use std::time::Duration;

use serialport::{ClearBuffer, SerialPort as PortOps};
use tessera_hal::{DataBits, Parity, StopBits, UartConfig, UartRx, UartTx};
use thiserror::Error;

/// Serial port errors
#[derive(Debug, Error)]
pub enum SerialError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: serialport::Error,
    },

    #[error("unsupported setting: {0}")]
    Unsupported(&'static str),

    #[error("port configuration failed: {0}")]
    Config(#[from] serialport::Error),

    #[error("serial I/O failed: {0}")]
    Io(#[from] io::Error),
}

fn data_bits(bits: DataBits) -> Result<serialport::DataBits, SerialError> {
    match bits {
        DataBits::Five => Ok(serialport::DataBits::Five),
        DataBits::Six => Ok(serialport::DataBits::Six),
        DataBits::Seven => Ok(serialport::DataBits::Seven),
        DataBits::Eight => Ok(serialport::DataBits::Eight),
        DataBits::Nine => Err(SerialError::Unsupported("nine data bits")),
    }
}

fn parity(parity: Parity) -> serialport::Parity {
    match parity {
        Parity::None => serialport::Parity::None,
        Parity::Even => serialport::Parity::Even,
        Parity::Odd => serialport::Parity::Odd,
    }
}

fn stop_bits(bits: StopBits) -> serialport::StopBits {
    match bits {
        StopBits::One => serialport::StopBits::One,
        StopBits::Two => serialport::StopBits::Two,
    }
}

fn timeout(config: &UartConfig) -> Duration {
    Duration::from_millis(u64::from(config.read_timeout_ms))
}

/// An open serial port
///
/// Opened raw (no echo, no line discipline) with the requested line
/// settings. Reads return `Ok(0)` when the read timeout elapses.
pub struct SerialPort {
    path: String,
    port: Box<dyn PortOps>,
}

impl SerialPort {
    /// Open and configure the tty at `path`
    pub fn open(path: &str, config: &UartConfig) -> Result<Self, SerialError> {
        let port = serialport::new(path, config.baudrate)
            .data_bits(data_bits(config.data_bits)?)
            .parity(parity(config.parity))
            .stop_bits(stop_bits(config.stop_bits))
            .flow_control(serialport::FlowControl::None)
            .timeout(timeout(config))
            .open()
            .map_err(|source| SerialError::Open {
                path: path.to_string(),
                source,
            })?;

        log::info!(
            "opened {} at {} baud ({:?}, {:?}, {:?})",
            path,
            config.baudrate,
            config.data_bits,
            config.parity,
            config.stop_bits
        );

        Ok(Self {
            path: path.to_string(),
            port,
        })
    }

    /// Device path this port was opened from
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Apply new line settings to the open port
    pub fn reconfigure(&mut self, config: &UartConfig) -> Result<(), SerialError> {
        self.port.set_data_bits(data_bits(config.data_bits)?)?;
        self.port.set_baud_rate(config.baudrate)?;
        self.port.set_parity(parity(config.parity))?;
        self.port.set_stop_bits(stop_bits(config.stop_bits))?;
        self.port.set_timeout(timeout(config))?;
        log::debug!("{}: reconfigured to {} baud", self.path, config.baudrate);
        Ok(())
    }

    /// Bytes waiting in the receive buffer
    pub fn bytes_available(&self) -> Result<u32, SerialError> {
        Ok(self.port.bytes_to_read()?)
    }

    /// Discard pending input and output
    pub fn clear(&self) -> Result<(), SerialError> {
        self.port.clear(ClearBuffer::All)?;
        Ok(())
    }

    /// Second handle to the same tty
    ///
    /// Lets a reader thread and a writer share one port.
    pub fn try_clone(&self) -> Result<Self, SerialError> {
        Ok(Self {
            path: self.path.clone(),
            port: self.port.try_clone()?,
        })
    }
}

impl UartTx for SerialPort {
    type Error = SerialError;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), SerialError> {
        self.port.write_all(data)?;
        log::trace!("{}: wrote {} bytes", self.path, data.len());
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SerialError> {
        self.port.flush()?;
        Ok(())
    }
}

impl UartRx for SerialPort {
    type Error = SerialError;

    fn read_blocking(&mut self, buf: &mut [u8]) -> Result<usize, SerialError> {
        match self.port.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if is_timeout(&e) => Ok(0),
            Err(e) => Err(e.into()),
        }
    }
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nine_data_bits_rejected() {
        assert!(matches!(
            data_bits(DataBits::Nine),
            Err(SerialError::Unsupported(_))
        ));
        assert_eq!(
            data_bits(DataBits::Seven).unwrap(),
            serialport::DataBits::Seven
        );
    }

    #[test]
    fn test_line_setting_mapping() {
        assert_eq!(parity(Parity::Odd), serialport::Parity::Odd);
        assert_eq!(stop_bits(StopBits::Two), serialport::StopBits::Two);
        let config = UartConfig {
            read_timeout_ms: 250,
            ..UartConfig::default()
        };
        assert_eq!(timeout(&config), Duration::from_millis(250));
    }

    #[test]
    fn test_timeouts_are_not_errors() {
        assert!(is_timeout(&io::Error::from(io::ErrorKind::TimedOut)));
        assert!(!is_timeout(&io::Error::from(io::ErrorKind::BrokenPipe)));
    }

    #[test]
    fn test_open_missing_device_fails() {
        let err = SerialPort::open("/dev/tessera-does-not-exist", &UartConfig::default());
        assert!(matches!(err, Err(SerialError::Open { .. })));
    }

    #[test]
    fn test_open_rejects_nine_bits_before_touching_device() {
        let config = UartConfig {
            data_bits: DataBits::Nine,
            ..UartConfig::default()
        };
        let err = SerialPort::open("/dev/tessera-does-not-exist", &config);
        assert!(matches!(err, Err(SerialError::Unsupported(_))));
    }
}
