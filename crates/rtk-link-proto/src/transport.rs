//! ---
//! rtk_section: "05-device-protocol"
//! rtk_subsection: "module"
//! rtk_type: "source"
//! rtk_scope: "code"
//! rtk_description: "Receiver protocol records and channel/transport seams."
//! rtk_version: "v0.0.0-prealpha"
//! rtk_owner: "tbd"
//! ---
use std::io;
use std::io::Read;
use std::time::Duration;

use tracing::debug;

use crate::Result;

/// Byte source for a [`crate::ProtocolChannel`] decode pass.
///
/// `open`/`close` are idempotent at the trait level; callers serialize all
/// access behind the driver's exclusion lock.
pub trait DeviceTransport: Send {
    /// Acquire the device handle. A no-op when already open.
    fn open(&mut self) -> Result<()>;

    /// Release the device handle. A no-op when already closed.
    fn close(&mut self);

    /// Read available bytes into `buf`. `Ok(0)` when nothing arrived before
    /// the transport's timeout.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Human-readable endpoint description for logs.
    fn describe(&self) -> String;
}

const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(500);

/// Serial-port transport for receivers attached over USB/UART.
pub struct SerialTransport {
    port_path: String,
    baud: u32,
    read_timeout: Duration,
    handle: Option<Box<dyn serialport::SerialPort>>,
}

impl SerialTransport {
    /// Describe a serial endpoint; the port is opened lazily by [`DeviceTransport::open`].
    pub fn new(port_path: impl Into<String>, baud: u32) -> Self {
        Self {
            port_path: port_path.into(),
            baud,
            read_timeout: DEFAULT_READ_TIMEOUT,
            handle: None,
        }
    }

    /// Override the bounded read timeout applied to every read.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }
}

impl DeviceTransport for SerialTransport {
    fn open(&mut self) -> Result<()> {
        if self.handle.is_some() {
            return Ok(());
        }
        // Some USB serial adapters need explicit settings.
        let builder = serialport::new(self.port_path.as_str(), self.baud)
            .timeout(self.read_timeout)
            .data_bits(serialport::DataBits::Eight)
            .stop_bits(serialport::StopBits::One)
            .parity(serialport::Parity::None);
        let port = builder
            .open()
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        self.handle = Some(port);
        debug!(port = %self.port_path, baud = self.baud, "serial port opened");
        Ok(())
    }

    fn close(&mut self) {
        if self.handle.take().is_some() {
            debug!(port = %self.port_path, "serial port closed");
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.handle.as_mut() {
            Some(port) => match port.read(buf) {
                Ok(read) => Ok(read),
                Err(err)
                    if err.kind() == io::ErrorKind::TimedOut
                        || err.kind() == io::ErrorKind::WouldBlock =>
                {
                    Ok(0)
                }
                Err(err) => Err(err),
            },
            None => Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "serial transport is not open",
            )),
        }
    }

    fn describe(&self) -> String {
        format!("serial:{}@{}", self.port_path, self.baud)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_before_open_is_not_connected() {
        let mut transport = SerialTransport::new("/dev/null-port", 115_200);
        let mut buf = [0u8; 16];
        let err = transport.read(&mut buf).expect_err("not open");
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);
    }

    #[test]
    fn describe_names_the_endpoint() {
        let transport = SerialTransport::new("/dev/ttyACM0", 230_400);
        assert_eq!(transport.describe(), "serial:/dev/ttyACM0@230400");
    }
}
