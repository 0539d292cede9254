//! Byte transport between the client and the sensor.

use std::io;

use embedded_io::{ErrorKind, ErrorType, Read, ReadReady, Write};
use log::debug;
use serialport::{ClearBuffer, DataBits, Parity, SerialPort, StopBits};

use crate::constants::{BAUD_RATE, READ_TIMEOUT};
use crate::error::Error;

/// A blocking byte stream to one sensor.
///
/// Reads must be bounded by a timeout: a read that times out returns `Ok(0)`
/// instead of blocking. The transport is closed when it is dropped.
pub trait Transport: Read + Write + ReadReady {
    /// Discards bytes received but not yet read.
    fn clear_input(&mut self) -> Result<(), Self::Error>;

    /// Discards bytes written but not yet transmitted.
    fn clear_output(&mut self) -> Result<(), Self::Error>;
}

/// Error type of [`SerialTransport`].
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct SerialError(#[from] io::Error);

impl embedded_io::Error for SerialError {
    fn kind(&self) -> ErrorKind {
        match self.0.kind() {
            io::ErrorKind::NotFound => ErrorKind::NotFound,
            io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            io::ErrorKind::BrokenPipe => ErrorKind::BrokenPipe,
            io::ErrorKind::InvalidInput => ErrorKind::InvalidInput,
            io::ErrorKind::InvalidData => ErrorKind::InvalidData,
            io::ErrorKind::TimedOut => ErrorKind::TimedOut,
            io::ErrorKind::Interrupted => ErrorKind::Interrupted,
            io::ErrorKind::Unsupported => ErrorKind::Unsupported,
            _ => ErrorKind::Other,
        }
    }
}

impl From<serialport::Error> for SerialError {
    fn from(err: serialport::Error) -> Self {
        SerialError(err.into())
    }
}

/// A serial port configured for the S8: 9600 baud, 8N1, 1s read timeout.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
}

impl SerialTransport {
    /// Opens the serial port at `path`.
    ///
    /// # Returns
    ///
    /// * `Ok(SerialTransport)` once the port is open and configured.
    /// * `Err(Error::TransportUnavailable)` if the port cannot be opened.
    pub fn open(path: &str) -> Result<Self, Error> {
        let port = serialport::new(path, BAUD_RATE)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(READ_TIMEOUT)
            .open()
            .map_err(|e| Error::TransportUnavailable {
                path: path.to_string(),
                reason: e.to_string(),
            })?;

        debug!("Opened serial port {}", path);
        Ok(Self { port })
    }
}

impl ErrorType for SerialTransport {
    type Error = SerialError;
}

impl Read for SerialTransport {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        match io::Read::read(&mut self.port, buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e.into()),
        }
    }
}

impl Write for SerialTransport {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        Ok(io::Write::write(&mut self.port, buf)?)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(io::Write::flush(&mut self.port)?)
    }
}

impl ReadReady for SerialTransport {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(self.port.bytes_to_read()? > 0)
    }
}

impl Transport for SerialTransport {
    fn clear_input(&mut self) -> Result<(), Self::Error> {
        Ok(self.port.clear(ClearBuffer::Input)?)
    }

    fn clear_output(&mut self) -> Result<(), Self::Error> {
        Ok(self.port.clear(ClearBuffer::Output)?)
    }
}
