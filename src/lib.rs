//! Client and polling monitor for the Senseair S8 CO2 sensor.
//!
//! The S8 speaks a small subset of Modbus RTU over a 9600 baud UART. [`S8`]
//! builds request frames, exchanges them over a [`Transport`] and decodes
//! the replies. [`Monitor`] polls one or more sensors on a fixed cadence and
//! writes every reading to a [`LogSink`].

#![deny(unsafe_code)]

use std::thread;
use std::time::Duration;

use log::{debug, warn};

mod constants;
pub use constants::*;

mod error;
pub use error::*;

mod config;
pub use config::*;

mod crc16;
pub use crc16::{checksum, verify_checksum};

pub mod command;
pub use command::{Command, Frame};

pub mod monitor;
pub use monitor::{Monitor, MonitorState, Sensor, StopSignal};

pub mod sink;
pub use sink::{FileSink, Level, LogSink};

pub mod transport;
pub use transport::{SerialTransport, Transport};

#[cfg(test)]
mod debug_utils;

/// Represents a Senseair S8 sensor.
///
/// The sensor owns its transport until it is closed. Every method performs
/// exactly one request/reply round trip and never retries.
///
/// # Type Parameters
///
/// * `T`: The transport used to talk to the sensor, usually a [`SerialTransport`].
pub struct S8<T> {
    transport: Option<T>,
    config: Config,
    abc_enabled: Option<bool>,
}

impl<T: Transport> S8<T> {
    /// Creates a new `S8` sensor instance around an open transport.
    ///
    /// # Arguments
    ///
    /// * `transport`: The byte stream connected to the sensor.
    /// * `config`: Timing settings for request/reply exchanges.
    pub fn new(transport: T, config: Config) -> Self {
        Self {
            transport: Some(transport),
            config,
            abc_enabled: None,
        }
    }

    /// Reads the current CO2 concentration in ppm.
    ///
    /// The reply must be exactly seven bytes with a valid checksum.
    pub fn read_co2(&mut self) -> Result<u16, Error> {
        let value = self.read_register(Command::ReadCo2)?;
        debug!("CO2: {} ppm", value);
        Ok(value)
    }

    /// Queries the automatic baseline calibration period in hours.
    ///
    /// A period of zero means ABC is disabled.
    pub fn abc_period(&mut self) -> Result<u16, Error> {
        let period = self.read_register(Command::GetAbcPeriod)?;
        debug!("ABC period: {} hours", period);
        Ok(period)
    }

    /// Disables automatic baseline calibration.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` if the sensor acknowledged the write.
    /// * `Ok(false)` if the sensor answered with something else.
    /// * `Err(Error)` if no reply arrived or the transport failed.
    pub fn disable_abc(&mut self) -> Result<bool, Error> {
        let accepted = self.write_register(Command::DisableAbc)?;
        if accepted {
            self.abc_enabled = Some(false);
        }
        Ok(accepted)
    }

    /// Enables automatic baseline calibration with a period of `period_hours`.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` if the sensor acknowledged the write.
    /// * `Ok(false)` if the sensor answered with something else.
    /// * `Err(Error::InvalidParameter)` if the period does not fit in 16 bits.
    ///   Nothing is sent in that case.
    /// * `Err(Error)` if no reply arrived or the transport failed.
    pub fn enable_abc(&mut self, period_hours: u32) -> Result<bool, Error> {
        let accepted = self.write_register(Command::EnableAbc { period_hours })?;
        if accepted {
            self.abc_enabled = Some(period_hours != 0);
        }
        Ok(accepted)
    }

    /// Last ABC state this client set successfully, if any.
    ///
    /// This is a local guess: the sensor may have been reconfigured by
    /// someone else since.
    pub fn abc_enabled(&self) -> Option<bool> {
        self.abc_enabled
    }

    pub fn is_open(&self) -> bool {
        self.transport.is_some()
    }

    /// Releases the transport. Closing twice is a no-op.
    pub fn close(&mut self) {
        if self.transport.take().is_some() {
            debug!("Closed S8 transport");
        }
    }

    /// Writes `frame` and reads back up to `expected_len` bytes.
    ///
    /// Stale input is discarded before writing and stale output after
    /// reading. The reply is returned as read, possibly shorter than
    /// `expected_len` if the transport timed out.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<u8>)` holding the raw reply.
    /// * `Err(Error::NoResponse)` if nothing was received after the settle delay.
    /// * `Err(Error::Closed)` if the sensor has been closed.
    /// * `Err(Error::Io)` for transport failures.
    pub fn send_and_receive(&mut self, frame: &[u8], expected_len: usize) -> Result<Vec<u8>, Error> {
        let settle_delay = self.config.settle_delay;
        let post_read_delay = self.config.post_read_delay;
        let transport = self.transport.as_mut().ok_or(Error::Closed)?;

        debug!("Executing command: {:02X?}", frame);
        transport.clear_input().map_err(Error::io)?;
        transport.write_all(frame).map_err(Error::io)?;
        transport.flush().map_err(Error::io)?;
        pause(settle_delay);

        if !transport.read_ready().map_err(Error::io)? {
            warn!("No reply to {:02X?}", frame);
            return Err(Error::NoResponse);
        }

        let mut buffer = vec![0u8; expected_len];
        let mut filled = 0;
        while filled < expected_len {
            let n = transport.read(&mut buffer[filled..]).map_err(Error::io)?;
            if n == 0 {
                debug!("Read timed out after {} of {} bytes", filled, expected_len);
                break;
            }
            filled += n;
        }
        buffer.truncate(filled);

        pause(post_read_delay);
        transport.clear_output().map_err(Error::io)?;

        debug!("Received: {:02X?}", buffer);
        Ok(buffer)
    }

    // Sends a register read and decodes the single value it returns.
    fn read_register(&mut self, command: Command) -> Result<u16, Error> {
        let frame = command.frame()?;
        let expected = command.response_len();
        let reply = self.send_and_receive(&frame, expected)?;

        if reply.is_empty() {
            return Err(Error::NoResponse);
        }
        if reply.len() != expected {
            warn!("Unexpected reply length {} for {:?}: {:02X?}", reply.len(), command, reply);
            return Err(Error::MalformedResponse {
                expected,
                got: reply,
            });
        }
        verify_checksum(&reply).map_err(|e| {
            warn!("Rejected reply {:02X?}: {}", reply, e);
            e
        })?;

        decode_measurement(&reply)
    }

    // Sends a register write and checks its echo.
    fn write_register(&mut self, command: Command) -> Result<bool, Error> {
        let frame = command.frame()?;
        let reply = self.send_and_receive(&frame, command.response_len())?;

        let accepted = decode_acknowledgment(&reply, &frame);
        if !accepted {
            warn!("{:?} not acknowledged, reply: {:02X?}", command, reply);
        }
        Ok(accepted)
    }
}

impl<T: Transport> Sensor for S8<T> {
    fn read(&mut self) -> Result<u16, Error> {
        self.read_co2()
    }

    fn close(&mut self) {
        S8::close(self)
    }
}

/// Decodes the big-endian register value at bytes 3..5 of a read reply.
///
/// Only the length is checked here; callers that need an intact frame verify
/// its checksum first.
pub fn decode_measurement(response: &[u8]) -> Result<u16, Error> {
    match response.get(VALUE_OFFSET..VALUE_OFFSET + 2) {
        Some(&[hi, lo]) => Ok(u16::from_be_bytes([hi, lo])),
        _ => Err(Error::MalformedResponse {
            expected: VALUE_OFFSET + 2,
            got: response.to_vec(),
        }),
    }
}

/// Checks a write acknowledgment: the S8 echoes a single-register write verbatim.
pub fn decode_acknowledgment(response: &[u8], sent_frame: &[u8]) -> bool {
    !response.is_empty() && response == sent_frame
}

fn pause(delay: Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}
