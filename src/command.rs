use crate::constants::*;
use crate::crc16::checksum;
use crate::error::Error;

/// A complete request frame, checksum included.
pub type Frame = [u8; FRAME_LEN];

/// The requests this crate knows how to send to an S8.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Command {
    /// Read the current CO2 concentration in ppm.
    ReadCo2,
    /// Turn automatic baseline calibration off.
    DisableAbc,
    /// Turn automatic baseline calibration on with the given period.
    EnableAbc { period_hours: u32 },
    /// Read the configured ABC period in hours (0 means disabled).
    GetAbcPeriod,
}

impl Command {
    /// Encodes the command into its wire frame.
    ///
    /// Fixed commands return their precomputed frame. `EnableAbc` appends the
    /// period as a big-endian `u16` and the checksum of the six leading bytes.
    ///
    /// # Returns
    ///
    /// * `Ok(Frame)` ready to be written to the transport.
    /// * `Err(Error::InvalidParameter)` if the period does not fit in 16 bits.
    pub fn frame(&self) -> Result<Frame, Error> {
        match *self {
            Command::ReadCo2 => Ok(READ_CO2_FRAME),
            Command::DisableAbc => Ok(DISABLE_ABC_FRAME),
            Command::GetAbcPeriod => Ok(GET_ABC_PERIOD_FRAME),
            Command::EnableAbc { period_hours } => {
                let period = u16::try_from(period_hours).map_err(|_| Error::InvalidParameter {
                    name: "period_hours",
                    value: period_hours,
                })?;

                let mut frame = [0u8; FRAME_LEN];
                frame[..4].copy_from_slice(&ENABLE_ABC_PREFIX);
                frame[4..6].copy_from_slice(&period.to_be_bytes());
                let crc = checksum(&frame[..6]);
                frame[6..].copy_from_slice(&crc);
                Ok(frame)
            }
        }
    }

    /// Number of bytes the sensor sends back for this command.
    pub fn response_len(&self) -> usize {
        match self {
            Command::ReadCo2 | Command::GetAbcPeriod => READ_REPLY_LEN,
            Command::DisableAbc | Command::EnableAbc { .. } => WRITE_REPLY_LEN,
        }
    }
}
