use crc::{Crc, CRC_16_MODBUS};

use crate::error::Error;

// Reflected polynomial 0xA001, init 0xFFFF, no final XOR.
const CRC_COMPUTER: Crc<u16> = Crc::<u16>::new(&CRC_16_MODBUS);

/// Calculates the CRC-16/MODBUS checksum of `data`.
///
/// The result is returned in wire order, least significant byte first, ready
/// to be appended to a frame.
#[inline]
pub fn checksum(data: &[u8]) -> [u8; 2] {
    CRC_COMPUTER.checksum(data).to_le_bytes()
}

/// Verifies a frame whose last two bytes are the checksum of everything before them.
///
/// # Returns
///
/// * `Ok(())` if the checksum matches.
/// * `Err(Error::MalformedResponse)` if the frame is too short to carry a checksum.
/// * `Err(Error::BadChecksum)` if the checksums don't match.
pub fn verify_checksum(frame: &[u8]) -> Result<(), Error> {
    if frame.len() < 3 {
        return Err(Error::MalformedResponse {
            expected: 3,
            got: frame.to_vec(),
        });
    }
    let (data, trailer) = frame.split_at(frame.len() - 2);

    let calculated = CRC_COMPUTER.checksum(data);
    let received = u16::from_le_bytes([trailer[0], trailer[1]]);

    if calculated == received {
        Ok(())
    } else {
        Err(Error::BadChecksum {
            calculated,
            received,
        })
    }
}
