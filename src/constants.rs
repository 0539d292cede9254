use core::time::Duration;

// DEVICE_ADDRESS is the "any sensor" Modbus address every S8 answers to.
pub const DEVICE_ADDRESS: u8 = 0xFE;

// Function codes used by the S8.
pub const READ_HOLDING_REGISTERS: u8 = 0x03;
pub const READ_INPUT_REGISTERS: u8 = 0x04;
pub const WRITE_SINGLE_REGISTER: u8 = 0x06;

// ABC_PERIOD_REGISTER holds the automatic baseline calibration period in hours.
// Writing zero disables ABC.
pub const ABC_PERIOD_REGISTER: u16 = 0x001F;

// FRAME_LEN is the length of every command frame, checksum included.
pub const FRAME_LEN: usize = 8;

// READ_CO2_FRAME queries input register 0x0003 (CO2 ppm). The checksum never varies.
pub const READ_CO2_FRAME: [u8; FRAME_LEN] = [0xFE, 0x04, 0x00, 0x03, 0x00, 0x01, 0xD5, 0xC5];

// DISABLE_ABC_FRAME writes a zero period to the ABC register.
pub const DISABLE_ABC_FRAME: [u8; FRAME_LEN] = [0xFE, 0x06, 0x00, 0x1F, 0x00, 0x00, 0xAC, 0x03];

// GET_ABC_PERIOD_FRAME reads holding register 0x001F.
pub const GET_ABC_PERIOD_FRAME: [u8; FRAME_LEN] = [0xFE, 0x03, 0x00, 0x1F, 0x00, 0x01, 0xA1, 0xC3];

// ENABLE_ABC_PREFIX is followed by the period (u16 big-endian) and the checksum.
pub const ENABLE_ABC_PREFIX: [u8; 4] = [DEVICE_ADDRESS, WRITE_SINGLE_REGISTER, 0x00, 0x1F];

// Reply lengths: register reads carry one 16-bit value, writes echo the request.
pub const READ_REPLY_LEN: usize = 7;
pub const WRITE_REPLY_LEN: usize = FRAME_LEN;

// VALUE_OFFSET is where the big-endian register value starts in a read reply.
pub const VALUE_OFFSET: usize = 3;

// DEFAULT_ABC_PERIOD_HOURS is the factory ABC period.
pub const DEFAULT_ABC_PERIOD_HOURS: u32 = 180;

// Serial line settings (8N1 is configured by the transport).
pub const BAUD_RATE: u32 = 9600;
pub const READ_TIMEOUT: Duration = Duration::from_secs(1);

// SETTLE_DELAY gives the sensor time to process a request before its reply is read.
pub const SETTLE_DELAY: Duration = Duration::from_millis(50);

// RECOVERY_DELAY is how long the monitor backs off after a failed read.
pub const RECOVERY_DELAY: Duration = Duration::from_secs(5);

// DEFAULT_SAMPLE_INTERVAL is the monitor cadence between successful reads.
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_secs(30);
