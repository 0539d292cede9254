use embedded_io::ErrorKind;

/// Failures of the S8 client and the monitor driving it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The serial port could not be opened.
    #[error("cannot open serial port {path}: {reason}")]
    TransportUnavailable { path: String, reason: String },

    /// The request was written but no reply arrived within the settle window.
    #[error("sensor did not respond, check wiring and power")]
    NoResponse,

    /// A reply arrived but does not have the layout expected for the command.
    #[error("malformed response: expected {expected} bytes, got {got:02X?}")]
    MalformedResponse { expected: usize, got: Vec<u8> },

    /// A reply arrived with a trailing checksum that does not match its content.
    #[error("bad checksum: calculated {calculated:#06x}, received {received:#06x}")]
    BadChecksum { calculated: u16, received: u16 },

    /// The caller supplied a value the protocol cannot encode.
    #[error("invalid {name}: {value}")]
    InvalidParameter { name: &'static str, value: u32 },

    /// The sensor handle was already closed.
    #[error("sensor handle is closed")]
    Closed,

    /// The transport reported an I/O failure.
    #[error("transport I/O error: {0:?}")]
    Io(ErrorKind),
}

impl Error {
    /// Returns `true` for communication hiccups worth retrying on the next cycle.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::NoResponse | Error::MalformedResponse { .. } | Error::BadChecksum { .. }
        )
    }

    pub(crate) fn io<E: embedded_io::Error>(err: E) -> Self {
        Error::Io(err.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(Error::NoResponse.is_transient());
        assert!(Error::MalformedResponse {
            expected: 7,
            got: vec![0xFE]
        }
        .is_transient());
        assert!(Error::BadChecksum {
            calculated: 1,
            received: 2
        }
        .is_transient());

        assert!(!Error::Closed.is_transient());
        assert!(!Error::Io(ErrorKind::Other).is_transient());
        assert!(!Error::InvalidParameter {
            name: "period_hours",
            value: 65536
        }
        .is_transient());
        assert!(!Error::TransportUnavailable {
            path: "/dev/ttyS0".into(),
            reason: "missing".into()
        }
        .is_transient());
    }

    #[test]
    fn test_no_response_message_mentions_wiring() {
        assert_eq!(
            Error::NoResponse.to_string(),
            "sensor did not respond, check wiring and power"
        );
    }
}
