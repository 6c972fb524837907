use magicbox_core::BackendError;
use thiserror::Error;

/// Errors from the PN532 and the tags it reads
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Pn532Error {
    /// The serial port could not be opened or configured
    #[error("serial port error: {0}")]
    Serial(String),

    /// Reading from or writing to the port failed
    #[error("I/O error: {0}")]
    Io(String),

    /// The PN532 stopped answering mid-exchange
    #[error("no response from PN532")]
    Timeout,

    /// A frame with a broken length or data checksum
    #[error("bad {0} checksum")]
    Checksum(&'static str),

    /// Bytes on the line that do not form a frame
    #[error("malformed frame: {0}")]
    Framing(String),

    /// The PN532 did not accept the last frame
    #[error("PN532 answered with NACK")]
    Nack,

    /// The PN532 reported a syntax error in the last command
    #[error("PN532 reported an application error")]
    ApplicationError,

    /// A response to a different command than the one sent
    #[error("expected response code 0x{expected:02X}, got 0x{got:02X}")]
    UnexpectedResponse { expected: u8, got: u8 },

    /// The chip answering is not a PN532
    #[error("unsupported chip, IC code 0x{0:02X}")]
    UnsupportedChip(u8),

    /// The tag refused a data exchange
    #[error("tag exchange failed with status 0x{0:02X}")]
    TagStatus(u8),

    /// None of the candidate ports has a PN532 on it
    #[error("no PN532 found on {0}")]
    NoDevice(String),
}

impl From<serialport::Error> for Pn532Error {
    fn from(error: serialport::Error) -> Self {
        Pn532Error::Serial(error.to_string())
    }
}

impl From<Pn532Error> for BackendError {
    fn from(error: Pn532Error) -> Self {
        match &error {
            Pn532Error::Serial(_)
            | Pn532Error::Io(_)
            | Pn532Error::Timeout
            | Pn532Error::NoDevice(_) => BackendError::unavailable(error.to_string()),
            _ => BackendError::rejected(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_mapping() {
        assert!(matches!(
            BackendError::from(Pn532Error::Timeout),
            BackendError::Unavailable(_)
        ));
        assert!(matches!(
            BackendError::from(Pn532Error::NoDevice("/dev/ttyS0".into())),
            BackendError::Unavailable(_)
        ));
        assert!(matches!(
            BackendError::from(Pn532Error::TagStatus(0x01)),
            BackendError::Rejected(_)
        ));
        assert!(matches!(
            BackendError::from(Pn532Error::Checksum("data")),
            BackendError::Rejected(_)
        ));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            Pn532Error::UnexpectedResponse {
                expected: 0x03,
                got: 0x15
            }
            .to_string(),
            "expected response code 0x03, got 0x15"
        );
        assert_eq!(
            Pn532Error::UnsupportedChip(0x07).to_string(),
            "unsupported chip, IC code 0x07"
        );
    }
}
