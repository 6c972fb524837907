//! PN532 normal information frames
//!
//! ```text
//! 00 | 00 FF | LEN | LCS | TFI | PD0 .. PDn | DCS | 00
//! ```
//!
//! `LEN` counts `TFI` plus the data bytes, `LEN + LCS == 0` and
//! `TFI + PD0 + .. + PDn + DCS == 0` (mod 256).

use std::io::{self, Read};

use crate::error::Pn532Error;

/// Frame identifier for host to PN532 frames
pub const HOST_TO_PN532: u8 = 0xD4;
/// Frame identifier for PN532 to host frames
pub const PN532_TO_HOST: u8 = 0xD5;

pub const ACK: [u8; 6] = [0x00, 0x00, 0xFF, 0x00, 0xFF, 0x00];
pub const NACK: [u8; 6] = [0x00, 0x00, 0xFF, 0xFF, 0x00, 0x00];

const ERROR_TFI: u8 = 0x7F;
const MAX_DATA: usize = 254;
// Line noise tolerated before a start code
const MAX_SKIPPED: usize = 64;

/// A frame read from the PN532
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Ack,
    Nack,
    /// `TFI` followed by the packet data
    Data(Vec<u8>),
}

/// Build a normal information frame
pub fn encode(tfi: u8, data: &[u8]) -> Result<Vec<u8>, Pn532Error> {
    if data.len() > MAX_DATA {
        return Err(Pn532Error::Framing(format!(
            "{} data bytes do not fit a normal frame",
            data.len()
        )));
    }

    let len = (data.len() + 1) as u8;
    let sum = data.iter().fold(tfi, |acc, byte| acc.wrapping_add(*byte));

    let mut frame = Vec::with_capacity(data.len() + 8);
    frame.extend_from_slice(&[0x00, 0x00, 0xFF, len, len.wrapping_neg(), tfi]);
    frame.extend_from_slice(data);
    frame.push(sum.wrapping_neg());
    frame.push(0x00);
    Ok(frame)
}

/// Read the next frame, skipping anything before its start code
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Frame, Pn532Error> {
    let mut previous = read_byte(reader)?;
    let mut skipped = 0;
    loop {
        let byte = read_byte(reader)?;
        if previous == 0x00 && byte == 0xFF {
            break;
        }
        skipped += 1;
        if skipped > MAX_SKIPPED {
            return Err(Pn532Error::Framing("no start code".to_string()));
        }
        previous = byte;
    }

    let len = read_byte(reader)?;
    let lcs = read_byte(reader)?;
    match (len, lcs) {
        (0x00, 0xFF) => {
            read_byte(reader)?;
            return Ok(Frame::Ack);
        }
        (0xFF, 0x00) => {
            read_byte(reader)?;
            return Ok(Frame::Nack);
        }
        (0xFF, 0xFF) => {
            return Err(Pn532Error::Framing("extended frames are not supported".to_string()));
        }
        _ => {}
    }
    if len.wrapping_add(lcs) != 0 {
        return Err(Pn532Error::Checksum("length"));
    }

    let mut body = vec![0u8; usize::from(len)];
    read_exact(reader, &mut body)?;
    let dcs = read_byte(reader)?;
    read_byte(reader)?;

    let sum = body.iter().fold(dcs, |acc, byte| acc.wrapping_add(*byte));
    if sum != 0 {
        return Err(Pn532Error::Checksum("data"));
    }
    if body.first() == Some(&ERROR_TFI) {
        return Err(Pn532Error::ApplicationError);
    }

    Ok(Frame::Data(body))
}

fn read_byte<R: Read>(reader: &mut R) -> Result<u8, Pn532Error> {
    let mut byte = [0u8; 1];
    read_exact(reader, &mut byte)?;
    Ok(byte[0])
}

fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<(), Pn532Error> {
    reader.read_exact(buf).map_err(|error| match error.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::UnexpectedEof => {
            Pn532Error::Timeout
        }
        _ => Pn532Error::Io(error.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode_get_firmware_version() {
        assert_eq!(
            encode(HOST_TO_PN532, &[0x02]).unwrap(),
            vec![0x00, 0x00, 0xFF, 0x02, 0xFE, 0xD4, 0x02, 0x2A, 0x00]
        );
    }

    #[test]
    fn test_encode_rejects_oversized_payload() {
        assert!(matches!(
            encode(HOST_TO_PN532, &[0u8; 255]),
            Err(Pn532Error::Framing(_))
        ));
    }

    #[test]
    fn test_read_ack_and_nack() {
        assert_eq!(read_frame(&mut &ACK[..]).unwrap(), Frame::Ack);
        assert_eq!(read_frame(&mut &NACK[..]).unwrap(), Frame::Nack);
    }

    #[test]
    fn test_read_firmware_response() {
        let bytes = [
            0x00, 0x00, 0xFF, 0x06, 0xFA, 0xD5, 0x03, 0x32, 0x01, 0x06, 0x07, 0xE8, 0x00,
        ];
        assert_eq!(
            read_frame(&mut &bytes[..]).unwrap(),
            Frame::Data(vec![0xD5, 0x03, 0x32, 0x01, 0x06, 0x07])
        );
    }

    #[test]
    fn test_skips_leading_noise() {
        let mut bytes = vec![0x55, 0x12, 0x00];
        bytes.extend_from_slice(&ACK);
        assert_eq!(read_frame(&mut bytes.as_slice()).unwrap(), Frame::Ack);
    }

    #[test]
    fn test_error_frame() {
        let bytes = [0x00, 0x00, 0xFF, 0x01, 0xFF, 0x7F, 0x81, 0x00];
        assert_eq!(
            read_frame(&mut &bytes[..]),
            Err(Pn532Error::ApplicationError)
        );
    }

    #[test]
    fn test_bad_checksums() {
        let bad_length = [0x00, 0x00, 0xFF, 0x02, 0xFD, 0xD5, 0x15, 0x16, 0x00];
        assert_eq!(
            read_frame(&mut &bad_length[..]),
            Err(Pn532Error::Checksum("length"))
        );

        let bad_data = [0x00, 0x00, 0xFF, 0x02, 0xFE, 0xD5, 0x15, 0x17, 0x00];
        assert_eq!(
            read_frame(&mut &bad_data[..]),
            Err(Pn532Error::Checksum("data"))
        );
    }

    #[test]
    fn test_truncated_frame_is_timeout() {
        let bytes = [0x00, 0x00, 0xFF, 0x06, 0xFA, 0xD5, 0x03];
        assert_eq!(read_frame(&mut &bytes[..]), Err(Pn532Error::Timeout));
    }

    proptest! {
        #[test]
        fn prop_read_frame_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..128)) {
            let _ = read_frame(&mut bytes.as_slice());
        }

        #[test]
        fn prop_encoded_frames_checksum(data in proptest::collection::vec(any::<u8>(), 0..64)) {
            let frame = encode(HOST_TO_PN532, &data).unwrap();
            prop_assert_eq!(frame[3].wrapping_add(frame[4]), 0);
            let body = &frame[5..frame.len() - 1];
            prop_assert_eq!(body.iter().fold(0u8, |acc, b| acc.wrapping_add(*b)), 0);
        }
    }
}
