//! NDEF message decoding
//!
//! Turns the raw bytes of an NDEF message (the value of an NDEF TLV on a tag)
//! into [`RawRecord`]s. Only the two record types the controller understands
//! are surfaced:
//!
//! - well-known `U` records and absolute-URI records become `uri` records
//! - well-known `T` records become `text` records
//!
//! Every other record (MIME, external, smart posters, empty) is skipped so that
//! tags carrying extra data still classify.

use thiserror::Error;

use crate::record::RawRecord;

const FLAG_MB: u8 = 0x80;
const FLAG_ME: u8 = 0x40;
const FLAG_CF: u8 = 0x20;
const FLAG_SR: u8 = 0x10;
const FLAG_IL: u8 = 0x08;
const TNF_MASK: u8 = 0x07;

const TNF_WELL_KNOWN: u8 = 0x01;
const TNF_ABSOLUTE_URI: u8 = 0x03;

/// URI identifier codes from the NFC Forum URI record type definition.
/// Codes past the end of the table are reserved and mean "no prefix".
const URI_PREFIXES: [&str; 36] = [
    "",
    "http://www.",
    "https://www.",
    "http://",
    "https://",
    "tel:",
    "mailto:",
    "ftp://anonymous:anonymous@",
    "ftp://ftp.",
    "ftps://",
    "sftp://",
    "smb://",
    "nfs://",
    "ftp://",
    "dav://",
    "news:",
    "telnet://",
    "imap:",
    "rtsp://",
    "urn:",
    "pop:",
    "sip:",
    "sips:",
    "tftp:",
    "btspp://",
    "btl2cap://",
    "btgoep://",
    "tcpobex://",
    "irdaobex://",
    "file://",
    "urn:epc:id:",
    "urn:epc:tag:",
    "urn:epc:pat:",
    "urn:epc:raw:",
    "urn:epc:",
    "urn:nfc:",
];

/// Errors raised while decoding an NDEF message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NdefError {
    /// The message ended in the middle of a record
    #[error("NDEF message truncated at byte {offset}")]
    Truncated { offset: usize },

    /// The first record did not carry the message-begin flag
    #[error("NDEF message does not start with a message-begin record")]
    MissingMessageBegin,

    /// Chunked records are not used by the tags this controller reads
    #[error("chunked NDEF records are not supported")]
    Chunked,

    /// A record payload could not be decoded as text
    #[error("record payload is not valid {encoding}")]
    Encoding { encoding: &'static str },
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn byte(&mut self) -> Result<u8, NdefError> {
        let value = *self
            .bytes
            .get(self.pos)
            .ok_or(NdefError::Truncated { offset: self.pos })?;
        self.pos += 1;
        Ok(value)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], NdefError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or(NdefError::Truncated { offset: self.pos })?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }
}

/// Decode an NDEF message into the records the classifier understands.
///
/// An empty message decodes to an empty list. Decoding stops at the first
/// record carrying the message-end flag; trailing bytes are ignored.
pub fn decode_message(bytes: &[u8]) -> Result<Vec<RawRecord>, NdefError> {
    let mut cursor = Cursor::new(bytes);
    let mut records = Vec::new();
    let mut first = true;

    while !cursor.is_empty() {
        let header = cursor.byte()?;
        if first && header & FLAG_MB == 0 {
            return Err(NdefError::MissingMessageBegin);
        }
        first = false;

        if header & FLAG_CF != 0 {
            return Err(NdefError::Chunked);
        }

        let type_len = cursor.byte()? as usize;
        let payload_len = if header & FLAG_SR != 0 {
            cursor.byte()? as usize
        } else {
            let raw = cursor.take(4)?;
            u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize
        };
        let id_len = if header & FLAG_IL != 0 {
            cursor.byte()? as usize
        } else {
            0
        };

        let record_type = cursor.take(type_len)?;
        cursor.take(id_len)?;
        let payload = cursor.take(payload_len)?;

        if let Some(record) = decode_record(header & TNF_MASK, record_type, payload)? {
            records.push(record);
        }

        if header & FLAG_ME != 0 {
            break;
        }
    }

    Ok(records)
}

fn decode_record(
    tnf: u8,
    record_type: &[u8],
    payload: &[u8],
) -> Result<Option<RawRecord>, NdefError> {
    match (tnf, record_type) {
        (TNF_WELL_KNOWN, b"U") => decode_uri(payload).map(Some),
        (TNF_WELL_KNOWN, b"T") => decode_text(payload).map(Some),
        (TNF_ABSOLUTE_URI, uri) if !uri.is_empty() => {
            let uri = std::str::from_utf8(uri).map_err(|_| NdefError::Encoding {
                encoding: "UTF-8",
            })?;
            Ok(Some(RawRecord::uri(uri)))
        }
        _ => Ok(None),
    }
}

fn decode_uri(payload: &[u8]) -> Result<RawRecord, NdefError> {
    let (&code, rest) = payload
        .split_first()
        .ok_or(NdefError::Truncated { offset: 0 })?;
    let prefix = URI_PREFIXES.get(code as usize).copied().unwrap_or("");
    let rest = std::str::from_utf8(rest).map_err(|_| NdefError::Encoding { encoding: "UTF-8" })?;
    Ok(RawRecord::uri(format!("{prefix}{rest}")))
}

fn decode_text(payload: &[u8]) -> Result<RawRecord, NdefError> {
    let (&status, rest) = payload
        .split_first()
        .ok_or(NdefError::Truncated { offset: 0 })?;
    let lang_len = (status & 0x3F) as usize;
    let text = rest
        .get(lang_len..)
        .ok_or(NdefError::Truncated { offset: 1 + rest.len() })?;

    let decoded = if status & 0x80 != 0 {
        decode_utf16(text)?
    } else {
        std::str::from_utf8(text)
            .map_err(|_| NdefError::Encoding { encoding: "UTF-8" })?
            .to_string()
    };

    Ok(RawRecord::text(decoded))
}

// UTF-16 text defaults to big endian unless a byte order mark says otherwise.
fn decode_utf16(bytes: &[u8]) -> Result<String, NdefError> {
    if bytes.len() % 2 != 0 {
        return Err(NdefError::Encoding { encoding: "UTF-16" });
    }

    let (little_endian, body) = match bytes {
        [0xFF, 0xFE, rest @ ..] => (true, rest),
        [0xFE, 0xFF, rest @ ..] => (false, rest),
        _ => (false, bytes),
    };

    let units: Vec<u16> = body
        .chunks_exact(2)
        .map(|pair| {
            if little_endian {
                u16::from_le_bytes([pair[0], pair[1]])
            } else {
                u16::from_be_bytes([pair[0], pair[1]])
            }
        })
        .collect();

    String::from_utf16(&units).map_err(|_| NdefError::Encoding { encoding: "UTF-16" })
}
