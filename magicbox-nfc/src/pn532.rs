//! PN532 command set over a byte transport

use std::io::{Read, Write};

use tracing::{debug, trace};

use crate::error::Pn532Error;
use crate::frame::{self, Frame, HOST_TO_PN532, PN532_TO_HOST};

const GET_FIRMWARE_VERSION: u8 = 0x02;
const SAM_CONFIGURATION: u8 = 0x14;
const RF_CONFIGURATION: u8 = 0x32;
const IN_DATA_EXCHANGE: u8 = 0x40;
const IN_LIST_PASSIVE_TARGET: u8 = 0x4A;

const PN532_IC: u8 = 0x32;
const BAUD_106_TYPE_A: u8 = 0x00;
const MIFARE_READ: u8 = 0x30;
const RF_MAX_RETRIES: u8 = 0x05;

// HSU wake-up: two 0x55 then enough zeros to cover the chip start-up
const WAKE_UP: [u8; 16] = [
    0x55, 0x55, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Firmware identification returned by `GetFirmwareVersion`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Firmware {
    pub ic: u8,
    pub version: u8,
    pub revision: u8,
    pub support: u8,
}

/// An ISO 14443-A target found by `InListPassiveTarget`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Logical target number used for later exchanges
    pub number: u8,
    pub sens_res: u16,
    pub sel_res: u8,
    pub uid: Vec<u8>,
}

impl Target {
    /// NFC Forum Type 2 tags (NTAG, Ultralight) answer `SEL_RES` 0x00
    pub fn is_type2(&self) -> bool {
        self.sel_res == 0x00
    }

    pub fn uid_hex(&self) -> String {
        self.uid.iter().map(|byte| format!("{byte:02X}")).collect()
    }
}

/// A PN532 attached to `port`
pub struct Pn532<T> {
    port: T,
}

impl<T: Read + Write> Pn532<T> {
    pub fn new(port: T) -> Self {
        Self { port }
    }

    /// Wake the chip, check it is a PN532 and configure it for polling
    pub fn init(&mut self) -> Result<Firmware, Pn532Error> {
        self.port
            .write_all(&WAKE_UP)
            .map_err(|e| Pn532Error::Io(e.to_string()))?;
        // normal mode, 1 s virtual card timeout, IRQ pin used
        self.command(SAM_CONFIGURATION, &[0x01, 0x14, 0x01])?;

        let firmware = self.firmware_version()?;
        if firmware.ic != PN532_IC {
            return Err(Pn532Error::UnsupportedChip(firmware.ic));
        }

        // ATR retries 0xFF, PSL retries 1, passive activation retries 2
        self.command(RF_CONFIGURATION, &[RF_MAX_RETRIES, 0xFF, 0x01, 0x02])?;
        debug!(
            version = firmware.version,
            revision = firmware.revision,
            "PN532 ready"
        );
        Ok(firmware)
    }

    pub fn firmware_version(&mut self) -> Result<Firmware, Pn532Error> {
        let data = self.command(GET_FIRMWARE_VERSION, &[])?;
        match data.as_slice() {
            [ic, version, revision, support, ..] => Ok(Firmware {
                ic: *ic,
                version: *version,
                revision: *revision,
                support: *support,
            }),
            _ => Err(Pn532Error::Framing(format!(
                "firmware version has {} bytes",
                data.len()
            ))),
        }
    }

    /// Look for one ISO 14443-A target at 106 kbps
    pub fn list_passive_target(&mut self) -> Result<Option<Target>, Pn532Error> {
        let data = self.command(IN_LIST_PASSIVE_TARGET, &[0x01, BAUD_106_TYPE_A])?;
        match data.as_slice() {
            [0, ..] | [] => Ok(None),
            [_, number, sens_hi, sens_lo, sel_res, uid_len, rest @ ..] => {
                let uid = rest
                    .get(..usize::from(*uid_len))
                    .ok_or_else(|| Pn532Error::Framing("target UID truncated".to_string()))?;
                Ok(Some(Target {
                    number: *number,
                    sens_res: u16::from_be_bytes([*sens_hi, *sens_lo]),
                    sel_res: *sel_res,
                    uid: uid.to_vec(),
                }))
            }
            _ => Err(Pn532Error::Framing("target data truncated".to_string())),
        }
    }

    /// Type 2 `READ`: four pages (16 bytes) starting at `page`
    pub fn read_block(&mut self, target: u8, page: u8) -> Result<[u8; 16], Pn532Error> {
        let data = self.command(IN_DATA_EXCHANGE, &[target, MIFARE_READ, page])?;
        let (status, block) = data
            .split_first()
            .ok_or_else(|| Pn532Error::Framing("empty data exchange response".to_string()))?;
        if status & 0x3F != 0 {
            return Err(Pn532Error::TagStatus(*status));
        }
        block
            .get(..16)
            .and_then(|bytes| <[u8; 16]>::try_from(bytes).ok())
            .ok_or_else(|| Pn532Error::Framing(format!("READ returned {} bytes", block.len())))
    }

    /// Send a command and return the response data after the response code
    pub fn command(&mut self, code: u8, params: &[u8]) -> Result<Vec<u8>, Pn532Error> {
        let mut data = Vec::with_capacity(params.len() + 1);
        data.push(code);
        data.extend_from_slice(params);

        let request = frame::encode(HOST_TO_PN532, &data)?;
        trace!(code, "pn532 command");
        self.port
            .write_all(&request)
            .and_then(|_| self.port.flush())
            .map_err(|e| Pn532Error::Io(e.to_string()))?;

        match frame::read_frame(&mut self.port)? {
            Frame::Ack => {}
            Frame::Nack => return Err(Pn532Error::Nack),
            Frame::Data(_) => {
                return Err(Pn532Error::Framing("expected ACK".to_string()));
            }
        }

        let body = match frame::read_frame(&mut self.port)? {
            Frame::Data(body) => body,
            Frame::Ack | Frame::Nack => {
                return Err(Pn532Error::Framing("expected a response frame".to_string()));
            }
        };

        let expected = code.wrapping_add(1);
        match body.as_slice() {
            [PN532_TO_HOST, got, rest @ ..] if *got == expected => Ok(rest.to_vec()),
            [PN532_TO_HOST, got, ..] => Err(Pn532Error::UnexpectedResponse {
                expected,
                got: *got,
            }),
            _ => Err(Pn532Error::Framing("response frame without PN532 TFI".to_string())),
        }
    }

    pub fn into_inner(self) -> T {
        self.port
    }
}

impl<T> std::fmt::Debug for Pn532<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pn532").finish_non_exhaustive()
    }
}
