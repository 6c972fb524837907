//! [`TagReader`] backed by a PN532

use std::io::{Read, Write};
use std::time::Duration;

use magicbox_core::{decode_message, BackendResult, RawRecord, TagReader};
use serialport::SerialPort;
use tracing::{debug, info, warn};

use crate::error::Pn532Error;
use crate::pn532::{Pn532, Target};
use crate::type2;

/// Serial ports tried when none is configured
pub const DEFAULT_DEVICES: &[&str] = &["/dev/ttyS0", "/dev/ttyAMA0"];

/// PN532 HSU line speed
pub const BAUD_RATE: u32 = 115_200;

/// Per-read timeout on the serial line
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);

/// Tag reader reporting each tag once per presentation
pub struct Pn532Reader<T> {
    device: Pn532<T>,
    last_uid: Option<Vec<u8>>,
}

impl<T: Read + Write> Pn532Reader<T> {
    /// Wrap an already initialised PN532
    pub fn new(device: Pn532<T>) -> Self {
        Self {
            device,
            last_uid: None,
        }
    }

    fn read_records(&mut self, target: &Target) -> Result<Vec<RawRecord>, Pn532Error> {
        if !target.is_type2() {
            warn!(
                uid = %target.uid_hex(),
                sel_res = target.sel_res,
                "not an NFC Forum Type 2 tag, ignoring its contents"
            );
            return Ok(Vec::new());
        }

        let number = target.number;
        let device = &mut self.device;
        let Some(message) = type2::read_ndef(|page| device.read_block(number, page))? else {
            info!(uid = %target.uid_hex(), "tag carries no NDEF message");
            return Ok(Vec::new());
        };

        match decode_message(&message) {
            Ok(records) => Ok(records),
            Err(error) => {
                warn!(uid = %target.uid_hex(), %error, "unreadable NDEF message");
                Ok(Vec::new())
            }
        }
    }
}

impl Pn532Reader<Box<dyn SerialPort>> {
    /// Open the first port in `paths` that has a PN532 on it
    pub fn open<S: AsRef<str>>(paths: &[S], timeout: Duration) -> Result<Self, Pn532Error> {
        for path in paths {
            let path = path.as_ref();
            match open_port(path, timeout) {
                Ok(device) => {
                    info!(path, "NFC reader connected");
                    return Ok(Self::new(device));
                }
                Err(error) => debug!(path, %error, "no PN532 on port"),
            }
        }

        let tried: Vec<&str> = paths.iter().map(AsRef::as_ref).collect();
        Err(Pn532Error::NoDevice(tried.join(", ")))
    }
}

fn open_port(path: &str, timeout: Duration) -> Result<Pn532<Box<dyn SerialPort>>, Pn532Error> {
    let port = serialport::new(path, BAUD_RATE).timeout(timeout).open()?;
    let mut device = Pn532::new(port);
    device.init()?;
    Ok(device)
}

impl<T> std::fmt::Debug for Pn532Reader<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pn532Reader")
            .field("device", &self.device)
            .field("last_uid", &self.last_uid)
            .finish()
    }
}

impl<T: Read + Write> TagReader for Pn532Reader<T> {
    fn poll(&mut self) -> BackendResult<Option<Vec<RawRecord>>> {
        let Some(target) = self.device.list_passive_target()? else {
            if self.last_uid.take().is_some() {
                debug!("tag removed");
            }
            return Ok(None);
        };

        if self.last_uid.as_deref() == Some(target.uid.as_slice()) {
            return Ok(None);
        }

        let records = self.read_records(&target)?;
        info!(uid = %target.uid_hex(), records = records.len(), "tag scanned");
        self.last_uid = Some(target.uid);
        Ok(Some(records))
    }
}
