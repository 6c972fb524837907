//! PN532 NFC reader for MagicBox
//!
//! Drives a PN532 over its high-speed UART (HSU) interface and turns NFC
//! Forum Type 2 tags (NTAG21x, Ultralight) into [`RawRecord`](magicbox_core::RawRecord)s:
//!
//! ```text
//! Pn532Reader (TagReader)
//!     ↓ InListPassiveTarget, InDataExchange READ
//! Pn532 command layer
//!     ↓ normal information frames, ACK/NACK
//! serial port (115 200 baud)
//! ```
//!
//! A tag left on the reader is reported once; it has to be removed before it
//! is reported again.
//!
//! ```rust,no_run
//! use magicbox_core::TagReader;
//! use magicbox_nfc::{Pn532Reader, DEFAULT_DEVICES, DEFAULT_TIMEOUT};
//!
//! let mut reader = Pn532Reader::open(DEFAULT_DEVICES, DEFAULT_TIMEOUT)?;
//! if let Some(records) = reader.poll()? {
//!     println!("{} records", records.len());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
pub mod frame;
mod pn532;
mod reader;
pub mod type2;

pub use error::Pn532Error;
pub use pn532::{Firmware, Pn532, Target};
pub use reader::{Pn532Reader, BAUD_RATE, DEFAULT_DEVICES, DEFAULT_TIMEOUT};
