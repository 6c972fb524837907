//! Sonos speaker adapter for MagicBox
//!
//! Controls a Sonos player directly over UPnP/SOAP on port 1400:
//!
//! ```text
//! SonosSpeaker (SpeakerBackend)
//!     ↓
//! Discovery (SSDP + device description) → Device
//!     ↓
//! SonosClient::execute::<Operation>()
//!     ↓
//! SoapClient (ureq + xmltree)
//! ```
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use magicbox_core::SpeakerBackend;
//! use magicbox_sonos::{Discovery, SonosSpeaker};
//!
//! let discovery = Discovery::new(Duration::from_secs(3))?;
//! let mut speaker = SonosSpeaker::discover(discovery);
//! speaker.play("Living Room", "https://open.spotify.com/album/6wiUBliPe76YAVpNEdidpY", true)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod client;
pub mod discovery;
mod error;
pub mod operation;
pub mod operations;
mod service;
pub mod sharelink;
mod soap;
mod speaker;

pub use client::SonosClient;
pub use discovery::{Device, Discovery};
pub use error::{DiscoveryError, Result, SoapError, SonosError};
pub use operation::UPnPOperation;
pub use service::{Service, ServiceInfo};
pub use sharelink::{MusicService, ShareKind, ShareLink};
pub use soap::{escape_xml, SoapClient, SONOS_PORT};
pub use speaker::{clamp_volume, Locator, SonosSpeaker, VolumePolicy};
