//! TV, video and feedback-tone adapters for MagicBox
//!
//! Each adapter drives an external program and exposes one of the
//! `magicbox_core` backend traits:
//!
//! | Adapter         | Trait          | Program            |
//! |-----------------|----------------|--------------------|
//! | [`CecClient`]   | `TvBackend`    | `cec-client`       |
//! | [`PlayerVideo`] | `VideoBackend` | `mpv` (JSON IPC)   |
//! | [`AplayOutput`] | `AudioOutput`  | `aplay`            |
//!
//! With the `rodio` feature, `RodioOutput` plays tones in-process instead.
//!
//! Every program run is bounded: a child that outlives its time budget is
//! killed and reported as a timeout.

pub mod audio;
pub mod cec;
mod error;
mod process;
pub mod video;

pub use audio::{write_wav, AplayOutput};
#[cfg(feature = "rodio")]
pub use audio::RodioOutput;
pub use cec::{parse_power_status, CecClient, CecConfig};
pub use error::MediaError;
pub use video::{PlayerConfig, PlayerVideo};
