//! # MagicBox core - tag-dispatch controller
//!
//! Turns scans of NFC tags into media actions:
//!
//! ```text
//! TagReader ─▶ classify ─▶ Dispatcher ─▶ SpeakerBackend / VideoBackend / TvBackend
//!                              │
//!                              ▼
//!                       FeedbackEmitter ─▶ AudioOutput
//! ```
//!
//! Everything outside this crate is reached through the traits in
//! [`backend`], so the controller runs unchanged against real hardware or
//! in-memory doubles.
//!
//! ```rust,no_run
//! use std::sync::atomic::AtomicBool;
//! use magicbox_core::{Controller, Dispatcher, FeedbackEmitter, PlaybackState, TvPowerCoordinator};
//! # use magicbox_core::backend::*;
//! # fn adapters() -> (Box<dyn TagReader>, Box<dyn SpeakerBackend>, Box<dyn VideoBackend>, Box<dyn TvBackend>) { unimplemented!() }
//!
//! let (reader, speaker, video, tv) = adapters();
//! let dispatcher = Dispatcher::new(speaker, video, TvPowerCoordinator::new(tv));
//! let mut controller = Controller::new(
//!     reader,
//!     dispatcher,
//!     FeedbackEmitter::silent(),
//!     PlaybackState::new("Living Room"),
//! );
//!
//! let shutdown = AtomicBool::new(false);
//! controller.run(&shutdown);
//! ```

pub mod action;
pub mod backend;
pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod feedback;
pub mod ndef;
pub mod outcome;
pub mod record;
pub mod state;
pub mod tv;

pub use action::{classify, Action, ControlCommand, MediaKind};
pub use backend::{
    AudioOutput, PowerStatus, SpeakerBackend, TagReader, TransportCommand, TransportState,
    TvBackend, VideoBackend,
};
pub use controller::{Controller, ControllerConfig, LoopState, PollResult};
pub use dispatcher::{DispatchConfig, Dispatcher};
pub use error::{BackendError, BackendResult};
pub use feedback::{FeedbackCategory, FeedbackEmitter, Tone};
pub use ndef::{decode_message, NdefError};
pub use outcome::{ActionOutcome, FailureReason};
pub use record::{RawRecord, RecordKind};
pub use state::{ActiveTarget, PlaybackState};
pub use tv::TvPowerCoordinator;
