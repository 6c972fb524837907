//! Capability traits for the external collaborators
//!
//! The controller never talks to hardware or the network directly. Each
//! collaborator is reached through one of these traits so the dispatcher and
//! the main loop can be exercised with in-memory doubles.
//!
//! All calls are blocking and are expected to return within a bounded time;
//! adapters that wrap something which can hang must impose their own timeout
//! and report [`BackendError::Timeout`].

use std::fmt;

use crate::action::ControlCommand;
use crate::error::{BackendError, BackendResult};
use crate::feedback::Tone;
use crate::record::RawRecord;

/// TV power state as reported over CEC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerStatus {
    On,
    Off,
    Unknown,
}

impl fmt::Display for PowerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerStatus::On => write!(f, "on"),
            PowerStatus::Off => write!(f, "standby"),
            PowerStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// Speaker transport state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportState {
    Playing,
    Paused,
    Stopped,
    Transitioning,
    NoMedia,
    Other(String),
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportState::Playing => write!(f, "playing"),
            TransportState::Paused => write!(f, "paused"),
            TransportState::Stopped => write!(f, "stopped"),
            TransportState::Transitioning => write!(f, "transitioning"),
            TransportState::NoMedia => write!(f, "no media"),
            TransportState::Other(raw) => write!(f, "{raw}"),
        }
    }
}

/// Transport commands that are routed to whichever backend is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportCommand {
    Play,
    Next,
    Prev,
}

impl TransportCommand {
    /// The transport command a control tag maps to, if any
    pub fn from_control(command: ControlCommand) -> Option<Self> {
        match command {
            ControlCommand::Play => Some(TransportCommand::Play),
            ControlCommand::Next => Some(TransportCommand::Next),
            ControlCommand::Prev => Some(TransportCommand::Prev),
            _ => None,
        }
    }
}

impl fmt::Display for TransportCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportCommand::Play => write!(f, "play"),
            TransportCommand::Next => write!(f, "next"),
            TransportCommand::Prev => write!(f, "prev"),
        }
    }
}

/// Source of scan events
pub trait TagReader {
    /// Poll the reader once.
    ///
    /// Returns `Ok(None)` when no new tag is present. A tag left resting on the
    /// reader is reported only once, on the poll where it first appears.
    fn poll(&mut self) -> BackendResult<Option<Vec<RawRecord>>>;
}

/// Networked speaker, addressed by logical room name
pub trait SpeakerBackend {
    /// Replace whatever is playing with `uri` and start playback
    fn play(&mut self, room: &str, uri: &str, shuffle: bool) -> BackendResult<()>;

    /// Resume the current queue
    fn resume(&mut self, room: &str) -> BackendResult<()>;

    fn stop(&mut self, room: &str) -> BackendResult<()>;

    fn next(&mut self, room: &str) -> BackendResult<()>;

    fn prev(&mut self, room: &str) -> BackendResult<()>;

    /// Change the volume by `delta` steps and return the new volume
    fn set_volume_delta(&mut self, room: &str, delta: i8) -> BackendResult<u8>;

    fn transport_state(&mut self, room: &str) -> BackendResult<TransportState>;
}

/// Full-screen video player on the TV
pub trait VideoBackend {
    /// Start a player session for `uri`, replacing any running session
    fn start(&mut self, uri: &str) -> BackendResult<()>;

    /// Stop the running session; stopping with nothing running succeeds
    fn stop(&mut self) -> BackendResult<()>;

    /// Transport control of the running session
    fn transport(&mut self, command: TransportCommand) -> BackendResult<()> {
        Err(BackendError::rejected(format!(
            "video player does not support '{command}'"
        )))
    }
}

/// TV power and input control (HDMI-CEC)
pub trait TvBackend {
    fn query_power(&mut self) -> BackendResult<PowerStatus>;

    fn power_on(&mut self) -> BackendResult<()>;

    fn power_off(&mut self) -> BackendResult<()>;

    /// Switch the TV input to this device
    fn activate_source(&mut self) -> BackendResult<()> {
        Ok(())
    }
}

/// Local audio device used for feedback tones
pub trait AudioOutput {
    /// Play the tone and return once it has finished
    fn play_tone(&mut self, tone: &Tone) -> BackendResult<()>;
}
