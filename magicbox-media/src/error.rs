use std::time::Duration;

use magicbox_core::BackendError;
use thiserror::Error;

/// Errors from the external programs and devices this crate drives
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaError {
    /// The program is not on this system
    #[error("'{0}' is not installed")]
    NotInstalled(String),

    /// The program exists but could not be started
    #[error("failed to start '{program}': {reason}")]
    Spawn { program: String, reason: String },

    /// The program did not finish in time and was killed
    #[error("'{program}' did not finish within {after:?}")]
    Timeout { program: String, after: Duration },

    /// The program ran and reported failure
    #[error("'{program}' failed: {status}")]
    Failed { program: String, status: String },

    /// A player exited right after it was started
    #[error("'{program}' exited during start-up: {status}")]
    EarlyExit { program: String, status: String },

    /// cec-client found no CEC adapter
    #[error("no CEC adapter found")]
    NoCecAdapter,

    /// Nothing is playing on the TV
    #[error("no video session is running")]
    NoSession,

    /// mpv IPC socket unreachable or the command was refused
    #[error("player IPC: {0}")]
    Ipc(String),

    /// Tone file could not be written
    #[error("tone file: {0}")]
    Wav(String),

    /// Audio device could not be opened or played to
    #[error("audio device: {0}")]
    Device(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for MediaError {
    fn from(error: std::io::Error) -> Self {
        MediaError::Io(error.to_string())
    }
}

impl From<hound::Error> for MediaError {
    fn from(error: hound::Error) -> Self {
        MediaError::Wav(error.to_string())
    }
}

impl From<MediaError> for BackendError {
    fn from(error: MediaError) -> Self {
        match &error {
            MediaError::Timeout { after, .. } => BackendError::Timeout(*after),
            MediaError::NotInstalled(_)
            | MediaError::Spawn { .. }
            | MediaError::NoCecAdapter
            | MediaError::Wav(_)
            | MediaError::Device(_)
            | MediaError::Io(_) => BackendError::unavailable(error.to_string()),
            MediaError::Failed { .. }
            | MediaError::EarlyExit { .. }
            | MediaError::NoSession
            | MediaError::Ipc(_) => BackendError::rejected(error.to_string()),
        }
    }
}
