//! Playback state tracking
//!
//! Control tags carry no target, so the controller remembers which backend
//! last took over playback. The state is owned by the main loop and passed to
//! the dispatcher by `&mut`; the dispatcher is its only writer.

use std::fmt;

use tracing::debug;

/// Backend currently in control of universal transport commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActiveTarget {
    Audio,
    Video,
}

impl fmt::Display for ActiveTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActiveTarget::Audio => write!(f, "audio"),
            ActiveTarget::Video => write!(f, "video"),
        }
    }
}

/// Process-wide playback state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackState {
    active_target: Option<ActiveTarget>,
    room: String,
}

impl PlaybackState {
    /// Create the state for the configured speaker room. Nothing is active.
    pub fn new(room: impl Into<String>) -> Self {
        Self {
            active_target: None,
            room: room.into(),
        }
    }

    /// The logical speaker target; fixed for the life of the process
    pub fn room(&self) -> &str {
        &self.room
    }

    pub fn active_target(&self) -> Option<ActiveTarget> {
        self.active_target
    }

    pub fn is_active(&self, target: ActiveTarget) -> bool {
        self.active_target == Some(target)
    }

    pub(crate) fn set_active_target(&mut self, target: Option<ActiveTarget>) {
        if self.active_target != target {
            debug!(
                from = ?self.active_target,
                to = ?target,
                "active target changed"
            );
        }
        self.active_target = target;
    }
}
