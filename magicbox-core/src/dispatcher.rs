//! Action dispatch
//!
//! Maps a classified [`Action`] onto exactly one backend, keeping audio and
//! video mutually exclusive and tracking which of them owns the universal
//! transport commands.

use tracing::{info, warn};

use crate::action::{Action, ControlCommand, MediaKind};
use crate::backend::{SpeakerBackend, TransportCommand, VideoBackend};
use crate::error::BackendResult;
use crate::outcome::{ActionOutcome, FailureReason};
use crate::state::{ActiveTarget, PlaybackState};
use crate::tv::TvPowerCoordinator;

/// Dispatcher tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Volume change applied by one `vol_up` / `vol_down` tag
    pub volume_step: u8,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self { volume_step: 5 }
    }
}

/// Executes actions against the speaker, video player and TV
pub struct Dispatcher {
    speaker: Box<dyn SpeakerBackend>,
    video: Box<dyn VideoBackend>,
    tv: TvPowerCoordinator,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(
        speaker: Box<dyn SpeakerBackend>,
        video: Box<dyn VideoBackend>,
        tv: TvPowerCoordinator,
    ) -> Self {
        Self {
            speaker,
            video,
            tv,
            config: DispatchConfig::default(),
        }
    }

    pub fn with_config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Execute `action`, updating `state` on success.
    ///
    /// Backend errors never escape; they come back as
    /// [`ActionOutcome::Failure`].
    pub fn dispatch(&mut self, action: &Action, state: &mut PlaybackState) -> ActionOutcome {
        match action {
            Action::PlayMedia {
                uri,
                kind: MediaKind::Audio,
                display_name,
                shuffle,
            } => self.play_audio(uri, display_name.as_deref(), *shuffle, state),
            Action::PlayMedia {
                uri,
                kind: MediaKind::Video,
                display_name,
                ..
            } => self.play_video(uri, display_name.as_deref(), state),
            Action::Control { command } => self.control(*command, state),
            Action::Unrecognized => FailureReason::Unrecognized.into(),
        }
    }

    fn play_audio(
        &mut self,
        uri: &str,
        display_name: Option<&str>,
        shuffle: bool,
        state: &mut PlaybackState,
    ) -> ActionOutcome {
        if state.is_active(ActiveTarget::Video) {
            if let Err(error) = self.video.stop() {
                warn!(%error, "failed to stop video before playing music");
                return error.into();
            }
            state.set_active_target(None);
        }

        let title = display_name.unwrap_or("music from tag");
        match self.speaker.play(state.room(), uri, shuffle) {
            Ok(()) => {
                info!(room = state.room(), uri, shuffle, "playing {title}");
                state.set_active_target(Some(ActiveTarget::Audio));
                ActionOutcome::Success
            }
            Err(error) => {
                warn!(room = state.room(), uri, %error, "failed to play {title}");
                error.into()
            }
        }
    }

    fn play_video(
        &mut self,
        uri: &str,
        display_name: Option<&str>,
        state: &mut PlaybackState,
    ) -> ActionOutcome {
        let outcome = self.tv.prepare_for_video();
        if !outcome.is_success() {
            return outcome;
        }

        if state.is_active(ActiveTarget::Audio) {
            if let Err(error) = self.speaker.stop(state.room()) {
                warn!(room = state.room(), %error, "failed to stop music before video");
                return error.into();
            }
            state.set_active_target(None);
        }

        let title = display_name.unwrap_or("video from tag");
        match self.video.start(uri) {
            Ok(()) => {
                info!(uri, "showing {title}");
                state.set_active_target(Some(ActiveTarget::Video));
                ActionOutcome::Success
            }
            Err(error) => {
                warn!(uri, %error, "failed to start {title}");
                error.into()
            }
        }
    }

    fn control(&mut self, command: ControlCommand, state: &mut PlaybackState) -> ActionOutcome {
        match command {
            ControlCommand::VolUp | ControlCommand::VolDown => self.adjust_volume(command, state),
            ControlCommand::TvOn => self.tv.ensure_power(true),
            ControlCommand::TvOff => self.tv.ensure_power(false),
            ControlCommand::Stop => self.stop(state),
            ControlCommand::Play | ControlCommand::Next | ControlCommand::Prev => {
                self.transport(command, state)
            }
        }
    }

    // Volume always goes to the speaker, whatever is active.
    fn adjust_volume(&mut self, command: ControlCommand, state: &PlaybackState) -> ActionOutcome {
        let step = i8::try_from(self.config.volume_step).unwrap_or(i8::MAX);
        let delta = if command == ControlCommand::VolUp {
            step
        } else {
            -step
        };

        match self.speaker.set_volume_delta(state.room(), delta) {
            Ok(volume) => {
                info!(room = state.room(), volume, "volume {command}");
                ActionOutcome::Success
            }
            Err(error) => {
                warn!(room = state.room(), %error, "failed to change volume");
                error.into()
            }
        }
    }

    fn stop(&mut self, state: &mut PlaybackState) -> ActionOutcome {
        let result = match state.active_target() {
            None => return FailureReason::NoActiveTarget(ControlCommand::Stop).into(),
            Some(ActiveTarget::Audio) => self.speaker.stop(state.room()),
            Some(ActiveTarget::Video) => self.video.stop(),
        };

        match result {
            Ok(()) => {
                info!(active = ?state.active_target(), "stopped");
                state.set_active_target(None);
                ActionOutcome::Success
            }
            Err(error) => {
                warn!(active = ?state.active_target(), %error, "failed to stop");
                error.into()
            }
        }
    }

    // With nothing active the speaker owns transport, so a `play` tag can
    // resume music after a `stop`.
    fn transport(&mut self, command: ControlCommand, state: &mut PlaybackState) -> ActionOutcome {
        let Some(transport) = TransportCommand::from_control(command) else {
            return FailureReason::NoActiveTarget(command).into();
        };

        let result: BackendResult<()> = match state.active_target() {
            None | Some(ActiveTarget::Audio) => {
                let room = state.room();
                match transport {
                    TransportCommand::Play => self.speaker.resume(room),
                    TransportCommand::Next => self.speaker.next(room),
                    TransportCommand::Prev => self.speaker.prev(room),
                }
            }
            Some(ActiveTarget::Video) => self.video.transport(transport),
        };

        match result {
            Ok(()) => {
                if state.active_target().is_none() {
                    state.set_active_target(Some(ActiveTarget::Audio));
                }
                info!(active = ?state.active_target(), "{command}");
                ActionOutcome::Success
            }
            Err(error) => {
                warn!(active = ?state.active_target(), %error, "failed to {command}");
                error.into()
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("tv", &self.tv)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
