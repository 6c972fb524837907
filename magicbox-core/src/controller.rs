//! Main scan loop
//!
//! `Idle → Classifying → Dispatching → Feedback → Idle`, one tag at a time.
//! Tags presented while a tag is being handled are not queued; the reader
//! only reports a tag once, so a tag still resting on the reader afterwards
//! is ignored until it is lifted and presented again.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::action::classify;
use crate::backend::TagReader;
use crate::dispatcher::Dispatcher;
use crate::error::{BackendError, BackendResult};
use crate::feedback::{FeedbackCategory, FeedbackEmitter};
use crate::outcome::ActionOutcome;
use crate::record::RawRecord;
use crate::state::PlaybackState;

/// Where the loop is in handling a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopState {
    Idle,
    Classifying,
    Dispatching,
    Feedback,
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopState::Idle => write!(f, "idle"),
            LoopState::Classifying => write!(f, "classifying"),
            LoopState::Dispatching => write!(f, "dispatching"),
            LoopState::Feedback => write!(f, "feedback"),
        }
    }
}

/// Loop timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Sleep between polls when no tag is present
    pub poll_interval: Duration,
    /// Sleep after the reader becomes unreachable or stops answering
    pub error_backoff: Duration,
}

impl ControllerConfig {
    /// Sleep before polling again after `error`.
    ///
    /// A rejected exchange, typically a tag lifted mid-read, is retried at
    /// the normal poll interval.
    pub fn backoff(&self, error: &BackendError) -> Duration {
        if error.is_transient() {
            self.error_backoff
        } else {
            self.poll_interval
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            error_backoff: Duration::from_secs(1),
        }
    }
}

/// What one call to [`Controller::poll_once`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollResult {
    /// No new tag
    Empty,
    /// A tag was handled
    Handled(ActionOutcome),
}

/// Ties the reader, dispatcher and feedback emitter together
pub struct Controller {
    reader: Box<dyn TagReader>,
    dispatcher: Dispatcher,
    feedback: FeedbackEmitter,
    state: PlaybackState,
    loop_state: LoopState,
    config: ControllerConfig,
}

impl Controller {
    pub fn new(
        reader: Box<dyn TagReader>,
        dispatcher: Dispatcher,
        feedback: FeedbackEmitter,
        state: PlaybackState,
    ) -> Self {
        Self {
            reader,
            dispatcher,
            feedback,
            state,
            loop_state: LoopState::Idle,
            config: ControllerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ControllerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn loop_state(&self) -> LoopState {
        self.loop_state
    }

    /// Handle one scanned tag: scan tone, classify, dispatch, outcome tone.
    pub fn process_tag(&mut self, records: &[RawRecord]) -> ActionOutcome {
        self.feedback.emit(FeedbackCategory::Scan);

        self.transition(LoopState::Classifying);
        let action = classify(records);
        info!(%action, records = records.len(), "tag scanned");

        self.transition(LoopState::Dispatching);
        let outcome = self.dispatcher.dispatch(&action, &mut self.state);

        self.transition(LoopState::Feedback);
        match &outcome {
            ActionOutcome::Success => info!(%action, "action succeeded"),
            ActionOutcome::Failure(reason) => warn!(%action, %reason, "action failed"),
        }
        self.feedback.emit(outcome.feedback());

        self.transition(LoopState::Idle);
        outcome
    }

    /// Poll the reader once and handle a new tag if there is one
    pub fn poll_once(&mut self) -> BackendResult<PollResult> {
        match self.reader.poll()? {
            Some(records) => Ok(PollResult::Handled(self.process_tag(&records))),
            None => Ok(PollResult::Empty),
        }
    }

    /// Run until `shutdown` is set.
    ///
    /// The flag is checked between iterations, so a tag being handled when
    /// the interrupt arrives is finished first.
    pub fn run(&mut self, shutdown: &AtomicBool) {
        info!(room = self.state.room(), "ready for tags");
        self.feedback.emit(FeedbackCategory::Info);

        while !shutdown.load(Ordering::SeqCst) {
            match self.poll_once() {
                Ok(PollResult::Empty) => thread::sleep(self.config.poll_interval),
                Ok(PollResult::Handled(_)) => {}
                Err(error) => {
                    let backoff = self.config.backoff(&error);
                    warn!(%error, ?backoff, "tag reader error");
                    thread::sleep(backoff);
                }
            }
        }

        info!("shutting down");
        self.feedback.emit(FeedbackCategory::Info);
    }

    fn transition(&mut self, next: LoopState) {
        debug!(from = %self.loop_state, to = %next, "loop state");
        self.loop_state = next;
    }
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("dispatcher", &self.dispatcher)
            .field("feedback", &self.feedback)
            .field("state", &self.state)
            .field("loop_state", &self.loop_state)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
