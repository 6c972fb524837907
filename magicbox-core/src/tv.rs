//! TV power coordination
//!
//! CEC power-on latency dominates how long a video tag takes to respond, so
//! the coordinator asks the TV for its power state first and skips the power
//! command when the TV is already where we want it.

use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::backend::{PowerStatus, TvBackend};
use crate::outcome::ActionOutcome;

/// Query-before-command power control over a [`TvBackend`]
pub struct TvPowerCoordinator {
    tv: Box<dyn TvBackend>,
    settle_window: Duration,
    settle_poll: Duration,
}

impl TvPowerCoordinator {
    /// How long a TV typically needs after a power command
    pub const DEFAULT_SETTLE_WINDOW: Duration = Duration::from_millis(3500);

    /// Interval between status checks while settling
    pub const DEFAULT_SETTLE_POLL: Duration = Duration::from_millis(500);

    pub fn new(tv: Box<dyn TvBackend>) -> Self {
        Self {
            tv,
            settle_window: Self::DEFAULT_SETTLE_WINDOW,
            settle_poll: Self::DEFAULT_SETTLE_POLL,
        }
    }

    /// Override the settle window. `Duration::ZERO` disables waiting.
    pub fn with_settle_window(mut self, window: Duration) -> Self {
        self.settle_window = window;
        self
    }

    pub fn with_settle_poll(mut self, poll: Duration) -> Self {
        self.settle_poll = poll;
        self
    }

    /// Bring the TV to the requested power state.
    ///
    /// - status already matches: success, no command sent
    /// - status differs: send the command, then wait for the TV to settle
    /// - status query failed or unknown: send the command anyway
    ///
    /// Only an error from the power command itself is a failure.
    pub fn ensure_power(&mut self, target_on: bool) -> ActionOutcome {
        let desired = if target_on {
            PowerStatus::On
        } else {
            PowerStatus::Off
        };

        match self.tv.query_power() {
            Ok(status) if status == desired => {
                debug!(%status, "tv already in requested power state");
                return ActionOutcome::Success;
            }
            Ok(status) => {
                debug!(%status, %desired, "tv power state differs");
            }
            Err(error) => {
                warn!(%error, "tv power query failed, sending power command anyway");
            }
        }

        let result = if target_on {
            self.tv.power_on()
        } else {
            self.tv.power_off()
        };

        if let Err(error) = result {
            warn!(%error, %desired, "tv power command failed");
            return error.into();
        }

        info!(%desired, "tv power command sent");
        self.settle(desired);
        ActionOutcome::Success
    }

    /// Power the TV on and switch its input to this device.
    ///
    /// A failed input switch is logged but does not fail the action: the
    /// player still starts and the user can change input by hand.
    pub fn prepare_for_video(&mut self) -> ActionOutcome {
        let outcome = self.ensure_power(true);
        if !outcome.is_success() {
            return outcome;
        }

        if let Err(error) = self.tv.activate_source() {
            warn!(%error, "failed to switch tv input");
        }

        ActionOutcome::Success
    }

    // Wait until the TV reports `desired` or the window runs out.
    fn settle(&mut self, desired: PowerStatus) {
        if self.settle_window.is_zero() {
            return;
        }

        let deadline = Instant::now() + self.settle_window;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                debug!("tv settle window elapsed");
                return;
            }

            thread::sleep(self.settle_poll.min(remaining));

            if matches!(self.tv.query_power(), Ok(status) if status == desired) {
                debug!(%desired, "tv settled");
                return;
            }
        }
    }
}

impl std::fmt::Debug for TvPowerCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TvPowerCoordinator")
            .field("settle_window", &self.settle_window)
            .field("settle_poll", &self.settle_poll)
            .finish_non_exhaustive()
    }
}
