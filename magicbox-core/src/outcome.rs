//! Outcome of executing an action

use std::fmt;

use crate::action::ControlCommand;
use crate::error::BackendError;
use crate::feedback::FeedbackCategory;

/// Why an action did not succeed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The tag classified as [`Action::Unrecognized`](crate::Action::Unrecognized)
    Unrecognized,
    /// A transport command arrived while nothing was playing
    NoActiveTarget(ControlCommand),
    /// A backend adapter failed
    Backend(BackendError),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Unrecognized => write!(f, "unrecognized tag"),
            FailureReason::NoActiveTarget(command) => {
                write!(f, "nothing is playing, '{command}' has no target")
            }
            FailureReason::Backend(error) => write!(f, "{error}"),
        }
    }
}

/// Result of dispatching one action. Only used to pick a feedback tone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Success,
    Failure(FailureReason),
}

impl ActionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ActionOutcome::Success)
    }

    /// Tone to play for this outcome
    pub fn feedback(&self) -> FeedbackCategory {
        match self {
            ActionOutcome::Success => FeedbackCategory::Success,
            ActionOutcome::Failure(_) => FeedbackCategory::Failure,
        }
    }
}

impl From<BackendError> for ActionOutcome {
    fn from(error: BackendError) -> Self {
        ActionOutcome::Failure(FailureReason::Backend(error))
    }
}

impl From<FailureReason> for ActionOutcome {
    fn from(reason: FailureReason) -> Self {
        ActionOutcome::Failure(reason)
    }
}

impl fmt::Display for ActionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionOutcome::Success => write!(f, "success"),
            ActionOutcome::Failure(reason) => write!(f, "failure: {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feedback_mapping() {
        assert_eq!(ActionOutcome::Success.feedback(), FeedbackCategory::Success);
        assert_eq!(
            ActionOutcome::Failure(FailureReason::Unrecognized).feedback(),
            FeedbackCategory::Failure
        );
    }

    #[test]
    fn test_from_backend_error() {
        let outcome = ActionOutcome::from(BackendError::rejected("no such room"));
        assert!(!outcome.is_success());
        assert_eq!(
            outcome.to_string(),
            "failure: backend rejected the request: no such room"
        );
    }

    #[test]
    fn test_failure_reason_display() {
        assert_eq!(FailureReason::Unrecognized.to_string(), "unrecognized tag");
        assert_eq!(
            FailureReason::NoActiveTarget(ControlCommand::Stop).to_string(),
            "nothing is playing, 'stop' has no target"
        );
    }
}
