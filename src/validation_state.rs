//! Validation State Machine (spec §4.4): a pure transition function over
//! `{NOT_STARTED, IN_PROGRESS, PARTIAL_PASS, PASSED, FAILED}`, driven by
//! severity counts rather than by re-inspecting individual messages.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationState {
    NotStarted,
    InProgress,
    PartialPass,
    Passed,
    Failed,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationCounts {
    pub info: u32,
    pub warning: u32,
    pub error: u32,
    pub fatal: u32,
}

impl ValidationCounts {
    pub fn has_blocking_errors(&self) -> bool {
        self.error > 0 || self.fatal > 0
    }

    pub fn has_warnings(&self) -> bool {
        self.warning > 0
    }

    pub fn is_clean(&self) -> bool {
        self.warning == 0 && self.error == 0 && self.fatal == 0
    }
}

/// Advances `current` given the latest `counts`. `override_approved` only
/// matters from `PartialPass`, where a reviewer override is the sole way
/// out besides re-running validation (spec §4.4, Open Question resolved:
/// the override is recorded as a `ValidationOverride` change-request event
/// by the caller, not by this function).
pub fn transition(current: ValidationState, counts: ValidationCounts, override_approved: bool) -> ValidationState {
    match current {
        ValidationState::NotStarted => ValidationState::InProgress,
        ValidationState::InProgress => {
            if counts.has_blocking_errors() {
                ValidationState::Failed
            } else if counts.has_warnings() {
                ValidationState::PartialPass
            } else {
                ValidationState::Passed
            }
        }
        ValidationState::PartialPass => {
            if override_approved {
                ValidationState::Passed
            } else {
                ValidationState::PartialPass
            }
        }
        other => other,
    }
}

/// Whether the workflow may advance to its next stage from `state`. Both
/// `PartialPass` and `Passed` may proceed; `PartialPass` still requires a
/// reviewer to see it, which the caller surfaces separately.
pub fn can_proceed_to_next_stage(state: ValidationState) -> bool {
    matches!(state, ValidationState::PartialPass | ValidationState::Passed)
}

pub fn can_merge(state: ValidationState) -> bool {
    state == ValidationState::Passed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_started_always_advances_to_in_progress() {
        let counts = ValidationCounts::default();
        assert_eq!(transition(ValidationState::NotStarted, counts, false), ValidationState::InProgress);
    }

    #[test]
    fn in_progress_routes_by_severity() {
        let clean = ValidationCounts::default();
        assert_eq!(transition(ValidationState::InProgress, clean, false), ValidationState::Passed);

        let warned = ValidationCounts { warning: 1, ..Default::default() };
        assert_eq!(transition(ValidationState::InProgress, warned, false), ValidationState::PartialPass);

        let failed = ValidationCounts { error: 1, ..Default::default() };
        assert_eq!(transition(ValidationState::InProgress, failed, false), ValidationState::Failed);

        let fatal = ValidationCounts { fatal: 1, ..Default::default() };
        assert_eq!(transition(ValidationState::InProgress, fatal, false), ValidationState::Failed);
    }

    #[test]
    fn partial_pass_only_advances_on_override() {
        let warned = ValidationCounts { warning: 1, ..Default::default() };
        assert_eq!(transition(ValidationState::PartialPass, warned, false), ValidationState::PartialPass);
        assert_eq!(transition(ValidationState::PartialPass, warned, true), ValidationState::Passed);
    }

    #[test]
    fn terminal_states_are_idempotent() {
        let counts = ValidationCounts::default();
        assert_eq!(transition(ValidationState::Passed, counts, false), ValidationState::Passed);
        assert_eq!(transition(ValidationState::Failed, counts, true), ValidationState::Failed);
    }

    #[test]
    fn can_proceed_excludes_failed_and_not_started() {
        assert!(!can_proceed_to_next_stage(ValidationState::NotStarted));
        assert!(!can_proceed_to_next_stage(ValidationState::InProgress));
        assert!(!can_proceed_to_next_stage(ValidationState::Failed));
        assert!(can_proceed_to_next_stage(ValidationState::PartialPass));
        assert!(can_proceed_to_next_stage(ValidationState::Passed));
    }

    #[test]
    fn only_passed_permits_automatic_merge() {
        assert!(can_merge(ValidationState::Passed));
        assert!(!can_merge(ValidationState::PartialPass));
    }
}
