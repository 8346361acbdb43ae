//! Dictation state machine.
//!
//! Valid transitions:
//! - Idle -> Listening (recognition session acquired)
//! - Listening -> Idle (result, explicit stop, host end or host error)

use std::fmt;

use crate::error::SpeechError;

/// Operational state of dictation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DictationState {
    /// No recognition session. Ready to start.
    #[default]
    Idle,
    /// A recognition session is open and waiting for an utterance.
    Listening,
}

impl fmt::Display for DictationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DictationState::Idle => write!(f, "Idle"),
            DictationState::Listening => write!(f, "Listening"),
        }
    }
}

impl DictationState {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &DictationState) -> bool {
        matches!(
            (self, target),
            (DictationState::Idle, DictationState::Listening)
                | (DictationState::Listening, DictationState::Idle)
        )
    }
}

/// Validated holder of the current dictation state.
#[derive(Debug, Clone, Default)]
pub struct StateMachine {
    state: DictationState,
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> DictationState {
        self.state
    }

    /// Attempt to transition to the target state.
    pub fn transition(&mut self, target: DictationState) -> Result<(), SpeechError> {
        if self.state.can_transition_to(&target) {
            tracing::debug!("Dictation state: {} -> {}", self.state, target);
            self.state = target;
            Ok(())
        } else {
            Err(SpeechError::InvalidTransition {
                from: self.state,
                to: target,
            })
        }
    }

    /// Force the state back to Idle.
    pub fn reset(&mut self) {
        if self.state != DictationState::Idle {
            tracing::debug!("Dictation state machine reset to Idle from {}", self.state);
        }
        self.state = DictationState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_display() {
        assert_eq!(DictationState::Idle.to_string(), "Idle");
        assert_eq!(DictationState::Listening.to_string(), "Listening");
    }

    #[test]
    fn test_valid_transitions() {
        assert!(DictationState::Idle.can_transition_to(&DictationState::Listening));
        assert!(DictationState::Listening.can_transition_to(&DictationState::Idle));
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(!DictationState::Idle.can_transition_to(&DictationState::Idle));
        assert!(!DictationState::Listening.can_transition_to(&DictationState::Listening));
    }

    #[test]
    fn test_state_machine_round_trip() {
        let mut sm = StateMachine::new();
        assert_eq!(sm.current(), DictationState::Idle);
        sm.transition(DictationState::Listening).unwrap();
        assert_eq!(sm.current(), DictationState::Listening);
        sm.transition(DictationState::Idle).unwrap();
        assert_eq!(sm.current(), DictationState::Idle);
    }

    #[test]
    fn test_state_machine_rejects_double_start() {
        let mut sm = StateMachine::new();
        sm.transition(DictationState::Listening).unwrap();
        match sm.transition(DictationState::Listening) {
            Err(SpeechError::InvalidTransition { from, to }) => {
                assert_eq!(from, DictationState::Listening);
                assert_eq!(to, DictationState::Listening);
            }
            other => panic!("expected InvalidTransition, got {other:?}"),
        }
        assert_eq!(sm.current(), DictationState::Listening);
    }

    #[test]
    fn test_state_machine_reset() {
        let mut sm = StateMachine::new();
        sm.transition(DictationState::Listening).unwrap();
        sm.reset();
        assert_eq!(sm.current(), DictationState::Idle);
        sm.reset();
        assert_eq!(sm.current(), DictationState::Idle);
    }
}
