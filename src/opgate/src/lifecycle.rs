//! Per-operation protocol state machine.
//!
//! ```text
//! Submitted -> Validating -> Rejected
//!                         -> Validated -> Executing -> Executed | ExecutionFailed
//! Executed | ExecutionFailed -> Settling -> Settled      (only when a sponsor is engaged)
//! ```

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum OperationState {
    Submitted,
    Validating,
    Validated,
    Rejected,
    Executing,
    Executed,
    ExecutionFailed,
    Settling,
    Settled,
}

impl OperationState {
    pub fn can_transition_to(self, next: OperationState) -> bool {
        use OperationState::*;
        matches!(
            (self, next),
            (Submitted, Validating)
                | (Validating, Validated)
                | (Validating, Rejected)
                | (Validated, Executing)
                | (Executing, Executed)
                | (Executing, ExecutionFailed)
                | (Executed, Settling)
                | (ExecutionFailed, Settling)
                | (Settling, Settled)
        )
    }

    /// No transition leaves a terminal state. Executed and ExecutionFailed are terminal unless a
    /// sponsor still has to settle.
    pub fn is_terminal(self) -> bool {
        matches!(self, OperationState::Rejected | OperationState::Settled)
    }
}

impl fmt::Display for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Ordered trace of the states one operation went through.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Lifecycle {
    states: Vec<OperationState>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            states: vec![OperationState::Submitted],
        }
    }

    pub fn current(&self) -> OperationState {
        *self.states.last().unwrap_or(&OperationState::Submitted)
    }

    pub(crate) fn advance(&mut self, next: OperationState) {
        debug_assert!(
            self.current().can_transition_to(next),
            "illegal transition {} -> {}",
            self.current(),
            next
        );
        self.states.push(next);
    }

    pub fn states(&self) -> &[OperationState] {
        &self.states
    }

    pub fn into_states(self) -> Vec<OperationState> {
        self.states
    }
}
