//! Discriminated per-operation results.

use alloy_primitives::{Address, B256, U256};
use opgate_types::{Event, ExecutionError, SponsorError, ValidationError};

use crate::lifecycle::OperationState;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Settlement {
    NotSponsored,
    Settled { sponsor: Address, amount: U256 },
    Failed { sponsor: Address, error: SponsorError },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OperationOutcome {
    /// Validated and every requested call committed.
    Executed {
        actual_cost: U256,
        settlement: Settlement,
    },
    /// Validated, but execution failed and left no effects.
    ExecutionFailed {
        error: ExecutionError,
        actual_cost: U256,
        settlement: Settlement,
    },
    /// Stopped by the account validator.
    Rejected(ValidationError),
    /// Account validation passed but the named sponsor would not (or could not) pay.
    SponsorRejected(SponsorError),
}

impl OperationOutcome {
    pub fn is_executed(&self) -> bool {
        matches!(self, OperationOutcome::Executed { .. })
    }

    pub fn settlement(&self) -> Option<&Settlement> {
        match self {
            OperationOutcome::Executed { settlement, .. }
            | OperationOutcome::ExecutionFailed { settlement, .. } => Some(settlement),
            _ => None,
        }
    }

    /// Short label for logs and reports.
    pub fn kind(&self) -> &'static str {
        match self {
            OperationOutcome::Executed { .. } => "executed",
            OperationOutcome::ExecutionFailed { .. } => "execution-failed",
            OperationOutcome::Rejected(_) => "rejected",
            OperationOutcome::SponsorRejected(_) => "sponsor-rejected",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperationReceipt {
    pub operation_hash: B256,
    pub account: Address,
    pub sequence: U256,
    pub outcome: OperationOutcome,
    pub states: Vec<OperationState>,
    /// Events emitted for this operation, in order. Also appended to the ledger log.
    pub events: Vec<Event>,
}
