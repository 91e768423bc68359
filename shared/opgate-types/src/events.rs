//! Observable events.
//!
//! Every state transition returns the events it produced; the orchestrator appends them to the
//! ledger's log in the order they happened.

use alloy_primitives::{Address, Bytes, U256};

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "event", rename_all = "camelCase"))]
pub enum Event {
    Executed {
        target: Address,
        value: U256,
        payload: Bytes,
    },
    SignerAdded {
        identity: Address,
    },
    SignerRemoved {
        identity: Address,
    },
    OperationValidated {
        account: Address,
        sequence: U256,
    },
    SponsorEngaged {
        sponsor: Address,
    },
    GasSponsored {
        account: Address,
        amount: U256,
    },
    AllowanceGranted {
        token: Address,
        sponsor: Address,
        amount: U256,
    },
}
