//! Error taxonomy.
//!
//! One enum per component; every variant is terminal for the descriptor it was raised for.

use alloy_primitives::{Address, B256, U256};
use thiserror::Error;

/// Errors raised by the account validator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("caller {caller} is not the orchestrator")]
    UnauthorizedCaller { caller: Address },
    #[error("no account policy store for {0}")]
    UnknownAccount(Address),
    #[error("invalid sequence: expected {expected}, got {claimed}")]
    InvalidSequence { expected: U256, claimed: U256 },
    #[error("authorization is {len} bytes, below the minimum signature size")]
    MalformedAuthorization { len: usize },
    #[error("authorization does not recover to an authorized signer")]
    UnauthorizedSigner { recovered: Option<Address> },
    #[error("sponsor data is {len} bytes, shorter than a sponsor identifier")]
    MalformedSponsorData { len: usize },
}

/// Errors raised by a sponsor (or by the orchestrator while looking one up).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SponsorError {
    #[error("caller {caller} is not the orchestrator")]
    UnauthorizedCaller { caller: Address },
    #[error("no sponsor registered as {0}")]
    UnknownSponsor(Address),
    #[error("sponsor {sponsor} declined the operation")]
    SponsorDeclined { sponsor: Address },
    #[error("operation {0} was already settled")]
    AlreadySettled(B256),
    #[error("deposit {available} cannot cover {required}")]
    InsufficientDeposit { available: U256, required: U256 },
}

/// Errors raised by the executor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("caller {caller} is not the orchestrator")]
    UnauthorizedCaller { caller: Address },
    #[error("call reverted: {reason}")]
    CallReverted {
        /// Position inside a batch; `None` for a single call.
        index: Option<usize>,
        reason: String,
    },
    #[error("batch lists differ in length ({targets} targets, {values} values, {payloads} payloads)")]
    MalformedBatch {
        targets: usize,
        values: usize,
        payloads: usize,
    },
    #[error("unknown account call selector 0x{}", hex_selector(.0))]
    UnknownSelector([u8; 4]),
    #[error("payload could not be decoded as an account call")]
    MalformedPayload,
}

/// Errors raised by owner-gated account administration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdminError {
    #[error("caller {caller} is not the account owner")]
    UnauthorizedCaller { caller: Address },
    #[error("no account policy store for {0}")]
    UnknownAccount(Address),
    #[error("{0} is already an authorized signer")]
    AlreadySigner(Address),
    #[error("{0} is not an authorized signer")]
    NotASigner(Address),
    #[error("the owner cannot be removed from the signer set")]
    CannotRemoveOwner,
    #[error("the zero identity is not allowed here")]
    ZeroIdentity,
}

/// Errors while decoding account install data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InstallError {
    #[error("install data truncated")]
    Truncated,
    #[error("unsupported install data version {0}")]
    UnsupportedVersion(u8),
    #[error("unexpected trailing bytes in install data")]
    TrailingBytes,
    #[error("the zero identity cannot be an owner or signer")]
    ZeroIdentity,
}

/// Errors while recovering a signer from an authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RecoveryError {
    #[error("signature has the wrong length")]
    InvalidLength,
    #[error("unrecognised recovery id {0}")]
    InvalidRecoveryId(u8),
    #[error("signature does not recover to a public key")]
    InvalidSignature,
}

fn hex_selector(selector: impl AsRef<[u8]>) -> String {
    selector.as_ref().iter().map(|b| format!("{b:02x}")).collect()
}
