//! Shared types for the opgate orchestrator.
//!
//! Everything here is plain data: the operation descriptor and its canonical hash, the account
//! call ABI, the event log entries and the error taxonomy. Both the orchestrator core and the
//! off-ledger tooling depend on this crate so the two sides never disagree on a byte layout.

pub mod calls;
pub mod errors;
pub mod events;
pub mod identity;
pub mod operation;

pub use calls::{decode_account_call, AccountCall, Call};
pub use errors::{
    AdminError, ExecutionError, InstallError, RecoveryError, SponsorError, ValidationError,
};
pub use events::Event;
pub use identity::address_from_coordinates;
pub use operation::{OperationBuilder, OperationDescriptor};

/// Minimum authorization length (`r || s || v`).
pub const MIN_SIGNATURE_LEN: usize = 65;

/// Version byte of packed account install data.
pub const INSTALL_DATA_VERSION: u8 = 1;

/// Width of the sponsor identifier prefix inside `sponsor_data`.
pub const SPONSOR_ID_LEN: usize = 20;
