//! Orchestrator core for signed, sponsor-aware delegated operations.
//!
//! A requester submits an [`OperationDescriptor`]; the [`Orchestrator`] validates it against the
//! target account's [`AccountPolicyStore`], asks the named [`Sponsor`] (if any) whether it will
//! cover the cost, runs the requested calls through the [`Executor`] and finally settles the real
//! cost with the sponsor.
//!
//! Privileged entry points (validator, executor, sponsor hooks) take the caller identity as their
//! first argument and reject anyone but the orchestrator before doing anything else. Account
//! administration is gated to the account owner and does not go through the orchestrator.

pub mod account;
pub mod config;
pub mod executor;
pub mod host;
pub mod ledger;
pub mod lifecycle;
pub mod orchestrator;
pub mod outcome;
pub mod sponsor;
pub mod utils;


pub use account::{AccountPolicyStore, AccountValidator, CheckedOperation};
pub use config::{OrchestratorConfig, SequencePolicy};
pub use executor::{Execution, Executor};
pub use host::{memory::InMemoryHost, CallHost, CallReceipt};
pub use ledger::{EventLog, Ledger};
pub use lifecycle::{Lifecycle, OperationState};
pub use orchestrator::Orchestrator;
pub use outcome::{OperationOutcome, OperationReceipt, Settlement};
pub use sponsor::{
    policy::{AcceptAll, AllowList, DepositThreshold, SponsorPolicy},
    SettlementContext, Sponsor, SponsorLedger,
};
pub use utils::crypto::{EcdsaRecovery, SignatureVerifier};

pub use opgate_types::{
    AdminError, Event, ExecutionError, InstallError, OperationDescriptor, RecoveryError,
    SponsorError, ValidationError,
};
