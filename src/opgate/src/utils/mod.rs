//! Small deterministic helpers shared by the account and orchestrator modules.

pub mod bytes;
pub mod crypto;
