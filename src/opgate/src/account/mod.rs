//! Per-account state and the validator that guards it.

pub mod install;
pub mod store;
pub mod validator;

pub use store::AccountPolicyStore;
pub use validator::{AccountValidator, CheckedOperation};
