//! Pluggable sponsorship policies.
//!
//! A policy's `covers` is a pure predicate over the descriptor and the required prefund. The
//! settlement hook runs after the sponsor wrapper has checked the caller and replay state.

use std::{collections::BTreeSet, fmt};

use alloy_primitives::{Address, U256};
use opgate_types::{OperationDescriptor, SponsorError};

use crate::sponsor::SettlementContext;

pub trait SponsorPolicy: fmt::Debug {
    fn name(&self) -> &'static str;

    /// Will this sponsor pay for `op`, given the worst-case cost?
    fn covers(&self, op: &OperationDescriptor, required_prefund: U256) -> bool;

    /// Reconcile the real cost against the sponsor's funding.
    fn on_settle(&mut self, _actual_cost: U256, _ctx: &SettlementContext) -> Result<(), SponsorError> {
        Ok(())
    }

    /// Funds still available, for policies that track them.
    fn remaining_funds(&self) -> Option<U256> {
        None
    }
}

/// Sponsors everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct AcceptAll;

impl SponsorPolicy for AcceptAll {
    fn name(&self) -> &'static str {
        "accept-all"
    }

    fn covers(&self, _op: &OperationDescriptor, _required_prefund: U256) -> bool {
        true
    }
}

/// Sponsors only the listed accounts.
#[derive(Clone, Debug, Default)]
pub struct AllowList {
    accounts: BTreeSet<Address>,
}

impl AllowList {
    pub fn new(accounts: impl IntoIterator<Item = Address>) -> Self {
        Self {
            accounts: accounts.into_iter().collect(),
        }
    }
}

impl SponsorPolicy for AllowList {
    fn name(&self) -> &'static str {
        "allow-list"
    }

    fn covers(&self, op: &OperationDescriptor, _required_prefund: U256) -> bool {
        self.accounts.contains(&op.account())
    }
}

/// Sponsors while its deposit covers the worst case; settlement debits the real cost.
#[derive(Clone, Debug, Default)]
pub struct DepositThreshold {
    deposit: U256,
}

impl DepositThreshold {
    pub fn new(deposit: U256) -> Self {
        Self { deposit }
    }

    pub fn deposit(&self) -> U256 {
        self.deposit
    }
}

impl SponsorPolicy for DepositThreshold {
    fn name(&self) -> &'static str {
        "deposit-threshold"
    }

    fn covers(&self, _op: &OperationDescriptor, required_prefund: U256) -> bool {
        self.deposit >= required_prefund
    }

    fn on_settle(&mut self, actual_cost: U256, _ctx: &SettlementContext) -> Result<(), SponsorError> {
        self.deposit = self
            .deposit
            .checked_sub(actual_cost)
            .ok_or(SponsorError::InsufficientDeposit {
                available: self.deposit,
                required: actual_cost,
            })?;
        Ok(())
    }

    fn remaining_funds(&self) -> Option<U256> {
        Some(self.deposit)
    }
}
