//! Sponsor: a third party that may pay for an operation, and its accounting.

pub mod policy;

use std::collections::{BTreeMap, BTreeSet};

use alloy_primitives::{Address, Bytes, B256, U256};
use opgate_types::{Event, OperationDescriptor, SponsorError};
use tracing::{debug, info};

use crate::sponsor::policy::SponsorPolicy;

/// What the orchestrator hands a sponsor at settlement time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SettlementContext {
    pub account: Address,
    pub operation_hash: B256,
    pub sequence: U256,
    pub execution_succeeded: bool,
    /// Sponsor-specific bytes after the identifier prefix.
    pub aux: Bytes,
}

/// Accounting events recorded by settlement.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SponsorLedger {
    total_sponsored: U256,
    per_account: BTreeMap<Address, U256>,
    settled: BTreeSet<B256>,
}

impl SponsorLedger {
    pub fn total_sponsored(&self) -> U256 {
        self.total_sponsored
    }

    pub fn sponsored_for(&self, account: &Address) -> U256 {
        self.per_account.get(account).copied().unwrap_or_default()
    }

    pub fn is_settled(&self, operation_hash: &B256) -> bool {
        self.settled.contains(operation_hash)
    }

    pub fn settlements(&self) -> usize {
        self.settled.len()
    }

    fn record(&mut self, account: Address, operation_hash: B256, amount: U256) {
        self.total_sponsored = self.total_sponsored.saturating_add(amount);
        let entry = self.per_account.entry(account).or_default();
        *entry = entry.saturating_add(amount);
        self.settled.insert(operation_hash);
    }
}

#[derive(Debug)]
pub struct Sponsor {
    address: Address,
    owner: Address,
    orchestrator: Address,
    policy: Box<dyn SponsorPolicy>,
    ledger: SponsorLedger,
}

impl Sponsor {
    pub fn new(
        address: Address,
        owner: Address,
        orchestrator: Address,
        policy: impl SponsorPolicy + 'static,
    ) -> Self {
        Self {
            address,
            owner,
            orchestrator,
            policy: Box::new(policy),
            ledger: SponsorLedger::default(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn policy(&self) -> &dyn SponsorPolicy {
        self.policy.as_ref()
    }

    pub fn ledger(&self) -> &SponsorLedger {
        &self.ledger
    }

    /// Pure decision; nothing is recorded either way.
    pub fn validate_sponsorship(
        &self,
        caller: Address,
        op: &OperationDescriptor,
        required_prefund: U256,
    ) -> Result<(), SponsorError> {
        self.require_orchestrator(caller)?;
        if !self.policy.covers(op, required_prefund) {
            info!(sponsor = %self.address, account = %op.account(), policy = self.policy.name(), %required_prefund, "sponsorship declined");
            return Err(SponsorError::SponsorDeclined {
                sponsor: self.address,
            });
        }
        debug!(sponsor = %self.address, account = %op.account(), "sponsorship accepted");
        Ok(())
    }

    /// Record the real cost of an executed operation. At most once per operation hash.
    pub fn settle(
        &mut self,
        caller: Address,
        actual_cost: U256,
        ctx: &SettlementContext,
    ) -> Result<Vec<Event>, SponsorError> {
        self.require_orchestrator(caller)?;
        if self.ledger.is_settled(&ctx.operation_hash) {
            return Err(SponsorError::AlreadySettled(ctx.operation_hash));
        }
        self.policy.on_settle(actual_cost, ctx)?;
        self.ledger.record(ctx.account, ctx.operation_hash, actual_cost);
        info!(
            sponsor = %self.address,
            account = %ctx.account,
            %actual_cost,
            succeeded = ctx.execution_succeeded,
            "gas sponsored"
        );
        Ok(vec![Event::GasSponsored {
            account: ctx.account,
            amount: actual_cost,
        }])
    }

    fn require_orchestrator(&self, caller: Address) -> Result<(), SponsorError> {
        if caller != self.orchestrator {
            debug!(sponsor = %self.address, %caller, "sponsor hook called by non-orchestrator");
            return Err(SponsorError::UnauthorizedCaller { caller });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sponsor::policy::{AcceptAll, AllowList, DepositThreshold};

    const SPONSOR: Address = Address::repeat_byte(0x50);
    const OWNER: Address = Address::repeat_byte(0x51);
    const ORCHESTRATOR: Address = Address::repeat_byte(0xe0);
    const ACCOUNT: Address = Address::repeat_byte(0xa1);

    fn ctx(hash: u8) -> SettlementContext {
        SettlementContext {
            account: ACCOUNT,
            operation_hash: B256::repeat_byte(hash),
            sequence: U256::ZERO,
            execution_succeeded: false,
            aux: Bytes::new(),
        }
    }

    #[test]
    fn test_hooks_reject_non_orchestrator() {
        let mut sponsor = Sponsor::new(SPONSOR, OWNER, ORCHESTRATOR, AcceptAll);
        let op = OperationDescriptor::builder(ACCOUNT, U256::ZERO).build();
        // The sponsor's own owner is not the orchestrator either.
        assert_eq!(
            sponsor.validate_sponsorship(OWNER, &op, U256::ZERO),
            Err(SponsorError::UnauthorizedCaller { caller: OWNER })
        );
        assert_eq!(
            sponsor.settle(OWNER, U256::from(1u64), &ctx(1)),
            Err(SponsorError::UnauthorizedCaller { caller: OWNER })
        );
        assert_eq!(sponsor.ledger().settlements(), 0);
    }

    #[test]
    fn test_decline_is_sponsor_declined() {
        let sponsor = Sponsor::new(SPONSOR, OWNER, ORCHESTRATOR, AllowList::new([]));
        let op = OperationDescriptor::builder(ACCOUNT, U256::ZERO).build();
        assert_eq!(
            sponsor.validate_sponsorship(ORCHESTRATOR, &op, U256::ZERO),
            Err(SponsorError::SponsorDeclined { sponsor: SPONSOR })
        );
    }

    #[test]
    fn test_settle_once_per_operation() {
        let mut sponsor = Sponsor::new(SPONSOR, OWNER, ORCHESTRATOR, AcceptAll);
        let events = sponsor
            .settle(ORCHESTRATOR, U256::from(30u64), &ctx(1))
            .unwrap();
        assert_eq!(
            events,
            vec![Event::GasSponsored {
                account: ACCOUNT,
                amount: U256::from(30u64)
            }]
        );
        assert_eq!(
            sponsor.settle(ORCHESTRATOR, U256::from(30u64), &ctx(1)),
            Err(SponsorError::AlreadySettled(B256::repeat_byte(1)))
        );
        sponsor
            .settle(ORCHESTRATOR, U256::from(5u64), &ctx(2))
            .unwrap();
        assert_eq!(sponsor.ledger().total_sponsored(), U256::from(35u64));
        assert_eq!(sponsor.ledger().sponsored_for(&ACCOUNT), U256::from(35u64));
        assert_eq!(sponsor.ledger().settlements(), 2);
    }

    #[test]
    fn test_failed_settlement_records_nothing() {
        let mut sponsor = Sponsor::new(
            SPONSOR,
            OWNER,
            ORCHESTRATOR,
            DepositThreshold::new(U256::from(10u64)),
        );
        assert!(matches!(
            sponsor.settle(ORCHESTRATOR, U256::from(11u64), &ctx(1)),
            Err(SponsorError::InsufficientDeposit { .. })
        ));
        assert!(!sponsor.ledger().is_settled(&B256::repeat_byte(1)));
        assert_eq!(sponsor.policy().remaining_funds(), Some(U256::from(10u64)));
    }
}
