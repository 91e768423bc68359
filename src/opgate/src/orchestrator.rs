//! Orchestrator: the single trusted entry point.
//!
//! For each descriptor: account validation, sponsor approval (if one is named), execution, and
//! settlement with the sponsor. Every privileged hook is invoked with the orchestrator's own
//! identity as caller.

use std::collections::BTreeMap;

use alloy_primitives::{Address, B256, U256};
use opgate_types::{Event, OperationDescriptor, SponsorError, ValidationError};
use tracing::{info, info_span, warn};

use crate::{
    account::{AccountPolicyStore, AccountValidator, CheckedOperation},
    config::{OrchestratorConfig, SequencePolicy},
    executor::Executor,
    host::CallHost,
    ledger::Ledger,
    lifecycle::{Lifecycle, OperationState},
    outcome::{OperationOutcome, OperationReceipt, Settlement},
    sponsor::{SettlementContext, Sponsor},
    utils::crypto::SignatureVerifier,
};

#[derive(Clone, Debug)]
pub struct Orchestrator<V> {
    config: OrchestratorConfig,
    validator: AccountValidator<V>,
}

impl<V: SignatureVerifier> Orchestrator<V> {
    pub fn new(config: OrchestratorConfig, verifier: V) -> Self {
        Self {
            validator: AccountValidator::new(verifier, config.chain_id),
            config,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn address(&self) -> Address {
        self.config.address
    }

    /// Hash a descriptor the way this orchestrator validates it.
    pub fn operation_hash(&self, op: &OperationDescriptor) -> B256 {
        op.operation_hash(self.config.address, self.config.chain_id)
    }

    /// Run one descriptor through its full lifecycle.
    pub fn submit<H: CallHost + Clone>(
        &self,
        ledger: &mut Ledger<H>,
        op: &OperationDescriptor,
    ) -> OperationReceipt {
        let operation_hash = self.operation_hash(op);
        let span = info_span!("submit", account = %op.account(), sequence = %op.sequence(), hash = %operation_hash);
        let _enter = span.enter();

        let mut lifecycle = Lifecycle::new();
        let mut events = Vec::new();
        let outcome = self.run(ledger, op, operation_hash, &mut lifecycle, &mut events);
        ledger.log.append(events.iter().cloned());

        match &outcome {
            OperationOutcome::Rejected(err) => warn!(%err, "operation rejected"),
            OperationOutcome::SponsorRejected(err) => warn!(%err, "operation rejected by sponsor"),
            other => info!(outcome = other.kind(), "operation finished"),
        }

        OperationReceipt {
            operation_hash,
            account: op.account(),
            sequence: op.sequence(),
            outcome,
            states: lifecycle.into_states(),
            events,
        }
    }

    /// Run each descriptor's lifecycle independently, in order.
    pub fn submit_batch<H: CallHost + Clone>(
        &self,
        ledger: &mut Ledger<H>,
        ops: &[OperationDescriptor],
    ) -> Vec<OperationReceipt> {
        info!(count = ops.len(), "submitting batch");
        ops.iter().map(|op| self.submit(ledger, op)).collect()
    }

    fn run<H: CallHost + Clone>(
        &self,
        ledger: &mut Ledger<H>,
        op: &OperationDescriptor,
        operation_hash: B256,
        lifecycle: &mut Lifecycle,
        events: &mut Vec<Event>,
    ) -> OperationOutcome {
        let caller = self.config.address;
        let Ledger {
            accounts,
            sponsors,
            host,
            ..
        } = ledger;

        lifecycle.advance(OperationState::Validating);
        let Some(store) = accounts.get_mut(&op.account()) else {
            lifecycle.advance(OperationState::Rejected);
            return OperationOutcome::Rejected(ValidationError::UnknownAccount(op.account()));
        };

        let required_prefund = op.required_prefund();
        let checked = match self.validate(op, store, sponsors, required_prefund, events) {
            Ok(checked) => checked,
            Err(outcome) => {
                lifecycle.advance(OperationState::Rejected);
                return outcome;
            }
        };
        lifecycle.advance(OperationState::Validated);

        lifecycle.advance(OperationState::Executing);
        let execution = Executor::new(store).dispatch(caller, host, op.payload());
        let price = op.effective_unit_price(self.config.base_fee_per_unit);
        let units = execution.as_ref().map(|e| e.units_used).unwrap_or_default();
        let actual_cost = op
            .base_gas_fee()
            .saturating_add(U256::from(units))
            .saturating_mul(price)
            .min(required_prefund);

        let execution = match execution {
            Ok(execution) => {
                events.extend(execution.events);
                lifecycle.advance(OperationState::Executed);
                Ok(())
            }
            Err(error) => {
                warn!(%error, "execution failed");
                lifecycle.advance(OperationState::ExecutionFailed);
                Err(error)
            }
        };

        let settlement = match checked.sponsor {
            None => Settlement::NotSponsored,
            Some(sponsor) => {
                lifecycle.advance(OperationState::Settling);
                let ctx = SettlementContext {
                    account: op.account(),
                    operation_hash,
                    sequence: checked.sequence,
                    execution_succeeded: execution.is_ok(),
                    aux: op.sponsor_aux().to_vec().into(),
                };
                let result = match sponsors.get_mut(&sponsor) {
                    Some(s) => s.settle(caller, actual_cost, &ctx),
                    None => Err(SponsorError::UnknownSponsor(sponsor)),
                };
                lifecycle.advance(OperationState::Settled);
                match result {
                    Ok(emitted) => {
                        events.extend(emitted);
                        Settlement::Settled {
                            sponsor,
                            amount: actual_cost,
                        }
                    }
                    Err(error) => {
                        warn!(%sponsor, %error, "settlement failed");
                        Settlement::Failed { sponsor, error }
                    }
                }
            }
        };

        match execution {
            Ok(()) => OperationOutcome::Executed {
                actual_cost,
                settlement,
            },
            Err(error) => OperationOutcome::ExecutionFailed {
                error,
                actual_cost,
                settlement,
            },
        }
    }

    /// Account validation plus sponsor approval, ordered by the configured sequence policy.
    fn validate(
        &self,
        op: &OperationDescriptor,
        store: &mut AccountPolicyStore,
        sponsors: &BTreeMap<Address, Sponsor>,
        required_prefund: U256,
        events: &mut Vec<Event>,
    ) -> Result<CheckedOperation, OperationOutcome> {
        let caller = self.config.address;
        let checked = self
            .validator
            .check(caller, op, store)
            .map_err(OperationOutcome::Rejected)?;

        let consume_first = self.config.sequence_policy == SequencePolicy::ConsumeOnDecline;
        if consume_first {
            events.extend(
                self.validator
                    .commit(caller, &checked, store)
                    .map_err(OperationOutcome::Rejected)?,
            );
        }

        if let Some(sponsor) = checked.sponsor {
            let verdict = match sponsors.get(&sponsor) {
                Some(s) => s.validate_sponsorship(caller, op, required_prefund),
                None => Err(SponsorError::UnknownSponsor(sponsor)),
            };
            verdict.map_err(OperationOutcome::SponsorRejected)?;
        }

        if !consume_first {
            events.extend(
                self.validator
                    .commit(caller, &checked, store)
                    .map_err(OperationOutcome::Rejected)?,
            );
        }
        Ok(checked)
    }
}
