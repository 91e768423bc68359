//! Executor: forwards an account's calls through a [`CallHost`].
//!
//! Batches are all-or-nothing. Entries run in order against a staged copy of the host, and the
//! staged copy replaces the live host only after the last entry succeeded.

use alloy_primitives::{Address, Bytes, U256};
use opgate_types::{decode_account_call, AccountCall, Call, Event, ExecutionError};
use tracing::{debug, info, warn};

use crate::{account::AccountPolicyStore, host::CallHost};

/// Committed effects of one execution.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Execution {
    pub units_used: u64,
    pub events: Vec<Event>,
}

/// Executor bound to one account.
#[derive(Clone, Copy, Debug)]
pub struct Executor {
    account: Address,
    orchestrator: Address,
}

impl Executor {
    pub fn new(store: &AccountPolicyStore) -> Self {
        Self {
            account: store.account(),
            orchestrator: store.orchestrator(),
        }
    }

    pub fn execute<H: CallHost>(
        &self,
        caller: Address,
        host: &mut H,
        target: Address,
        value: U256,
        payload: Bytes,
    ) -> Result<Execution, ExecutionError> {
        self.require_orchestrator(caller)?;
        let call = Call {
            target,
            value,
            payload,
        };
        let receipt = host.invoke(self.account, &call).map_err(|reason| {
            warn!(account = %self.account, %target, %reason, "call reverted");
            ExecutionError::CallReverted {
                index: None,
                reason,
            }
        })?;
        info!(account = %self.account, %target, %value, "call executed");
        Ok(Execution {
            units_used: receipt.units_used,
            events: vec![Event::Executed {
                target: call.target,
                value: call.value,
                payload: call.payload,
            }],
        })
    }

    pub fn execute_batch<H: CallHost + Clone>(
        &self,
        caller: Address,
        host: &mut H,
        targets: Vec<Address>,
        values: Vec<U256>,
        payloads: Vec<Bytes>,
    ) -> Result<Execution, ExecutionError> {
        self.require_orchestrator(caller)?;
        if targets.len() != values.len() || targets.len() != payloads.len() {
            return Err(ExecutionError::MalformedBatch {
                targets: targets.len(),
                values: values.len(),
                payloads: payloads.len(),
            });
        }

        let mut staged = host.clone();
        let mut execution = Execution::default();
        let entries = targets.into_iter().zip(values).zip(payloads);
        for (index, ((target, value), payload)) in entries.enumerate() {
            let call = Call {
                target,
                value,
                payload,
            };
            let receipt = staged.invoke(self.account, &call).map_err(|reason| {
                warn!(account = %self.account, index, %target, %reason, "batch entry reverted, discarding batch");
                ExecutionError::CallReverted {
                    index: Some(index),
                    reason,
                }
            })?;
            execution.units_used = execution.units_used.saturating_add(receipt.units_used);
            execution.events.push(Event::Executed {
                target: call.target,
                value: call.value,
                payload: call.payload,
            });
        }

        *host = staged;
        info!(account = %self.account, calls = execution.events.len(), "batch executed");
        Ok(execution)
    }

    /// Decode a descriptor payload and run it.
    pub fn dispatch<H: CallHost + Clone>(
        &self,
        caller: Address,
        host: &mut H,
        payload: &[u8],
    ) -> Result<Execution, ExecutionError> {
        self.require_orchestrator(caller)?;
        match decode_account_call(payload)? {
            AccountCall::Noop => {
                debug!(account = %self.account, "empty payload, nothing to execute");
                Ok(Execution::default())
            }
            AccountCall::Single(call) => {
                self.execute(caller, host, call.target, call.value, call.payload)
            }
            AccountCall::Batch {
                targets,
                values,
                payloads,
            } => self.execute_batch(caller, host, targets, values, payloads),
        }
    }

    fn require_orchestrator(&self, caller: Address) -> Result<(), ExecutionError> {
        if caller != self.orchestrator {
            debug!(account = %self.account, %caller, "executor called by non-orchestrator");
            return Err(ExecutionError::UnauthorizedCaller { caller });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::InMemoryHost;
    use opgate_types::calls::encode_execute_batch;

    const ACCOUNT: Address = Address::repeat_byte(0xa1);
    const ORCHESTRATOR: Address = Address::repeat_byte(0xe0);
    const OWNER: Address = Address::repeat_byte(0x01);
    const T1: Address = Address::repeat_byte(0xc1);
    const T2: Address = Address::repeat_byte(0xc2);
    const T3: Address = Address::repeat_byte(0xc3);

    fn executor() -> Executor {
        Executor::new(&AccountPolicyStore::new(ACCOUNT, ORCHESTRATOR, OWNER).unwrap())
    }

    fn funded() -> InMemoryHost {
        InMemoryHost::new().with_balance(ACCOUNT, U256::from(1_000u64))
    }

    #[test]
    fn test_single_call_emits_executed() {
        let mut host = funded();
        let out = executor()
            .execute(ORCHESTRATOR, &mut host, T1, U256::from(10u64), Bytes::from(vec![7]))
            .unwrap();
        assert_eq!(
            out.events,
            vec![Event::Executed {
                target: T1,
                value: U256::from(10u64),
                payload: Bytes::from(vec![7])
            }]
        );
        assert_eq!(host.balance_of(&T1), U256::from(10u64));
    }

    #[test]
    fn test_single_call_revert_propagates() {
        let mut host = funded();
        host.set_reverting(T1, "boom");
        assert_eq!(
            executor().execute(ORCHESTRATOR, &mut host, T1, U256::ZERO, Bytes::new()),
            Err(ExecutionError::CallReverted {
                index: None,
                reason: "boom".into()
            })
        );
    }

    #[test]
    fn test_batch_is_all_or_nothing() {
        let mut host = funded();
        host.set_reverting(T3, "third fails");
        let before = host.clone();
        let result = executor().execute_batch(
            ORCHESTRATOR,
            &mut host,
            vec![T1, T2, T3],
            vec![U256::from(1u64), U256::from(2u64), U256::ZERO],
            vec![Bytes::new(), Bytes::new(), Bytes::new()],
        );
        assert_eq!(
            result,
            Err(ExecutionError::CallReverted {
                index: Some(2),
                reason: "third fails".into()
            })
        );
        // The first two entries succeeded on the staged copy but left nothing behind.
        assert_eq!(host, before);
        assert_eq!(host.balance_of(&T1), U256::ZERO);
        assert!(host.calls().is_empty());
    }

    #[test]
    fn test_batch_commits_in_order() {
        let mut host = funded();
        let out = executor()
            .execute_batch(
                ORCHESTRATOR,
                &mut host,
                vec![T1, T2],
                vec![U256::from(1u64), U256::from(2u64)],
                vec![Bytes::new(), Bytes::from(vec![1, 2, 3])],
            )
            .unwrap();
        assert_eq!(out.events.len(), 2);
        let targets: Vec<_> = host.calls().iter().map(|(_, c)| c.target).collect();
        assert_eq!(targets, vec![T1, T2]);
        assert_eq!(host.balance_of(&ACCOUNT), U256::from(997u64));
        assert_eq!(
            out.units_used,
            InMemoryHost::units_for(&Bytes::new()) + InMemoryHost::units_for(&Bytes::from(vec![1, 2, 3]))
        );
    }

    #[test]
    fn test_mismatched_batch_attempts_nothing() {
        let mut host = funded();
        let result = executor().execute_batch(
            ORCHESTRATOR,
            &mut host,
            vec![T1, T2],
            vec![U256::ZERO],
            vec![Bytes::new(), Bytes::new()],
        );
        assert_eq!(
            result,
            Err(ExecutionError::MalformedBatch {
                targets: 2,
                values: 1,
                payloads: 2
            })
        );
        assert!(host.calls().is_empty());
    }

    #[test]
    fn test_non_orchestrator_rejected() {
        let mut host = funded();
        let stranger = Address::repeat_byte(0x66);
        let expected = Err(ExecutionError::UnauthorizedCaller { caller: stranger });
        assert_eq!(
            executor().execute(stranger, &mut host, T1, U256::ZERO, Bytes::new()),
            expected
        );
        assert_eq!(
            executor().execute_batch(stranger, &mut host, vec![], vec![U256::ZERO], vec![]),
            expected
        );
        assert_eq!(executor().dispatch(stranger, &mut host, &[]), expected);
        assert!(host.calls().is_empty());
    }

    #[test]
    fn test_dispatch_decodes_batch() {
        let mut host = funded();
        let payload = encode_execute_batch(
            vec![T1, T2],
            vec![U256::ZERO, U256::ZERO],
            vec![Bytes::new(), Bytes::new()],
        );
        let out = executor()
            .dispatch(ORCHESTRATOR, &mut host, &payload)
            .unwrap();
        assert_eq!(out.events.len(), 2);
        assert_eq!(
            executor().dispatch(ORCHESTRATOR, &mut host, &[1, 2, 3, 4]),
            Err(ExecutionError::UnknownSelector([1, 2, 3, 4]))
        );
    }
}
