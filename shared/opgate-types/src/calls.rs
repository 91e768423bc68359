//! Account call ABI.
//!
//! A descriptor's payload is the calldata the orchestrator hands to the account's executor:
//! either a single `execute` or an `executeBatch` of parallel lists. An empty payload requests
//! no action.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{sol, SolCall};

use crate::errors::ExecutionError;

sol! {
    /// Forward `data` to `target` carrying `value`.
    function execute(address target, uint256 value, bytes data);

    /// Run every `(targets[i], values[i], payloads[i])` in order, all-or-nothing.
    function executeBatch(address[] targets, uint256[] values, bytes[] payloads);
}

/// One forwarded call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Call {
    pub target: Address,
    pub value: U256,
    pub payload: Bytes,
}

/// Decoded descriptor payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccountCall {
    Noop,
    Single(Call),
    /// Lists are kept as supplied; length agreement is enforced by the executor.
    Batch {
        targets: Vec<Address>,
        values: Vec<U256>,
        payloads: Vec<Bytes>,
    },
}

/// Decode a descriptor payload into an [`AccountCall`].
pub fn decode_account_call(payload: &[u8]) -> Result<AccountCall, ExecutionError> {
    if payload.is_empty() {
        return Ok(AccountCall::Noop);
    }
    if payload.len() < 4 {
        return Err(ExecutionError::MalformedPayload);
    }
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&payload[..4]);

    match selector {
        executeCall::SELECTOR => {
            let call = executeCall::abi_decode(payload, true)
                .map_err(|_| ExecutionError::MalformedPayload)?;
            Ok(AccountCall::Single(Call {
                target: call.target,
                value: call.value,
                payload: call.data,
            }))
        }
        executeBatchCall::SELECTOR => {
            let call = executeBatchCall::abi_decode(payload, true)
                .map_err(|_| ExecutionError::MalformedPayload)?;
            Ok(AccountCall::Batch {
                targets: call.targets,
                values: call.values,
                payloads: call.payloads,
            })
        }
        other => Err(ExecutionError::UnknownSelector(other)),
    }
}

/// ABI-encode a single `execute` payload.
pub fn encode_execute(call: &Call) -> Bytes {
    executeCall {
        target: call.target,
        value: call.value,
        data: call.payload.clone(),
    }
    .abi_encode()
    .into()
}

/// ABI-encode an `executeBatch` payload from parallel lists.
pub fn encode_execute_batch(targets: Vec<Address>, values: Vec<U256>, payloads: Vec<Bytes>) -> Bytes {
    executeBatchCall {
        targets,
        values,
        payloads,
    }
    .abi_encode()
    .into()
}
