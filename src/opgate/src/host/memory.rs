//! In-memory call host with native balances.
//!
//! Targets can be marked as reverting to exercise failure paths; every successful call is
//! recorded so callers can observe exactly which effects happened.

use std::collections::BTreeMap;

use alloy_primitives::{Address, Bytes, U256};
use opgate_types::Call;

use crate::host::{CallHost, CallReceipt};

/// Flat cost of any forwarded call.
pub const CALL_BASE_UNITS: u64 = 21_000;
/// Cost per payload byte.
pub const PAYLOAD_BYTE_UNITS: u64 = 16;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InMemoryHost {
    balances: BTreeMap<Address, U256>,
    reverting: BTreeMap<Address, String>,
    calls: Vec<(Address, Call)>,
}

impl InMemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balance(mut self, who: Address, amount: U256) -> Self {
        self.set_balance(who, amount);
        self
    }

    pub fn set_balance(&mut self, who: Address, amount: U256) {
        self.balances.insert(who, amount);
    }

    pub fn balance_of(&self, who: &Address) -> U256 {
        self.balances.get(who).copied().unwrap_or_default()
    }

    /// Every call to `target` reverts with `reason` from now on.
    pub fn set_reverting(&mut self, target: Address, reason: impl Into<String>) {
        self.reverting.insert(target, reason.into());
    }

    /// Successful calls, oldest first, as `(from, call)`.
    pub fn calls(&self) -> &[(Address, Call)] {
        &self.calls
    }

    pub fn units_for(payload: &Bytes) -> u64 {
        CALL_BASE_UNITS.saturating_add(PAYLOAD_BYTE_UNITS.saturating_mul(payload.len() as u64))
    }
}

impl CallHost for InMemoryHost {
    fn invoke(&mut self, from: Address, call: &Call) -> Result<CallReceipt, String> {
        if let Some(reason) = self.reverting.get(&call.target) {
            return Err(reason.clone());
        }
        if !call.value.is_zero() {
            let available = self.balance_of(&from);
            let remaining = available
                .checked_sub(call.value)
                .ok_or_else(|| format!("insufficient balance: {available} < {}", call.value))?;
            self.balances.insert(from, remaining);
            // Read after the debit so a self-transfer nets to zero.
            let credited = self.balance_of(&call.target).saturating_add(call.value);
            self.balances.insert(call.target, credited);
        }
        self.calls.push((from, call.clone()));
        Ok(CallReceipt {
            units_used: Self::units_for(&call.payload),
            output: Bytes::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FROM: Address = Address::repeat_byte(0xa1);
    const TO: Address = Address::repeat_byte(0xc1);

    fn call(value: u64, payload: Vec<u8>) -> Call {
        Call {
            target: TO,
            value: U256::from(value),
            payload: payload.into(),
        }
    }

    #[test]
    fn test_value_transfer_and_units() {
        let mut host = InMemoryHost::new().with_balance(FROM, U256::from(100u64));
        let receipt = host.invoke(FROM, &call(40, vec![1, 2])).unwrap();
        assert_eq!(receipt.units_used, CALL_BASE_UNITS + 2 * PAYLOAD_BYTE_UNITS);
        assert_eq!(host.balance_of(&FROM), U256::from(60u64));
        assert_eq!(host.balance_of(&TO), U256::from(40u64));
        assert_eq!(host.calls().len(), 1);
    }

    #[test]
    fn test_failed_call_leaves_no_trace() {
        let mut host = InMemoryHost::new().with_balance(FROM, U256::from(10u64));
        let err = host.invoke(FROM, &call(11, vec![])).unwrap_err();
        assert!(err.starts_with("insufficient balance"));

        host.set_reverting(TO, "nope");
        assert_eq!(host.invoke(FROM, &call(0, vec![])), Err("nope".to_string()));
        assert_eq!(host.balance_of(&FROM), U256::from(10u64));
        assert!(host.calls().is_empty());
    }

    #[test]
    fn test_self_transfer_keeps_balance() {
        let mut host = InMemoryHost::new().with_balance(FROM, U256::from(100u64));
        let to_self = Call {
            target: FROM,
            value: U256::from(40u64),
            payload: Bytes::new(),
        };
        host.invoke(FROM, &to_self).unwrap();
        assert_eq!(host.balance_of(&FROM), U256::from(100u64));
        assert_eq!(host.calls().len(), 1);
    }
}
