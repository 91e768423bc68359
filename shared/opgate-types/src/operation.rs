//! Operation descriptor and its canonical hash.

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_sol_types::SolValue;

use crate::{errors::ValidationError, SPONSOR_ID_LEN};

/// Signed, immutable description of one delegated action.
///
/// Fields are only readable; a descriptor is built once through [`OperationBuilder`] and the only
/// way to "change" it is to derive a new value (see [`OperationDescriptor::with_authorization`]).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct OperationDescriptor {
    account: Address,
    sequence: U256,
    payload: Bytes,
    action_gas_budget: U256,
    verification_gas_budget: U256,
    base_gas_fee: U256,
    max_fee_per_unit: U256,
    max_priority_fee_per_unit: U256,
    sponsor_data: Bytes,
    authorization: Bytes,
}

impl OperationDescriptor {
    pub fn builder(account: Address, sequence: U256) -> OperationBuilder {
        OperationBuilder::new(account, sequence)
    }

    pub fn account(&self) -> Address {
        self.account
    }

    pub fn sequence(&self) -> U256 {
        self.sequence
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn action_gas_budget(&self) -> U256 {
        self.action_gas_budget
    }

    pub fn verification_gas_budget(&self) -> U256 {
        self.verification_gas_budget
    }

    pub fn base_gas_fee(&self) -> U256 {
        self.base_gas_fee
    }

    pub fn max_fee_per_unit(&self) -> U256 {
        self.max_fee_per_unit
    }

    pub fn max_priority_fee_per_unit(&self) -> U256 {
        self.max_priority_fee_per_unit
    }

    pub fn sponsor_data(&self) -> &Bytes {
        &self.sponsor_data
    }

    pub fn authorization(&self) -> &Bytes {
        &self.authorization
    }

    /// Copy of this descriptor carrying `authorization`.
    pub fn with_authorization(&self, authorization: impl Into<Bytes>) -> Self {
        Self {
            authorization: authorization.into(),
            ..self.clone()
        }
    }

    /// Sponsor named by the leading 20 bytes of `sponsor_data`.
    ///
    /// Empty data and the zero identifier both mean "no sponsor".
    pub fn sponsor(&self) -> Result<Option<Address>, ValidationError> {
        if self.sponsor_data.is_empty() {
            return Ok(None);
        }
        if self.sponsor_data.len() < SPONSOR_ID_LEN {
            return Err(ValidationError::MalformedSponsorData {
                len: self.sponsor_data.len(),
            });
        }
        let sponsor = Address::from_slice(&self.sponsor_data[..SPONSOR_ID_LEN]);
        Ok((sponsor != Address::ZERO).then_some(sponsor))
    }

    /// Sponsor-specific bytes following the identifier prefix.
    pub fn sponsor_aux(&self) -> &[u8] {
        self.sponsor_data.get(SPONSOR_ID_LEN..).unwrap_or_default()
    }

    /// Upper bound on what the operation may cost: every budget priced at `max_fee_per_unit`.
    pub fn required_prefund(&self) -> U256 {
        self.action_gas_budget
            .saturating_add(self.verification_gas_budget)
            .saturating_add(self.base_gas_fee)
            .saturating_mul(self.max_fee_per_unit)
    }

    /// `min(max_fee, max_priority + base_fee)`.
    pub fn effective_unit_price(&self, base_fee_per_unit: U256) -> U256 {
        self.max_fee_per_unit.min(
            self.max_priority_fee_per_unit
                .saturating_add(base_fee_per_unit),
        )
    }

    /// Canonical hash of every field except `authorization`, bound to the orchestrator identity
    /// and chain id so a signature cannot be replayed against another deployment.
    pub fn operation_hash(&self, orchestrator: Address, chain_id: u64) -> B256 {
        let inner = keccak256(
            (
                self.account,
                self.sequence,
                keccak256(&self.payload),
                self.action_gas_budget,
                self.verification_gas_budget,
                self.base_gas_fee,
                self.max_fee_per_unit,
                self.max_priority_fee_per_unit,
                keccak256(&self.sponsor_data),
            )
                .abi_encode(),
        );
        keccak256((inner, orchestrator, U256::from(chain_id)).abi_encode())
    }

    /// Digest the authorizing identity signs: EIP-191 personal message over the operation hash.
    pub fn signing_digest(&self, orchestrator: Address, chain_id: u64) -> B256 {
        personal_message_digest(self.operation_hash(orchestrator, chain_id))
    }
}

/// keccak256("\x19Ethereum Signed Message:\n32" || hash)
pub fn personal_message_digest(hash: B256) -> B256 {
    let mut buf = Vec::with_capacity(28 + 32);
    buf.extend_from_slice(b"\x19Ethereum Signed Message:\n32");
    buf.extend_from_slice(hash.as_slice());
    keccak256(buf)
}

/// Builder for [`OperationDescriptor`]. Unset budgets and prices default to zero.
#[derive(Clone, Debug)]
pub struct OperationBuilder {
    inner: OperationDescriptor,
}

impl OperationBuilder {
    pub fn new(account: Address, sequence: U256) -> Self {
        Self {
            inner: OperationDescriptor {
                account,
                sequence,
                payload: Bytes::new(),
                action_gas_budget: U256::ZERO,
                verification_gas_budget: U256::ZERO,
                base_gas_fee: U256::ZERO,
                max_fee_per_unit: U256::ZERO,
                max_priority_fee_per_unit: U256::ZERO,
                sponsor_data: Bytes::new(),
                authorization: Bytes::new(),
            },
        }
    }

    pub fn payload(mut self, payload: impl Into<Bytes>) -> Self {
        self.inner.payload = payload.into();
        self
    }

    pub fn gas_budgets(mut self, action: U256, verification: U256, base_fee: U256) -> Self {
        self.inner.action_gas_budget = action;
        self.inner.verification_gas_budget = verification;
        self.inner.base_gas_fee = base_fee;
        self
    }

    pub fn fees(mut self, max_fee_per_unit: U256, max_priority_fee_per_unit: U256) -> Self {
        self.inner.max_fee_per_unit = max_fee_per_unit;
        self.inner.max_priority_fee_per_unit = max_priority_fee_per_unit;
        self
    }

    pub fn sponsor_data(mut self, sponsor_data: impl Into<Bytes>) -> Self {
        self.inner.sponsor_data = sponsor_data.into();
        self
    }

    pub fn authorization(mut self, authorization: impl Into<Bytes>) -> Self {
        self.inner.authorization = authorization.into();
        self
    }

    pub fn build(self) -> OperationDescriptor {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    const ACCOUNT: Address = address!("00000000000000000000000000000000000000a1");
    const ORCHESTRATOR: Address = address!("0000000000000000000000000000000000000e01");

    fn sample() -> OperationDescriptor {
        OperationDescriptor::builder(ACCOUNT, U256::from(3u64))
            .payload(vec![0xde, 0xad])
            .gas_budgets(U256::from(100u64), U256::from(50u64), U256::from(10u64))
            .fees(U256::from(7u64), U256::from(2u64))
            .build()
    }

    #[test]
    fn test_sponsor_prefix() {
        let none = sample();
        assert_eq!(none.sponsor(), Ok(None));

        let sponsor = address!("00000000000000000000000000000000000000b7");
        let mut data = sponsor.to_vec();
        data.extend_from_slice(&[1, 2, 3]);
        let op = OperationDescriptor::builder(ACCOUNT, U256::ZERO)
            .sponsor_data(data)
            .build();
        assert_eq!(op.sponsor(), Ok(Some(sponsor)));
        assert_eq!(op.sponsor_aux(), &[1, 2, 3]);

        let zero = OperationDescriptor::builder(ACCOUNT, U256::ZERO)
            .sponsor_data(vec![0u8; 20])
            .build();
        assert_eq!(zero.sponsor(), Ok(None));

        let short = OperationDescriptor::builder(ACCOUNT, U256::ZERO)
            .sponsor_data(vec![1u8; 5])
            .build();
        assert_eq!(
            short.sponsor(),
            Err(ValidationError::MalformedSponsorData { len: 5 })
        );
    }

    #[test]
    fn test_prefund_and_price() {
        let op = sample();
        assert_eq!(op.required_prefund(), U256::from(160u64 * 7));
        assert_eq!(op.effective_unit_price(U256::from(3u64)), U256::from(5u64));
        assert_eq!(op.effective_unit_price(U256::from(30u64)), U256::from(7u64));
    }

    #[test]
    fn test_hash_ignores_authorization() {
        let op = sample();
        let signed = op.with_authorization(vec![9u8; 65]);
        assert_eq!(
            op.operation_hash(ORCHESTRATOR, 1),
            signed.operation_hash(ORCHESTRATOR, 1)
        );
        assert_eq!(signed.authorization().len(), 65);
        assert!(op.authorization().is_empty());
    }

    #[test]
    fn test_hash_binds_domain_and_fields() {
        let op = sample();
        let base = op.operation_hash(ORCHESTRATOR, 1);
        assert_ne!(base, op.operation_hash(ORCHESTRATOR, 2));
        assert_ne!(base, op.operation_hash(ACCOUNT, 1));

        let other = OperationDescriptor::builder(ACCOUNT, U256::from(4u64))
            .payload(vec![0xde, 0xad])
            .gas_budgets(U256::from(100u64), U256::from(50u64), U256::from(10u64))
            .fees(U256::from(7u64), U256::from(2u64))
            .build();
        assert_ne!(base, other.operation_hash(ORCHESTRATOR, 1));
    }
}
