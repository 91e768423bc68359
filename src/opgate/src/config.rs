//! Orchestrator configuration.

use alloy_primitives::{Address, U256};

/// What happens to a consumed sequence when the named sponsor declines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum SequencePolicy {
    /// Account validation commits before the sponsor is asked; a decline still burns the
    /// sequence.
    #[default]
    ConsumeOnDecline,
    /// Account gates run read-only, the sponsor is asked, and the sequence is committed only
    /// once the sponsor accepted.
    PreserveOnDecline,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct OrchestratorConfig {
    /// Calling identity of the orchestrator; every privileged hook checks against it.
    pub address: Address,
    pub chain_id: u64,
    /// Network base price per resource unit, used for the effective price of an operation.
    #[cfg_attr(feature = "serde", serde(default))]
    pub base_fee_per_unit: U256,
    #[cfg_attr(feature = "serde", serde(default))]
    pub sequence_policy: SequencePolicy,
}

impl OrchestratorConfig {
    pub fn new(address: Address, chain_id: u64) -> Self {
        Self {
            address,
            chain_id,
            base_fee_per_unit: U256::ZERO,
            sequence_policy: SequencePolicy::default(),
        }
    }

    pub fn with_base_fee(mut self, base_fee_per_unit: U256) -> Self {
        self.base_fee_per_unit = base_fee_per_unit;
        self
    }

    pub fn with_sequence_policy(mut self, sequence_policy: SequencePolicy) -> Self {
        self.sequence_policy = sequence_policy;
        self
    }
}
