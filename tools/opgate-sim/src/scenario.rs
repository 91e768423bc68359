//! Scenario files: the initial world plus the operations to submit.

use std::{collections::BTreeMap, fs, path::Path};

use alloy_primitives::{Address, Bytes, U256};
use anyhow::{bail, Context, Result};
use opgate::{
    AcceptAll, AccountPolicyStore, AllowList, DepositThreshold, EcdsaRecovery, InMemoryHost,
    Ledger, OperationDescriptor, Orchestrator, OrchestratorConfig, Sponsor,
};
use opgate_encoder::{
    address_of, batch_payload, build_sponsor_data, encode_install_data, parse_signing_key,
    sign_operation, single_call_payload,
};
use opgate_types::Call;
use serde::Deserialize;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Scenario {
    pub config: OrchestratorConfig,
    /// Native balances on the host.
    #[serde(default)]
    pub balances: BTreeMap<Address, U256>,
    /// Targets whose calls always revert, with the revert reason.
    #[serde(default)]
    pub reverting: BTreeMap<Address, String>,
    #[serde(default)]
    pub accounts: Vec<AccountSpec>,
    #[serde(default)]
    pub sponsors: Vec<SponsorSpec>,
    pub operations: Vec<OperationSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AccountSpec {
    pub address: Address,
    /// Hex secret key of the owner.
    pub owner_key: String,
    /// Hex secret keys of additional signers.
    #[serde(default)]
    pub signer_keys: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SponsorSpec {
    pub address: Address,
    pub owner: Address,
    /// Defaults to the scenario's orchestrator.
    #[serde(default)]
    pub orchestrator: Option<Address>,
    pub policy: PolicySpec,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case", deny_unknown_fields)]
pub enum PolicySpec {
    AcceptAll,
    AllowList { accounts: Vec<Address> },
    DepositThreshold { deposit: U256 },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OperationSpec {
    pub account: Address,
    pub sequence: U256,
    pub signer_key: String,
    #[serde(default)]
    pub calls: Vec<CallSpec>,
    /// Force `executeBatch` even for a single call.
    #[serde(default)]
    pub batch: bool,
    #[serde(default)]
    pub gas: GasSpec,
    #[serde(default)]
    pub sponsor: Option<Address>,
    #[serde(default)]
    pub sponsor_aux: Bytes,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CallSpec {
    pub target: Address,
    #[serde(default)]
    pub value: U256,
    #[serde(default)]
    pub data: Bytes,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GasSpec {
    #[serde(default)]
    pub action: U256,
    #[serde(default)]
    pub verification: U256,
    #[serde(default)]
    pub base: U256,
    #[serde(default)]
    pub max_fee_per_unit: U256,
    #[serde(default)]
    pub max_priority_fee_per_unit: U256,
}

/// A provisioned ledger plus signed operations, ready to submit.
pub struct World {
    pub orchestrator: Orchestrator<EcdsaRecovery>,
    pub ledger: Ledger<InMemoryHost>,
    pub operations: Vec<OperationDescriptor>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed reading scenario {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("failed parsing scenario {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn build(&self) -> Result<World> {
        let orchestrator_addr = self.config.address;

        let mut host = InMemoryHost::new();
        for (who, amount) in &self.balances {
            host.set_balance(*who, *amount);
        }
        for (target, reason) in &self.reverting {
            host.set_reverting(*target, reason.clone());
        }
        let mut ledger = Ledger::new(host);

        for spec in &self.accounts {
            let owner = parse_signing_key(&spec.owner_key)
                .with_context(|| format!("bad owner key for account {}", spec.address))?;
            let signers = spec
                .signer_keys
                .iter()
                .map(|k| parse_signing_key(k).map(|key| address_of(&key)))
                .collect::<Result<Vec<_>, _>>()
                .with_context(|| format!("bad signer key for account {}", spec.address))?;
            let data = encode_install_data(address_of(&owner), &signers)?;
            let store = AccountPolicyStore::install(spec.address, orchestrator_addr, &data)
                .with_context(|| format!("failed installing account {}", spec.address))?;
            if !ledger.provision_account(store) {
                bail!("account {} listed twice", spec.address);
            }
            debug!(account = %spec.address, signers = signers.len() + 1, "account provisioned");
        }

        for spec in &self.sponsors {
            let orchestrator = spec.orchestrator.unwrap_or(orchestrator_addr);
            let sponsor = match &spec.policy {
                PolicySpec::AcceptAll => Sponsor::new(spec.address, spec.owner, orchestrator, AcceptAll),
                PolicySpec::AllowList { accounts } => Sponsor::new(
                    spec.address,
                    spec.owner,
                    orchestrator,
                    AllowList::new(accounts.iter().copied()),
                ),
                PolicySpec::DepositThreshold { deposit } => Sponsor::new(
                    spec.address,
                    spec.owner,
                    orchestrator,
                    DepositThreshold::new(*deposit),
                ),
            };
            if !ledger.register_sponsor(sponsor) {
                bail!("sponsor {} listed twice", spec.address);
            }
        }

        let operations = self
            .operations
            .iter()
            .enumerate()
            .map(|(index, spec)| {
                spec.sign(orchestrator_addr, self.config.chain_id)
                    .with_context(|| format!("failed preparing operation #{index}"))
            })
            .collect::<Result<Vec<_>>>()?;

        info!(
            accounts = self.accounts.len(),
            sponsors = self.sponsors.len(),
            operations = operations.len(),
            "scenario loaded"
        );
        Ok(World {
            orchestrator: Orchestrator::new(self.config.clone(), EcdsaRecovery),
            ledger,
            operations,
        })
    }
}

impl OperationSpec {
    fn payload(&self) -> Bytes {
        match self.calls.as_slice() {
            [] => Bytes::new(),
            [call] if !self.batch => single_call_payload(call.target, call.value, call.data.clone()),
            calls => batch_payload(
                &calls
                    .iter()
                    .map(|c| Call {
                        target: c.target,
                        value: c.value,
                        payload: c.data.clone(),
                    })
                    .collect::<Vec<_>>(),
            ),
        }
    }

    fn sign(&self, orchestrator: Address, chain_id: u64) -> Result<OperationDescriptor> {
        let key = parse_signing_key(&self.signer_key)?;
        let sponsor_data = self
            .sponsor
            .map(|sponsor| build_sponsor_data(sponsor, &self.sponsor_aux))
            .unwrap_or_default();
        let op = OperationDescriptor::builder(self.account, self.sequence)
            .payload(self.payload())
            .gas_budgets(self.gas.action, self.gas.verification, self.gas.base)
            .fees(self.gas.max_fee_per_unit, self.gas.max_priority_fee_per_unit)
            .sponsor_data(sponsor_data)
            .build();
        Ok(sign_operation(&op, &key, orchestrator, chain_id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC: &str = include_str!("../scenarios/basic.json");

    #[test]
    fn test_basic_scenario_outcomes() {
        let mut world = Scenario::parse(BASIC).unwrap().build().unwrap();
        let receipts = world
            .orchestrator
            .submit_batch(&mut world.ledger, &world.operations);
        let kinds: Vec<_> = receipts.iter().map(|r| r.outcome.kind()).collect();
        assert_eq!(
            kinds,
            vec!["executed", "execution-failed", "rejected", "rejected", "sponsor-rejected"]
        );

        let account = Address::repeat_byte(0xa1);
        assert_eq!(
            world.ledger.account(&account).unwrap().sequence_counter(),
            U256::from(3u64)
        );
        assert_eq!(
            world.ledger.host().balance_of(&Address::repeat_byte(0xc1)),
            U256::from(5u64)
        );
        let sponsor = world.ledger.sponsor(&Address::repeat_byte(0x50)).unwrap();
        assert_eq!(sponsor.ledger().settlements(), 2);
    }

    #[test]
    fn test_duplicate_account_is_rejected() {
        let raw = r#"{
            "config": { "address": "0xe0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0", "chainId": 1 },
            "accounts": [
                { "address": "0xa1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1", "ownerKey": "0x0101010101010101010101010101010101010101010101010101010101010101" },
                { "address": "0xa1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1", "ownerKey": "0x0101010101010101010101010101010101010101010101010101010101010101" }
            ],
            "operations": []
        }"#;
        let err = Scenario::parse(raw).unwrap().build().err().unwrap();
        assert!(err.to_string().contains("listed twice"));
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let raw = r#"{ "config": { "address": "0xe0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0", "chainId": 1 }, "operations": [], "extra": 1 }"#;
        assert!(Scenario::parse(raw).is_err());
    }
}
