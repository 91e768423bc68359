//! Ledger-resident records the orchestrator works on.
//!
//! Account stores are keyed by account, sponsors by sponsor identifier. The event log is
//! append-only. Owner-gated administration goes straight to the account store and never
//! through the orchestrator.

use std::collections::BTreeMap;

use alloy_primitives::{Address, U256};
use opgate_types::{AdminError, Event};

use crate::{account::AccountPolicyStore, sponsor::Sponsor};

/// Append-only event log.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventLog {
    entries: Vec<Event>,
}

impl EventLog {
    pub(crate) fn append(&mut self, events: impl IntoIterator<Item = Event>) {
        self.entries.extend(events);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[Event] {
        &self.entries
    }
}

#[derive(Debug)]
pub struct Ledger<H> {
    pub(crate) accounts: BTreeMap<Address, AccountPolicyStore>,
    pub(crate) sponsors: BTreeMap<Address, Sponsor>,
    pub(crate) host: H,
    pub(crate) log: EventLog,
}

impl<H> Ledger<H> {
    pub fn new(host: H) -> Self {
        Self {
            accounts: BTreeMap::new(),
            sponsors: BTreeMap::new(),
            host,
            log: EventLog::default(),
        }
    }

    /// Add an account store. Returns `false` (and keeps the existing one) if the account is
    /// already provisioned.
    pub fn provision_account(&mut self, store: AccountPolicyStore) -> bool {
        if self.accounts.contains_key(&store.account()) {
            return false;
        }
        self.accounts.insert(store.account(), store);
        true
    }

    /// Register a sponsor. Returns `false` if the identifier is taken.
    pub fn register_sponsor(&mut self, sponsor: Sponsor) -> bool {
        if self.sponsors.contains_key(&sponsor.address()) {
            return false;
        }
        self.sponsors.insert(sponsor.address(), sponsor);
        true
    }

    pub fn account(&self, account: &Address) -> Option<&AccountPolicyStore> {
        self.accounts.get(account)
    }

    pub fn sponsor(&self, sponsor: &Address) -> Option<&Sponsor> {
        self.sponsors.get(sponsor)
    }

    pub fn accounts(&self) -> impl Iterator<Item = &AccountPolicyStore> {
        self.accounts.values()
    }

    pub fn sponsors(&self) -> impl Iterator<Item = &Sponsor> {
        self.sponsors.values()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn events(&self) -> &EventLog {
        &self.log
    }

    pub fn add_signer(
        &mut self,
        account: Address,
        caller: Address,
        identity: Address,
    ) -> Result<(), AdminError> {
        let events = self.store_mut(account)?.add_signer(caller, identity)?;
        self.log.append(events);
        Ok(())
    }

    pub fn remove_signer(
        &mut self,
        account: Address,
        caller: Address,
        identity: Address,
    ) -> Result<(), AdminError> {
        let events = self.store_mut(account)?.remove_signer(caller, identity)?;
        self.log.append(events);
        Ok(())
    }

    pub fn grant_sponsor_allowance(
        &mut self,
        account: Address,
        caller: Address,
        token: Address,
        sponsor: Address,
        amount: U256,
    ) -> Result<(), AdminError> {
        let events = self
            .store_mut(account)?
            .grant_sponsor_allowance(caller, token, sponsor, amount)?;
        self.log.append(events);
        Ok(())
    }

    fn store_mut(&mut self, account: Address) -> Result<&mut AccountPolicyStore, AdminError> {
        self.accounts
            .get_mut(&account)
            .ok_or(AdminError::UnknownAccount(account))
    }
}
