//! Account policy store: owner, authorized signers, replay counter and sponsor allowances.

use std::collections::{BTreeMap, BTreeSet};

use alloy_primitives::{Address, U256};
use opgate_types::{AdminError, Event};
use tracing::{debug, info};

/// Authorization and replay-prevention state of one account.
///
/// The sequence counter only moves through [`AccountPolicyStore::consume_sequence`], which is
/// reachable solely from the account validator's commit step. Signer and allowance edits are
/// owner-gated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountPolicyStore {
    account: Address,
    orchestrator: Address,
    owner: Address,
    authorized_signers: BTreeSet<Address>,
    sequence_counter: U256,
    /// `(token, sponsor) -> amount`
    sponsor_allowances: BTreeMap<(Address, Address), U256>,
}

impl AccountPolicyStore {
    /// Provision a store; the owner is bound here and is always an authorized signer.
    pub fn new(account: Address, orchestrator: Address, owner: Address) -> Result<Self, AdminError> {
        if owner == Address::ZERO || account == Address::ZERO || orchestrator == Address::ZERO {
            return Err(AdminError::ZeroIdentity);
        }
        let mut authorized_signers = BTreeSet::new();
        authorized_signers.insert(owner);
        Ok(Self {
            account,
            orchestrator,
            owner,
            authorized_signers,
            sequence_counter: U256::ZERO,
            sponsor_allowances: BTreeMap::new(),
        })
    }

    pub fn account(&self) -> Address {
        self.account
    }

    /// The only identity allowed into this account's validator and executor.
    pub fn orchestrator(&self) -> Address {
        self.orchestrator
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn sequence_counter(&self) -> U256 {
        self.sequence_counter
    }

    pub fn is_signer(&self, identity: &Address) -> bool {
        self.authorized_signers.contains(identity)
    }

    pub fn signers(&self) -> impl Iterator<Item = &Address> {
        self.authorized_signers.iter()
    }

    pub fn allowance(&self, token: Address, sponsor: Address) -> U256 {
        self.sponsor_allowances
            .get(&(token, sponsor))
            .copied()
            .unwrap_or_default()
    }

    /// Advance the counter by one and return the value consumed. `None` once the counter is
    /// exhausted; it never wraps.
    pub(crate) fn consume_sequence(&mut self) -> Option<U256> {
        let used = self.sequence_counter;
        self.sequence_counter = used.checked_add(U256::from(1u64))?;
        Some(used)
    }

    /// Add to the signer set without the owner gate. `false` if already a member.
    pub(crate) fn insert_signer(&mut self, identity: Address) -> bool {
        self.authorized_signers.insert(identity)
    }

    pub fn add_signer(&mut self, caller: Address, identity: Address) -> Result<Vec<Event>, AdminError> {
        self.require_owner(caller)?;
        if identity == Address::ZERO {
            return Err(AdminError::ZeroIdentity);
        }
        if !self.insert_signer(identity) {
            return Err(AdminError::AlreadySigner(identity));
        }
        info!(account = %self.account, %identity, "signer added");
        Ok(vec![Event::SignerAdded { identity }])
    }

    pub fn remove_signer(&mut self, caller: Address, identity: Address) -> Result<Vec<Event>, AdminError> {
        self.require_owner(caller)?;
        if identity == Address::ZERO {
            return Err(AdminError::ZeroIdentity);
        }
        if identity == self.owner {
            return Err(AdminError::CannotRemoveOwner);
        }
        if !self.authorized_signers.remove(&identity) {
            return Err(AdminError::NotASigner(identity));
        }
        info!(account = %self.account, %identity, "signer removed");
        Ok(vec![Event::SignerRemoved { identity }])
    }

    /// Record the amount of `token` the owner lets `sponsor` draw. Zero revokes.
    pub fn grant_sponsor_allowance(
        &mut self,
        caller: Address,
        token: Address,
        sponsor: Address,
        amount: U256,
    ) -> Result<Vec<Event>, AdminError> {
        self.require_owner(caller)?;
        if token == Address::ZERO || sponsor == Address::ZERO {
            return Err(AdminError::ZeroIdentity);
        }
        if amount.is_zero() {
            self.sponsor_allowances.remove(&(token, sponsor));
        } else {
            self.sponsor_allowances.insert((token, sponsor), amount);
        }
        info!(account = %self.account, %token, %sponsor, %amount, "sponsor allowance granted");
        Ok(vec![Event::AllowanceGranted {
            token,
            sponsor,
            amount,
        }])
    }

    fn require_owner(&self, caller: Address) -> Result<(), AdminError> {
        if caller != self.owner {
            debug!(account = %self.account, %caller, "admin call from non-owner");
            return Err(AdminError::UnauthorizedCaller { caller });
        }
        Ok(())
    }
}
