//! Account validator.
//!
//! Gates, in order, each aborting with no effect:
//! 1. caller must be the account's orchestrator
//! 2. claimed sequence must equal the stored counter
//! 3. authorization must be at least a signature long and recover, from the descriptor's own
//!    signing digest, to an authorized signer
//! 4. sponsor data, when present, must carry a full identifier
//!
//! Only then is the counter advanced, by exactly one.

use alloy_primitives::{Address, U256};
use opgate_types::{Event, OperationDescriptor, ValidationError, MIN_SIGNATURE_LEN};
use tracing::{debug, info};

use crate::{account::AccountPolicyStore, utils::crypto::SignatureVerifier};

/// Result of the read-only gates; consumed by [`AccountValidator::commit`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckedOperation {
    pub account: Address,
    pub sequence: U256,
    pub signer: Address,
    pub sponsor: Option<Address>,
}

/// Validator for one chain. Signatures are checked against the descriptor hashed for the
/// store's orchestrator and this chain id.
#[derive(Clone, Debug, Default)]
pub struct AccountValidator<V> {
    verifier: V,
    chain_id: u64,
}

impl<V: SignatureVerifier> AccountValidator<V> {
    pub fn new(verifier: V, chain_id: u64) -> Self {
        Self { verifier, chain_id }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Run every gate and commit the sequence on success.
    pub fn validate(
        &self,
        caller: Address,
        op: &OperationDescriptor,
        store: &mut AccountPolicyStore,
    ) -> Result<Vec<Event>, ValidationError> {
        let checked = self.check(caller, op, store)?;
        self.commit(caller, &checked, store)
    }

    /// Every gate, no mutation.
    pub fn check(
        &self,
        caller: Address,
        op: &OperationDescriptor,
        store: &AccountPolicyStore,
    ) -> Result<CheckedOperation, ValidationError> {
        require_orchestrator(caller, store)?;
        if op.account() != store.account() {
            return Err(ValidationError::UnknownAccount(op.account()));
        }

        let expected = store.sequence_counter();
        if op.sequence() != expected {
            debug!(account = %op.account(), %expected, claimed = %op.sequence(), "sequence mismatch");
            return Err(ValidationError::InvalidSequence {
                expected,
                claimed: op.sequence(),
            });
        }

        let authorization = op.authorization();
        if authorization.len() < MIN_SIGNATURE_LEN {
            return Err(ValidationError::MalformedAuthorization {
                len: authorization.len(),
            });
        }
        let digest = op.signing_digest(store.orchestrator(), self.chain_id);
        let signer = match self.verifier.recover(digest, authorization) {
            Ok(signer) => signer,
            Err(err) => {
                debug!(account = %op.account(), %err, "authorization did not recover");
                return Err(ValidationError::UnauthorizedSigner { recovered: None });
            }
        };
        if !store.is_signer(&signer) {
            debug!(account = %op.account(), %signer, "recovered identity is not a signer");
            return Err(ValidationError::UnauthorizedSigner {
                recovered: Some(signer),
            });
        }

        let sponsor = op.sponsor()?;

        Ok(CheckedOperation {
            account: op.account(),
            sequence: op.sequence(),
            signer,
            sponsor,
        })
    }

    /// Consume the sequence for an operation that passed [`AccountValidator::check`].
    ///
    /// The counter is re-checked so a stale `CheckedOperation` can never be committed twice.
    pub fn commit(
        &self,
        caller: Address,
        checked: &CheckedOperation,
        store: &mut AccountPolicyStore,
    ) -> Result<Vec<Event>, ValidationError> {
        require_orchestrator(caller, store)?;
        if checked.account != store.account() {
            return Err(ValidationError::UnknownAccount(checked.account));
        }
        let expected = store.sequence_counter();
        let stale = ValidationError::InvalidSequence {
            expected,
            claimed: checked.sequence,
        };
        if checked.sequence != expected {
            return Err(stale);
        }
        let sequence = store.consume_sequence().ok_or(stale)?;

        let mut events = Vec::with_capacity(2);
        if let Some(sponsor) = checked.sponsor {
            events.push(Event::SponsorEngaged { sponsor });
        }
        events.push(Event::OperationValidated {
            account: checked.account,
            sequence,
        });
        info!(account = %checked.account, %sequence, signer = %checked.signer, "operation validated");
        Ok(events)
    }
}

fn require_orchestrator(caller: Address, store: &AccountPolicyStore) -> Result<(), ValidationError> {
    if caller != store.orchestrator() {
        debug!(account = %store.account(), %caller, "validator called by non-orchestrator");
        return Err(ValidationError::UnauthorizedCaller { caller });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{tests::fixtures, utils::crypto::EcdsaRecovery};

    const CHAIN_ID: u64 = 31337;

    struct Setup {
        store: AccountPolicyStore,
        owner: k256::ecdsa::SigningKey,
        validator: AccountValidator<EcdsaRecovery>,
    }

    fn setup() -> Setup {
        let owner = fixtures::key(1);
        let store = AccountPolicyStore::new(
            fixtures::ACCOUNT,
            fixtures::ORCHESTRATOR,
            fixtures::address_of(&owner),
        )
        .unwrap();
        Setup {
            store,
            owner,
            validator: AccountValidator::new(EcdsaRecovery, CHAIN_ID),
        }
    }

    #[test]
    fn test_validate_commits_sequence() {
        let mut s = setup();
        let op = fixtures::signed_op(&s.owner, fixtures::ACCOUNT, 0, CHAIN_ID);
        let events = s
            .validator
            .validate(fixtures::ORCHESTRATOR, &op, &mut s.store)
            .unwrap();
        assert_eq!(
            events,
            vec![Event::OperationValidated {
                account: fixtures::ACCOUNT,
                sequence: U256::ZERO
            }]
        );
        assert_eq!(s.store.sequence_counter(), U256::from(1u64));
    }

    #[test]
    fn test_non_orchestrator_rejected_first() {
        let mut s = setup();
        // Stale sequence and bad signature too; the caller gate must win.
        let op = OperationDescriptor::builder(fixtures::ACCOUNT, U256::from(9u64)).build();
        let stranger = Address::repeat_byte(0x66);
        assert_eq!(
            s.validator.validate(stranger, &op, &mut s.store),
            Err(ValidationError::UnauthorizedCaller { caller: stranger })
        );
        assert_eq!(s.store.sequence_counter(), U256::ZERO);
    }

    #[test]
    fn test_gate_order() {
        let mut s = setup();
        let wrong_seq = OperationDescriptor::builder(fixtures::ACCOUNT, U256::from(1u64)).build();
        assert_eq!(
            s.validator
                .validate(fixtures::ORCHESTRATOR, &wrong_seq, &mut s.store),
            Err(ValidationError::InvalidSequence {
                expected: U256::ZERO,
                claimed: U256::from(1u64)
            })
        );

        let short_sig = OperationDescriptor::builder(fixtures::ACCOUNT, U256::ZERO)
            .authorization(vec![1u8; 64])
            .build();
        assert_eq!(
            s.validator
                .validate(fixtures::ORCHESTRATOR, &short_sig, &mut s.store),
            Err(ValidationError::MalformedAuthorization { len: 64 })
        );
        assert_eq!(s.store.sequence_counter(), U256::ZERO);
    }

    #[test]
    fn test_non_member_signer_rejected() {
        let mut s = setup();
        let mallory = fixtures::key(7);
        let op = fixtures::signed_op(&mallory, fixtures::ACCOUNT, 0, CHAIN_ID);
        assert_eq!(
            s.validator
                .validate(fixtures::ORCHESTRATOR, &op, &mut s.store),
            Err(ValidationError::UnauthorizedSigner {
                recovered: Some(fixtures::address_of(&mallory))
            })
        );
        assert_eq!(s.store.sequence_counter(), U256::ZERO);
    }

    #[test]
    fn test_sponsor_engaged_event() {
        let mut s = setup();
        let sponsor = Address::repeat_byte(0x50);
        let unsigned = OperationDescriptor::builder(fixtures::ACCOUNT, U256::ZERO)
            .sponsor_data(sponsor.to_vec())
            .build();
        let op = fixtures::sign(&s.owner, &unsigned, CHAIN_ID);
        let events = s
            .validator
            .validate(fixtures::ORCHESTRATOR, &op, &mut s.store)
            .unwrap();
        assert_eq!(events[0], Event::SponsorEngaged { sponsor });
    }

    #[test]
    fn test_short_sponsor_data_rejected_without_commit() {
        let mut s = setup();
        let unsigned = OperationDescriptor::builder(fixtures::ACCOUNT, U256::ZERO)
            .sponsor_data(vec![0x50; 12])
            .build();
        let op = fixtures::sign(&s.owner, &unsigned, CHAIN_ID);
        assert_eq!(
            s.validator
                .validate(fixtures::ORCHESTRATOR, &op, &mut s.store),
            Err(ValidationError::MalformedSponsorData { len: 12 })
        );
        assert_eq!(s.store.sequence_counter(), U256::ZERO);
    }

    #[test]
    fn test_stale_check_cannot_commit_twice() {
        let mut s = setup();
        let op = fixtures::signed_op(&s.owner, fixtures::ACCOUNT, 0, CHAIN_ID);
        let checked = s
            .validator
            .check(fixtures::ORCHESTRATOR, &op, &s.store)
            .unwrap();
        s.validator
            .commit(fixtures::ORCHESTRATOR, &checked, &mut s.store)
            .unwrap();
        assert_eq!(
            s.validator
                .commit(fixtures::ORCHESTRATOR, &checked, &mut s.store),
            Err(ValidationError::InvalidSequence {
                expected: U256::from(1u64),
                claimed: U256::ZERO
            })
        );
        assert_eq!(s.store.sequence_counter(), U256::from(1u64));
    }

    #[test]
    fn test_authorization_is_bound_to_descriptor() {
        let mut s = setup();
        let signed = fixtures::signed_op(&s.owner, fixtures::ACCOUNT, 0, CHAIN_ID);
        let swapped = OperationDescriptor::builder(fixtures::ACCOUNT, U256::ZERO)
            .payload(vec![0xde, 0xad, 0xbe, 0xef])
            .authorization(signed.authorization().clone())
            .build();
        assert!(matches!(
            s.validator
                .validate(fixtures::ORCHESTRATOR, &swapped, &mut s.store),
            Err(ValidationError::UnauthorizedSigner { .. })
        ));
        assert_eq!(s.store.sequence_counter(), U256::ZERO);
    }

    #[test]
    fn test_signature_for_other_chain_rejected() {
        let mut s = setup();
        let op = fixtures::signed_op(&s.owner, fixtures::ACCOUNT, 0, CHAIN_ID + 1);
        assert!(matches!(
            s.validator.validate(fixtures::ORCHESTRATOR, &op, &mut s.store),
            Err(ValidationError::UnauthorizedSigner { .. })
        ));
    }
}
