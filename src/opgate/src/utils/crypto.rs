//! Signer recovery.
//!
//! The pipeline only needs "who signed this digest"; that capability sits behind
//! [`SignatureVerifier`] so hosts can plug in their own primitive. [`EcdsaRecovery`] is the
//! secp256k1 implementation used by default.

use alloy_primitives::{Address, B256};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use opgate_types::{address_from_coordinates, RecoveryError};

pub trait SignatureVerifier {
    /// Recover the identity that produced `signature` over `digest`.
    fn recover(&self, digest: B256, signature: &[u8]) -> Result<Address, RecoveryError>;
}

impl<T: SignatureVerifier + ?Sized> SignatureVerifier for &T {
    fn recover(&self, digest: B256, signature: &[u8]) -> Result<Address, RecoveryError> {
        (**self).recover(digest, signature)
    }
}

/// secp256k1 ECDSA recovery over a 65-byte `r || s || v` signature.
#[derive(Clone, Copy, Debug, Default)]
pub struct EcdsaRecovery;

impl SignatureVerifier for EcdsaRecovery {
    fn recover(&self, digest: B256, signature: &[u8]) -> Result<Address, RecoveryError> {
        recover_address(digest, signature)
    }
}

/// Recover an address from a prehashed digest.
///
/// Accepts `v` in {0, 1, 27, 28}; anything else is rejected rather than guessed.
pub fn recover_address(digest: B256, sig: &[u8]) -> Result<Address, RecoveryError> {
    if sig.len() != 65 {
        return Err(RecoveryError::InvalidLength);
    }
    let signature = Signature::from_slice(&sig[..64]).map_err(|_| RecoveryError::InvalidSignature)?;
    let v = match sig[64] {
        27 | 28 => sig[64] - 27,
        0 | 1 => sig[64],
        other => return Err(RecoveryError::InvalidRecoveryId(other)),
    };
    let recovery_id = RecoveryId::from_byte(v).ok_or(RecoveryError::InvalidRecoveryId(sig[64]))?;
    let key = VerifyingKey::recover_from_prehash(digest.as_slice(), &signature, recovery_id)
        .map_err(|_| RecoveryError::InvalidSignature)?;
    Ok(public_key_address(&key))
}

/// Ethereum-style address of a public key: low 20 bytes of keccak256(uncompressed point).
pub fn public_key_address(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    address_from_coordinates(&point.as_bytes()[1..])
}
