use alloy_primitives::Address;
use k256::ecdsa::SigningKey;
use opgate_types::{address_from_coordinates, OperationDescriptor};

use crate::encoder::EncodeError;

/// Parse a 32-byte secret key from hex, with or without a `0x` prefix.
pub fn parse_signing_key(input: &str) -> Result<SigningKey, EncodeError> {
    let trimmed = input.trim();
    let raw = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let bytes = hex::decode(raw).map_err(|e| EncodeError::InvalidHex(e.to_string()))?;
    SigningKey::from_slice(&bytes).map_err(|_| EncodeError::InvalidKey)
}

pub fn address_of(key: &SigningKey) -> Address {
    let point = key.verifying_key().to_encoded_point(false);
    address_from_coordinates(&point.as_bytes()[1..])
}

/// Sign `op` for a specific orchestrator deployment. Produces `r || s || v` with `v` in {27, 28}.
pub fn sign_operation(
    op: &OperationDescriptor,
    key: &SigningKey,
    orchestrator: Address,
    chain_id: u64,
) -> Result<OperationDescriptor, EncodeError> {
    let digest = op.signing_digest(orchestrator, chain_id);
    let (signature, recovery_id) = key
        .sign_prehash_recoverable(digest.as_slice())
        .map_err(|_| EncodeError::Signing)?;
    let mut authorization = signature.to_bytes().to_vec();
    authorization.push(recovery_id.to_byte() + 27);
    Ok(op.with_authorization(authorization))
}
