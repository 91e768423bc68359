use alloy_primitives::{Address, Bytes, U256};
use opgate_types::{
    calls::{encode_execute, encode_execute_batch},
    Call, INSTALL_DATA_VERSION,
};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("install data holds at most 255 extra signers, got {got}")]
    TooManySigners { got: usize },
    #[error("invalid hex: {0}")]
    InvalidHex(String),
    #[error("invalid secp256k1 secret key")]
    InvalidKey,
    #[error("signing failed")]
    Signing,
}

/// Pack account install data: `u8 version || bytes20 owner || u8 count || count * bytes20`.
pub fn encode_install_data(owner: Address, signers: &[Address]) -> Result<Vec<u8>, EncodeError> {
    let count =
        u8::try_from(signers.len()).map_err(|_| EncodeError::TooManySigners { got: signers.len() })?;
    let mut buf = Vec::with_capacity(22 + signers.len() * 20);
    buf.push(INSTALL_DATA_VERSION);
    buf.extend_from_slice(owner.as_slice());
    buf.push(count);
    for signer in signers {
        buf.extend_from_slice(signer.as_slice());
    }
    Ok(buf)
}

/// Sponsor identifier followed by opaque bytes handed to the sponsor at settlement.
pub fn build_sponsor_data(sponsor: Address, aux: &[u8]) -> Bytes {
    let mut buf = Vec::with_capacity(20 + aux.len());
    buf.extend_from_slice(sponsor.as_slice());
    buf.extend_from_slice(aux);
    buf.into()
}

pub fn single_call_payload(target: Address, value: U256, data: impl Into<Bytes>) -> Bytes {
    encode_execute(&Call {
        target,
        value,
        payload: data.into(),
    })
}

/// `executeBatch` payload with one entry per call, order preserved.
pub fn batch_payload(calls: &[Call]) -> Bytes {
    let targets = calls.iter().map(|c| c.target).collect();
    let values = calls.iter().map(|c| c.value).collect();
    let payloads = calls.iter().map(|c| c.payload.clone()).collect();
    encode_execute_batch(targets, values, payloads)
}
