//! Minimal cursor-based readers for packed install data.

use alloy_primitives::Address;
use opgate_types::InstallError;

pub fn read_u8(bytes: &[u8], i: &mut usize) -> Result<u8, InstallError> {
    let b = *bytes.get(*i).ok_or(InstallError::Truncated)?;
    *i += 1;
    Ok(b)
}

pub fn read_address(bytes: &[u8], i: &mut usize) -> Result<Address, InstallError> {
    if bytes.len() < *i + 20 {
        return Err(InstallError::Truncated);
    }
    let addr = Address::from_slice(&bytes[*i..*i + 20]);
    *i += 20;
    Ok(addr)
}
