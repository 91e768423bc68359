//! Identity derivation shared by the orchestrator and requester tooling.

use alloy_primitives::{keccak256, Address};

/// Address of a secp256k1 public key given as its 64-byte `x || y` coordinates: the low 20
/// bytes of their keccak256.
pub fn address_from_coordinates(xy: &[u8]) -> Address {
    let hash = keccak256(xy);
    Address::from_slice(&hash[12..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_takes_low_twenty_bytes() {
        let xy = [7u8; 64];
        assert_eq!(
            address_from_coordinates(&xy).as_slice(),
            &keccak256(xy)[12..]
        );
    }
}
