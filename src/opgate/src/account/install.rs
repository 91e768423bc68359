//! Account provisioning from packed install data.
//!
//! Layout:
//! - `u8 version = 1`
//! - `bytes20 owner`
//! - `u8 count`
//! - `count * bytes20` additional signers

use alloy_primitives::Address;
use opgate_types::{InstallError, INSTALL_DATA_VERSION};
use tracing::{debug, info};

use crate::{
    account::AccountPolicyStore,
    utils::bytes::{read_address, read_u8},
};

impl AccountPolicyStore {
    /// Provision a store for `account` trusting `orchestrator`, from packed install data.
    ///
    /// Duplicate signers and a repeated owner are folded into the set.
    pub fn install(
        account: Address,
        orchestrator: Address,
        data: &[u8],
    ) -> Result<Self, InstallError> {
        let mut i = 0usize;
        let version = read_u8(data, &mut i)?;
        if version != INSTALL_DATA_VERSION {
            return Err(InstallError::UnsupportedVersion(version));
        }
        let owner = read_address(data, &mut i)?;
        let count = read_u8(data, &mut i)?;
        let mut signers = Vec::with_capacity(count as usize);
        for _ in 0..count {
            signers.push(read_address(data, &mut i)?);
        }
        if i != data.len() {
            return Err(InstallError::TrailingBytes);
        }

        let mut store = AccountPolicyStore::new(account, orchestrator, owner)
            .map_err(|_| InstallError::ZeroIdentity)?;
        for signer in signers {
            if signer == Address::ZERO {
                return Err(InstallError::ZeroIdentity);
            }
            if !store.insert_signer(signer) {
                debug!(%account, %signer, "signer listed more than once in install data");
            }
        }
        info!(%account, %owner, signers = store.signers().count(), "account installed");
        Ok(store)
    }
}
