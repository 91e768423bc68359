//! Call host: the "invoke" capability the executor forwards calls through.

pub mod memory;

use alloy_primitives::{Address, Bytes};
use opgate_types::Call;

/// What a successful forwarded call reports back.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallReceipt {
    pub units_used: u64,
    pub output: Bytes,
}

/// Environment that carries out forwarded calls.
///
/// A failing call returns its revert reason and must leave the host unchanged. Batch atomicity
/// is layered on top by the executor, which stages a batch on a clone of the host.
pub trait CallHost {
    fn invoke(&mut self, from: Address, call: &Call) -> Result<CallReceipt, String>;
}
