//! Requester-side tooling: everything needed to produce bytes the orchestrator accepts.

pub mod encoder;
pub mod keys;


pub use encoder::{
    batch_payload, build_sponsor_data, encode_install_data, single_call_payload, EncodeError,
};
pub use keys::{address_of, parse_signing_key, sign_operation};
