//! Message, transaction and typed-data signing
//!
//! This module provides:
//! - Digest construction for headers, transaction IDs and typed data
//! - The recoverable signature codec
//! - Stateless signing and verification functions
//! - A config-bound [`Signer`]

pub mod digest;
pub mod error;
pub mod service;
pub mod signature;
pub mod signer;
pub mod typed_data;

pub use digest::{
    message_digest, message_digest_v2, message_header, ETH_MESSAGE_HEADER, LINDA_MESSAGE_HEADER,
    LINDA_MESSAGE_PREFIX,
};
pub use error::SignError;
pub use service::{
    ec_recover, sign, sign_message, sign_message_v2, sign_transaction, sign_typed_data,
    typed_data_digest, verify_message, verify_message_v2, verify_signature, verify_typed_data,
    verify_typed_data_signature, Recovered, Signable, Signed,
};
pub use signature::{Signature, SignatureError};
pub use signer::{ConfigError, Signer, SignerConfig};
pub use typed_data::{hash_typed_data, TypeMap, TypedData, TypedDataDomain, TypedDataError, TypedDataField};
