//! Error type shared by the signing operations

use thiserror::Error;

use super::signature::SignatureError;
use super::typed_data::TypedDataError;
use crate::address::AddressError;
use crate::crypto::KeyError;

/// Errors returned by message, transaction and typed-data signing
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SignError {
    #[error("Expected hex input: {0}")]
    InvalidHexInput(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Address checksum mismatch")]
    ChecksumMismatch,

    #[error("Invalid signature length: {0} hex chars")]
    InvalidSignatureLength(usize),

    #[error("Signature recovery failed: {0}")]
    RecoveryFailure(String),

    #[error("Signature does not match the expected address")]
    SignatureMismatch,

    #[error("Transaction is already signed")]
    AlreadySigned,

    #[error("Private key does not match the transaction owner")]
    OwnerMismatch,

    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("Transaction is not signed")]
    NotSigned,

    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("No private key supplied or configured")]
    MissingPrivateKey,

    #[error("No address supplied or configured")]
    MissingAddress,

    #[error("Typed data error: {0}")]
    TypedData(#[from] TypedDataError),
}

impl From<SignatureError> for SignError {
    fn from(err: SignatureError) -> Self {
        match err {
            SignatureError::InvalidHexInput(msg) => SignError::InvalidHexInput(msg),
            SignatureError::InvalidSignatureLength(len) => SignError::InvalidSignatureLength(len),
            SignatureError::RecoveryFailure(msg) => SignError::RecoveryFailure(msg),
        }
    }
}

impl From<KeyError> for SignError {
    fn from(err: KeyError) -> Self {
        match err {
            KeyError::InvalidKey(msg) => SignError::InvalidKey(msg),
        }
    }
}

impl From<AddressError> for SignError {
    fn from(err: AddressError) -> Self {
        match err {
            AddressError::ChecksumMismatch => SignError::ChecksumMismatch,
            other => SignError::InvalidAddress(other.to_string()),
        }
    }
}
