//! Multi-signature authorization
//!
//! Accounts may authorize transactions through non-owner permissions: a
//! set of weighted keys with a threshold. Collecting signatures under such
//! a permission needs the node's view of who may sign and who already has.
//!
//! # Example
//!
//! ```ignore
//! use linda_signer::multisig::MultiSigAuthorizer;
//!
//! let authorizer = MultiSigAuthorizer::new(transport);
//!
//! // First signer under active permission 2
//! let tx = authorizer.multi_sign(&tx, &key_a, 2).await?;
//! // Second signer; the permission is attached now
//! let tx = authorizer.multi_sign(&tx, &key_b, 2).await?;
//!
//! authorizer.send_raw_transaction(&tx).await?;
//! ```

pub mod authorizer;
pub mod permission;

use thiserror::Error;

use crate::address::AddressError;
use crate::signing::SignError;
use crate::transport::TransportError;

pub use authorizer::{LocalDraft, MultiSigAuthorizer, ServerConfirmed};
pub use permission::{
    evaluate_weight, ApprovedList, BroadcastHexReturn, BroadcastReturn, Permission, PermissionKey,
    PermissionType, ResultCode, SignWeight, TransactionExtention, WeightResult, WeightStatus,
};

/// Errors related to multisig operations
#[derive(Error, Debug)]
pub enum MultisigError {
    #[error("Permission denied: {0}")]
    Permission(String),
    #[error("Already signed by this signer")]
    AlreadySigned,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),
    #[error("Signing error: {0}")]
    Sign(#[from] SignError),
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("Address error: {0}")]
    Address(#[from] AddressError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
