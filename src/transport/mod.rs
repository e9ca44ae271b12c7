//! Node API transport seam
//!
//! The multi-signature flow talks to a full node through this trait. No
//! HTTP client ships with the crate; callers plug in their own.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Sign weight of a transaction under its permission
pub const GET_SIGN_WEIGHT: &str = "wallet/getsignweight";
/// Addresses that have already signed a transaction
pub const GET_APPROVED_LIST: &str = "wallet/getapprovedlist";
/// Submit a signed transaction
pub const BROADCAST_TRANSACTION: &str = "wallet/broadcasttransaction";
/// Submit a protobuf-encoded transaction as hex
pub const BROADCAST_HEX: &str = "wallet/broadcasthex";

/// HTTP method of a node request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// Transport failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("Request to {path} failed: {reason}")]
    Request { path: String, reason: String },

    #[error("Node returned status {0}")]
    Status(u16),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Request/response channel to a node
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(
        &self,
        path: &str,
        body: Option<Value>,
        method: Method,
    ) -> Result<Value, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn request(
        &self,
        path: &str,
        body: Option<Value>,
        method: Method,
    ) -> Result<Value, TransportError> {
        (**self).request(path, body, method).await
    }
}
