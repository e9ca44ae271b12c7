//! Multi-signature authorization rounds against a node
//!
//! One round moves a transaction through three states, each consuming the
//! previous one:
//!
//! 1. [`LocalDraft`]: the caller's transaction and requested permission
//! 2. [`ServerConfirmed`]: the node confirmed the signer's authority and
//!    returned its canonical copy of the transaction
//! 3. Signed: the returned [`Transaction`] with one more signature

use serde_json::Value;

use super::permission::{ApprovedList, BroadcastHexReturn, BroadcastReturn, ResultCode, SignWeight};
use super::MultisigError;
use crate::address::Address;
use crate::core::{BasicChecker, Transaction, TransactionChecker};
use crate::crypto::keys::strip_0x;
use crate::crypto::KeyPair;
use crate::signing::{sign_transaction, SignError};
use crate::transport::{
    Method, Transport, BROADCAST_HEX, BROADCAST_TRANSACTION, GET_APPROVED_LIST, GET_SIGN_WEIGHT,
};

/// The caller's transaction before the node has been consulted
#[derive(Debug, Clone)]
pub struct LocalDraft {
    transaction: Transaction,
    permission_id: u32,
    needs_confirmation: bool,
}

impl LocalDraft {
    /// Resolve the active permission: the transaction's own non-zero
    /// `Permission_id`, else the caller's, else owner (0).
    pub fn new(transaction: Transaction, requested_permission: u32) -> Self {
        let attached = transaction.permission_id().filter(|id| *id > 0);
        let (permission_id, needs_confirmation) = match attached {
            Some(id) => (id, false),
            None if requested_permission > 0 => (requested_permission, true),
            None => (0, false),
        };

        log::debug!(
            "Multi-sign draft {} uses permission {} (confirm: {})",
            transaction.tx_id,
            permission_id,
            needs_confirmation
        );

        Self {
            transaction,
            permission_id,
            needs_confirmation,
        }
    }

    pub fn permission_id(&self) -> u32 {
        self.permission_id
    }

    /// A non-owner permission that is not yet attached must be checked by the node
    pub fn needs_confirmation(&self) -> bool {
        self.needs_confirmation
    }

    /// The draft with the permission attached, as sent to the node
    pub fn request_transaction(&self) -> Transaction {
        let mut transaction = self.transaction.clone();
        if self.needs_confirmation {
            transaction.set_permission_id(self.permission_id);
        }
        transaction
    }

    /// Skip the node round; the transaction is signed as given
    pub fn confirm_locally(self) -> ServerConfirmed {
        ServerConfirmed {
            transaction: self.transaction,
            permission_id: self.permission_id,
        }
    }

    /// Check the node's sign-weight answer for `signer` and adopt the
    /// node's transaction.
    ///
    /// # Errors
    /// - `Permission` when the node reports a permission error or the signer
    ///   holds no key in the permission
    /// - `NotFound` when the response carries no permission
    /// - `AlreadySigned` when the signer is in the approved list
    /// - `InvalidTransaction` when the response carries no transaction
    pub fn confirm(
        self,
        weight: SignWeight,
        signer: &Address,
    ) -> Result<ServerConfirmed, MultisigError> {
        if weight.result.code == ResultCode::PermissionError {
            let message = weight
                .result
                .message
                .unwrap_or_else(|| "permission error".to_string());
            log::warn!("Node rejected permission {}: {}", self.permission_id, message);
            return Err(MultisigError::Permission(message));
        }

        let permission = weight.permission.as_ref().ok_or_else(|| {
            MultisigError::NotFound(format!("permission {}", self.permission_id))
        })?;

        if !permission.contains(signer) {
            log::warn!(
                "{} holds no key in permission {}",
                signer,
                self.permission_id
            );
            return Err(MultisigError::Permission(format!(
                "{} has no permission to sign",
                signer
            )));
        }

        if weight.has_approved(signer) {
            log::warn!("{} already approved {}", signer, self.transaction.tx_id);
            return Err(MultisigError::AlreadySigned);
        }

        let mut transaction = weight
            .transaction
            .and_then(|ext| ext.transaction)
            .ok_or_else(|| {
                MultisigError::InvalidTransaction("node returned no transaction".to_string())
            })?;
        transaction.set_permission_id(self.permission_id);

        Ok(ServerConfirmed {
            transaction,
            permission_id: self.permission_id,
        })
    }
}

/// A transaction whose signer authority has been settled
#[derive(Debug, Clone)]
pub struct ServerConfirmed {
    transaction: Transaction,
    permission_id: u32,
}

impl ServerConfirmed {
    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    pub fn permission_id(&self) -> u32 {
        self.permission_id
    }

    /// Append one signature, producing the signed transaction
    pub fn sign(
        self,
        private_key: &str,
        checker: &dyn TransactionChecker,
    ) -> Result<Transaction, MultisigError> {
        Ok(sign_transaction(&self.transaction, private_key, true, checker)?)
    }
}

/// Drives multi-signature rounds over a [`Transport`]
pub struct MultiSigAuthorizer<T: Transport> {
    transport: T,
    checker: Box<dyn TransactionChecker>,
}

impl<T: Transport> MultiSigAuthorizer<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            checker: Box::new(BasicChecker),
        }
    }

    pub fn with_checker(mut self, checker: Box<dyn TransactionChecker>) -> Self {
        self.checker = checker;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Add the signature of `private_key` under `permission_id`.
    ///
    /// The node is only consulted when a non-owner permission has to be
    /// attached; the weight threshold is not enforced here.
    pub async fn multi_sign(
        &self,
        transaction: &Transaction,
        private_key: &str,
        permission_id: u32,
    ) -> Result<Transaction, MultisigError> {
        let draft = LocalDraft::new(transaction.clone(), permission_id);

        let confirmed = if draft.needs_confirmation() {
            let signer = KeyPair::from_private_key_hex(private_key)
                .map_err(SignError::from)?
                .address();
            let request = draft.request_transaction();
            let weight = self.get_sign_weight(&request, Some(draft.permission_id())).await?;
            draft.confirm(weight, &signer)?
        } else {
            draft.confirm_locally()
        };

        confirmed.sign(private_key, self.checker.as_ref())
    }

    /// Query the node for the transaction's sign weight.
    ///
    /// `permission_id` is attached when given; otherwise a transaction
    /// without one is sent as owner (0).
    pub async fn get_sign_weight(
        &self,
        transaction: &Transaction,
        permission_id: Option<u32>,
    ) -> Result<SignWeight, MultisigError> {
        let mut request = transaction.clone();
        match permission_id {
            Some(id) => request.set_permission_id(id),
            None if request.permission_id().is_none() => request.set_permission_id(0),
            None => {}
        }

        let response = self.post(GET_SIGN_WEIGHT, &request).await?;
        Ok(serde_json::from_value(response)?)
    }

    /// Addresses that have already signed the transaction
    pub async fn get_approved_list(
        &self,
        transaction: &Transaction,
    ) -> Result<Vec<String>, MultisigError> {
        let response = self.post(GET_APPROVED_LIST, transaction).await?;
        let list: ApprovedList = serde_json::from_value(response)?;
        Ok(list.approved_list)
    }

    /// Broadcast a signed transaction
    pub async fn send_raw_transaction(
        &self,
        transaction: &Transaction,
    ) -> Result<BroadcastReturn, MultisigError> {
        if !transaction.is_signed() {
            return Err(SignError::NotSigned.into());
        }

        let response = self.post(BROADCAST_TRANSACTION, transaction).await?;
        let mut result: BroadcastReturn = serde_json::from_value(response)?;
        if !result.result {
            log::warn!(
                "Broadcast of {} rejected: {}",
                transaction.tx_id,
                result.code.as_deref().unwrap_or("unknown")
            );
        }
        result.transaction = Some(transaction.clone());
        Ok(result)
    }

    /// Broadcast a protobuf-encoded transaction given as hex.
    ///
    /// On success the node echoes the transaction as a JSON string, which is
    /// decoded into [`BroadcastHexReturn::transaction`].
    pub async fn send_hex_transaction(
        &self,
        hex_transaction: &str,
    ) -> Result<BroadcastHexReturn, MultisigError> {
        let digits = strip_0x(hex_transaction);
        if digits.is_empty() || hex::decode(digits).is_err() {
            return Err(MultisigError::InvalidTransaction(format!(
                "expected hex transaction, got '{}'",
                hex_transaction
            )));
        }

        let body = serde_json::json!({ "transaction": digits });
        let response = self
            .transport
            .request(BROADCAST_HEX, Some(body), Method::Post)
            .await?;
        let echoed = response
            .get("transaction")
            .and_then(Value::as_str)
            .map(str::to_string);

        let mut result: BroadcastHexReturn = serde_json::from_value(response)?;
        result.hex_transaction = digits.to_string();
        if !result.result {
            log::warn!(
                "Hex broadcast rejected: {}",
                result.code.as_deref().unwrap_or("unknown")
            );
            return Ok(result);
        }

        if let Some(echoed) = echoed {
            result.transaction = Some(serde_json::from_str(&echoed)?);
        }
        Ok(result)
    }

    async fn post(&self, path: &str, transaction: &Transaction) -> Result<Value, MultisigError> {
        let body = serde_json::to_value(transaction)?;
        Ok(self.transport.request(path, Some(body), Method::Post).await?)
    }
}
