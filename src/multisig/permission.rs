//! Account permissions and node sign-weight responses

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::MultisigError;
use crate::address::Address;
use crate::core::Transaction;
use crate::signing::{SignError, Signature};

/// Kind of an account permission
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum PermissionType {
    Owner,
    Witness,
    Active,
}

/// One weighted key of a permission
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PermissionKey {
    /// Hex (`41…`) or base58, depending on the node's `visible` setting
    pub address: String,
    pub weight: i64,
}

impl PermissionKey {
    pub fn parsed_address(&self) -> Option<Address> {
        Address::parse(&self.address).ok()
    }
}

/// A named set of weighted keys with a threshold
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Permission {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub permission_type: Option<PermissionType>,
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub permission_name: String,
    pub threshold: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operations: Option<String>,
    #[serde(default)]
    pub keys: Vec<PermissionKey>,
}

impl Permission {
    /// Weight of `address` in this permission, if it is a key
    pub fn weight_of(&self, address: &Address) -> Option<i64> {
        self.keys
            .iter()
            .find(|key| key.parsed_address().as_ref() == Some(address))
            .map(|key| key.weight)
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.weight_of(address).is_some()
    }
}

/// Result code of a sign-weight query
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultCode {
    EnoughPermission,
    NotEnoughPermission,
    SignatureFormatError,
    ComputeAddressError,
    PermissionError,
    OtherError,
    #[serde(other)]
    Unknown,
}

/// `result` member of a sign-weight response
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeightResult {
    pub code: ResultCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Transaction wrapper returned by the node
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct TransactionExtention {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction: Option<Transaction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txid: Option<String>,
}

/// Response of `wallet/getsignweight`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SignWeight {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission: Option<Permission>,
    #[serde(default)]
    pub approved_list: Vec<String>,
    #[serde(default)]
    pub current_weight: i64,
    pub result: WeightResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction: Option<TransactionExtention>,
}

impl SignWeight {
    /// Whether `address` appears in `approved_list`
    pub fn has_approved(&self, address: &Address) -> bool {
        self.approved_list
            .iter()
            .any(|approved| Address::parse(approved).ok().as_ref() == Some(address))
    }

    /// Current weight against the permission threshold
    pub fn status(&self) -> WeightStatus {
        WeightStatus {
            current_weight: self.current_weight,
            threshold: self.permission.as_ref().map_or(0, |p| p.threshold),
            approved: self
                .approved_list
                .iter()
                .filter_map(|approved| Address::parse(approved).ok())
                .collect(),
            code: self.result.code.clone(),
        }
    }
}

/// Response of `wallet/getapprovedlist`
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ApprovedList {
    #[serde(default)]
    pub approved_list: Vec<String>,
}

/// Response of `wallet/broadcasttransaction`, plus the transaction sent
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BroadcastReturn {
    #[serde(default)]
    pub result: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_deserializing)]
    pub transaction: Option<Transaction>,
}

/// Response of `wallet/broadcasthex`, plus the hex that was sent
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BroadcastHexReturn {
    #[serde(default)]
    pub result: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Decoded from the JSON string the node echoes on success
    #[serde(skip_deserializing)]
    pub transaction: Option<Transaction>,
    #[serde(skip_deserializing)]
    pub hex_transaction: String,
}

/// Accumulated weight versus threshold. Advisory only: the node decides.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeightStatus {
    pub current_weight: i64,
    pub threshold: i64,
    pub approved: BTreeSet<Address>,
    pub code: ResultCode,
}

impl WeightStatus {
    pub fn is_satisfied(&self) -> bool {
        self.threshold > 0 && self.current_weight >= self.threshold
    }

    pub fn missing(&self) -> i64 {
        (self.threshold - self.current_weight).max(0)
    }
}

/// Evaluate a transaction's signatures against `permission` locally.
///
/// Each distinct permission key counts once; signers outside the
/// permission add nothing.
pub fn evaluate_weight(
    transaction: &Transaction,
    permission: &Permission,
) -> Result<WeightStatus, MultisigError> {
    let digest = transaction.digest().ok_or_else(|| {
        MultisigError::InvalidTransaction(format!("bad txID '{}'", transaction.tx_id))
    })?;

    let mut signers = BTreeSet::new();
    for encoded in transaction.signatures() {
        let signature = Signature::decode(encoded).map_err(SignError::from)?;
        let address = signature.recover_address(&digest).map_err(SignError::from)?;
        signers.insert(address);
    }

    let approved: BTreeSet<Address> = signers
        .into_iter()
        .filter(|signer| permission.contains(signer))
        .collect();
    let current_weight = approved
        .iter()
        .filter_map(|signer| permission.weight_of(signer))
        .sum::<i64>();
    let code = if current_weight >= permission.threshold {
        ResultCode::EnoughPermission
    } else {
        ResultCode::NotEnoughPermission
    };

    Ok(WeightStatus {
        current_weight,
        threshold: permission.threshold,
        approved,
        code,
    })
}
