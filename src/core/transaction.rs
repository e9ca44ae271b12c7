//! Transaction model as exchanged with a node's HTTP API
//!
//! Only the fields the signing stack reads are typed; everything else in
//! the node's JSON is carried through untouched so a transaction survives
//! a deserialize/serialize cycle byte-for-byte in meaning.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::signing::digest::transaction_digest;

// =============================================================================
// Contract entries
// =============================================================================

/// `raw_data.contract[i].parameter`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContractParameter {
    /// Contract-specific payload; always carries `owner_address`
    #[serde(default)]
    pub value: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One entry of `raw_data.contract`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContractEntry {
    pub parameter: ContractParameter,
    #[serde(rename = "type", default)]
    pub contract_type: String,
    /// Permission the signatures are checked against (0 / absent = owner)
    #[serde(
        rename = "Permission_id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub permission_id: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContractEntry {
    /// `parameter.value.owner_address`, hex or base58
    pub fn owner_address(&self) -> Option<&str> {
        self.parameter.value.get("owner_address")?.as_str()
    }
}

/// `raw_data`; expiration, ref block fields etc. stay in `extra`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawData {
    pub contract: Vec<ContractEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// =============================================================================
// Transaction
// =============================================================================

/// A transaction plus its accumulated signatures
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    /// sha256 of the protobuf-encoded raw data, computed by the encoder
    #[serde(rename = "txID")]
    pub tx_id: String,
    pub raw_data: RawData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_data_hex: Option<String>,
    /// Transaction-form signatures (hex, no `0x`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Transaction {
    /// Parse a node JSON value; `None` when it does not have transaction shape
    pub fn from_value(value: Value) -> Option<Self> {
        serde_json::from_value(value).ok()
    }

    /// First contract entry, the one that carries owner and permission
    pub fn first_contract(&self) -> Option<&ContractEntry> {
        self.raw_data.contract.first()
    }

    /// Owner address of the first contract entry
    pub fn owner_address(&self) -> Option<&str> {
        self.first_contract()?.owner_address()
    }

    /// `Permission_id` of the first contract entry
    pub fn permission_id(&self) -> Option<u32> {
        self.first_contract()?.permission_id
    }

    /// Attach a permission id to the first contract entry
    pub fn set_permission_id(&mut self, permission_id: u32) {
        if let Some(contract) = self.raw_data.contract.first_mut() {
            contract.permission_id = Some(permission_id);
        }
    }

    /// Signatures gathered so far
    pub fn signatures(&self) -> &[String] {
        self.signature.as_deref().unwrap_or(&[])
    }

    /// True once at least one signature is present
    pub fn is_signed(&self) -> bool {
        !self.signatures().is_empty()
    }

    /// The digest signers sign: the decoded `txID`
    pub fn digest(&self) -> Option<[u8; 32]> {
        transaction_digest(&self.tx_id)
    }

    /// Append a signature; `txID` and `raw_data` are left untouched
    pub fn push_signature(&mut self, signature: String) {
        self.signature.get_or_insert_with(Vec::new).push(signature);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::crypto::sha256_hex;
    use serde_json::json;

    /// A transfer transaction whose txID matches its raw_data_hex
    pub fn transfer_from(owner: &str) -> Transaction {
        let raw_data_hex = format!("0a02{}", hex::encode(owner.as_bytes()));
        let tx_id = sha256_hex(&hex::decode(&raw_data_hex).unwrap());
        serde_json::from_value(json!({
            "visible": false,
            "txID": tx_id,
            "raw_data": {
                "contract": [{
                    "parameter": {
                        "value": {
                            "amount": 1000,
                            "owner_address": owner,
                            "to_address": "41928c9af0651632157ef27a2cf17ca72c575a4d28"
                        },
                        "type_url": "type.googleapis.com/protocol.TransferContract"
                    },
                    "type": "TransferContract"
                }],
                "ref_block_bytes": "7ac7",
                "ref_block_hash": "4d9bb8f8c9c59ac3",
                "expiration": 1_700_000_060_000u64,
                "timestamp": 1_700_000_000_000u64
            },
            "raw_data_hex": raw_data_hex
        }))
        .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::transfer_from;
    use super::*;

    const OWNER: &str = "417e5f4552091a69125d5dfcb7b8c2659029395bdf";

    #[test]
    fn test_round_trip_preserves_unknown_fields() {
        let tx = transfer_from(OWNER);
        let value = serde_json::to_value(&tx).unwrap();
        assert_eq!(value["raw_data"]["ref_block_bytes"], "7ac7");
        assert_eq!(
            value["raw_data"]["contract"][0]["parameter"]["value"]["amount"],
            1000
        );
        assert!(value.get("signature").is_none());

        let back: Transaction = serde_json::from_value(value).unwrap();
        assert_eq!(back, tx);
    }

    #[test]
    fn test_accessors() {
        let mut tx = transfer_from(OWNER);
        assert_eq!(tx.owner_address(), Some(OWNER));
        assert_eq!(tx.permission_id(), None);
        assert!(!tx.is_signed());
        assert!(tx.digest().is_some());

        tx.set_permission_id(2);
        assert_eq!(tx.permission_id(), Some(2));
        let value = serde_json::to_value(&tx).unwrap();
        assert_eq!(value["raw_data"]["contract"][0]["Permission_id"], 2);
    }

    #[test]
    fn test_push_signature_keeps_id() {
        let mut tx = transfer_from(OWNER);
        let id = tx.tx_id.clone();
        let raw = tx.raw_data.clone();

        tx.push_signature("aa".repeat(65));
        tx.push_signature("bb".repeat(65));

        assert_eq!(tx.signatures().len(), 2);
        assert_eq!(tx.tx_id, id);
        assert_eq!(tx.raw_data, raw);
    }

    #[test]
    fn test_from_value_rejects_non_transactions() {
        assert!(Transaction::from_value(serde_json::json!({ "foo": 1 })).is_none());
        assert!(Transaction::from_value(serde_json::json!("0xdead")).is_none());
    }
}
