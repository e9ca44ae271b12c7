//! Structural validation of transactions before they are signed or recovered

use super::transaction::Transaction;
use crate::crypto::sha256;

/// Decides whether a transaction has the shape required for signing.
///
/// Full protobuf re-encoding of `raw_data` belongs to the transaction
/// encoder; implementations plug that in here.
pub trait TransactionChecker: Send + Sync {
    fn is_structurally_valid(&self, transaction: &Transaction) -> bool;
}

/// Default checker: at least one contract with an owner, a 32-byte `txID`,
/// and when `raw_data_hex` is present, `txID == sha256(raw_data_hex)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicChecker;

impl TransactionChecker for BasicChecker {
    fn is_structurally_valid(&self, transaction: &Transaction) -> bool {
        if transaction.owner_address().is_none() {
            return false;
        }

        let digest = match transaction.digest() {
            Some(digest) => digest,
            None => return false,
        };

        match &transaction.raw_data_hex {
            Some(raw_hex) => match hex::decode(raw_hex) {
                Ok(raw) => sha256(&raw) == digest,
                Err(_) => false,
            },
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transaction::test_support::transfer_from;

    const OWNER: &str = "417e5f4552091a69125d5dfcb7b8c2659029395bdf";

    #[test]
    fn test_accepts_consistent_transaction() {
        assert!(BasicChecker.is_structurally_valid(&transfer_from(OWNER)));
    }

    #[test]
    fn test_rejects_mismatched_id() {
        let mut tx = transfer_from(OWNER);
        tx.tx_id = "00".repeat(32);
        assert!(!BasicChecker.is_structurally_valid(&tx));
    }

    #[test]
    fn test_rejects_short_id() {
        let mut tx = transfer_from(OWNER);
        tx.tx_id = "abcd".to_string();
        tx.raw_data_hex = None;
        assert!(!BasicChecker.is_structurally_valid(&tx));
    }

    #[test]
    fn test_rejects_missing_owner() {
        let mut tx = transfer_from(OWNER);
        tx.raw_data.contract[0].parameter.value.remove("owner_address");
        assert!(!BasicChecker.is_structurally_valid(&tx));

        tx.raw_data.contract.clear();
        assert!(!BasicChecker.is_structurally_valid(&tx));
    }

    #[test]
    fn test_without_raw_hex_only_shape_is_checked() {
        let mut tx = transfer_from(OWNER);
        tx.raw_data_hex = None;
        tx.tx_id = "11".repeat(32);
        assert!(BasicChecker.is_structurally_valid(&tx));
    }
}
