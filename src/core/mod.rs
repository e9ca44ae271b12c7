//! Core transaction types
//!
//! This module contains:
//! - The node-API transaction model
//! - Structural checks applied before signing and recovery

pub mod checker;
pub mod transaction;

pub use checker::{BasicChecker, TransactionChecker};
pub use transaction::{ContractEntry, ContractParameter, RawData, Transaction};
