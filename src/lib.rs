//! LINDA Signer: signing, verification and multi-signature authorization
//! for LINDA ledger clients
//!
//! This crate provides:
//! - Address derivation and conversion (hex, base58check, checksum-hex)
//! - Recoverable ECDSA signatures (secp256k1) over messages and transactions
//! - Typed structured data hashing and signing
//! - Multi-signature rounds against a node through a pluggable transport
//!
//! # Example
//!
//! ```rust
//! use linda_signer::core::BasicChecker;
//! use linda_signer::crypto::KeyPair;
//! use linda_signer::signing::{Signer, SignerConfig};
//!
//! let pair = KeyPair::generate();
//! let config = SignerConfig::default()
//!     .with_private_key(&pair.private_key_hex())
//!     .unwrap();
//! let signer = Signer::new(&config, &BasicChecker);
//!
//! // Sign "hello" under the chain message header
//! let signature = signer.sign_message("0x68656c6c6f", None).unwrap();
//! assert!(signer.verify_message("0x68656c6c6f", &signature, None).unwrap());
//!
//! println!("Signed by {}", pair.address());
//! ```

pub mod address;
pub mod cli;
pub mod core;
pub mod crypto;
pub mod multisig;
pub mod signing;
pub mod transport;

// Re-export commonly used types
pub use address::{Address, AddressError};
pub use core::{BasicChecker, Transaction, TransactionChecker};
pub use crypto::{KeyError, KeyPair};
pub use multisig::{MultiSigAuthorizer, MultisigError, Permission, SignWeight, WeightStatus};
pub use signing::{Recovered, SignError, Signature, Signer, SignerConfig};
pub use transport::{Method, Transport, TransportError};
