//! Cryptographic utilities
//!
//! This module provides:
//! - SHA-256 and Keccak-256 hashing
//! - ECDSA key management (secp256k1)

pub mod hash;
pub mod keys;

pub use hash::{double_sha256, keccak256, keccak256_concat, sha256, sha256_hex};
pub use keys::{parse_secret_key, public_key_to_address, KeyError, KeyMaterial, KeyPair};
