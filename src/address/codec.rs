//! Address derivation and validation helpers
//!
//! Key-to-address derivation comes in two explicit flavours:
//! [`derive_strict`] fails on malformed keys, [`derive_lenient`] salvages
//! what it can and may yield an address for a different key.

use super::address::{Address, AddressError, ADDRESS_HEX_LEN, ADDRESS_PREFIX};
use crate::crypto::{keccak256, public_key_to_address, KeyError, KeyMaterial};

/// Derive the address for a private or public key, failing on any
/// malformed input.
pub fn derive_strict(key: &str) -> Result<Address, KeyError> {
    let material = KeyMaterial::parse(key)?;
    Ok(public_key_to_address(&material.public_key()))
}

/// Best-effort derivation: non-hex noise is skipped and short private keys
/// are left-padded. Returns `None` only when no usable key remains.
pub fn derive_lenient(key: &str) -> Option<Address> {
    let material = KeyMaterial::parse_lenient(key)?;
    Some(public_key_to_address(&material.public_key()))
}

impl Address {
    /// Mixed-case checksum rendering: `41` followed by the EIP-55 form of
    /// the 20-byte identifier.
    pub fn to_checksum_hex(&self) -> String {
        let lower = hex::encode(self.eth_bytes());
        let hash = keccak256(lower.as_bytes());

        let mut out = String::with_capacity(ADDRESS_HEX_LEN);
        out.push_str(&hex::encode([ADDRESS_PREFIX]));
        for (i, c) in lower.chars().enumerate() {
            let nibble = if i % 2 == 0 {
                hash[i / 2] >> 4
            } else {
                hash[i / 2] & 0x0f
            };
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

/// Checksum rendering of a hex or base58 address
pub fn to_checksum_address(address_like: &str) -> Result<String, AddressError> {
    let address = Address::parse(address_like)
        .map_err(|_| AddressError::InvalidAddress(address_like.to_string()))?;
    Ok(address.to_checksum_hex())
}

/// True when `candidate` is a hex address written in its exact checksum case
pub fn is_checksum_address(candidate: &str) -> bool {
    if candidate.len() != ADDRESS_HEX_LEN || !candidate.chars().all(|c| c.is_ascii_hexdigit()) {
        return false;
    }
    match to_checksum_address(candidate) {
        Ok(checksummed) => checksummed == candidate,
        Err(_) => false,
    }
}

/// True for a well-formed hex (42 chars) or base58check (25-34 chars) address
pub fn is_address(candidate: &str) -> bool {
    match candidate.len() {
        ADDRESS_HEX_LEN => Address::from_hex(candidate).is_ok(),
        25..=34 => Address::from_base58(candidate).is_ok(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_ONE: &str = "0000000000000000000000000000000000000000000000000000000000000001";
    const KEY_ONE_BASE58: &str = "TMVQGm1qAQYVdetCeGRRkTWYYrLXuHK2HC";
    const KEY_ONE_CHECKSUM: &str = "417E5F4552091A69125d5DfCb7b8C2659029395Bdf";

    #[test]
    fn test_derive_strict() {
        let address = derive_strict(KEY_ONE).unwrap();
        assert_eq!(address.to_base58(), KEY_ONE_BASE58);

        assert!(derive_strict("test").is_err());
        assert!(derive_strict(&KEY_ONE[2..]).is_err());
    }

    #[test]
    fn test_derive_lenient_salvages_input() {
        assert_eq!(
            derive_lenient(&format!("  {}\n", KEY_ONE)).map(|a| a.to_base58()),
            Some(KEY_ONE_BASE58.to_string())
        );
        // Short input is read as a number, so "01" is the scalar one
        assert_eq!(
            derive_lenient("01").map(|a| a.to_base58()),
            Some(KEY_ONE_BASE58.to_string())
        );
        assert_eq!(derive_lenient("1"), None);
        assert_eq!(derive_lenient("zzzz"), None);
    }

    #[test]
    fn test_same_key_same_address() {
        let a = derive_strict(KEY_ONE).unwrap();
        let b = derive_strict(&format!("0x{}", KEY_ONE)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_to_checksum_address() {
        assert_eq!(to_checksum_address(KEY_ONE_BASE58).unwrap(), KEY_ONE_CHECKSUM);
        assert_eq!(
            to_checksum_address("417e5f4552091a69125d5dfcb7b8c2659029395bdf").unwrap(),
            KEY_ONE_CHECKSUM
        );

        let err = to_checksum_address("not a valid address").unwrap_err();
        assert_eq!(
            err.to_string(),
            "'not a valid address' is not a valid address string"
        );
    }

    #[test]
    fn test_checksum_lowercases_back_to_hex() {
        let address = derive_strict(KEY_ONE).unwrap();
        assert_eq!(address.to_checksum_hex().to_lowercase(), address.to_hex());
    }

    #[test]
    fn test_is_checksum_address() {
        assert!(is_checksum_address(KEY_ONE_CHECKSUM));
        assert!(!is_checksum_address("417e5f4552091a69125d5dfcb7b8c2659029395bdf"));
        assert!(!is_checksum_address(KEY_ONE_BASE58));
        assert!(!is_checksum_address(""));
    }

    #[test]
    fn test_is_address_base58() {
        assert!(is_address("TYPG8VeuoVAh2hP7Vfw6ww7vK98nvXXXUG"));
        assert!(!is_address("TYPG8VeuoVAh2hP7Vfw6ww7vK98nvXXXUs"));
        assert!(!is_address("TYPG8VeuoVAh2hP7Vfw6ww7vK98nvXXXUG89"));
        assert!(!is_address("aYPG8VeuoVAh2hP7Vfw6ww7vK98nvXXXUG"));
    }

    #[test]
    fn test_is_address_hex() {
        assert!(is_address("4165cfbd57fa4f20687b2c33f84c4f9017e5895d49"));
        assert!(!is_address("0x65cfbd57fa4f20687b2c33f84c4f9017e5895d49"));
        assert!(!is_address("4165cfbd57fa4f20687b2c33f84c4f9017e589"));
        assert!(!is_address("4165cfbd57fa4f20687b2c33f84c4f9017e5895d4998"));
        assert!(!is_address(""));
    }
}
