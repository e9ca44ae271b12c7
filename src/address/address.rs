//! The 21-byte ledger address and its hex / base58check renderings

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::crypto::double_sha256;
use crate::crypto::keys::strip_0x;

/// Network prefix byte carried by every address
pub const ADDRESS_PREFIX: u8 = 0x41;

/// Address length in bytes (prefix + 20-byte identifier)
pub const ADDRESS_LEN: usize = 21;

/// Length of the hex rendering (prefix included)
pub const ADDRESS_HEX_LEN: usize = 42;

/// Errors produced while parsing or rendering addresses
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("'{0}' is not a valid address string")]
    InvalidAddress(String),
    #[error("Base58 checksum mismatch")]
    ChecksumMismatch,
    #[error("Invalid base58 format: {0}")]
    InvalidFormat(String),
}

/// A ledger address: `[0x41] ‖ [20-byte identifier]`
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// Wrap raw address bytes
    pub fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Build an address from a 20-byte EVM-style identifier
    pub fn from_eth_bytes(identifier: &[u8; 20]) -> Self {
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes[0] = ADDRESS_PREFIX;
        bytes[1..].copy_from_slice(identifier);
        Self(bytes)
    }

    /// Raw 21 bytes
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// The 20-byte identifier without the network prefix
    pub fn eth_bytes(&self) -> [u8; 20] {
        let mut out = [0u8; 20];
        out.copy_from_slice(&self.0[1..]);
        out
    }

    /// Lowercase hex rendering, prefix byte included (42 chars)
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse the 42-char hex rendering. Case-insensitive, no `0x`.
    pub fn from_hex(value: &str) -> Result<Self, AddressError> {
        if value.len() != ADDRESS_HEX_LEN {
            return Err(AddressError::InvalidAddress(value.to_string()));
        }
        let decoded =
            hex::decode(value).map_err(|_| AddressError::InvalidAddress(value.to_string()))?;
        Self::from_payload(&decoded).ok_or_else(|| AddressError::InvalidAddress(value.to_string()))
    }

    /// Base58check rendering: Base58(bytes ‖ sha256(sha256(bytes))[..4])
    pub fn to_base58(&self) -> String {
        let checksum = double_sha256(&self.0);
        let mut payload = Vec::with_capacity(ADDRESS_LEN + 4);
        payload.extend_from_slice(&self.0);
        payload.extend_from_slice(&checksum[..4]);
        bs58::encode(payload).into_string()
    }

    /// Parse a base58check address, verifying its checksum
    pub fn from_base58(value: &str) -> Result<Self, AddressError> {
        let decoded = bs58::decode(value)
            .into_vec()
            .map_err(|e| AddressError::InvalidFormat(e.to_string()))?;

        if decoded.len() < 5 {
            return Err(AddressError::InvalidFormat(format!(
                "decoded {} bytes, expected at least 5",
                decoded.len()
            )));
        }

        let (payload, checksum) = decoded.split_at(decoded.len() - 4);
        if double_sha256(payload)[..4] != *checksum {
            return Err(AddressError::ChecksumMismatch);
        }

        Self::from_payload(payload).ok_or_else(|| AddressError::InvalidAddress(value.to_string()))
    }

    /// Parse any supported rendering: hex, checksum-hex or base58check
    pub fn parse(value: &str) -> Result<Self, AddressError> {
        if value.len() == ADDRESS_HEX_LEN {
            return Self::from_hex(value);
        }
        Self::from_base58(value)
    }

    fn from_payload(payload: &[u8]) -> Option<Self> {
        if payload.len() != ADDRESS_LEN || payload[0] != ADDRESS_PREFIX {
            return None;
        }
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(payload);
        Some(Self(bytes))
    }
}

/// Same as [`Address::parse`], but also accepts the `0x`-prefixed
/// 20-byte EVM form. Used where EVM-compatible inputs are expected
/// (typed-data `address` fields and domains).
pub fn parse_evm_compatible(value: &str) -> Result<Address, AddressError> {
    let stripped = strip_0x(value);
    if stripped.len() != value.len() && stripped.len() == 40 {
        let decoded =
            hex::decode(stripped).map_err(|_| AddressError::InvalidAddress(value.to_string()))?;
        let mut identifier = [0u8; 20];
        identifier.copy_from_slice(&decoded);
        return Ok(Address::from_eth_bytes(&identifier));
    }
    Address::parse(value)
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_base58())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base58())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Address::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEX: &str = "41928c9af0651632157ef27a2cf17ca72c575a4d28";
    const BASE58: &str = "TPL66VK2gCXNCD7EJg9pgJRfqcRbnn4zcp";

    #[test]
    fn test_hex_base58_round_trip() {
        let address = Address::from_hex(HEX).unwrap();
        assert_eq!(address.to_base58(), BASE58);

        let back = Address::from_base58(BASE58).unwrap();
        assert_eq!(back, address);
        assert_eq!(back.to_hex(), HEX);
    }

    #[test]
    fn test_parse_accepts_any_rendering() {
        let from_hex: Address = HEX.parse().unwrap();
        let from_upper: Address = HEX.to_uppercase().parse().unwrap();
        let from_base58: Address = BASE58.parse().unwrap();
        assert_eq!(from_hex, from_base58);
        assert_eq!(from_upper, from_base58);
    }

    #[test]
    fn test_base58_checksum_mismatch() {
        let tampered = format!("{}s", &BASE58[..BASE58.len() - 1]);
        assert_eq!(
            Address::from_base58(&tampered),
            Err(AddressError::ChecksumMismatch)
        );
    }

    #[test]
    fn test_base58_too_short() {
        assert!(matches!(
            Address::from_base58("1111"),
            Err(AddressError::InvalidFormat(_))
        ));
        assert!(matches!(
            Address::from_base58("0OIl"),
            Err(AddressError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_hex_requires_network_prefix() {
        assert!(Address::from_hex("0x65cfbd57fa4f20687b2c33f84c4f9017e5895d49").is_err());
        assert!(Address::from_hex("4265cfbd57fa4f20687b2c33f84c4f9017e5895d49").is_err());
    }

    #[test]
    fn test_evm_compatible_parse() {
        let evm = parse_evm_compatible("0x928c9af0651632157ef27a2cf17ca72c575a4d28").unwrap();
        assert_eq!(evm.to_hex(), HEX);
        assert_eq!(parse_evm_compatible(BASE58).unwrap(), evm);
    }

    #[test]
    fn test_serde_uses_base58() {
        let address = Address::from_hex(HEX).unwrap();
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, format!("\"{}\"", BASE58));

        let from_hex: Address = serde_json::from_str(&format!("\"{}\"", HEX)).unwrap();
        assert_eq!(from_hex, address);
    }
}
