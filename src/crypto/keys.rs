//! secp256k1 key management
//!
//! Key pairs, parsing of user-supplied key material, and the
//! public-key-to-address derivation shared by every signing path.

use rand::rngs::OsRng;
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use thiserror::Error;
use zeroize::Zeroize;

use super::hash::keccak256;
use crate::address::{Address, ADDRESS_PREFIX};

/// Errors that can occur during key operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

/// A key pair consisting of a private key and its corresponding public key
#[derive(Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, public_key) = secp.generate_keypair(&mut OsRng);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from an existing secret key
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from a hex-encoded private key (optional `0x` prefix)
    pub fn from_private_key_hex(hex_key: &str) -> Result<Self, KeyError> {
        parse_secret_key(hex_key).map(Self::from_secret_key)
    }

    /// Get the private key as a hex string
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// Get the public key as a hex string (uncompressed, 130 chars)
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key.serialize_uncompressed())
    }

    /// Ledger address owned by this key pair
    pub fn address(&self) -> Address {
        public_key_to_address(&self.public_key)
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}

/// Parsed key material: either side of a key pair
#[derive(Clone, Debug)]
pub enum KeyMaterial {
    Private(SecretKey),
    Public(PublicKey),
}

impl KeyMaterial {
    /// Strictly parse a hex key.
    ///
    /// Accepted lengths (after an optional `0x`): 64 (private key),
    /// 66 (compressed public key), 128 (raw X‖Y), 130 (uncompressed, `04` tag).
    pub fn parse(key: &str) -> Result<Self, KeyError> {
        let stripped = strip_0x(key.trim());
        if !stripped.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(KeyError::InvalidKey("key is not a hex string".to_string()));
        }
        let mut bytes =
            hex::decode(stripped).map_err(|e| KeyError::InvalidKey(e.to_string()))?;
        let parsed = Self::from_bytes(&bytes, false);
        bytes.zeroize();
        parsed.ok_or_else(|| {
            KeyError::InvalidKey(format!("unsupported key length {}", stripped.len()))
        })
    }

    /// Best-effort parse: non-hex characters are dropped, a trailing odd
    /// nibble is ignored and short private keys are left-padded.
    pub fn parse_lenient(key: &str) -> Option<Self> {
        let mut digits: String = strip_0x(key.trim())
            .chars()
            .filter(|c| c.is_ascii_hexdigit())
            .collect();
        if digits.len() % 2 == 1 {
            digits.pop();
        }
        let mut bytes = hex::decode(&digits).ok()?;
        digits.zeroize();
        let parsed = Self::from_bytes(&bytes, true);
        bytes.zeroize();
        parsed
    }

    fn from_bytes(bytes: &[u8], pad_short_private: bool) -> Option<Self> {
        match bytes.len() {
            32 => SecretKey::from_slice(bytes).ok().map(KeyMaterial::Private),
            33 | 65 => PublicKey::from_slice(bytes).ok().map(KeyMaterial::Public),
            64 => {
                let mut tagged = [0u8; 65];
                tagged[0] = 0x04;
                tagged[1..].copy_from_slice(bytes);
                PublicKey::from_slice(&tagged).ok().map(KeyMaterial::Public)
            }
            n if pad_short_private && n > 0 && n < 32 => {
                let mut padded = [0u8; 32];
                padded[32 - n..].copy_from_slice(bytes);
                let parsed = SecretKey::from_slice(&padded).ok().map(KeyMaterial::Private);
                padded.zeroize();
                parsed
            }
            _ => None,
        }
    }

    /// Public half of the material
    pub fn public_key(&self) -> PublicKey {
        match self {
            KeyMaterial::Private(secret) => PublicKey::from_secret_key(&Secp256k1::new(), secret),
            KeyMaterial::Public(public) => *public,
        }
    }
}

/// Parse a hex private key (64 hex chars, optional `0x`)
pub fn parse_secret_key(hex_key: &str) -> Result<SecretKey, KeyError> {
    match KeyMaterial::parse(hex_key)? {
        KeyMaterial::Private(secret) => Ok(secret),
        KeyMaterial::Public(_) => Err(KeyError::InvalidKey(
            "expected a private key, got a public key".to_string(),
        )),
    }
}

/// Convert a public key to a ledger address:
/// `0x41 ‖ keccak256(uncompressed point without tag)[12..]`
pub fn public_key_to_address(public_key: &PublicKey) -> Address {
    let uncompressed = public_key.serialize_uncompressed();
    let hash = keccak256(&uncompressed[1..]);

    let mut bytes = [0u8; 21];
    bytes[0] = ADDRESS_PREFIX;
    bytes[1..].copy_from_slice(&hash[12..]);
    Address::from_bytes(bytes)
}

pub(crate) fn strip_0x(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_ONE: &str = "0000000000000000000000000000000000000000000000000000000000000001";

    #[test]
    fn test_key_pair_generation() {
        let kp = KeyPair::generate();
        assert_eq!(kp.private_key_hex().len(), 64);
        assert_eq!(kp.public_key_hex().len(), 130);
        assert!(kp.address().to_base58().starts_with('T'));
    }

    #[test]
    fn test_key_pair_from_hex() {
        let kp1 = KeyPair::generate();
        let private_hex = kp1.private_key_hex();

        let kp2 = KeyPair::from_private_key_hex(&private_hex).unwrap();
        assert_eq!(kp1.public_key_hex(), kp2.public_key_hex());
        assert_eq!(kp1.address(), kp2.address());

        let kp3 = KeyPair::from_private_key_hex(&format!("0x{}", private_hex)).unwrap();
        assert_eq!(kp1.address(), kp3.address());
    }

    #[test]
    fn test_known_address_for_key_one() {
        let kp = KeyPair::from_private_key_hex(KEY_ONE).unwrap();
        assert_eq!(kp.address().to_hex(), "417e5f4552091a69125d5dfcb7b8c2659029395bdf");
        assert_eq!(kp.address().to_base58(), "TMVQGm1qAQYVdetCeGRRkTWYYrLXuHK2HC");
    }

    #[test]
    fn test_public_key_forms_derive_same_address() {
        let kp = KeyPair::generate();
        let uncompressed = hex::encode(kp.public_key.serialize_uncompressed());
        let compressed = hex::encode(kp.public_key.serialize());
        let raw = uncompressed[2..].to_string();

        for form in [uncompressed, compressed, raw] {
            let material = KeyMaterial::parse(&form).unwrap();
            assert_eq!(public_key_to_address(&material.public_key()), kp.address());
        }
    }

    #[test]
    fn test_strict_parse_rejects_garbage() {
        assert!(KeyMaterial::parse("test").is_err());
        assert!(KeyMaterial::parse(&"zz".repeat(32)).is_err());
        assert!(KeyMaterial::parse("abcd").is_err());
        // Zero is not a valid scalar
        assert!(KeyMaterial::parse(&"00".repeat(32)).is_err());
    }

    #[test]
    fn test_lenient_parse_skips_noise() {
        let noisy = format!("{}-{}", &KEY_ONE[..32], &KEY_ONE[32..]);
        let material = KeyMaterial::parse_lenient(&noisy).unwrap();
        let strict = KeyMaterial::parse(KEY_ONE).unwrap();
        assert_eq!(material.public_key(), strict.public_key());

        // Short keys are treated as numbers
        let short = KeyMaterial::parse_lenient("01").unwrap();
        assert_eq!(short.public_key(), strict.public_key());

        assert!(KeyMaterial::parse_lenient("").is_none());
        assert!(KeyMaterial::parse_lenient(&"11".repeat(40)).is_none());
    }

    #[test]
    fn test_debug_does_not_leak_secret() {
        let kp = KeyPair::from_private_key_hex(KEY_ONE).unwrap();
        let rendered = format!("{:?}", kp);
        assert!(!rendered.contains(KEY_ONE));
    }
}
