//! Recoverable secp256k1 signatures and their wire encoding
//!
//! Wire form: `0x` ‖ hex(r, 32 bytes) ‖ hex(s, 32 bytes) ‖ hex(v).
//! `v` is written with its natural number of hex digits and is not
//! zero-padded. Existing verifiers depend on this exact text, so every
//! serialization goes through [`Signature::encode`].

use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use thiserror::Error;

use crate::address::Address;
use crate::crypto::keys::strip_0x;
use crate::crypto::public_key_to_address;

/// Offset added to the recovery id when a signature is produced
pub const RECOVERY_OFFSET: u8 = 27;

/// Errors raised while decoding or recovering signatures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Expected hex input: {0}")]
    InvalidHexInput(String),
    #[error("Invalid signature length: {0} hex chars")]
    InvalidSignatureLength(usize),
    #[error("Signature recovery failed: {0}")]
    RecoveryFailure(String),
}

/// A 65-byte recoverable ECDSA signature
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Signature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    pub v: u8,
}

impl Signature {
    /// Sign a 32-byte digest. Deterministic (RFC 6979) and low-S.
    pub fn sign(digest: &[u8; 32], secret_key: &SecretKey) -> Self {
        let secp = Secp256k1::new();
        let message = Message::from_digest(*digest);
        let recoverable = secp.sign_ecdsa_recoverable(&message, secret_key);
        let (recovery_id, compact) = recoverable.serialize_compact();

        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&compact[..32]);
        s.copy_from_slice(&compact[32..]);

        Self {
            r,
            s,
            v: RECOVERY_OFFSET + recovery_id.to_i32() as u8,
        }
    }

    /// Wire encoding with `0x` prefix and unpadded `v`
    pub fn encode(&self) -> String {
        format!("0x{}{}{:x}", hex::encode(self.r), hex::encode(self.s), self.v)
    }

    /// Encoding stored in a transaction's `signature` list (no `0x`)
    pub fn to_transaction_hex(&self) -> String {
        let encoded = self.encode();
        encoded[2..].to_string()
    }

    /// Decode the wire form. Accepts 130 hex chars, or 129 when `v` was
    /// written as a single hex digit.
    pub fn decode(value: &str) -> Result<Self, SignatureError> {
        let digits = strip_0x(value.trim());
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(SignatureError::InvalidHexInput(value.to_string()));
        }
        if digits.len() != 129 && digits.len() != 130 {
            return Err(SignatureError::InvalidSignatureLength(digits.len()));
        }

        let rs = hex::decode(&digits[..128])
            .map_err(|e| SignatureError::InvalidHexInput(e.to_string()))?;
        let v = u8::from_str_radix(&digits[128..], 16)
            .map_err(|e| SignatureError::InvalidHexInput(e.to_string()))?;

        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&rs[..32]);
        s.copy_from_slice(&rs[32..]);
        Ok(Self { r, s, v })
    }

    /// Recovery id normalized to {0, 1}
    pub fn recovery_id(&self) -> Result<u8, SignatureError> {
        match self.v {
            0 | 1 => Ok(self.v),
            27 | 28 => Ok(self.v - RECOVERY_OFFSET),
            other => Err(SignatureError::RecoveryFailure(format!(
                "invalid recovery id {}",
                other
            ))),
        }
    }

    /// Recover the signing public key for `digest`
    pub fn recover_public_key(&self, digest: &[u8; 32]) -> Result<PublicKey, SignatureError> {
        let recovery_id = RecoveryId::from_i32(self.recovery_id()? as i32)
            .map_err(|e| SignatureError::RecoveryFailure(e.to_string()))?;

        let mut compact = [0u8; 64];
        compact[..32].copy_from_slice(&self.r);
        compact[32..].copy_from_slice(&self.s);

        let recoverable = RecoverableSignature::from_compact(&compact, recovery_id)
            .map_err(|e| SignatureError::RecoveryFailure(e.to_string()))?;

        let secp = Secp256k1::new();
        secp.recover_ecdsa(&Message::from_digest(*digest), &recoverable)
            .map_err(|e| SignatureError::RecoveryFailure(e.to_string()))
    }

    /// Recover the signer's address for `digest`
    pub fn recover_address(&self, digest: &[u8; 32]) -> Result<Address, SignatureError> {
        self.recover_public_key(digest)
            .map(|public_key| public_key_to_address(&public_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{keccak256, KeyPair};

    #[test]
    fn test_sign_and_recover() {
        let kp = KeyPair::generate();
        let digest = keccak256(b"Hello, ledger!");

        let signature = Signature::sign(&digest, &kp.secret_key);
        assert!(signature.v == 27 || signature.v == 28);
        assert_eq!(signature.recover_address(&digest).unwrap(), kp.address());
    }

    #[test]
    fn test_signing_is_deterministic() {
        let kp = KeyPair::generate();
        let digest = keccak256(b"same input");
        assert_eq!(
            Signature::sign(&digest, &kp.secret_key),
            Signature::sign(&digest, &kp.secret_key)
        );
    }

    #[test]
    fn test_encode_decode() {
        let kp = KeyPair::generate();
        let digest = keccak256(b"wire");
        let signature = Signature::sign(&digest, &kp.secret_key);

        let encoded = signature.encode();
        assert!(encoded.starts_with("0x"));
        assert_eq!(encoded.len(), 132);
        assert_eq!(Signature::decode(&encoded).unwrap(), signature);
        assert_eq!(
            Signature::decode(&signature.to_transaction_hex()).unwrap(),
            signature
        );
    }

    #[test]
    fn test_small_v_is_not_padded() {
        let signature = Signature {
            r: [0x11; 32],
            s: [0x22; 32],
            v: 1,
        };
        let encoded = signature.encode();
        assert_eq!(encoded.len(), 2 + 128 + 1);
        assert!(encoded.ends_with('1'));
        assert_eq!(Signature::decode(&encoded).unwrap(), signature);
    }

    #[test]
    fn test_decode_rejects_bad_input() {
        assert!(matches!(
            Signature::decode("0x1234"),
            Err(SignatureError::InvalidSignatureLength(4))
        ));
        assert!(matches!(
            Signature::decode(&"zz".repeat(65)),
            Err(SignatureError::InvalidHexInput(_))
        ));
        assert!(matches!(
            Signature::decode(&"ab".repeat(66)),
            Err(SignatureError::InvalidSignatureLength(132))
        ));
    }

    #[test]
    fn test_recovery_id_normalization() {
        let mut signature = Signature {
            r: [1; 32],
            s: [1; 32],
            v: 27,
        };
        assert_eq!(signature.recovery_id().unwrap(), 0);
        signature.v = 28;
        assert_eq!(signature.recovery_id().unwrap(), 1);
        signature.v = 1;
        assert_eq!(signature.recovery_id().unwrap(), 1);
        signature.v = 29;
        assert!(signature.recovery_id().is_err());
    }

    #[test]
    fn test_tampering_changes_recovered_address() {
        let kp = KeyPair::generate();
        let digest = keccak256(b"tamper");
        let signature = Signature::sign(&digest, &kp.secret_key);

        let mut flipped_r = signature;
        flipped_r.r[31] ^= 0x01;
        match flipped_r.recover_address(&digest) {
            Ok(address) => assert_ne!(address, kp.address()),
            Err(SignatureError::RecoveryFailure(_)) => {}
            Err(other) => panic!("unexpected error {other:?}"),
        }

        let mut flipped_s = signature;
        flipped_s.s[0] ^= 0x01;
        match flipped_s.recover_address(&digest) {
            Ok(address) => assert_ne!(address, kp.address()),
            Err(SignatureError::RecoveryFailure(_)) => {}
            Err(other) => panic!("unexpected error {other:?}"),
        }

        let other_digest = keccak256(b"tamperd");
        assert_ne!(
            signature.recover_address(&other_digest).ok(),
            Some(kp.address())
        );
    }

    #[test]
    fn test_zero_signature_fails_recovery() {
        let signature = Signature {
            r: [0; 32],
            s: [0; 32],
            v: 27,
        };
        assert!(matches!(
            signature.recover_address(&[7u8; 32]),
            Err(SignatureError::RecoveryFailure(_))
        ));
    }
}
