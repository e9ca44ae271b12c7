//! The exact bytes that get signed
//!
//! Plain messages are prefixed with a fixed header before hashing;
//! transaction IDs are already digests and are signed as-is.

use super::signature::SignatureError;
use crate::crypto::keccak256_concat;
use crate::crypto::keys::strip_0x;

/// Chain message header.
///
/// Other clients of the chain family have been seen with `\x15` as the
/// leading byte. This value is kept for compatibility with signatures
/// already in circulation; override it through `SignerConfig::chain_header`.
pub const LINDA_MESSAGE_HEADER: &str = "\x19LINDA Signed Message:\n32";

/// Ethereum-compatible message header
pub const ETH_MESSAGE_HEADER: &str = "\x19Ethereum Signed Message:\n32";

/// Prefix of the length-carrying message scheme. The decimal byte length of
/// the message follows it, then the message itself.
pub const LINDA_MESSAGE_PREFIX: &str = "\x19LINDA Signed Message:\n";

/// Pick one of the two built-in headers
pub fn message_header(use_chain_header: bool) -> &'static str {
    if use_chain_header {
        LINDA_MESSAGE_HEADER
    } else {
        ETH_MESSAGE_HEADER
    }
}

/// Decode a hex message with optional `0x` prefix.
///
/// A trailing odd nibble is dropped, so `"abc"` decodes to `[0xab]`; other
/// chain clients sign such messages the same way.
pub fn decode_hex_message(message: &str) -> Result<Vec<u8>, SignatureError> {
    let digits = strip_0x(message);
    if digits.is_empty() {
        return Err(SignatureError::InvalidHexInput(
            "Expected hex message input".to_string(),
        ));
    }
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(SignatureError::InvalidHexInput(format!(
            "Expected hex message input, got '{}'",
            message
        )));
    }
    let even = &digits[..digits.len() - digits.len() % 2];
    hex::decode(even).map_err(|_| {
        SignatureError::InvalidHexInput(format!("Expected hex message input, got '{}'", message))
    })
}

/// `keccak256(header ‖ message bytes)`
pub fn message_digest(message: &str, header: &str) -> Result<[u8; 32], SignatureError> {
    let bytes = decode_hex_message(message)?;
    Ok(keccak256_concat(&[header.as_bytes(), &bytes]))
}

/// `keccak256(prefix ‖ decimal length ‖ message)` over raw message bytes
pub fn message_digest_v2(message: &[u8]) -> [u8; 32] {
    let length = message.len().to_string();
    keccak256_concat(&[LINDA_MESSAGE_PREFIX.as_bytes(), length.as_bytes(), message])
}

/// A transaction ID decoded as the digest to sign. `None` unless it is
/// exactly 32 bytes of hex.
pub fn transaction_digest(tx_id: &str) -> Option<[u8; 32]> {
    let bytes = hex::decode(strip_0x(tx_id)).ok()?;
    bytes.try_into().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keccak256;

    #[test]
    fn test_headers_have_expected_lengths() {
        assert_eq!(LINDA_MESSAGE_HEADER.len(), 25);
        assert_eq!(ETH_MESSAGE_HEADER.len(), 28);
        assert_eq!(LINDA_MESSAGE_HEADER.as_bytes()[0], 0x19);
        assert_eq!(message_header(true), LINDA_MESSAGE_HEADER);
        assert_eq!(message_header(false), ETH_MESSAGE_HEADER);
    }

    #[test]
    fn test_message_digest_prefixes_header() {
        let digest = message_digest("0x68656c6c6f", ETH_MESSAGE_HEADER).unwrap();
        let mut expected = ETH_MESSAGE_HEADER.as_bytes().to_vec();
        expected.extend_from_slice(b"hello");
        assert_eq!(digest, keccak256(&expected));

        let without_prefix = message_digest("68656c6c6f", ETH_MESSAGE_HEADER).unwrap();
        assert_eq!(digest, without_prefix);
    }

    #[test]
    fn test_headers_give_different_digests() {
        let chain = message_digest("68656c6c6f", message_header(true)).unwrap();
        let eth = message_digest("68656c6c6f", message_header(false)).unwrap();
        assert_ne!(chain, eth);
    }

    #[test]
    fn test_rejects_non_hex() {
        assert!(message_digest("hello", LINDA_MESSAGE_HEADER).is_err());
        assert!(message_digest("0x", LINDA_MESSAGE_HEADER).is_err());
        assert!(message_digest("0xzz", LINDA_MESSAGE_HEADER).is_err());
    }

    #[test]
    fn test_odd_length_drops_trailing_nibble() {
        assert_eq!(decode_hex_message("0xabc").unwrap(), vec![0xab]);
        assert_eq!(decode_hex_message("f").unwrap(), Vec::<u8>::new());

        let digest = message_digest("0xabc", LINDA_MESSAGE_HEADER).unwrap();
        assert_eq!(digest, message_digest("ab", LINDA_MESSAGE_HEADER).unwrap());
        let mut expected = LINDA_MESSAGE_HEADER.as_bytes().to_vec();
        expected.push(0xab);
        assert_eq!(digest, keccak256(&expected));
    }

    #[test]
    fn test_v2_digest_carries_message_length() {
        assert_eq!(LINDA_MESSAGE_PREFIX.len(), 23);
        assert!(LINDA_MESSAGE_HEADER.starts_with(LINDA_MESSAGE_PREFIX));

        let expected = keccak256(b"\x19LINDA Signed Message:\n5hello");
        assert_eq!(message_digest_v2(b"hello"), expected);

        let long = [0x42u8; 100];
        let mut payload = b"\x19LINDA Signed Message:\n100".to_vec();
        payload.extend_from_slice(&long);
        assert_eq!(message_digest_v2(&long), keccak256(&payload));

        // A 32-byte message hashes like the fixed header scheme
        let thirty_two = [0x01u8; 32];
        assert_eq!(
            message_digest_v2(&thirty_two),
            message_digest(&hex::encode(thirty_two), LINDA_MESSAGE_HEADER).unwrap()
        );
        assert_eq!(
            message_digest_v2(b""),
            keccak256(b"\x19LINDA Signed Message:\n0")
        );
    }

    #[test]
    fn test_transaction_digest() {
        let tx_id = "ab".repeat(32);
        assert_eq!(transaction_digest(&tx_id), Some([0xab; 32]));
        assert_eq!(transaction_digest("abcd"), None);
        assert_eq!(transaction_digest(&"zz".repeat(32)), None);
    }
}
