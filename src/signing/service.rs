//! Stateless signing operations
//!
//! Every function here takes all of its inputs explicitly. [`super::Signer`]
//! layers configured defaults on top.

use secp256k1::Secp256k1;
use serde_json::Value;

use super::digest::{message_digest, message_digest_v2};
use super::error::SignError;
use super::signature::Signature;
use super::typed_data::{hash_typed_data, TypeMap, TypedDataDomain};
use crate::address::{parse_evm_compatible, Address};
use crate::core::{Transaction, TransactionChecker};
use crate::crypto::{parse_secret_key, public_key_to_address};

// =============================================================================
// Messages
// =============================================================================

/// Sign a hex-encoded message under `header`, returning the wire encoding
pub fn sign_message(message: &str, private_key: &str, header: &str) -> Result<String, SignError> {
    let digest = message_digest(message, header)?;
    let secret_key = parse_secret_key(private_key)?;
    log::debug!("Signing {}-byte message digest", digest.len());
    Ok(Signature::sign(&digest, &secret_key).encode())
}

/// Recover the signer of `message` and compare it with `address`
pub fn verify_signature(
    message: &str,
    address: &str,
    signature: &str,
    header: &str,
) -> Result<bool, SignError> {
    let digest = message_digest(message, header)?;
    let expected = Address::parse(address)?;
    let recovered = Signature::decode(signature)?.recover_address(&digest)?;
    Ok(recovered.to_base58() == expected.to_base58())
}

/// Like [`verify_signature`], but a mismatch is an error
pub fn verify_message(
    message: &str,
    signature: &str,
    address: &str,
    header: &str,
) -> Result<bool, SignError> {
    if verify_signature(message, address, signature, header)? {
        Ok(true)
    } else {
        log::debug!("Message signature does not match {}", address);
        Err(SignError::SignatureMismatch)
    }
}

/// Sign raw bytes or a UTF-8 string under the length-carrying header
pub fn sign_message_v2(message: impl AsRef<[u8]>, private_key: &str) -> Result<String, SignError> {
    let digest = message_digest_v2(message.as_ref());
    let secret_key = parse_secret_key(private_key)?;
    Ok(Signature::sign(&digest, &secret_key).encode())
}

/// Recover the address that produced a [`sign_message_v2`] signature
pub fn verify_message_v2(
    message: impl AsRef<[u8]>,
    signature: &str,
) -> Result<Address, SignError> {
    let digest = message_digest_v2(message.as_ref());
    Ok(Signature::decode(signature)?.recover_address(&digest)?)
}

// =============================================================================
// Transactions
// =============================================================================

/// Append one signature over `txID` to a copy of `transaction`.
///
/// Without `multisig` the key must own the transaction and no signature
/// list may exist yet. With `multisig` further signatures are appended as
/// long as the same one is not already present.
pub fn sign_transaction(
    transaction: &Transaction,
    private_key: &str,
    multisig: bool,
    checker: &dyn TransactionChecker,
) -> Result<Transaction, SignError> {
    let secret_key = parse_secret_key(private_key)?;
    let signer = public_key_to_address(&secret_key.public_key(&Secp256k1::new()));

    if !multisig {
        if transaction.signature.is_some() {
            return Err(SignError::AlreadySigned);
        }

        let owner = transaction.owner_address().ok_or_else(|| {
            SignError::InvalidTransaction("missing owner_address".to_string())
        })?;
        let owner = Address::parse(owner)
            .map_err(|e| SignError::InvalidTransaction(format!("owner_address: {}", e)))?;
        if owner != signer {
            return Err(SignError::OwnerMismatch);
        }
    }

    if !checker.is_structurally_valid(transaction) {
        return Err(SignError::InvalidTransaction(
            "transaction failed structural validation".to_string(),
        ));
    }

    let digest = transaction
        .digest()
        .ok_or_else(|| SignError::InvalidTransaction(format!("bad txID '{}'", transaction.tx_id)))?;
    let encoded = Signature::sign(&digest, &secret_key).to_transaction_hex();

    if multisig && transaction.signatures().iter().any(|s| s == &encoded) {
        return Err(SignError::AlreadySigned);
    }

    log::debug!(
        "Signed transaction {} as {} (multisig: {})",
        transaction.tx_id,
        signer,
        multisig
    );

    let mut signed = transaction.clone();
    signed.push_signature(encoded);
    Ok(signed)
}

/// Something that can be signed
#[derive(Debug, Clone, PartialEq)]
pub enum Signable {
    /// Hex-encoded message
    Message(String),
    Transaction(Transaction),
}

impl Signable {
    /// Strings are messages, objects are transactions
    pub fn from_json(value: Value) -> Result<Self, SignError> {
        match value {
            Value::String(message) => Ok(Signable::Message(message)),
            Value::Object(_) => Transaction::from_value(value)
                .map(Signable::Transaction)
                .ok_or_else(|| {
                    SignError::InvalidTransaction("object is not a transaction".to_string())
                }),
            other => Err(SignError::InvalidHexInput(other.to_string())),
        }
    }
}

/// Result of [`sign`]
#[derive(Debug, Clone, PartialEq)]
pub enum Signed {
    /// Wire-encoded message signature
    Message(String),
    Transaction(Transaction),
}

/// Sign either a message or a transaction
pub fn sign(
    input: &Signable,
    private_key: &str,
    header: &str,
    multisig: bool,
    checker: &dyn TransactionChecker,
) -> Result<Signed, SignError> {
    match input {
        Signable::Message(message) => sign_message(message, private_key, header).map(Signed::Message),
        Signable::Transaction(tx) => {
            sign_transaction(tx, private_key, multisig, checker).map(Signed::Transaction)
        }
    }
}

/// Signer(s) recovered by [`ec_recover`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recovered {
    Single(Address),
    /// One per signature, in signature order
    Multiple(Vec<Address>),
}

impl Recovered {
    pub fn addresses(&self) -> Vec<Address> {
        match self {
            Recovered::Single(address) => vec![*address],
            Recovered::Multiple(addresses) => addresses.clone(),
        }
    }
}

/// Recover every signer of a transaction
pub fn ec_recover(
    transaction: &Transaction,
    checker: &dyn TransactionChecker,
) -> Result<Recovered, SignError> {
    if !checker.is_structurally_valid(transaction) {
        return Err(SignError::InvalidTransaction(
            "transaction failed structural validation".to_string(),
        ));
    }
    if !transaction.is_signed() {
        return Err(SignError::NotSigned);
    }

    let digest = transaction
        .digest()
        .ok_or_else(|| SignError::InvalidTransaction(format!("bad txID '{}'", transaction.tx_id)))?;

    let mut addresses = transaction
        .signatures()
        .iter()
        .map(|sig| -> Result<Address, SignError> {
            Ok(Signature::decode(sig)?.recover_address(&digest)?)
        })
        .collect::<Result<Vec<_>, SignError>>()?;

    if addresses.len() == 1 {
        Ok(Recovered::Single(addresses.remove(0)))
    } else {
        Ok(Recovered::Multiple(addresses))
    }
}

// =============================================================================
// Typed data
// =============================================================================

/// Typed-data digest with the primary type detected from `types`
pub fn typed_data_digest(
    domain: &TypedDataDomain,
    types: &TypeMap,
    value: &Value,
) -> Result<[u8; 32], SignError> {
    Ok(hash_typed_data(domain, types, None, value)?)
}

/// Sign typed structured data, returning the wire encoding
pub fn sign_typed_data(
    domain: &TypedDataDomain,
    types: &TypeMap,
    value: &Value,
    private_key: &str,
) -> Result<String, SignError> {
    let digest = typed_data_digest(domain, types, value)?;
    let secret_key = parse_secret_key(private_key)?;
    Ok(Signature::sign(&digest, &secret_key).encode())
}

/// Recover the typed-data signer and compare it with `address`
pub fn verify_typed_data_signature(
    domain: &TypedDataDomain,
    types: &TypeMap,
    value: &Value,
    signature: &str,
    address: &str,
) -> Result<bool, SignError> {
    let digest = typed_data_digest(domain, types, value)?;
    let expected = parse_evm_compatible(address)?;
    let recovered = Signature::decode(signature)?.recover_address(&digest)?;
    Ok(recovered.to_base58() == expected.to_base58())
}

/// Like [`verify_typed_data_signature`], but a mismatch is an error
pub fn verify_typed_data(
    domain: &TypedDataDomain,
    types: &TypeMap,
    value: &Value,
    signature: &str,
    address: &str,
) -> Result<bool, SignError> {
    if verify_typed_data_signature(domain, types, value, signature, address)? {
        Ok(true)
    } else {
        Err(SignError::SignatureMismatch)
    }
}
