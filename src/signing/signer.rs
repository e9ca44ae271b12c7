//! Signer bound to a configuration
//!
//! [`SignerConfig`] carries the defaults (key, address, message header) that
//! the free functions in [`super::service`] otherwise take on every call.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;
use zeroize::Zeroize;

use super::digest::LINDA_MESSAGE_HEADER;
use super::error::SignError;
use super::service::{self, Recovered, Signable, Signed};
use super::typed_data::{TypeMap, TypedDataDomain};
use crate::address::Address;
use crate::core::{Transaction, TransactionChecker};
use crate::crypto::KeyPair;

/// Errors loading a signer configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Defaults used by [`Signer`]
#[derive(Clone, Serialize, Deserialize)]
pub struct SignerConfig {
    #[serde(default)]
    pub private_key: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default = "default_chain_header")]
    pub chain_header: String,
}

fn default_chain_header() -> String {
    LINDA_MESSAGE_HEADER.to_string()
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            private_key: None,
            address: None,
            chain_header: default_chain_header(),
        }
    }
}

impl SignerConfig {
    /// Load from a JSON file. A configured key must derive the configured
    /// address when both are present.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        let mut config: SignerConfig = serde_json::from_str(&json)?;

        if let Some(key) = &config.private_key {
            let derived = KeyPair::from_private_key_hex(key)
                .map_err(|e| ConfigError::Invalid(e.to_string()))?
                .address();
            match config.address {
                Some(address) if address != derived => {
                    return Err(ConfigError::Invalid(format!(
                        "private key does not own address {}",
                        address
                    )));
                }
                _ => config.address = Some(derived),
            }
        }

        Ok(config)
    }

    /// Set the default key and the address it derives
    pub fn with_private_key(mut self, private_key: &str) -> Result<Self, SignError> {
        let address = KeyPair::from_private_key_hex(private_key)?.address();
        self.clear_private_key();
        self.private_key = Some(private_key.to_string());
        self.address = Some(address);
        Ok(self)
    }

    /// Set the default address. A configured key that does not own it is dropped.
    pub fn with_address(mut self, address: Address) -> Self {
        let owns = self
            .private_key
            .as_deref()
            .and_then(|key| KeyPair::from_private_key_hex(key).ok())
            .map_or(false, |pair| pair.address() == address);
        if !owns {
            self.clear_private_key();
        }
        self.address = Some(address);
        self
    }

    pub fn with_chain_header(mut self, header: &str) -> Self {
        self.chain_header = header.to_string();
        self
    }

    /// Header used for message signatures
    pub fn header(&self) -> &str {
        &self.chain_header
    }

    fn clear_private_key(&mut self) {
        if let Some(mut key) = self.private_key.take() {
            key.zeroize();
        }
    }
}

impl Drop for SignerConfig {
    fn drop(&mut self) {
        self.clear_private_key();
    }
}

impl fmt::Debug for SignerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignerConfig")
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("address", &self.address)
            .field("chain_header", &self.chain_header)
            .finish()
    }
}

/// Signing operations with defaults taken from a [`SignerConfig`]
pub struct Signer<'a> {
    config: &'a SignerConfig,
    checker: &'a dyn TransactionChecker,
}

impl<'a> Signer<'a> {
    pub fn new(config: &'a SignerConfig, checker: &'a dyn TransactionChecker) -> Self {
        Self { config, checker }
    }

    pub fn config(&self) -> &SignerConfig {
        self.config
    }

    fn key<'k>(&'k self, private_key: Option<&'k str>) -> Result<&'k str, SignError> {
        private_key
            .or(self.config.private_key.as_deref())
            .ok_or(SignError::MissingPrivateKey)
    }

    fn address(&self, address: Option<&str>) -> Result<String, SignError> {
        match address {
            Some(address) => Ok(address.to_string()),
            None => self
                .config
                .address
                .map(|a| a.to_base58())
                .ok_or(SignError::MissingAddress),
        }
    }

    pub fn sign_message(&self, message: &str, private_key: Option<&str>) -> Result<String, SignError> {
        service::sign_message(message, self.key(private_key)?, self.config.header())
    }

    pub fn verify_message(
        &self,
        message: &str,
        signature: &str,
        address: Option<&str>,
    ) -> Result<bool, SignError> {
        let address = self.address(address)?;
        service::verify_message(message, signature, &address, self.config.header())
    }

    pub fn sign_message_v2(
        &self,
        message: impl AsRef<[u8]>,
        private_key: Option<&str>,
    ) -> Result<String, SignError> {
        service::sign_message_v2(message, self.key(private_key)?)
    }

    /// Recover the signer of a length-prefixed message signature
    pub fn verify_message_v2(
        &self,
        message: impl AsRef<[u8]>,
        signature: &str,
    ) -> Result<Address, SignError> {
        service::verify_message_v2(message, signature)
    }

    pub fn sign_transaction(
        &self,
        transaction: &Transaction,
        private_key: Option<&str>,
        multisig: bool,
    ) -> Result<Transaction, SignError> {
        service::sign_transaction(transaction, self.key(private_key)?, multisig, self.checker)
    }

    pub fn sign(
        &self,
        input: &Signable,
        private_key: Option<&str>,
        multisig: bool,
    ) -> Result<Signed, SignError> {
        service::sign(
            input,
            self.key(private_key)?,
            self.config.header(),
            multisig,
            self.checker,
        )
    }

    pub fn ec_recover(&self, transaction: &Transaction) -> Result<Recovered, SignError> {
        service::ec_recover(transaction, self.checker)
    }

    pub fn sign_typed_data(
        &self,
        domain: &TypedDataDomain,
        types: &TypeMap,
        value: &Value,
        private_key: Option<&str>,
    ) -> Result<String, SignError> {
        service::sign_typed_data(domain, types, value, self.key(private_key)?)
    }

    pub fn verify_typed_data(
        &self,
        domain: &TypedDataDomain,
        types: &TypeMap,
        value: &Value,
        signature: &str,
        address: Option<&str>,
    ) -> Result<bool, SignError> {
        let address = self.address(address)?;
        service::verify_typed_data(domain, types, value, signature, &address)
    }
}
