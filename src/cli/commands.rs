//! CLI commands for the signer
//!
//! Implements all command handlers for the CLI interface.

use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::address::{
    derive_lenient, derive_strict, is_address, is_checksum_address, parse_evm_compatible, Address,
};
use crate::core::{BasicChecker, Transaction};
use crate::crypto::KeyPair;
use crate::signing::{
    typed_data::hash_domain, Recovered, SignError, Signer, SignerConfig, TypedData,
    ETH_MESSAGE_HEADER,
};

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Application state
pub struct AppState {
    pub config: SignerConfig,
}

impl AppState {
    /// Load the configuration file when given, then apply flag overrides
    pub fn new(
        config_path: Option<&Path>,
        private_key: Option<&str>,
        eth_header: bool,
    ) -> CliResult<Self> {
        let mut config = match config_path {
            Some(path) => {
                log::debug!("Loading signer config from {:?}", path);
                SignerConfig::load(path)?
            }
            None => SignerConfig::default(),
        };

        if let Some(key) = private_key {
            config = config.with_private_key(key)?;
        }
        if eth_header {
            config = config.with_chain_header(ETH_MESSAGE_HEADER);
        }

        Ok(Self { config })
    }

    pub fn signer(&self) -> Signer<'_> {
        Signer::new(&self.config, &BasicChecker)
    }
}

fn read_json(path: &Path) -> CliResult<Value> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

fn read_transaction(path: &Path) -> CliResult<Transaction> {
    let value = read_json(path)?;
    Transaction::from_value(value).ok_or_else(|| {
        SignError::InvalidTransaction(format!("{:?} does not hold a transaction", path)).into()
    })
}

/// Generate a new key pair
pub fn cmd_keygen() -> CliResult<()> {
    let pair = KeyPair::generate();
    let address = pair.address();

    println!("🔐 New key pair generated!");
    println!("   📍 Address: {}", address);
    println!("   ├─ Hex: {}", address.to_hex());
    println!("   └─ Checksum: {}", address.to_checksum_hex());
    println!("   🔑 Public Key: {}", pair.public_key_hex());
    println!("   🗝️  Private Key: {}", pair.private_key_hex());
    println!("\n   ⚠️  IMPORTANT: Store the private key somewhere safe.");

    Ok(())
}

/// Derive the address of a private or public key
pub fn derive_address(key: &str, lenient: bool) -> CliResult<Address> {
    if lenient {
        return derive_lenient(key)
            .ok_or_else(|| SignError::InvalidKey("no usable key material".to_string()).into());
    }
    Ok(derive_strict(key)?)
}

pub fn cmd_address_derive(key: &str, lenient: bool) -> CliResult<()> {
    let address = derive_address(key, lenient)?;
    println!("📍 Address: {}", address);
    println!("   Hex: {}", address.to_hex());
    Ok(())
}

/// Show every rendering of an address
pub fn cmd_address_convert(address: &str) -> CliResult<()> {
    let address = parse_evm_compatible(address)?;
    println!("📍 Address: {}", address);
    println!("   ├─ Base58: {}", address.to_base58());
    println!("   ├─ Hex: {}", address.to_hex());
    println!("   ├─ Checksum: {}", address.to_checksum_hex());
    println!("   └─ EVM: 0x{}", hex::encode(address.eth_bytes()));
    Ok(())
}

pub fn cmd_address_check(candidate: &str) -> CliResult<()> {
    if is_address(candidate) {
        println!("✅ {} is a valid address", candidate);
        if is_checksum_address(candidate) {
            println!("   Checksum casing is valid");
        }
    } else {
        println!("❌ {} is not a valid address", candidate);
    }
    Ok(())
}

pub fn cmd_sign_message(state: &AppState, message: &str, key: Option<&str>) -> CliResult<()> {
    let signature = state.signer().sign_message(message, key)?;
    println!("✍️  Signature: {}", signature);
    Ok(())
}

pub fn cmd_verify_message(
    state: &AppState,
    message: &str,
    signature: &str,
    address: Option<&str>,
) -> CliResult<()> {
    match state.signer().verify_message(message, signature, address) {
        Ok(_) => {
            println!("✅ Signature is valid");
            Ok(())
        }
        Err(SignError::SignatureMismatch) => {
            println!("❌ Signature does not match the address");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Sign the transaction in `input`
pub fn sign_transaction_file(
    state: &AppState,
    input: &Path,
    key: Option<&str>,
    multisig: bool,
) -> CliResult<Transaction> {
    let transaction = read_transaction(input)?;
    Ok(state.signer().sign_transaction(&transaction, key, multisig)?)
}

pub fn cmd_sign_tx(
    state: &AppState,
    input: &Path,
    output: Option<&Path>,
    key: Option<&str>,
    multisig: bool,
) -> CliResult<()> {
    let signed = sign_transaction_file(state, input, key, multisig)?;
    let json = serde_json::to_string_pretty(&signed)?;

    match output {
        Some(path) => {
            fs::write(path, &json)?;
            println!("✅ Transaction {} signed", signed.tx_id);
            println!("   Signatures: {}", signed.signatures().len());
            println!("   Written to {:?}", path);
        }
        None => println!("{}", json),
    }

    Ok(())
}

/// Recover the signers of the transaction in `input`
pub fn recover_transaction_file(state: &AppState, input: &Path) -> CliResult<Vec<Address>> {
    let transaction = read_transaction(input)?;
    let recovered = state.signer().ec_recover(&transaction)?;
    Ok(recovered.addresses())
}

pub fn cmd_recover(state: &AppState, input: &Path) -> CliResult<()> {
    let transaction = read_transaction(input)?;
    match state.signer().ec_recover(&transaction)? {
        Recovered::Single(address) => println!("📍 Signer: {}", address),
        Recovered::Multiple(addresses) => {
            println!("📍 Signers ({}):", addresses.len());
            for address in addresses {
                println!("   {}", address);
            }
        }
    }
    Ok(())
}

/// Digest of the typed-data payload in `input`, and its signature when a
/// key is available
pub fn typed_data_file(
    state: &AppState,
    input: &Path,
    key: Option<&str>,
) -> CliResult<([u8; 32], Option<String>)> {
    let typed: TypedData = serde_json::from_value(read_json(input)?)?;
    let digest = typed.digest()?;

    let signature = match key.or(state.config.private_key.as_deref()) {
        Some(key) => Some(state.signer().sign_typed_data(
            &typed.domain,
            &typed.types,
            &typed.message,
            Some(key),
        )?),
        None => None,
    };

    Ok((digest, signature))
}

pub fn cmd_typed_hash(state: &AppState, input: &Path, key: Option<&str>) -> CliResult<()> {
    let typed: TypedData = serde_json::from_value(read_json(input)?)?;
    let domain_separator = hash_domain(&typed.domain)?;
    let (digest, signature) = typed_data_file(state, input, key)?;

    println!("🧾 Typed data");
    println!("   ├─ Domain separator: 0x{}", hex::encode(domain_separator));
    println!("   └─ Digest: 0x{}", hex::encode(digest));
    if let Some(signature) = signature {
        println!("✍️  Signature: {}", signature);
    }
    Ok(())
}
