//! Typed structured data hashing (EIP-712, with TIP-712 address handling)
//!
//! `digest = keccak256(0x19 0x01 ‖ hash_domain(domain) ‖ hash_struct(primary, message))`
//!
//! Address fields accept the ledger's hex and base58 renderings as well as
//! the `0x`-prefixed 20-byte form; all of them encode the 20-byte
//! identifier, so signatures interoperate with EVM tooling.

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use crate::address::parse_evm_compatible;
use crate::crypto::keccak256;
use crate::crypto::keys::strip_0x;

/// Name of the domain struct
pub const EIP712_DOMAIN: &str = "EIP712Domain";

/// Errors raised while encoding typed data
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypedDataError {
    #[error("Unknown type: {0}")]
    UnknownType(String),
    #[error("Missing field '{field}' in {type_name}")]
    MissingField { type_name: String, field: String },
    #[error("Invalid value for {type_name}: {reason}")]
    InvalidValue { type_name: String, reason: String },
    #[error("Ambiguous primary type: {0:?}")]
    AmbiguousPrimaryType(Vec<String>),
    #[error("No primary type found")]
    NoPrimaryType,
}

/// One member of a struct type
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TypedDataField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
}

impl TypedDataField {
    pub fn new(name: &str, field_type: &str) -> Self {
        Self {
            name: name.to_string(),
            field_type: field_type.to_string(),
        }
    }
}

/// Struct definitions keyed by type name
pub type TypeMap = BTreeMap<String, Vec<TypedDataField>>;

/// Domain separator parameters; absent fields are left out of the
/// `EIP712Domain` struct entirely.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TypedDataDomain {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Number, decimal string or `0x` hex string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verifying_contract: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
}

/// A complete typed-data payload in the `eth_signTypedData` JSON shape
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TypedData {
    pub domain: TypedDataDomain,
    pub types: TypeMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_type: Option<String>,
    pub message: Value,
}

impl TypedData {
    /// The 32-byte digest to sign
    pub fn digest(&self) -> Result<[u8; 32], TypedDataError> {
        hash_typed_data(
            &self.domain,
            &self.types,
            self.primary_type.as_deref(),
            &self.message,
        )
    }
}

/// `keccak256(0x19 0x01 ‖ hash_domain(domain) ‖ hash_struct(primary, message))`.
/// The primary type is detected from `types` when not given.
pub fn hash_typed_data(
    domain: &TypedDataDomain,
    types: &TypeMap,
    primary_type: Option<&str>,
    message: &Value,
) -> Result<[u8; 32], TypedDataError> {
    let encoder = TypedDataEncoder::new(types)?;
    let primary = match primary_type {
        Some(primary) => primary.to_string(),
        None => encoder.primary_type()?,
    };
    let domain_separator = hash_domain(domain)?;
    let struct_hash = encoder.hash_struct(&primary, message)?;

    let mut payload = Vec::with_capacity(66);
    payload.extend_from_slice(&[0x19, 0x01]);
    payload.extend_from_slice(&domain_separator);
    payload.extend_from_slice(&struct_hash);
    Ok(keccak256(&payload))
}

/// Encoder over a set of struct definitions
pub struct TypedDataEncoder {
    types: TypeMap,
}

impl TypedDataEncoder {
    /// Build an encoder. An `EIP712Domain` entry is dropped; every struct
    /// referenced by a field must be defined.
    pub fn new(types: &TypeMap) -> Result<Self, TypedDataError> {
        let types: TypeMap = types
            .iter()
            .filter(|(name, _)| name.as_str() != EIP712_DOMAIN)
            .map(|(name, fields)| (name.clone(), fields.clone()))
            .collect();

        let encoder = Self { types };
        for fields in encoder.types.values() {
            for field in fields {
                let base = base_type(&field.field_type);
                if !encoder.types.contains_key(base) && !is_atomic(base) {
                    return Err(TypedDataError::UnknownType(field.field_type.clone()));
                }
            }
        }
        Ok(encoder)
    }

    fn fields(&self, type_name: &str) -> Result<&[TypedDataField], TypedDataError> {
        self.types
            .get(type_name)
            .map(|fields| fields.as_slice())
            .ok_or_else(|| TypedDataError::UnknownType(type_name.to_string()))
    }

    /// The single struct that no other struct references
    pub fn primary_type(&self) -> Result<String, TypedDataError> {
        let referenced: BTreeSet<&str> = self
            .types
            .values()
            .flatten()
            .map(|field| base_type(&field.field_type))
            .collect();

        let candidates: Vec<String> = self
            .types
            .keys()
            .filter(|name| !referenced.contains(name.as_str()))
            .cloned()
            .collect();

        match candidates.len() {
            0 => Err(TypedDataError::NoPrimaryType),
            1 => Ok(candidates[0].clone()),
            _ => Err(TypedDataError::AmbiguousPrimaryType(candidates)),
        }
    }

    fn collect_dependencies(&self, type_name: &str, found: &mut BTreeSet<String>) {
        let base = base_type(type_name);
        if found.contains(base) {
            return;
        }
        if let Some(fields) = self.types.get(base) {
            found.insert(base.to_string());
            for field in fields {
                self.collect_dependencies(&field.field_type, found);
            }
        }
    }

    /// `Primary(type name,…)` followed by referenced structs sorted by name
    pub fn encode_type(&self, type_name: &str) -> Result<String, TypedDataError> {
        self.fields(type_name)?;

        let mut dependencies = BTreeSet::new();
        self.collect_dependencies(type_name, &mut dependencies);
        dependencies.remove(type_name);

        let mut encoded = String::new();
        for name in std::iter::once(type_name.to_string()).chain(dependencies) {
            let members: Vec<String> = self
                .fields(&name)?
                .iter()
                .map(|field| format!("{} {}", field.field_type, field.name))
                .collect();
            encoded.push_str(&format!("{}({})", name, members.join(",")));
        }
        Ok(encoded)
    }

    pub fn type_hash(&self, type_name: &str) -> Result<[u8; 32], TypedDataError> {
        Ok(keccak256(self.encode_type(type_name)?.as_bytes()))
    }

    /// `type_hash ‖ enc(field_1) ‖ … ‖ enc(field_n)`
    pub fn encode_data(&self, type_name: &str, value: &Value) -> Result<Vec<u8>, TypedDataError> {
        let object = value.as_object().ok_or_else(|| TypedDataError::InvalidValue {
            type_name: type_name.to_string(),
            reason: "expected an object".to_string(),
        })?;

        let fields = self.fields(type_name)?;
        let mut encoded = Vec::with_capacity(32 * (fields.len() + 1));
        encoded.extend_from_slice(&self.type_hash(type_name)?);
        for field in fields {
            let member = object
                .get(&field.name)
                .ok_or_else(|| TypedDataError::MissingField {
                    type_name: type_name.to_string(),
                    field: field.name.clone(),
                })?;
            encoded.extend_from_slice(&self.encode_value(&field.field_type, member)?);
        }
        Ok(encoded)
    }

    pub fn hash_struct(&self, type_name: &str, value: &Value) -> Result<[u8; 32], TypedDataError> {
        Ok(keccak256(&self.encode_data(type_name, value)?))
    }

    fn encode_value(&self, field_type: &str, value: &Value) -> Result<[u8; 32], TypedDataError> {
        if let Some((inner, length)) = split_array(field_type) {
            let items = value.as_array().ok_or_else(|| invalid(field_type, "expected an array"))?;
            if let Some(length) = length {
                if items.len() != length {
                    return Err(invalid(
                        field_type,
                        &format!("expected {} items, got {}", length, items.len()),
                    ));
                }
            }
            let mut concatenated = Vec::with_capacity(32 * items.len());
            for item in items {
                concatenated.extend_from_slice(&self.encode_value(inner, item)?);
            }
            return Ok(keccak256(&concatenated));
        }

        if self.types.contains_key(field_type) {
            return self.hash_struct(field_type, value);
        }

        encode_atomic(field_type, value)
    }
}

/// Domain separator: `hash_struct(EIP712Domain, domain)` over the present fields
pub fn hash_domain(domain: &TypedDataDomain) -> Result<[u8; 32], TypedDataError> {
    let mut fields = Vec::new();
    let mut value = Map::new();

    if let Some(name) = &domain.name {
        fields.push(TypedDataField::new("name", "string"));
        value.insert("name".to_string(), Value::String(name.clone()));
    }
    if let Some(version) = &domain.version {
        fields.push(TypedDataField::new("version", "string"));
        value.insert("version".to_string(), Value::String(version.clone()));
    }
    if let Some(chain_id) = &domain.chain_id {
        fields.push(TypedDataField::new("chainId", "uint256"));
        value.insert("chainId".to_string(), chain_id.clone());
    }
    if let Some(contract) = &domain.verifying_contract {
        fields.push(TypedDataField::new("verifyingContract", "address"));
        value.insert(
            "verifyingContract".to_string(),
            Value::String(contract.clone()),
        );
    }
    if let Some(salt) = &domain.salt {
        fields.push(TypedDataField::new("salt", "bytes32"));
        value.insert("salt".to_string(), Value::String(salt.clone()));
    }

    let mut types = TypeMap::new();
    types.insert(EIP712_DOMAIN.to_string(), fields);
    let encoder = TypedDataEncoder { types };
    encoder.hash_struct(EIP712_DOMAIN, &Value::Object(value))
}

fn invalid(type_name: &str, reason: &str) -> TypedDataError {
    TypedDataError::InvalidValue {
        type_name: type_name.to_string(),
        reason: reason.to_string(),
    }
}

/// Strip every array suffix: `Person[][2]` -> `Person`
fn base_type(field_type: &str) -> &str {
    field_type.split('[').next().unwrap_or(field_type)
}

/// `T[]` -> (`T`, None), `T[3]` -> (`T`, Some(3))
fn split_array(field_type: &str) -> Option<(&str, Option<usize>)> {
    if !field_type.ends_with(']') {
        return None;
    }
    let open = field_type.rfind('[')?;
    let inner = &field_type[..open];
    let size = &field_type[open + 1..field_type.len() - 1];
    if size.is_empty() {
        Some((inner, None))
    } else {
        size.parse().ok().map(|length| (inner, Some(length)))
    }
}

fn integer_width(field_type: &str, prefix: &str) -> Option<usize> {
    let digits = field_type.strip_prefix(prefix)?;
    if digits.is_empty() {
        return Some(256);
    }
    let bits: usize = digits.parse().ok()?;
    (bits > 0 && bits <= 256 && bits % 8 == 0).then_some(bits)
}

fn fixed_bytes_width(field_type: &str) -> Option<usize> {
    let digits = field_type.strip_prefix("bytes")?;
    let width: usize = digits.parse().ok()?;
    (1..=32).contains(&width).then_some(width)
}

fn is_atomic(field_type: &str) -> bool {
    matches!(
        field_type,
        "bool" | "address" | "string" | "bytes" | "trcToken"
    ) || integer_width(field_type, "uint").is_some()
        || integer_width(field_type, "int").is_some()
        || fixed_bytes_width(field_type).is_some()
}

fn encode_atomic(field_type: &str, value: &Value) -> Result<[u8; 32], TypedDataError> {
    match field_type {
        "string" => {
            let text = value.as_str().ok_or_else(|| invalid(field_type, "expected a string"))?;
            return Ok(keccak256(text.as_bytes()));
        }
        "bytes" => {
            let bytes = decode_bytes(field_type, value)?;
            return Ok(keccak256(&bytes));
        }
        "bool" => {
            let flag = value.as_bool().ok_or_else(|| invalid(field_type, "expected a bool"))?;
            let mut word = [0u8; 32];
            word[31] = flag as u8;
            return Ok(word);
        }
        "address" => {
            let text = value.as_str().ok_or_else(|| invalid(field_type, "expected a string"))?;
            let address =
                parse_evm_compatible(text).map_err(|e| invalid(field_type, &e.to_string()))?;
            let mut word = [0u8; 32];
            word[12..].copy_from_slice(&address.eth_bytes());
            return Ok(word);
        }
        "trcToken" => return encode_uint(field_type, 256, value),
        _ => {}
    }

    if let Some(bits) = integer_width(field_type, "uint") {
        return encode_uint(field_type, bits, value);
    }
    if let Some(bits) = integer_width(field_type, "int") {
        return encode_int(field_type, bits, value);
    }
    if let Some(width) = fixed_bytes_width(field_type) {
        let bytes = decode_bytes(field_type, value)?;
        if bytes.len() != width {
            return Err(invalid(
                field_type,
                &format!("expected {} bytes, got {}", width, bytes.len()),
            ));
        }
        let mut word = [0u8; 32];
        word[..width].copy_from_slice(&bytes);
        return Ok(word);
    }

    Err(TypedDataError::UnknownType(field_type.to_string()))
}

fn decode_bytes(field_type: &str, value: &Value) -> Result<Vec<u8>, TypedDataError> {
    let text = value.as_str().ok_or_else(|| invalid(field_type, "expected a hex string"))?;
    hex::decode(strip_0x(text)).map_err(|e| invalid(field_type, &e.to_string()))
}

/// Parse a JSON integer into (negative, magnitude)
fn parse_integer(field_type: &str, value: &Value) -> Result<(bool, U256), TypedDataError> {
    match value {
        Value::Number(number) => {
            if let Some(unsigned) = number.as_u64() {
                Ok((false, U256::from(unsigned)))
            } else if let Some(signed) = number.as_i64() {
                Ok((signed < 0, U256::from(signed.unsigned_abs())))
            } else {
                Err(invalid(field_type, "fractional numbers are not integers"))
            }
        }
        Value::String(text) => {
            let text = text.trim();
            let (negative, digits) = match text.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, text),
            };
            let magnitude = if digits.starts_with("0x") || digits.starts_with("0X") {
                U256::from_str_radix(&digits[2..], 16)
                    .map_err(|_| invalid(field_type, "bad hex integer"))?
            } else {
                U256::from_dec_str(digits).map_err(|_| invalid(field_type, "bad decimal integer"))?
            };
            Ok((negative && !magnitude.is_zero(), magnitude))
        }
        _ => Err(invalid(field_type, "expected a number or numeric string")),
    }
}

fn encode_uint(field_type: &str, bits: usize, value: &Value) -> Result<[u8; 32], TypedDataError> {
    let (negative, magnitude) = parse_integer(field_type, value)?;
    if negative {
        return Err(invalid(field_type, "negative value for unsigned type"));
    }
    if bits < 256 && magnitude >= (U256::one() << bits) {
        return Err(invalid(field_type, "value out of range"));
    }
    let mut word = [0u8; 32];
    magnitude.to_big_endian(&mut word);
    Ok(word)
}

fn encode_int(field_type: &str, bits: usize, value: &Value) -> Result<[u8; 32], TypedDataError> {
    let (negative, magnitude) = parse_integer(field_type, value)?;
    let limit = U256::one() << (bits - 1);
    let in_range = if negative {
        magnitude <= limit
    } else {
        magnitude < limit
    };
    if !in_range {
        return Err(invalid(field_type, "value out of range"));
    }

    let encoded = if negative {
        (!magnitude).overflowing_add(U256::one()).0
    } else {
        magnitude
    };
    let mut word = [0u8; 32];
    encoded.to_big_endian(&mut word);
    Ok(word)
}
