//! Ledger addresses
//!
//! Three renderings of the same 21 bytes:
//! - hex: `41` + 40 lowercase hex digits
//! - base58check: the `T…` display form
//! - checksum-hex: hex with EIP-55 style mixed case

pub mod address;
pub mod codec;

pub use address::{
    parse_evm_compatible, Address, AddressError, ADDRESS_HEX_LEN, ADDRESS_LEN, ADDRESS_PREFIX,
};
pub use codec::{
    derive_lenient, derive_strict, is_address, is_checksum_address, to_checksum_address,
};
