//! Core value types
//!
//! This module contains the plain data the custody layer passes around:
//! - Addresses and keystore account handles
//! - Legacy transactions with EIP-155 signing
//! - RLP encoding
//! - Base-unit / display-unit scaling

pub mod address;
pub mod rlp;
pub mod transaction;
pub mod units;

pub use address::{Account, Address, AddressError, ADDRESS_LEN};
pub use transaction::{
    SignedTransaction, Transaction, TransactionError, DEFAULT_CHAIN_ID, DEFAULT_GAS_LIMIT,
};
pub use units::{
    ether_to_wei, gwei_to_wei, wei_to_ether, wei_to_gwei, Denomination, UnitError, ETHER, GWEI,
    WEI_PER_ETHER, WEI_PER_GWEI,
};
