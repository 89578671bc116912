//! Transaction handling
//!
//! Legacy Ethereum value transfers with EIP-155 replay protection:
//! - The signing payload commits to the chain ID
//! - `v` encodes both the recovery id and the chain ID
//! - The transaction hash is Keccak-256 over the signed RLP encoding

use crate::core::rlp::{self, RlpItem};
use crate::core::Address;
use crate::crypto::{keccak256, recover_address, KeyError, KeyPair, RecoverableSig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Default chain ID (Ethereum mainnet)
pub const DEFAULT_CHAIN_ID: u64 = 1;

/// Gas used by a plain value transfer
pub const DEFAULT_GAS_LIMIT: u64 = 21_000;

/// EIP-155 offset added to `recovery_id + 2 * chain_id`
const EIP155_V_OFFSET: u64 = 35;

// =============================================================================
// Error Types
// =============================================================================

/// Transaction-related errors
#[derive(Error, Debug)]
pub enum TransactionError {
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Wrong chain ID: expected {0}, got {1}")]
    WrongChainId(u64, u64),
    #[error("Crypto error: {0}")]
    CryptoError(#[from] KeyError),
}

// =============================================================================
// Unsigned Transaction
// =============================================================================

/// An unsigned legacy transaction, all amounts in base units (wei)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub nonce: u64,
    pub to: Address,
    /// Value in wei
    pub value: u128,
    pub gas_limit: u64,
    /// Gas price in wei
    pub gas_price: u128,
    #[serde(default, with = "hex_bytes")]
    pub data: Vec<u8>,
}

impl Transaction {
    /// Create a plain value transfer
    pub fn new(nonce: u64, to: Address, value: u128, gas_limit: u64, gas_price: u128) -> Self {
        Self {
            nonce,
            to,
            value,
            gas_limit,
            gas_price,
            data: Vec::new(),
        }
    }

    fn base_fields(&self) -> Vec<RlpItem> {
        vec![
            RlpItem::uint(self.nonce as u128),
            RlpItem::uint(self.gas_price),
            RlpItem::uint(self.gas_limit as u128),
            RlpItem::bytes(self.to.as_bytes()),
            RlpItem::uint(self.value),
            RlpItem::bytes(&self.data),
        ]
    }

    /// RLP payload that gets hashed and signed for `chain_id`
    pub fn signing_payload(&self, chain_id: u64) -> Vec<u8> {
        let mut fields = self.base_fields();
        fields.push(RlpItem::uint(chain_id as u128));
        fields.push(RlpItem::uint(0));
        fields.push(RlpItem::uint(0));
        rlp::encode(&RlpItem::List(fields))
    }

    /// Digest that the sender signs
    pub fn signing_hash(&self, chain_id: u64) -> [u8; 32] {
        keccak256(&self.signing_payload(chain_id))
    }

    /// Sign with `key` for `chain_id`
    pub fn sign(&self, key: &KeyPair, chain_id: u64) -> Result<SignedTransaction, TransactionError> {
        let sig = key.sign_recoverable(&self.signing_hash(chain_id))?;
        Ok(SignedTransaction::new(self.clone(), chain_id, sig))
    }
}

// =============================================================================
// Signed Transaction
// =============================================================================

/// A transaction signed for a specific chain, ready for broadcast
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub tx: Transaction,
    pub chain_id: u64,
    pub v: u64,
    #[serde(with = "hex_array")]
    pub r: [u8; 32],
    #[serde(with = "hex_array")]
    pub s: [u8; 32],
    /// Keccak-256 of the raw encoding
    #[serde(with = "hex_array")]
    pub hash: [u8; 32],
}

impl SignedTransaction {
    fn new(tx: Transaction, chain_id: u64, sig: RecoverableSig) -> Self {
        let mut signed = Self {
            tx,
            chain_id,
            v: sig.recovery_id as u64 + EIP155_V_OFFSET + 2 * chain_id,
            r: sig.r,
            s: sig.s,
            hash: [0u8; 32],
        };
        signed.hash = keccak256(&signed.raw());
        signed
    }

    /// RLP encoding submitted through `eth_sendRawTransaction`
    pub fn raw(&self) -> Vec<u8> {
        let mut fields = self.tx.base_fields();
        fields.push(RlpItem::uint(self.v as u128));
        fields.push(RlpItem::scalar(&self.r));
        fields.push(RlpItem::scalar(&self.s));
        rlp::encode(&RlpItem::List(fields))
    }

    pub fn raw_hex(&self) -> String {
        format!("0x{}", hex::encode(self.raw()))
    }

    pub fn hash_hex(&self) -> String {
        format!("0x{}", hex::encode(self.hash))
    }

    /// Recover the sender address from the signature
    pub fn sender(&self) -> Result<Address, TransactionError> {
        let recovery_id = self
            .v
            .checked_sub(EIP155_V_OFFSET + 2 * self.chain_id)
            .filter(|id| *id <= 1)
            .ok_or(TransactionError::InvalidSignature)?;

        let sig = RecoverableSig {
            recovery_id: recovery_id as u8,
            r: self.r,
            s: self.s,
        };
        Ok(recover_address(&self.tx.signing_hash(self.chain_id), &sig)?)
    }

    /// Check the signature was made for `chain_id`
    pub fn verify_chain_id(&self, chain_id: u64) -> Result<(), TransactionError> {
        if self.chain_id != chain_id {
            return Err(TransactionError::WrongChainId(chain_id, self.chain_id));
        }
        Ok(())
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s.trim_start_matches("0x")).map_err(serde::de::Error::custom)
    }
}

mod hex_array {
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
        super::hex_bytes::serialize(bytes, serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 32], D::Error> {
        let bytes = super::hex_bytes::deserialize(deserializer)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("expected 32 bytes"))
    }
}
