//! # Core Ledger Entities
//!
//! Identifiers, keys and accounts as the pre-handle stage sees them.
//!
//! Accounts may be addressed either by number or by alias. An alias is
//! either a serialized key or a 20-byte EVM address; stores resolve both
//! forms to the canonical numeric id.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

/// A 20-byte EVM address.
pub type EvmAddress = [u8; 20];

/// A 32-byte Ed25519 public key.
pub type Ed25519PublicKey = [u8; 32];

/// A 33-byte compressed secp256k1 public key.
pub type Secp256k1PublicKey = [u8; 33];

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Identifies an account either by number or by alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AccountId {
    /// Canonical numeric id.
    Num(u64),
    /// Key alias or 20-byte EVM address alias.
    Alias(Vec<u8>),
}

impl AccountId {
    /// The numeric id, if this is a canonical reference.
    pub fn num(&self) -> Option<u64> {
        match self {
            Self::Num(num) => Some(*num),
            Self::Alias(_) => None,
        }
    }

    pub fn is_alias(&self) -> bool {
        matches!(self, Self::Alias(_))
    }

    /// The EVM address carried by a 20-byte alias.
    pub fn evm_address(&self) -> Option<EvmAddress> {
        match self {
            Self::Alias(alias) => EvmAddress::try_from(alias.as_slice()).ok(),
            Self::Num(_) => None,
        }
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(num) => write!(f, "0.0.{}", num),
            Self::Alias(alias) => write!(f, "0.0.0x{}", hex::encode(alias)),
        }
    }
}

/// Identifies a contract either by number or by EVM address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContractId {
    Num(u64),
    EvmAddress(EvmAddress),
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(num) => write!(f, "0.0.{}", num),
            Self::EvmAddress(address) => write!(f, "0x{}", hex::encode(address)),
        }
    }
}

/// Decodes a "long-zero" EVM address, whose first 12 bytes are zero and
/// whose last 8 bytes hold an entity number.
pub fn long_zero_num(address: &EvmAddress) -> Option<u64> {
    let (prefix, num) = address.split_at(12);
    if prefix.iter().any(|b| *b != 0) {
        return None;
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(num);
    Some(u64::from_be_bytes(bytes))
}

/// Consensus-style timestamp.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanos: i32,
}

impl Timestamp {
    pub fn new(seconds: i64, nanos: i32) -> Self {
        Self { seconds, nanos }
    }
}

/// Unique transaction identifier: payer plus valid-start time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId {
    /// The account paying for the transaction.
    pub payer: AccountId,
    /// Start of the validity window.
    pub valid_start: Timestamp,
    /// Set on ids of transactions created by the schedule service.
    pub scheduled: bool,
    /// Distinguishes child transactions of one user transaction.
    pub nonce: i32,
}

impl TransactionId {
    pub fn new(payer: AccountId, valid_start: Timestamp) -> Self {
        Self {
            payer,
            valid_start,
            scheduled: false,
            nonce: 0,
        }
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}.{:09}",
            self.payer, self.valid_start.seconds, self.valid_start.nanos
        )?;
        if self.scheduled {
            write!(f, "?scheduled")?;
        }
        if self.nonce != 0 {
            write!(f, "/{}", self.nonce)?;
        }
        Ok(())
    }
}

// =============================================================================
// KEYS
// =============================================================================

/// A cryptographic key structure.
///
/// Primitive keys verify a single signature. Key lists require every member
/// to verify and thresholds require at least `threshold` members. Contract
/// keys are satisfied by contract execution rather than by signatures.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Ed25519(Ed25519PublicKey),
    EcdsaSecp256k1(#[serde_as(as = "Bytes")] Secp256k1PublicKey),
    KeyList(Vec<Key>),
    Threshold { threshold: u32, keys: Vec<Key> },
    ContractId(ContractId),
    DelegatableContractId(ContractId),
    /// Sentinel used by immutable entities.
    Empty,
}

impl Key {
    /// True when no signature could ever satisfy this key.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::KeyList(keys) => keys.iter().all(Key::is_empty),
            Self::Threshold { keys, .. } => keys.iter().all(Key::is_empty),
            _ => false,
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Self::Ed25519(_) | Self::EcdsaSecp256k1(_))
    }

    /// True when this key is the contract id key of `contract` itself.
    pub fn is_self_reference(&self, contract: &ContractId) -> bool {
        match self {
            Self::ContractId(id) | Self::DelegatableContractId(id) => id == contract,
            _ => false,
        }
    }
}

// =============================================================================
// ACCOUNTS
// =============================================================================

/// An account snapshot as read by the pre-handle stage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Account {
    /// Canonical numeric id.
    pub id: AccountId,
    /// Controlling key. `None` for hollow accounts.
    pub key: Option<Key>,
    /// Key or EVM address alias.
    pub alias: Option<Vec<u8>>,
    pub deleted: bool,
    pub receiver_sig_required: bool,
    pub smart_contract: bool,
}

impl Account {
    /// A live account controlled by `key`.
    pub fn new(num: u64, key: Key) -> Self {
        Self {
            id: AccountId::Num(num),
            key: Some(key),
            alias: None,
            deleted: false,
            receiver_sig_required: false,
            smart_contract: false,
        }
    }

    /// An account created by value transfer to an EVM address, not yet
    /// bound to a key.
    pub fn hollow(num: u64, address: EvmAddress) -> Self {
        Self {
            id: AccountId::Num(num),
            key: None,
            alias: Some(address.to_vec()),
            deleted: false,
            receiver_sig_required: false,
            smart_contract: false,
        }
    }

    /// The key, when it is present and not empty.
    pub fn usable_key(&self) -> Option<&Key> {
        self.key.as_ref().filter(|key| !key.is_empty())
    }

    /// The EVM address alias, when the alias is exactly 20 bytes.
    pub fn evm_address(&self) -> Option<EvmAddress> {
        self.alias
            .as_deref()
            .and_then(|alias| EvmAddress::try_from(alias).ok())
    }

    /// No usable key but an EVM address alias.
    pub fn is_hollow(&self) -> bool {
        self.usable_key().is_none() && self.evm_address().is_some()
    }

    /// This account's id in contract form.
    pub fn contract_id(&self) -> Option<ContractId> {
        self.id.num().map(ContractId::Num)
    }
}
