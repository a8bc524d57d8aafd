//! # Transactions
//!
//! Transaction bodies, signature maps and the signed wire envelope.
//!
//! ## Wire Format
//!
//! A `SignedTransaction` is bincode-encoded (fixed-width integers). Its
//! `body_bytes` hold the bincode encoding of a `TransactionBody`; those are
//! the bytes every signature in the `sig_map` signs.

use std::fmt;

use bincode::Options;
use serde::{Deserialize, Serialize};

use crate::entities::{AccountId, ContractId, Key, TransactionId};
use crate::errors::CodecError;

// =============================================================================
// BODIES
// =============================================================================

/// Signed ledger change, common fields plus a kind-specific payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionBody {
    /// Absent only inside a scheduled (nested) body.
    pub transaction_id: Option<TransactionId>,
    /// The node this transaction was submitted to.
    pub node_account_id: Option<AccountId>,
    pub transaction_fee: i64,
    pub valid_duration_secs: i64,
    pub memo: String,
    pub data: TransactionData,
}

impl TransactionBody {
    pub fn kind(&self) -> TransactionKind {
        self.data.kind()
    }

    /// The payer named by the transaction id.
    pub fn payer(&self) -> Option<&AccountId> {
        self.transaction_id.as_ref().map(|id| &id.payer)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        encode(self)
    }

    pub fn from_bytes(bytes: &[u8], limit: u64) -> Result<Self, CodecError> {
        decode(bytes, limit)
    }
}

/// Kind-specific payload of a transaction body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionData {
    CryptoTransfer(CryptoTransferBody),
    CryptoCreate(CryptoCreateBody),
    CryptoUpdate(CryptoUpdateBody),
    CryptoDelete(CryptoDeleteBody),
    ContractCall(ContractCallBody),
    ContractUpdate(ContractUpdateBody),
    ScheduleCreate(ScheduleCreateBody),
}

impl TransactionData {
    pub fn kind(&self) -> TransactionKind {
        match self {
            Self::CryptoTransfer(_) => TransactionKind::CryptoTransfer,
            Self::CryptoCreate(_) => TransactionKind::CryptoCreate,
            Self::CryptoUpdate(_) => TransactionKind::CryptoUpdate,
            Self::CryptoDelete(_) => TransactionKind::CryptoDelete,
            Self::ContractCall(_) => TransactionKind::ContractCall,
            Self::ContractUpdate(_) => TransactionKind::ContractUpdate,
            Self::ScheduleCreate(_) => TransactionKind::ScheduleCreate,
        }
    }
}

/// Discriminant of `TransactionData`, used for routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    CryptoTransfer,
    CryptoCreate,
    CryptoUpdate,
    CryptoDelete,
    ContractCall,
    ContractUpdate,
    ScheduleCreate,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A signed balance change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountAmount {
    pub account: AccountId,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptoTransferBody {
    pub transfers: Vec<AccountAmount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptoCreateBody {
    pub key: Option<Key>,
    pub initial_balance: u64,
    pub receiver_sig_required: bool,
    pub alias: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptoUpdateBody {
    pub account: AccountId,
    pub key: Option<Key>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptoDeleteBody {
    pub account: AccountId,
    pub transfer_account: AccountId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractCallBody {
    pub contract: ContractId,
    pub gas: u64,
    pub amount: i64,
    pub function_parameters: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractUpdateBody {
    pub contract: ContractId,
    pub admin_key: Option<Key>,
}

/// Creates a schedule wrapping an inner transaction body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleCreateBody {
    pub scheduled: Box<TransactionBody>,
    /// Pays for the inner transaction. Defaults to the outer payer.
    pub payer: Option<AccountId>,
    pub admin_key: Option<Key>,
}

// =============================================================================
// SIGNATURES
// =============================================================================

/// A signature tagged with its algorithm.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signature {
    Ed25519(Vec<u8>),
    EcdsaSecp256k1(Vec<u8>),
}

impl Signature {
    pub fn bytes(&self) -> &[u8] {
        match self {
            Self::Ed25519(bytes) | Self::EcdsaSecp256k1(bytes) => bytes,
        }
    }
}

/// A signature together with a prefix of the signing public key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignaturePair {
    pub pub_key_prefix: Vec<u8>,
    pub signature: Signature,
}

/// All signatures attached to a transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureMap {
    pub pairs: Vec<SignaturePair>,
}

impl SignatureMap {
    pub fn new(pairs: Vec<SignaturePair>) -> Self {
        Self { pairs }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// The wire envelope: body bytes plus the signatures over them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub body_bytes: Vec<u8>,
    pub sig_map: SignatureMap,
}

impl SignedTransaction {
    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        encode(self)
    }

    pub fn from_bytes(bytes: &[u8], limit: u64) -> Result<Self, CodecError> {
        decode(bytes, limit)
    }
}

// =============================================================================
// CODEC
// =============================================================================

fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    codec()
        .serialize(value)
        .map_err(|e| CodecError::Encode(e.to_string()))
}

/// Decodes with an allocation limit so hostile length prefixes fail fast.
fn decode<T: for<'de> Deserialize<'de>>(bytes: &[u8], limit: u64) -> Result<T, CodecError> {
    codec()
        .with_limit(limit)
        .deserialize(bytes)
        .map_err(|e| CodecError::Decode(e.to_string()))
}
