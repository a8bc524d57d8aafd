//! # Error Types
//!
//! Response codes and the typed pre-check failure that carries them.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Outcome code attached to every pre-handle result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseCode {
    Ok,
    InvalidTransaction,
    InvalidTransactionBody,
    InvalidTransactionId,
    InvalidNodeAccount,
    PayerAccountNotFound,
    PayerAccountDeleted,
    InvalidPayerAccountId,
    InvalidAccountId,
    InvalidContractId,
    InvalidAccountAmounts,
    InvalidTransferAccountId,
    AccountDeleted,
    InvalidSignature,
    InvalidPayerSignature,
    KeyPrefixMismatch,
    TransactionOversize,
    MemoTooLong,
    InvalidZeroByteInString,
    InvalidTransactionDuration,
    TransactionIdFieldNotAllowed,
    InsufficientTxFee,
    UnresolvableRequiredSigners,
    NestedDepthExceeded,
    Unknown,
}

impl ResponseCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::InvalidTransaction => "INVALID_TRANSACTION",
            Self::InvalidTransactionBody => "INVALID_TRANSACTION_BODY",
            Self::InvalidTransactionId => "INVALID_TRANSACTION_ID",
            Self::InvalidNodeAccount => "INVALID_NODE_ACCOUNT",
            Self::PayerAccountNotFound => "PAYER_ACCOUNT_NOT_FOUND",
            Self::PayerAccountDeleted => "PAYER_ACCOUNT_DELETED",
            Self::InvalidPayerAccountId => "INVALID_PAYER_ACCOUNT_ID",
            Self::InvalidAccountId => "INVALID_ACCOUNT_ID",
            Self::InvalidContractId => "INVALID_CONTRACT_ID",
            Self::InvalidAccountAmounts => "INVALID_ACCOUNT_AMOUNTS",
            Self::InvalidTransferAccountId => "INVALID_TRANSFER_ACCOUNT_ID",
            Self::AccountDeleted => "ACCOUNT_DELETED",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::InvalidPayerSignature => "INVALID_PAYER_SIGNATURE",
            Self::KeyPrefixMismatch => "KEY_PREFIX_MISMATCH",
            Self::TransactionOversize => "TRANSACTION_OVERSIZE",
            Self::MemoTooLong => "MEMO_TOO_LONG",
            Self::InvalidZeroByteInString => "INVALID_ZERO_BYTE_IN_STRING",
            Self::InvalidTransactionDuration => "INVALID_TRANSACTION_DURATION",
            Self::TransactionIdFieldNotAllowed => "TRANSACTION_ID_FIELD_NOT_ALLOWED",
            Self::InsufficientTxFee => "INSUFFICIENT_TX_FEE",
            Self::UnresolvableRequiredSigners => "UNRESOLVABLE_REQUIRED_SIGNERS",
            Self::NestedDepthExceeded => "NESTED_DEPTH_EXCEEDED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validation failure carrying a response code.
///
/// Raised by the parser, by structural checks and while collecting signing
/// requirements. Any other failure is unexpected and handled separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[error("pre-check failed: {code}")]
pub struct PreCheckError {
    code: ResponseCode,
}

impl PreCheckError {
    pub fn new(code: ResponseCode) -> Self {
        Self { code }
    }

    pub fn code(&self) -> ResponseCode {
        self.code
    }
}

impl From<ResponseCode> for PreCheckError {
    fn from(code: ResponseCode) -> Self {
        Self::new(code)
    }
}

/// Errors from the binary transaction codec.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("encoding failed: {0}")]
    Encode(String),

    #[error("decoding failed: {0}")]
    Decode(String),
}
