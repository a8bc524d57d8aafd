//! Core entities for pre-handle

use std::sync::Arc;

use shared_types::{AccountId, SignatureMap, TransactionBody, TransactionId, TransactionKind};

use crate::domain::result::PreprocessingResult;

/// A transaction that passed parsing and syntactic checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTransaction {
    body: TransactionBody,
    signature_map: SignatureMap,
    /// The exact bytes the signatures sign.
    signed_bytes: Vec<u8>,
    /// The complete wire bytes as submitted.
    transaction_bytes: Vec<u8>,
}

impl ParsedTransaction {
    pub fn new(
        body: TransactionBody,
        signature_map: SignatureMap,
        signed_bytes: Vec<u8>,
        transaction_bytes: Vec<u8>,
    ) -> Self {
        Self {
            body,
            signature_map,
            signed_bytes,
            transaction_bytes,
        }
    }

    /// View of an inner body that shares the outer transaction's signatures.
    pub fn nested(&self, body: TransactionBody) -> Self {
        Self {
            body,
            signature_map: self.signature_map.clone(),
            signed_bytes: self.signed_bytes.clone(),
            transaction_bytes: self.transaction_bytes.clone(),
        }
    }

    pub fn body(&self) -> &TransactionBody {
        &self.body
    }

    pub fn signature_map(&self) -> &SignatureMap {
        &self.signature_map
    }

    pub fn signed_bytes(&self) -> &[u8] {
        &self.signed_bytes
    }

    pub fn transaction_bytes(&self) -> &[u8] {
        &self.transaction_bytes
    }

    pub fn transaction_id(&self) -> Option<&TransactionId> {
        self.body.transaction_id.as_ref()
    }

    pub fn payer(&self) -> Option<&AccountId> {
        self.body.payer()
    }

    pub fn node_account_id(&self) -> Option<&AccountId> {
        self.body.node_account_id.as_ref()
    }

    pub fn kind(&self) -> TransactionKind {
        self.body.kind()
    }
}

/// An application transaction inside a consensus event.
///
/// Pre-handle attaches its result here as metadata for the handle stage.
#[derive(Debug, Clone, Default)]
pub struct RawTransaction {
    bytes: Vec<u8>,
    metadata: Option<Arc<PreprocessingResult>>,
}

impl RawTransaction {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            metadata: None,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn metadata(&self) -> Option<&Arc<PreprocessingResult>> {
        self.metadata.as_ref()
    }

    pub fn set_metadata(&mut self, result: Arc<PreprocessingResult>) {
        self.metadata = Some(result);
    }
}
