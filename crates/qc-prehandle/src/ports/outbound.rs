//! Outbound Ports (Driven Ports / SPI)
//!
//! Collaborators the pipeline calls. Every call site in the pipeline is
//! fault-isolated: a `PreHandleError::PreCheck` maps to a terminal status,
//! anything else (including a panic) becomes an unknown failure.

use std::collections::{HashMap, HashSet};

use shared_types::{Account, AccountId, ContractId, Key, SignatureMap, TransactionBody, TransactionId};

use crate::domain::context::KeyRequirementAccumulator;
use crate::domain::entities::ParsedTransaction;
use crate::domain::errors::{PreHandleError, SchedulerError};
use crate::domain::verification::PendingVerification;

/// Decodes raw bytes and runs syntactic checks.
pub trait TransactionParser: Send + Sync {
    /// Parse `bytes` into a transaction.
    ///
    /// Validation failures are `PreCheck` errors with a response code.
    fn parse_and_check(&self, bytes: &[u8]) -> Result<ParsedTransaction, PreHandleError>;
}

/// Read-only snapshot of ledger accounts.
pub trait AccountDirectory: Send + Sync {
    /// Resolve a numeric or alias id. The returned account carries its
    /// canonical numeric id.
    fn get_account_by_id(&self, id: &AccountId) -> Option<Account>;

    /// Resolve a contract by number or EVM address.
    fn get_contract_by_id(&self, id: &ContractId) -> Option<Account>;
}

/// Per-kind business rules.
pub trait TransactionRouter: Send + Sync {
    /// Ledger-independent validation of a body.
    fn structural_check(&self, body: &TransactionBody) -> Result<(), PreHandleError>;

    /// Record the signatures the transaction needs on `context`.
    ///
    /// Must not block or start asynchronous work.
    fn populate_requirements(
        &self,
        context: &mut KeyRequirementAccumulator<'_>,
    ) -> Result<(), PreHandleError>;
}

/// Keys and hollow accounts to verify for one transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationRequest {
    pub keys: HashSet<Key>,
    pub hollow_accounts: HashSet<Account>,
}

impl VerificationRequest {
    pub fn len(&self) -> usize {
        self.keys.len() + self.hollow_accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty() && self.hollow_accounts.is_empty()
    }
}

/// Asynchronous signature verification.
pub trait SignatureScheduler: Send + Sync {
    /// Submit verification work and return immediately with one handle per
    /// key. Handles for hollow accounts are keyed by the key discovered in
    /// the signature map; hollow accounts without a matching signature get
    /// no handle.
    fn verify(
        &self,
        signed_bytes: &[u8],
        signature_map: &SignatureMap,
        request: &VerificationRequest,
    ) -> Result<HashMap<Key, PendingVerification>, SchedulerError>;
}

/// Concurrent set of recently seen transaction ids.
pub trait DeduplicationRegistry: Send + Sync {
    /// Record `id`. Returns `true` if it was not already present.
    fn add(&self, id: &TransactionId) -> bool;

    fn contains(&self, id: &TransactionId) -> bool;
}
