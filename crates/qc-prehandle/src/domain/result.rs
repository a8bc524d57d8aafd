//! # Preprocessing Result
//!
//! The artifact handed from pre-handle to the post-consensus handle stage.
//!
//! ## Status Machine
//!
//! | Status | Terminal | Blame | Produced by |
//! |--------|----------|-------|-------------|
//! | `SO_FAR_SO_GOOD` | no | none | every check passed, signatures scheduled |
//! | `NODE_DUE_DILIGENCE_FAILURE` | yes | node | bad bytes, wrong node, bad payer |
//! | `PRE_HANDLE_FAILURE` | yes | payer | requirement collection failed |
//! | `UNKNOWN_FAILURE` | yes | deferred | unexpected fault |
//!
//! Results are immutable once built and shared behind `Arc`.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use shared_types::{Account, AccountId, Key, ResponseCode};

use crate::domain::context::TransactionKeys;
use crate::domain::entities::ParsedTransaction;
use crate::domain::verification::PendingVerification;

/// Outcome class of a preprocessing pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    SoFarSoGood,
    NodeDueDiligenceFailure,
    PreHandleFailure,
    UnknownFailure,
}

/// Who answers for a failed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blame {
    /// Nothing failed yet.
    None,
    /// The submitting node should not have forwarded the transaction.
    Node,
    /// The payer submitted an invalid transaction.
    Payer,
    /// Unknown, decided again during execution.
    Deferred,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SoFarSoGood => "SO_FAR_SO_GOOD",
            Self::NodeDueDiligenceFailure => "NODE_DUE_DILIGENCE_FAILURE",
            Self::PreHandleFailure => "PRE_HANDLE_FAILURE",
            Self::UnknownFailure => "UNKNOWN_FAILURE",
        }
    }

    /// Terminal statuses are final; `SO_FAR_SO_GOOD` still depends on the
    /// signature outcomes.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::SoFarSoGood)
    }

    pub fn blame(&self) -> Blame {
        match self {
            Self::SoFarSoGood => Blame::None,
            Self::NodeDueDiligenceFailure => Blame::Node,
            Self::PreHandleFailure => Blame::Payer,
            Self::UnknownFailure => Blame::Deferred,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of pre-handling one transaction.
#[derive(Debug, Clone)]
pub struct PreprocessingResult {
    status: Status,
    response_code: ResponseCode,
    payer: Option<AccountId>,
    payer_key: Option<Key>,
    tx_info: Option<Arc<ParsedTransaction>>,
    required_keys: Option<HashSet<Key>>,
    optional_keys: Option<HashSet<Key>>,
    hollow_accounts: HashSet<Account>,
    verification_results: Option<HashMap<Key, PendingVerification>>,
    inner_result: Option<Arc<PreprocessingResult>>,
    config_version: u64,
}

impl PreprocessingResult {
    // =========================================================================
    // CONSTRUCTORS
    // =========================================================================

    /// An unexpected fault. Carries nothing but the status.
    pub fn unknown_failure(config_version: u64) -> Self {
        Self {
            status: Status::UnknownFailure,
            response_code: ResponseCode::Unknown,
            payer: None,
            payer_key: None,
            tx_info: None,
            required_keys: None,
            optional_keys: None,
            hollow_accounts: HashSet::new(),
            verification_results: None,
            inner_result: None,
            config_version,
        }
    }

    /// The submitting node is charged: `node` becomes the payer.
    pub fn node_due_diligence_failure(
        node: AccountId,
        code: ResponseCode,
        tx_info: Option<Arc<ParsedTransaction>>,
        config_version: u64,
    ) -> Self {
        Self {
            status: Status::NodeDueDiligenceFailure,
            response_code: code,
            payer: Some(node),
            tx_info,
            ..Self::unknown_failure(config_version)
        }
    }

    /// The payer is charged. Only the payer's signature is scheduled.
    pub fn pre_handle_failure(
        payer: AccountId,
        keys: TransactionKeys,
        code: ResponseCode,
        tx_info: Arc<ParsedTransaction>,
        verification_results: HashMap<Key, PendingVerification>,
        config_version: u64,
    ) -> Self {
        Self {
            status: Status::PreHandleFailure,
            response_code: code,
            payer: Some(payer),
            payer_key: Some(keys.payer_key),
            tx_info: Some(tx_info),
            required_keys: Some(keys.required_non_payer_keys),
            optional_keys: Some(keys.optional_non_payer_keys),
            hollow_accounts: keys.required_hollow_accounts,
            verification_results: Some(verification_results),
            inner_result: None,
            config_version,
        }
    }

    /// Every check passed and all signatures are scheduled.
    pub fn so_far_so_good(
        payer: AccountId,
        keys: TransactionKeys,
        tx_info: Arc<ParsedTransaction>,
        verification_results: HashMap<Key, PendingVerification>,
        inner_result: Option<Arc<PreprocessingResult>>,
        config_version: u64,
    ) -> Self {
        Self {
            status: Status::SoFarSoGood,
            response_code: ResponseCode::Ok,
            payer: Some(payer),
            payer_key: Some(keys.payer_key),
            tx_info: Some(tx_info),
            required_keys: Some(keys.required_non_payer_keys),
            optional_keys: Some(keys.optional_non_payer_keys),
            hollow_accounts: keys.required_hollow_accounts,
            verification_results: Some(verification_results),
            inner_result,
            config_version,
        }
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn response_code(&self) -> ResponseCode {
        self.response_code
    }

    pub fn payer(&self) -> Option<&AccountId> {
        self.payer.as_ref()
    }

    pub fn payer_key(&self) -> Option<&Key> {
        self.payer_key.as_ref()
    }

    pub fn tx_info(&self) -> Option<&Arc<ParsedTransaction>> {
        self.tx_info.as_ref()
    }

    pub fn required_keys(&self) -> Option<&HashSet<Key>> {
        self.required_keys.as_ref()
    }

    pub fn optional_keys(&self) -> Option<&HashSet<Key>> {
        self.optional_keys.as_ref()
    }

    pub fn hollow_accounts(&self) -> &HashSet<Account> {
        &self.hollow_accounts
    }

    pub fn verification_results(&self) -> Option<&HashMap<Key, PendingVerification>> {
        self.verification_results.as_ref()
    }

    /// The handle for one key's signature.
    pub fn verification_for(&self, key: &Key) -> Option<&PendingVerification> {
        self.verification_results.as_ref()?.get(key)
    }

    /// Keys with a verification handle.
    pub fn verification_keys(&self) -> impl Iterator<Item = &Key> {
        self.verification_results.iter().flat_map(HashMap::keys)
    }

    /// Result for the embedded transaction, if the router reflected one.
    pub fn inner_result(&self) -> Option<&Arc<PreprocessingResult>> {
        self.inner_result.as_ref()
    }

    pub fn config_version(&self) -> u64 {
        self.config_version
    }

    /// The signer requirements this result was computed with.
    pub fn requirements(&self) -> Option<TransactionKeys> {
        Some(TransactionKeys {
            payer_key: self.payer_key.clone()?,
            required_non_payer_keys: self.required_keys.clone()?,
            optional_non_payer_keys: self.optional_keys.clone()?,
            required_hollow_accounts: self.hollow_accounts.clone(),
        })
    }

    // =========================================================================
    // REUSE
    // =========================================================================

    /// Whether this result may be returned verbatim for the same transaction
    /// under `config_version`.
    ///
    /// Unparseable transactions never change, so a result without `tx_info`
    /// is reusable under any configuration.
    pub fn can_reuse(&self, config_version: u64) -> bool {
        self.tx_info.is_none() || self.config_version == config_version
    }

    /// Exact set comparison of every requirement field against `keys`.
    pub fn has_same_requirements(&self, keys: &TransactionKeys) -> bool {
        self.payer_key.as_ref() == Some(&keys.payer_key)
            && self.required_keys.as_ref() == Some(&keys.required_non_payer_keys)
            && self.optional_keys.as_ref() == Some(&keys.optional_non_payer_keys)
            && self.hollow_accounts == keys.required_hollow_accounts
    }

    /// Whether the verification handles of this result can stand in for a
    /// fresh pass that collected `keys` under `config_version`.
    pub fn can_reuse_verifications(&self, keys: &TransactionKeys, config_version: u64) -> bool {
        self.tx_info.is_some()
            && self.status == Status::SoFarSoGood
            && self.config_version == config_version
            && self.has_same_requirements(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::verification::SignatureVerification;
    use shared_types::{
        CryptoTransferBody, SignatureMap, Timestamp, TransactionBody, TransactionData,
        TransactionId,
    };

    fn tx_info() -> Arc<ParsedTransaction> {
        let body = TransactionBody {
            transaction_id: Some(TransactionId::new(AccountId::Num(1001), Timestamp::new(1, 0))),
            node_account_id: Some(AccountId::Num(3)),
            transaction_fee: 1,
            valid_duration_secs: 120,
            memo: String::new(),
            data: TransactionData::CryptoTransfer(CryptoTransferBody { transfers: vec![] }),
        };
        Arc::new(ParsedTransaction::new(body, SignatureMap::default(), vec![1], vec![2]))
    }

    fn keys() -> TransactionKeys {
        TransactionKeys {
            payer_key: Key::Ed25519([1; 32]),
            required_non_payer_keys: HashSet::from([Key::Ed25519([2; 32])]),
            optional_non_payer_keys: HashSet::new(),
            required_hollow_accounts: HashSet::from([Account::hollow(1005, [0xBB; 20])]),
        }
    }

    fn good(config_version: u64) -> PreprocessingResult {
        let handles = keys()
            .all_keys()
            .into_iter()
            .map(|k| (k.clone(), PendingVerification::ready(SignatureVerification::passed(k))))
            .collect();
        PreprocessingResult::so_far_so_good(
            AccountId::Num(1001),
            keys(),
            tx_info(),
            handles,
            None,
            config_version,
        )
    }

    #[test]
    fn test_status_blame() {
        assert!(!Status::SoFarSoGood.is_terminal());
        assert!(Status::UnknownFailure.is_terminal());
        assert_eq!(Status::NodeDueDiligenceFailure.blame(), Blame::Node);
        assert_eq!(Status::PreHandleFailure.blame(), Blame::Payer);
        assert_eq!(Status::UnknownFailure.blame(), Blame::Deferred);
        assert_eq!(Status::SoFarSoGood.to_string(), "SO_FAR_SO_GOOD");
    }

    #[test]
    fn test_unknown_failure_is_empty() {
        let result = PreprocessingResult::unknown_failure(3);
        assert_eq!(result.response_code(), ResponseCode::Unknown);
        assert!(result.payer().is_none());
        assert!(result.tx_info().is_none());
        assert!(result.verification_results().is_none());
        assert!(result.requirements().is_none());
        assert!(result.can_reuse(99));
    }

    #[test]
    fn test_node_failure_names_node_as_payer() {
        let result = PreprocessingResult::node_due_diligence_failure(
            AccountId::Num(3),
            ResponseCode::InvalidNodeAccount,
            Some(tx_info()),
            1,
        );
        assert_eq!(result.status(), Status::NodeDueDiligenceFailure);
        assert_eq!(result.payer(), Some(&AccountId::Num(3)));
        assert!(result.payer_key().is_none());
        assert!(result.can_reuse(1));
        assert!(!result.can_reuse(2));
    }

    #[test]
    fn test_verification_lookup() {
        let result = good(1);
        assert_eq!(result.verification_keys().count(), 2);
        assert!(result.verification_for(&Key::Ed25519([2; 32])).is_some());
        assert!(result.verification_for(&Key::Ed25519([7; 32])).is_none());
        assert_eq!(result.requirements(), Some(keys()));
    }

    #[test]
    fn test_requirement_mismatch_rejects_reuse() {
        let result = good(1);
        assert!(result.can_reuse_verifications(&keys(), 1));
        assert!(!result.can_reuse_verifications(&keys(), 2));

        let mut changed = keys();
        changed.payer_key = Key::Ed25519([9; 32]);
        assert!(!result.has_same_requirements(&changed));

        let mut changed = keys();
        changed.required_non_payer_keys.insert(Key::Ed25519([3; 32]));
        assert!(!result.has_same_requirements(&changed));

        let mut changed = keys();
        changed.optional_non_payer_keys.insert(Key::Ed25519([4; 32]));
        assert!(!result.has_same_requirements(&changed));

        let mut changed = keys();
        changed.required_hollow_accounts.clear();
        assert!(!result.has_same_requirements(&changed));
    }
}
