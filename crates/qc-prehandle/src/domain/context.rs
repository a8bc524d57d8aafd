//! # Key Requirement Accumulator
//!
//! Per-transaction builder for the set of signatures a transaction needs.
//!
//! The router's business rules call the mutators below while inspecting a
//! transaction body. The payer's key is tracked separately and never enters
//! the required or optional sets, so a handler may name the payer freely.
//!
//! Embedded transactions (a schedule's inner body) are previewed with
//! [`KeyRequirementAccumulator::all_keys_for_transaction`], which runs the
//! router against a fresh accumulator and leaves this one untouched.

use std::collections::HashSet;

use shared_types::{
    Account, AccountId, ContractId, Key, PreCheckError, ResponseCode, TransactionBody,
};
use tracing::debug;

use crate::domain::errors::PreHandleError;
use crate::ports::outbound::{AccountDirectory, TransactionRouter};

/// Read-only snapshot of an accumulator's requirements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionKeys {
    pub payer_key: Key,
    pub required_non_payer_keys: HashSet<Key>,
    pub optional_non_payer_keys: HashSet<Key>,
    pub required_hollow_accounts: HashSet<Account>,
}

impl TransactionKeys {
    /// Every key whose signature must be checked: payer, required and
    /// optional keys.
    pub fn all_keys(&self) -> HashSet<Key> {
        let mut keys = HashSet::with_capacity(
            1 + self.required_non_payer_keys.len() + self.optional_non_payer_keys.len(),
        );
        keys.insert(self.payer_key.clone());
        keys.extend(self.required_non_payer_keys.iter().cloned());
        keys.extend(self.optional_non_payer_keys.iter().cloned());
        keys
    }
}

/// An embedded transaction reflected during dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerTransaction {
    pub body: TransactionBody,
    /// Canonical id of the inner payer.
    pub payer: AccountId,
    pub keys: TransactionKeys,
}

/// Collects signer requirements for one transaction.
pub struct KeyRequirementAccumulator<'a> {
    store: &'a dyn AccountDirectory,
    router: &'a dyn TransactionRouter,
    body: &'a TransactionBody,
    payer: Account,
    payer_key: Key,
    required_non_payer_keys: HashSet<Key>,
    optional_non_payer_keys: HashSet<Key>,
    required_hollow_accounts: HashSet<Account>,
    inner: Option<InnerTransaction>,
    depth: usize,
    max_depth: usize,
}

impl<'a> KeyRequirementAccumulator<'a> {
    /// Create an accumulator rooted at `payer_id`.
    ///
    /// # Errors
    ///
    /// - `PAYER_ACCOUNT_NOT_FOUND` if the payer does not resolve
    /// - `INVALID_PAYER_ACCOUNT_ID` if the payer has no usable key
    pub fn new(
        store: &'a dyn AccountDirectory,
        router: &'a dyn TransactionRouter,
        body: &'a TransactionBody,
        payer_id: &AccountId,
        max_depth: usize,
    ) -> Result<Self, PreCheckError> {
        Self::at_depth(store, router, body, payer_id, 0, max_depth)
    }

    fn at_depth(
        store: &'a dyn AccountDirectory,
        router: &'a dyn TransactionRouter,
        body: &'a TransactionBody,
        payer_id: &AccountId,
        depth: usize,
        max_depth: usize,
    ) -> Result<Self, PreCheckError> {
        let payer = store
            .get_account_by_id(payer_id)
            .ok_or(PreCheckError::new(ResponseCode::PayerAccountNotFound))?;
        let payer_key = payer
            .usable_key()
            .cloned()
            .ok_or(PreCheckError::new(ResponseCode::InvalidPayerAccountId))?;

        Ok(Self {
            store,
            router,
            body,
            payer,
            payer_key,
            required_non_payer_keys: HashSet::new(),
            optional_non_payer_keys: HashSet::new(),
            required_hollow_accounts: HashSet::new(),
            inner: None,
            depth,
            max_depth,
        })
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// The body being dispatched. Outlives any borrow of the accumulator.
    pub fn body(&self) -> &'a TransactionBody {
        self.body
    }

    /// Canonical id of the payer.
    pub fn payer(&self) -> &AccountId {
        &self.payer.id
    }

    pub fn payer_account(&self) -> &Account {
        &self.payer
    }

    pub fn payer_key(&self) -> &Key {
        &self.payer_key
    }

    pub fn store(&self) -> &'a dyn AccountDirectory {
        self.store
    }

    pub fn required_non_payer_keys(&self) -> &HashSet<Key> {
        &self.required_non_payer_keys
    }

    pub fn optional_non_payer_keys(&self) -> &HashSet<Key> {
        &self.optional_non_payer_keys
    }

    pub fn required_hollow_accounts(&self) -> &HashSet<Account> {
        &self.required_hollow_accounts
    }

    /// The embedded transaction reflected by the router, if any.
    pub fn inner(&self) -> Option<&InnerTransaction> {
        self.inner.as_ref()
    }

    /// Nesting depth, zero for a top-level transaction.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn keys(&self) -> TransactionKeys {
        TransactionKeys {
            payer_key: self.payer_key.clone(),
            required_non_payer_keys: self.required_non_payer_keys.clone(),
            optional_non_payer_keys: self.optional_non_payer_keys.clone(),
            required_hollow_accounts: self.required_hollow_accounts.clone(),
        }
    }

    // =========================================================================
    // MUTATORS
    // =========================================================================

    /// Require a signature from `key`.
    ///
    /// The payer key and empty keys are ignored.
    pub fn require_key(&mut self, key: Key) -> &mut Self {
        if !self.is_payer_or_empty(&key) {
            self.required_non_payer_keys.insert(key);
        }
        self
    }

    pub fn require_keys(&mut self, keys: impl IntoIterator<Item = Key>) -> &mut Self {
        for key in keys {
            self.require_key(key);
        }
        self
    }

    /// Verify a signature from `key` if one is present, without requiring it.
    pub fn optional_key(&mut self, key: Key) -> &mut Self {
        if !self.is_payer_or_empty(&key) {
            self.optional_non_payer_keys.insert(key);
        }
        self
    }

    pub fn optional_keys(&mut self, keys: impl IntoIterator<Item = Key>) -> &mut Self {
        for key in keys {
            self.optional_key(key);
        }
        self
    }

    /// Require the key of `account_id`, failing with `code` when the account
    /// does not resolve or has neither a key nor an EVM alias.
    ///
    /// A reference to the payer, in any form, adds nothing. A keyless account
    /// with an EVM alias is recorded as a hollow account.
    pub fn require_key_or_throw(
        &mut self,
        account_id: &AccountId,
        code: ResponseCode,
    ) -> Result<(), PreCheckError> {
        let account = self
            .store
            .get_account_by_id(account_id)
            .ok_or(PreCheckError::new(code))?;
        self.require_account_key(account, code)
    }

    /// Like [`Self::require_key_or_throw`], but only when the account has
    /// `receiver_sig_required` set. `None` is a no-op.
    pub fn require_key_if_receiver_sig_required(
        &mut self,
        account_id: Option<&AccountId>,
        code: ResponseCode,
    ) -> Result<(), PreCheckError> {
        let Some(account_id) = account_id else {
            return Ok(());
        };
        let account = self
            .store
            .get_account_by_id(account_id)
            .ok_or(PreCheckError::new(code))?;
        if !account.receiver_sig_required {
            return Ok(());
        }
        self.require_account_key(account, code)
    }

    /// Require the admin key of a contract.
    ///
    /// A contract whose key is its own contract id key is controlled by its
    /// own code, so no signature is added.
    pub fn require_contract_key_or_throw(
        &mut self,
        contract_id: &ContractId,
        code: ResponseCode,
    ) -> Result<(), PreCheckError> {
        let contract = self
            .store
            .get_contract_by_id(contract_id)
            .ok_or(PreCheckError::new(code))?;
        self.require_contract_account_key(contract, code)
    }

    /// Contract analogue of [`Self::require_key_if_receiver_sig_required`].
    pub fn require_contract_key_if_receiver_sig_required(
        &mut self,
        contract_id: Option<&ContractId>,
        code: ResponseCode,
    ) -> Result<(), PreCheckError> {
        let Some(contract_id) = contract_id else {
            return Ok(());
        };
        let contract = self
            .store
            .get_contract_by_id(contract_id)
            .ok_or(PreCheckError::new(code))?;
        if !contract.receiver_sig_required {
            return Ok(());
        }
        self.require_contract_account_key(contract, code)
    }

    /// Require a signature that will finalize the key of a hollow account.
    pub fn require_signature_for_hollow_account(&mut self, account: Account) -> &mut Self {
        if account.id != self.payer.id {
            self.required_hollow_accounts.insert(account);
        }
        self
    }

    // =========================================================================
    // NESTED REFLECTION
    // =========================================================================

    /// Compute the requirements of an embedded transaction.
    ///
    /// Runs the router's structural check and requirement population against
    /// an independent accumulator rooted at `payer_id`. Nothing is recorded on
    /// `self`. Failures propagate unchanged.
    pub fn all_keys_for_transaction(
        &self,
        body: &TransactionBody,
        payer_id: &AccountId,
    ) -> Result<TransactionKeys, PreHandleError> {
        self.nested(body, payer_id).map(|(_, keys)| keys)
    }

    /// Like [`Self::all_keys_for_transaction`], and also remember the inner
    /// transaction so the pipeline can produce an inner result for it.
    pub fn reflect_inner_transaction(
        &mut self,
        body: &TransactionBody,
        payer_id: &AccountId,
    ) -> Result<TransactionKeys, PreHandleError> {
        let (payer, keys) = self.nested(body, payer_id)?;
        self.inner = Some(InnerTransaction {
            body: body.clone(),
            payer,
            keys: keys.clone(),
        });
        Ok(keys)
    }

    fn nested(
        &self,
        body: &TransactionBody,
        payer_id: &AccountId,
    ) -> Result<(AccountId, TransactionKeys), PreHandleError> {
        let depth = self.depth + 1;
        if depth > self.max_depth {
            debug!(depth, max_depth = self.max_depth, "Nested transaction too deep");
            return Err(PreHandleError::pre_check(ResponseCode::NestedDepthExceeded));
        }

        let mut nested = KeyRequirementAccumulator::at_depth(
            self.store,
            self.router,
            body,
            payer_id,
            depth,
            self.max_depth,
        )?;
        self.router.structural_check(body)?;
        self.router.populate_requirements(&mut nested)?;

        Ok((nested.payer.id.clone(), nested.keys()))
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    fn is_payer_or_empty(&self, key: &Key) -> bool {
        key.is_empty() || *key == self.payer_key
    }

    fn require_account_key(&mut self, account: Account, code: ResponseCode) -> Result<(), PreCheckError> {
        if account.id == self.payer.id {
            return Ok(());
        }
        if let Some(key) = account.usable_key() {
            let key = key.clone();
            self.require_key(key);
            return Ok(());
        }
        if account.is_hollow() {
            self.require_signature_for_hollow_account(account);
            return Ok(());
        }
        Err(PreCheckError::new(code))
    }

    fn require_contract_account_key(
        &mut self,
        contract: Account,
        code: ResponseCode,
    ) -> Result<(), PreCheckError> {
        if contract.id == self.payer.id {
            return Ok(());
        }
        let own_id = contract.contract_id();
        match contract.key {
            Some(ref key) if own_id.as_ref().is_some_and(|id| key.is_self_reference(id)) => Ok(()),
            Some(ref key) if !key.is_empty() => {
                let key = key.clone();
                self.require_key(key);
                Ok(())
            }
            _ => Err(PreCheckError::new(code)),
        }
    }
}
