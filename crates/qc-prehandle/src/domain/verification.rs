//! # Signature Verification Handles
//!
//! The scheduler returns one `PendingVerification` per key (or hollow
//! account) as soon as work is submitted. The handle resolves to a
//! `SignatureVerification` once a worker finishes. Handles are cheap to
//! clone and any number of readers may wait on the same outcome.
//!
//! A worker that goes away without reporting resolves its handle as failed.

use std::fmt;
use std::time::Duration;

use shared_types::{EvmAddress, Key};
use tokio::sync::watch;

use crate::domain::errors::VerificationTimeout;

/// Final outcome of verifying one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureVerification {
    key: Option<Key>,
    evm_alias: Option<EvmAddress>,
    passed: bool,
}

impl SignatureVerification {
    pub fn new(key: Option<Key>, evm_alias: Option<EvmAddress>, passed: bool) -> Self {
        Self {
            key,
            evm_alias,
            passed,
        }
    }

    pub fn passed(key: Key) -> Self {
        Self::new(Some(key), None, true)
    }

    pub fn failed(key: Key) -> Self {
        Self::new(Some(key), None, false)
    }

    pub fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    /// Set when the verification was for a hollow account.
    pub fn evm_alias(&self) -> Option<&EvmAddress> {
        self.evm_alias.as_ref()
    }

    pub fn is_passed(&self) -> bool {
        self.passed
    }
}

/// Worker side of a pending verification.
pub struct VerificationSender {
    tx: watch::Sender<Option<SignatureVerification>>,
}

impl VerificationSender {
    /// Publish the outcome to every handle.
    pub fn complete(self, outcome: SignatureVerification) {
        self.tx.send_replace(Some(outcome));
    }
}

/// Future-like handle to an in-flight verification.
#[derive(Clone)]
pub struct PendingVerification {
    key: Option<Key>,
    evm_alias: Option<EvmAddress>,
    outcome: watch::Receiver<Option<SignatureVerification>>,
}

impl PendingVerification {
    /// A handle plus the sender a worker completes it with.
    pub fn channel(key: Option<Key>, evm_alias: Option<EvmAddress>) -> (VerificationSender, Self) {
        let (tx, rx) = watch::channel(None);
        (
            VerificationSender { tx },
            Self {
                key,
                evm_alias,
                outcome: rx,
            },
        )
    }

    /// An already resolved handle.
    pub fn ready(outcome: SignatureVerification) -> Self {
        let key = outcome.key.clone();
        let evm_alias = outcome.evm_alias;
        let (tx, rx) = watch::channel(Some(outcome));
        drop(tx);
        Self {
            key,
            evm_alias,
            outcome: rx,
        }
    }

    pub fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    pub fn evm_alias(&self) -> Option<&EvmAddress> {
        self.evm_alias.as_ref()
    }

    /// The outcome if already resolved, without waiting.
    ///
    /// A handle whose worker went away resolves as failed.
    pub fn try_get(&self) -> Option<SignatureVerification> {
        if let Some(outcome) = self.outcome.borrow().clone() {
            return Some(outcome);
        }
        if self.outcome.has_changed().is_err() {
            return Some(self.abandoned());
        }
        None
    }

    /// Wait for the outcome, up to `timeout`.
    pub async fn get(&self, timeout: Duration) -> Result<SignatureVerification, VerificationTimeout> {
        let mut rx = self.outcome.clone();
        let outcome = match tokio::time::timeout(timeout, rx.wait_for(Option::is_some)).await {
            Ok(Ok(value)) => (*value).clone(),
            Ok(Err(_)) => None,
            Err(_) => return Err(VerificationTimeout(timeout)),
        };
        Ok(outcome.unwrap_or_else(|| self.abandoned()))
    }

    fn abandoned(&self) -> SignatureVerification {
        SignatureVerification::new(self.key.clone(), self.evm_alias, false)
    }
}

impl fmt::Debug for PendingVerification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingVerification")
            .field("key", &self.key)
            .field("evm_alias", &self.evm_alias)
            .field("outcome", &*self.outcome.borrow())
            .finish()
    }
}
