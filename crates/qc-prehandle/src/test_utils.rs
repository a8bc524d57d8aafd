//! Test utilities for pre-handle
//!
//! Deterministic signers, transaction builders, a small example rule set
//! and counting wrappers around the outbound ports.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use ed25519_dalek::Signer;
use shared_types::{
    AccountAmount, AccountId, CryptoTransferBody, Key, ResponseCode, ScheduleCreateBody,
    Signature, SignatureMap, SignaturePair, SignedTransaction, Timestamp, TransactionBody,
    TransactionData, TransactionId, TransactionKind,
};

use crate::adapters::router::{HandlerRegistry, TransactionHandler};
use crate::domain::context::KeyRequirementAccumulator;
use crate::domain::entities::ParsedTransaction;
use crate::domain::errors::{PreHandleError, SchedulerError};
use crate::domain::verification::{PendingVerification, SignatureVerification};
use crate::ports::outbound::{
    SignatureScheduler, TransactionParser, TransactionRouter, VerificationRequest,
};

// =============================================================================
// SIGNERS
// =============================================================================

/// A deterministic key pair that signs transaction bodies.
pub enum TestSigner {
    Ed25519(ed25519_dalek::SigningKey),
    Secp256k1(k256::ecdsa::SigningKey),
}

impl TestSigner {
    /// Ed25519 signer derived from `seed`.
    pub fn ed25519(seed: u8) -> Self {
        Self::Ed25519(ed25519_dalek::SigningKey::from_bytes(&[seed; 32]))
    }

    /// secp256k1 signer derived from a non-zero `seed`.
    pub fn secp256k1(seed: u8) -> Self {
        let signing_key = k256::ecdsa::SigningKey::from_slice(&[seed.max(1); 32])
            .expect("small repeated-byte scalars are valid");
        Self::Secp256k1(signing_key)
    }

    pub fn key(&self) -> Key {
        match self {
            Self::Ed25519(signing_key) => Key::Ed25519(signing_key.verifying_key().to_bytes()),
            Self::Secp256k1(signing_key) => {
                let point = signing_key.verifying_key().to_encoded_point(true);
                let mut compressed = [0u8; 33];
                compressed.copy_from_slice(point.as_bytes());
                Key::EcdsaSecp256k1(compressed)
            }
        }
    }

    /// EVM address of a secp256k1 signer.
    pub fn evm_address(&self) -> Option<[u8; 20]> {
        match self.key() {
            Key::EcdsaSecp256k1(compressed) => shared_types::evm_address_from_secp256k1(&compressed),
            _ => None,
        }
    }

    /// Sign `message` with the full public key as prefix.
    pub fn sign(&self, message: &[u8]) -> SignaturePair {
        self.sign_with_prefix(message, usize::MAX)
    }

    /// Sign `message`, truncating the public key prefix to `prefix_len`.
    pub fn sign_with_prefix(&self, message: &[u8], prefix_len: usize) -> SignaturePair {
        let key_bytes = match self.key() {
            Key::Ed25519(bytes) => bytes.to_vec(),
            Key::EcdsaSecp256k1(bytes) => bytes.to_vec(),
            _ => unreachable!("test signers hold primitive keys"),
        };
        let prefix = key_bytes[..prefix_len.min(key_bytes.len())].to_vec();
        let signature = match self {
            Self::Ed25519(signing_key) => {
                Signature::Ed25519(signing_key.sign(message).to_bytes().to_vec())
            }
            Self::Secp256k1(signing_key) => {
                let digest = shared_types::keccak256(message);
                let (signature, _recovery_id) = signing_key
                    .sign_prehash_recoverable(&digest)
                    .expect("signing succeeds");
                Signature::EcdsaSecp256k1(signature.to_bytes().to_vec())
            }
        };
        SignaturePair {
            pub_key_prefix: prefix,
            signature,
        }
    }
}

// =============================================================================
// TRANSACTION BUILDERS
// =============================================================================

/// A transfer body paid by `payer`, submitted to `node`.
pub fn transfer_body(payer: u64, node: u64, transfers: &[(AccountId, i64)]) -> TransactionBody {
    TransactionBody {
        transaction_id: Some(TransactionId::new(
            AccountId::Num(payer),
            Timestamp::new(1_700_000_000, 0),
        )),
        node_account_id: Some(AccountId::Num(node)),
        transaction_fee: 100_000,
        valid_duration_secs: 120,
        memo: String::new(),
        data: TransactionData::CryptoTransfer(CryptoTransferBody {
            transfers: transfers
                .iter()
                .map(|(account, amount)| AccountAmount {
                    account: account.clone(),
                    amount: *amount,
                })
                .collect(),
        }),
    }
}

/// A schedule-create body wrapping `scheduled`.
pub fn schedule_body(
    payer: u64,
    node: u64,
    scheduled: TransactionBody,
    inner_payer: Option<AccountId>,
) -> TransactionBody {
    TransactionBody {
        data: TransactionData::ScheduleCreate(ScheduleCreateBody {
            scheduled: Box::new(TransactionBody {
                transaction_id: None,
                node_account_id: None,
                ..scheduled
            }),
            payer: inner_payer,
            admin_key: None,
        }),
        ..transfer_body(payer, node, &[])
    }
}

/// Wire bytes of `body` signed by every signer.
pub fn signed_bytes(body: &TransactionBody, signers: &[&TestSigner]) -> Vec<u8> {
    let body_bytes = body.to_bytes().expect("body encodes");
    let pairs = signers.iter().map(|s| s.sign(&body_bytes)).collect();
    SignedTransaction {
        body_bytes,
        sig_map: SignatureMap::new(pairs),
    }
    .to_bytes()
    .expect("transaction encodes")
}

// =============================================================================
// EXAMPLE RULE SET
// =============================================================================

/// Transfers: senders must sign, receivers only when they demand it.
pub struct CryptoTransferHandler;

impl TransactionHandler for CryptoTransferHandler {
    fn pure_checks(&self, body: &TransactionBody) -> Result<(), PreHandleError> {
        let TransactionData::CryptoTransfer(transfer) = &body.data else {
            return Err(PreHandleError::pre_check(ResponseCode::InvalidTransactionBody));
        };
        let net: i128 = transfer.transfers.iter().map(|t| t.amount as i128).sum();
        if net != 0 {
            return Err(PreHandleError::pre_check(ResponseCode::InvalidAccountAmounts));
        }
        Ok(())
    }

    fn pre_handle(&self, context: &mut KeyRequirementAccumulator<'_>) -> Result<(), PreHandleError> {
        let TransactionData::CryptoTransfer(transfer) = &context.body().data else {
            return Err(PreHandleError::pre_check(ResponseCode::InvalidTransactionBody));
        };
        for entry in &transfer.transfers {
            if entry.amount < 0 {
                context.require_key_or_throw(&entry.account, ResponseCode::InvalidAccountId)?;
            } else if entry.amount > 0 {
                context.require_key_if_receiver_sig_required(
                    Some(&entry.account),
                    ResponseCode::InvalidTransferAccountId,
                )?;
            }
        }
        Ok(())
    }
}

/// Schedules: the admin key signs and the inner transaction is reflected.
pub struct ScheduleCreateHandler;

impl TransactionHandler for ScheduleCreateHandler {
    fn pre_handle(&self, context: &mut KeyRequirementAccumulator<'_>) -> Result<(), PreHandleError> {
        let TransactionData::ScheduleCreate(schedule) = &context.body().data else {
            return Err(PreHandleError::pre_check(ResponseCode::InvalidTransactionBody));
        };
        if let Some(admin_key) = &schedule.admin_key {
            context.require_key(admin_key.clone());
        }
        let inner_payer = schedule
            .payer
            .clone()
            .unwrap_or_else(|| context.payer().clone());
        match context.reflect_inner_transaction(&schedule.scheduled, &inner_payer) {
            Ok(_) => Ok(()),
            Err(PreHandleError::PreCheck(e)) if e.code() != ResponseCode::NestedDepthExceeded => Err(
                PreHandleError::pre_check(ResponseCode::UnresolvableRequiredSigners),
            ),
            Err(other) => Err(other),
        }
    }
}

/// Router with the example handlers registered.
pub fn example_router() -> HandlerRegistry {
    HandlerRegistry::new()
        .register(TransactionKind::CryptoTransfer, Arc::new(CryptoTransferHandler))
        .register(TransactionKind::ScheduleCreate, Arc::new(ScheduleCreateHandler))
}

// =============================================================================
// COUNTING FAKES
// =============================================================================

/// Parser wrapper counting calls.
pub struct CountingParser {
    inner: Arc<dyn TransactionParser>,
    calls: AtomicUsize,
}

impl CountingParser {
    pub fn new(inner: impl TransactionParser + 'static) -> Self {
        Self {
            inner: Arc::new(inner),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TransactionParser for CountingParser {
    fn parse_and_check(&self, bytes: &[u8]) -> Result<ParsedTransaction, PreHandleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.parse_and_check(bytes)
    }
}

/// Router wrapper counting calls.
pub struct CountingRouter {
    inner: Arc<dyn TransactionRouter>,
    structural_checks: AtomicUsize,
    populations: AtomicUsize,
}

impl CountingRouter {
    pub fn new(inner: impl TransactionRouter + 'static) -> Self {
        Self {
            inner: Arc::new(inner),
            structural_checks: AtomicUsize::new(0),
            populations: AtomicUsize::new(0),
        }
    }

    /// Top-level and nested calls together.
    pub fn calls(&self) -> usize {
        self.structural_checks.load(Ordering::SeqCst) + self.populations.load(Ordering::SeqCst)
    }
}

impl TransactionRouter for CountingRouter {
    fn structural_check(&self, body: &TransactionBody) -> Result<(), PreHandleError> {
        self.structural_checks.fetch_add(1, Ordering::SeqCst);
        self.inner.structural_check(body)
    }

    fn populate_requirements(
        &self,
        context: &mut KeyRequirementAccumulator<'_>,
    ) -> Result<(), PreHandleError> {
        self.populations.fetch_add(1, Ordering::SeqCst);
        self.inner.populate_requirements(context)
    }
}

/// Scheduler wrapper recording every request.
pub struct CountingScheduler {
    inner: Arc<dyn SignatureScheduler>,
    requests: Mutex<Vec<VerificationRequest>>,
}

impl CountingScheduler {
    pub fn new(inner: impl SignatureScheduler + 'static) -> Self {
        Self {
            inner: Arc::new(inner),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }

    pub fn requests(&self) -> Vec<VerificationRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl SignatureScheduler for CountingScheduler {
    fn verify(
        &self,
        signed_bytes: &[u8],
        signature_map: &SignatureMap,
        request: &VerificationRequest,
    ) -> Result<HashMap<Key, PendingVerification>, SchedulerError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        self.inner.verify(signed_bytes, signature_map, request)
    }
}

/// Scheduler resolving every key immediately with a fixed outcome.
pub struct InstantScheduler {
    pub passed: bool,
}

impl SignatureScheduler for InstantScheduler {
    fn verify(
        &self,
        _signed_bytes: &[u8],
        _signature_map: &SignatureMap,
        request: &VerificationRequest,
    ) -> Result<HashMap<Key, PendingVerification>, SchedulerError> {
        Ok(request
            .keys
            .iter()
            .map(|key| {
                let outcome = SignatureVerification::new(Some(key.clone()), None, self.passed);
                (key.clone(), PendingVerification::ready(outcome))
            })
            .collect())
    }
}

/// Scheduler whose submission always fails.
pub struct UnavailableScheduler;

impl SignatureScheduler for UnavailableScheduler {
    fn verify(
        &self,
        _signed_bytes: &[u8],
        _signature_map: &SignatureMap,
        _request: &VerificationRequest,
    ) -> Result<HashMap<Key, PendingVerification>, SchedulerError> {
        Err(SchedulerError::PoolUnavailable("submission queue closed".to_string()))
    }
}

/// How a [`FaultyRouter`] misbehaves.
#[derive(Debug, Clone, Copy)]
pub enum Fault {
    StructuralPreCheck(ResponseCode),
    PopulatePreCheck(ResponseCode),
    PopulateUnexpected,
    PopulatePanic,
}

/// Router that fails in a configured way.
pub struct FaultyRouter(pub Fault);

impl TransactionRouter for FaultyRouter {
    fn structural_check(&self, _body: &TransactionBody) -> Result<(), PreHandleError> {
        match self.0 {
            Fault::StructuralPreCheck(code) => Err(PreHandleError::pre_check(code)),
            _ => Ok(()),
        }
    }

    fn populate_requirements(
        &self,
        _context: &mut KeyRequirementAccumulator<'_>,
    ) -> Result<(), PreHandleError> {
        match self.0 {
            Fault::PopulatePreCheck(code) => Err(PreHandleError::pre_check(code)),
            Fault::PopulateUnexpected => Err(PreHandleError::unexpected("state read failed")),
            Fault::PopulatePanic => panic!("router bug"),
            Fault::StructuralPreCheck(_) => Ok(()),
        }
    }
}
