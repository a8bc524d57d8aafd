//! # Signature Verifier
//!
//! Reference `SignatureScheduler` backed by a dedicated rayon pool.
//!
//! ## Matching Rules
//!
//! - A primitive key uses the signature whose prefix is the longest prefix
//!   of the key bytes, among signatures of the same algorithm. Empty
//!   prefixes never match.
//! - A key list passes when every member passes.
//! - A threshold key passes when at least `threshold` members pass, with
//!   the threshold clamped to `[1, len]`. A repeated member counts once per
//!   occurrence.
//! - Empty lists, empty thresholds and contract keys never pass.
//! - A hollow account is matched by a full 33-byte secp256k1 prefix whose
//!   EVM address equals the account's alias. A key that is also requested
//!   as a signer keeps its signer handle.
//!
//! ## Algorithms
//!
//! - Ed25519 signs the body bytes directly (strict verification).
//! - secp256k1 signs `keccak256(body bytes)`; high-S signatures are
//!   rejected as malleable.

use std::collections::HashMap;
use std::sync::Arc;

use ed25519_dalek::{Signature as Ed25519Signature, VerifyingKey as Ed25519VerifyingKey};
use k256::ecdsa::signature::hazmat::PrehashVerifier;
use k256::ecdsa::{Signature as EcdsaSignature, VerifyingKey as EcdsaVerifyingKey};
use rayon::{ThreadPool, ThreadPoolBuilder};
use shared_types::{
    evm_address_from_secp256k1, keccak256, Account, Ed25519PublicKey, Key, Secp256k1PublicKey,
    Signature, SignatureMap,
};
use tracing::{debug, trace};

use crate::domain::errors::SchedulerError;
use crate::domain::verification::{PendingVerification, SignatureVerification};
use crate::ports::outbound::{SignatureScheduler, VerificationRequest};

/// Verification plan for one key, with the matching signatures resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Check {
    Ed25519 {
        key: Ed25519PublicKey,
        signature: Option<Vec<u8>>,
    },
    Secp256k1 {
        key: Secp256k1PublicKey,
        signature: Option<Vec<u8>>,
    },
    All(Vec<Check>),
    AtLeast(usize, Vec<Check>),
    Never,
}

impl Check {
    fn plan(key: &Key, sig_map: &SignatureMap) -> Self {
        match key {
            Key::Ed25519(bytes) => Self::Ed25519 {
                key: *bytes,
                signature: best_match(sig_map, bytes, |s| matches!(s, Signature::Ed25519(_))),
            },
            Key::EcdsaSecp256k1(bytes) => Self::Secp256k1 {
                key: *bytes,
                signature: best_match(sig_map, bytes, |s| {
                    matches!(s, Signature::EcdsaSecp256k1(_))
                }),
            },
            Key::KeyList(keys) if !keys.is_empty() => {
                Self::All(keys.iter().map(|k| Self::plan(k, sig_map)).collect())
            }
            Key::Threshold { threshold, keys } if !keys.is_empty() => {
                let required = (*threshold as usize).clamp(1, keys.len());
                Self::AtLeast(required, keys.iter().map(|k| Self::plan(k, sig_map)).collect())
            }
            _ => Self::Never,
        }
    }

    fn verify(&self, message: &[u8]) -> bool {
        match self {
            Self::Ed25519 { key, signature } => signature
                .as_deref()
                .is_some_and(|sig| verify_ed25519(key, message, sig)),
            Self::Secp256k1 { key, signature } => signature
                .as_deref()
                .is_some_and(|sig| verify_secp256k1(key, &keccak256(message), sig)),
            Self::All(checks) => checks.iter().all(|c| c.verify(message)),
            Self::AtLeast(required, checks) => {
                checks.iter().filter(|c| c.verify(message)).count() >= *required
            }
            Self::Never => false,
        }
    }
}

/// The signature whose non-empty prefix is the longest prefix of `key`.
fn best_match(
    sig_map: &SignatureMap,
    key: &[u8],
    same_algorithm: impl Fn(&Signature) -> bool,
) -> Option<Vec<u8>> {
    sig_map
        .pairs
        .iter()
        .filter(|pair| !pair.pub_key_prefix.is_empty())
        .filter(|pair| same_algorithm(&pair.signature))
        .filter(|pair| key.starts_with(&pair.pub_key_prefix))
        .max_by_key(|pair| pair.pub_key_prefix.len())
        .map(|pair| pair.signature.bytes().to_vec())
}

/// The full secp256k1 key and signature whose address matches `account`.
fn hollow_match(sig_map: &SignatureMap, account: &Account) -> Option<(Secp256k1PublicKey, Vec<u8>)> {
    let alias = account.evm_address()?;
    sig_map.pairs.iter().find_map(|pair| {
        let Signature::EcdsaSecp256k1(signature) = &pair.signature else {
            return None;
        };
        let key = Secp256k1PublicKey::try_from(pair.pub_key_prefix.as_slice()).ok()?;
        (evm_address_from_secp256k1(&key)? == alias).then(|| (key, signature.clone()))
    })
}

fn verify_ed25519(key: &Ed25519PublicKey, message: &[u8], signature: &[u8]) -> bool {
    let Ok(verifying_key) = Ed25519VerifyingKey::from_bytes(key) else {
        return false;
    };
    let Ok(signature) = Ed25519Signature::from_slice(signature) else {
        return false;
    };
    verifying_key.verify_strict(message, &signature).is_ok()
}

fn verify_secp256k1(key: &Secp256k1PublicKey, digest: &[u8; 32], signature: &[u8]) -> bool {
    let Ok(verifying_key) = EcdsaVerifyingKey::from_sec1_bytes(key) else {
        return false;
    };
    let Ok(signature) = EcdsaSignature::from_slice(signature) else {
        return false;
    };
    // Malleability: only the low-S form is accepted.
    if signature.normalize_s().is_some() {
        return false;
    }
    verifying_key.verify_prehash(digest, &signature).is_ok()
}

/// Signature scheduler running verifications on its own thread pool.
pub struct SignatureVerifier {
    pool: Arc<ThreadPool>,
}

impl SignatureVerifier {
    /// Create a verifier with `threads` workers.
    pub fn new(threads: usize) -> Result<Self, SchedulerError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(|i| format!("qc-sigverify-{i}"))
            .build()
            .map_err(|e| SchedulerError::PoolUnavailable(e.to_string()))?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl SignatureScheduler for SignatureVerifier {
    fn verify(
        &self,
        signed_bytes: &[u8],
        signature_map: &SignatureMap,
        request: &VerificationRequest,
    ) -> Result<HashMap<Key, PendingVerification>, SchedulerError> {
        let message: Arc<[u8]> = Arc::from(signed_bytes);
        let mut handles = HashMap::with_capacity(request.len());

        for key in &request.keys {
            let check = Check::plan(key, signature_map);
            let (sender, pending) = PendingVerification::channel(Some(key.clone()), None);
            let message = Arc::clone(&message);
            let verified_key = key.clone();
            self.pool.spawn(move || {
                let passed = check.verify(&message);
                trace!(passed, "Key verification finished");
                sender.complete(SignatureVerification::new(Some(verified_key), None, passed));
            });
            handles.insert(key.clone(), pending);
        }

        for account in &request.hollow_accounts {
            let Some((key_bytes, signature)) = hollow_match(signature_map, account) else {
                debug!(account = %account.id, "No signature matches hollow account alias");
                continue;
            };
            let key = Key::EcdsaSecp256k1(key_bytes);
            if handles.contains_key(&key) {
                trace!(account = %account.id, "Hollow account key already verified as a signer");
                continue;
            }
            let alias = account.evm_address();
            let (sender, pending) = PendingVerification::channel(Some(key.clone()), alias);
            let message = Arc::clone(&message);
            let verified_key = key.clone();
            self.pool.spawn(move || {
                let passed = verify_secp256k1(&key_bytes, &keccak256(&message), &signature);
                trace!(passed, "Hollow account verification finished");
                sender.complete(SignatureVerification::new(Some(verified_key), alias, passed));
            });
            handles.insert(key, pending);
        }

        Ok(handles)
    }
}
