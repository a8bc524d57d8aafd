//! Hashing and address derivation shared by parsers and verifiers.

use k256::ecdsa::VerifyingKey;
use sha3::{Digest, Keccak256};

use crate::entities::{EvmAddress, Secp256k1PublicKey};

/// Keccak-256 hash.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Derives the EVM address of a compressed secp256k1 public key.
///
/// The address is the last 20 bytes of the Keccak-256 hash of the
/// uncompressed point without its `0x04` tag. Returns `None` for bytes that
/// do not encode a curve point.
pub fn evm_address_from_secp256k1(key: &Secp256k1PublicKey) -> Option<EvmAddress> {
    let verifying_key = VerifyingKey::from_sec1_bytes(key).ok()?;
    let point = verifying_key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    Some(address)
}
