//! # Shared Types Crate
//!
//! Ledger primitives used by the pre-handle pipeline and the collaborators
//! plugged into it.
//!
//! ## Clusters
//!
//! - **Identity**: `AccountId`, `ContractId`, `TransactionId`, `Timestamp`
//! - **Keys & Accounts**: `Key`, `Account`, EVM address derivation
//! - **Transactions**: `TransactionBody`, `SignatureMap`, `SignedTransaction`
//! - **Outcomes**: `ResponseCode`, `PreCheckError`

pub mod crypto;
pub mod entities;
pub mod errors;
pub mod transaction;

pub use crypto::*;
pub use entities::*;
pub use errors::*;
pub use transaction::*;
