//! Adapters (hexagonal architecture implementations)
//!
//! Reference implementations of the outbound ports.

pub mod account_store;
pub mod dedup;
pub mod parser;
pub mod router;
pub mod signatures;

pub use account_store::InMemoryAccountStore;
pub use dedup::DeduplicationCache;
pub use parser::TransactionChecker;
pub use router::{HandlerRegistry, TransactionHandler};
pub use signatures::SignatureVerifier;
