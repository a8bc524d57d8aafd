//! # QC-Prehandle: Transaction Preprocessing
//!
//! Parallel pre-handling of transactions submitted inside an event, before
//! consensus orders them. Each transaction is parsed, checked for node due
//! diligence, registered for deduplication and has its payer resolved. Its
//! signer requirements are collected and signature verification is
//! scheduled off-thread.
//!
//! ## Architecture
//!
//! - **Domain**: Results, statuses, key requirements, pending verifications
//! - **Ports**: Inbound (PreprocessingApi) and Outbound (parser, account
//!   directory, router, signature scheduler, deduplication registry)
//! - **Application**: Pipeline orchestration and fault containment
//! - **Adapters**: Reference implementations of every outbound port
//!
//! ## Statuses
//!
//! | Status | Blame |
//! |--------|-------|
//! | `SO_FAR_SO_GOOD` | none yet |
//! | `NODE_DUE_DILIGENCE_FAILURE` | submitting node |
//! | `PRE_HANDLE_FAILURE` | payer |
//! | `UNKNOWN_FAILURE` | decided later |

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

/// Test fixtures shared with the integration tests.
///
/// Requires feature: `test-utils`
#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use adapters::{
    DeduplicationCache, HandlerRegistry, InMemoryAccountStore, SignatureVerifier,
    TransactionChecker, TransactionHandler,
};
pub use application::service::PreprocessingPipeline;
pub use config::{ConfigError, PreHandleConfig};
pub use domain::*;
pub use ports::inbound::PreprocessingApi;
pub use ports::outbound::{
    AccountDirectory, DeduplicationRegistry, SignatureScheduler, TransactionParser,
    TransactionRouter, VerificationRequest,
};
