//! # Integration Tests Crate
//!
//! End-to-end tests that drive the pre-handle pipeline with its reference
//! adapters: real parsing, real Ed25519/secp256k1 signatures and the
//! dedicated verification pool.
//!
//! ## Structure
//!
//! ```text
//! integration-tests/
//! ├── src/
//! │   ├── lib.rs                    # This file
//! │   ├── harness.rs                # Ledger fixture and pipeline wiring
//! │   ├── flows.rs                  # Status outcomes, reuse, containment
//! │   ├── signature_rules.rs        # Prefix matching, key lists, hollow accounts
//! │   └── requirement_properties.rs # Property tests on key requirements
//! ```
//!
//! ## Ledger Fixture
//!
//! | Account | Shape |
//! |---------|-------|
//! | 0.0.3 | Submitting node |
//! | 0.0.1001 | Payer (Ed25519) |
//! | 0.0.1002 | Sender (Ed25519) |
//! | 0.0.1003 | Receiver requiring signatures (Ed25519) |
//! | 0.0.1004 | Hollow account (EVM alias of a secp256k1 key) |
//! | 0.0.1005 | Deleted account |
//! | 0.0.1006 | Plain receiver |
//! | 0.0.1007 | Contract with an admin key, receiver signature required |
//! | 0.0.1008 | Contract keyed by its own id, receiver signature required |

pub mod harness;

pub mod flows;
pub mod requirement_properties;
pub mod signature_rules;
