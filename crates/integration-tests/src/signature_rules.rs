//! # Signature Rule Tests
//!
//! Drives the reference verifier through the pipeline's verification
//! requests: prefix matching, composite keys and hollow accounts.
