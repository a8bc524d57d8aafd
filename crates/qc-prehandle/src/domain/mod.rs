//! Domain module for pre-handle
//!
//! Contains the requirement accumulator, result model, verification handles
//! and errors.

pub mod context;
pub mod entities;
pub mod errors;
pub mod result;
pub mod verification;

pub use context::*;
pub use entities::*;
pub use errors::*;
pub use result::*;
pub use verification::*;
