//! Inbound Ports (Driving Ports / API)

use std::sync::Arc;

use shared_types::AccountId;

use crate::domain::result::PreprocessingResult;
use crate::ports::outbound::AccountDirectory;

/// Pre-handle API for a single transaction.
///
/// Batch entry points are generic and live on the pipeline itself.
pub trait PreprocessingApi: Send + Sync {
    /// Pre-handle one transaction submitted by `creator`.
    ///
    /// `previous` is the result attached in an earlier round, if any. Never
    /// fails: every fault is folded into the returned result.
    fn pre_handle_transaction(
        &self,
        store: &dyn AccountDirectory,
        creator: &AccountId,
        bytes: &[u8],
        previous: Option<Arc<PreprocessingResult>>,
    ) -> Arc<PreprocessingResult>;

    /// Re-collect requirements for a previous result against a newer store
    /// and keep its verification handles when nothing changed.
    ///
    /// Under a different configuration version the transaction is processed
    /// from scratch, including deduplication.
    fn revalidate(
        &self,
        store: &dyn AccountDirectory,
        creator: &AccountId,
        previous: Arc<PreprocessingResult>,
    ) -> Arc<PreprocessingResult>;
}
