//! Preprocessing Pipeline
//!
//! Main service implementing `PreprocessingApi`.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use quantum_telemetry::{
    metric_inc, time_histogram, DEDUP_REGISTRATIONS, PREHANDLE_BATCHES, PREHANDLE_DURATION,
    PREHANDLE_PANICS, PREHANDLE_RESULTS, PREHANDLE_REUSED, SIGNATURE_SUBMISSIONS,
};
use rayon::iter::{ParallelBridge, ParallelIterator};
use rayon::{ThreadPool, ThreadPoolBuilder};
use shared_types::{AccountId, Key, ResponseCode};
use tracing::{debug, error, info, trace, warn};

use crate::config::PreHandleConfig;
use crate::domain::context::{InnerTransaction, KeyRequirementAccumulator, TransactionKeys};
use crate::domain::entities::{ParsedTransaction, RawTransaction};
use crate::domain::errors::{PipelineError, PreHandleError, SchedulerError};
use crate::domain::result::{PreprocessingResult, Status};
use crate::domain::verification::PendingVerification;
use crate::ports::inbound::PreprocessingApi;
use crate::ports::outbound::{
    AccountDirectory, DeduplicationRegistry, SignatureScheduler, TransactionParser,
    TransactionRouter, VerificationRequest,
};

/// Requirements of a transaction whose payer checked out.
struct Dispatched {
    payer: AccountId,
    keys: TransactionKeys,
    inner: Option<InnerTransaction>,
}

/// Preprocessing Pipeline
///
/// Per transaction, strictly in order:
/// 1. Reuse a previous result when allowed
/// 2. Parse and check syntax
/// 3. Check the declared node account against the sender
/// 4. Register the transaction id for deduplication
/// 5. Resolve and validate the payer
/// 6. Run the router's structural check and requirement population
/// 7. Schedule signature verification
///
/// Transactions of a batch are processed in parallel on a dedicated pool.
/// Every fault is contained per transaction.
pub struct PreprocessingPipeline {
    parser: Arc<dyn TransactionParser>,
    router: Arc<dyn TransactionRouter>,
    scheduler: Arc<dyn SignatureScheduler>,
    dedup: Arc<dyn DeduplicationRegistry>,
    config: PreHandleConfig,
    pool: ThreadPool,
}

impl PreprocessingPipeline {
    /// Create a pipeline with its worker pool.
    pub fn new(
        parser: Arc<dyn TransactionParser>,
        router: Arc<dyn TransactionRouter>,
        scheduler: Arc<dyn SignatureScheduler>,
        dedup: Arc<dyn DeduplicationRegistry>,
        config: PreHandleConfig,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.effective_worker_threads())
            .thread_name(|i| format!("qc-prehandle-{i}"))
            .build()
            .map_err(|e| PipelineError::WorkerPool(e.to_string()))?;

        info!(
            workers = pool.current_num_threads(),
            config_version = config.config_version,
            "Pre-handle pipeline ready"
        );

        Ok(Self {
            parser,
            router,
            scheduler,
            dedup,
            config,
            pool,
        })
    }

    /// Configuration the pipeline was built with.
    pub fn config(&self) -> &PreHandleConfig {
        &self.config
    }

    /// Pre-handle a batch of transactions from one sender.
    ///
    /// `previous` returns the result attached in an earlier round, if any.
    /// Each transaction gets its result attached as metadata, then
    /// `on_complete` runs once.
    pub fn pre_handle<'t, I, P, F>(
        &self,
        store: &dyn AccountDirectory,
        creator: &AccountId,
        transactions: I,
        previous: P,
        on_complete: F,
    ) where
        I: IntoIterator<Item = &'t mut RawTransaction>,
        I::IntoIter: Send,
        P: Fn(&RawTransaction) -> Option<Arc<PreprocessingResult>> + Sync,
        F: FnOnce(),
    {
        let started = Instant::now();
        let processed = AtomicUsize::new(0);
        let transactions = transactions.into_iter();

        self.pool.install(|| {
            transactions.par_bridge().for_each(|transaction| {
                // The lookup belongs to the transaction's own fault barrier.
                let result = panic::catch_unwind(AssertUnwindSafe(|| {
                    let prior = previous(&*transaction);
                    self.pre_handle_transaction(store, creator, transaction.bytes(), prior)
                }))
                .unwrap_or_else(|panic| {
                    let result = self.recover(panic.as_ref());
                    metric_inc!(PREHANDLE_RESULTS, &[result.status().as_str()]);
                    result
                });
                transaction.set_metadata(result);
                processed.fetch_add(1, Ordering::Relaxed);
            });
        });

        metric_inc!(PREHANDLE_BATCHES);
        debug!(
            creator = %creator,
            transactions = processed.into_inner(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "Batch pre-handled"
        );
        on_complete();
    }

    /// Pre-handle a slice, reusing whatever metadata is already attached.
    pub fn pre_handle_batch(
        &self,
        store: &dyn AccountDirectory,
        creator: &AccountId,
        transactions: &mut [RawTransaction],
    ) {
        self.pre_handle(
            store,
            creator,
            transactions.iter_mut(),
            |transaction| transaction.metadata().cloned(),
            || {},
        );
    }

    // =========================================================================
    // PER-TRANSACTION STEPS
    // =========================================================================

    fn process(
        &self,
        store: &dyn AccountDirectory,
        creator: &AccountId,
        bytes: &[u8],
    ) -> Arc<PreprocessingResult> {
        let version = self.config.config_version;

        let tx_info = match self.parser.parse_and_check(bytes) {
            Ok(parsed) => Arc::new(parsed),
            Err(PreHandleError::PreCheck(e)) => {
                debug!(creator = %creator, code = %e.code(), "Transaction failed parsing");
                return Arc::new(PreprocessingResult::node_due_diligence_failure(
                    creator.clone(),
                    e.code(),
                    None,
                    version,
                ));
            }
            Err(PreHandleError::Unexpected(cause)) => {
                return Arc::new(self.unexpected("parse", &cause));
            }
        };

        if tx_info.node_account_id() != Some(creator) {
            warn!(
                creator = %creator,
                declared = ?tx_info.node_account_id(),
                "Transaction submitted through a different node"
            );
            return Arc::new(PreprocessingResult::node_due_diligence_failure(
                creator.clone(),
                ResponseCode::InvalidNodeAccount,
                Some(tx_info),
                version,
            ));
        }

        match tx_info.transaction_id() {
            Some(id) => {
                let outcome = if self.dedup.add(id) { "new" } else { "duplicate" };
                metric_inc!(DEDUP_REGISTRATIONS, &[outcome]);
            }
            None => {
                return Arc::new(PreprocessingResult::node_due_diligence_failure(
                    creator.clone(),
                    ResponseCode::InvalidTransactionId,
                    Some(Arc::clone(&tx_info)),
                    version,
                ));
            }
        }

        match self.dispatch(store, creator, &tx_info) {
            Ok(dispatched) => Arc::new(self.finish(&tx_info, dispatched)),
            Err(terminal) => Arc::new(terminal),
        }
    }

    /// Resolve the payer and collect signer requirements.
    ///
    /// `Err` carries the terminal result to return instead.
    fn dispatch(
        &self,
        store: &dyn AccountDirectory,
        creator: &AccountId,
        tx_info: &Arc<ParsedTransaction>,
    ) -> Result<Dispatched, PreprocessingResult> {
        let version = self.config.config_version;
        let node_failure = |code: ResponseCode| {
            debug!(creator = %creator, code = %code, "Node due diligence failure");
            PreprocessingResult::node_due_diligence_failure(
                creator.clone(),
                code,
                Some(Arc::clone(tx_info)),
                version,
            )
        };

        let Some(payer_id) = tx_info.payer() else {
            return Err(node_failure(ResponseCode::InvalidTransactionId));
        };
        let payer = match store.get_account_by_id(payer_id) {
            None => return Err(node_failure(ResponseCode::PayerAccountNotFound)),
            Some(account) if account.deleted => {
                return Err(node_failure(ResponseCode::PayerAccountDeleted))
            }
            Some(account) => account,
        };

        let mut context = KeyRequirementAccumulator::new(
            store,
            self.router.as_ref(),
            tx_info.body(),
            &payer.id,
            self.config.max_nested_depth,
        )
        .map_err(|e| node_failure(e.code()))?;

        match self.router.structural_check(tx_info.body()) {
            Ok(()) => {}
            Err(PreHandleError::PreCheck(e)) => return Err(node_failure(e.code())),
            Err(PreHandleError::Unexpected(cause)) => {
                return Err(self.unexpected("structural check", &cause))
            }
        }

        if let Err(err) = self.router.populate_requirements(&mut context) {
            return Err(match err {
                PreHandleError::PreCheck(e) => {
                    self.payer_failure(tx_info, context.payer().clone(), context.keys(), e.code())
                }
                PreHandleError::Unexpected(cause) => self.unexpected("dispatch", &cause),
            });
        }

        Ok(Dispatched {
            payer: context.payer().clone(),
            keys: context.keys(),
            inner: context.inner().cloned(),
        })
    }

    /// Schedule verification of every requirement and build the result.
    fn finish(&self, tx_info: &Arc<ParsedTransaction>, dispatched: Dispatched) -> PreprocessingResult {
        let version = self.config.config_version;
        let handles = match self.schedule(tx_info, &dispatched.keys) {
            Ok(handles) => handles,
            Err(e) => return self.unexpected("signature scheduling", &e),
        };

        let inner_result = match dispatched.inner {
            Some(inner) => match self.inner_result(tx_info, inner) {
                Ok(result) => Some(Arc::new(result)),
                Err(e) => return self.unexpected("inner signature scheduling", &e),
            },
            None => None,
        };

        if let Some(id) = tx_info.transaction_id() {
            trace!(
                tx_id = %id,
                payer = %dispatched.payer,
                handles = handles.len(),
                inner = inner_result.is_some(),
                "Signatures scheduled"
            );
        }

        PreprocessingResult::so_far_so_good(
            dispatched.payer,
            dispatched.keys,
            Arc::clone(tx_info),
            handles,
            inner_result,
            version,
        )
    }

    fn inner_result(
        &self,
        tx_info: &Arc<ParsedTransaction>,
        inner: InnerTransaction,
    ) -> Result<PreprocessingResult, SchedulerError> {
        let inner_info = Arc::new(tx_info.nested(inner.body));
        let handles = self.schedule(&inner_info, &inner.keys)?;
        Ok(PreprocessingResult::so_far_so_good(
            inner.payer,
            inner.keys,
            inner_info,
            handles,
            None,
            self.config.config_version,
        ))
    }

    /// Payer-blamed failure. Only the payer signature is verified, so the
    /// handle stage can tell whether the payer really signed.
    fn payer_failure(
        &self,
        tx_info: &Arc<ParsedTransaction>,
        payer: AccountId,
        keys: TransactionKeys,
        code: ResponseCode,
    ) -> PreprocessingResult {
        debug!(payer = %payer, code = %code, "Pre-handle failure");
        let request = VerificationRequest {
            keys: HashSet::from([keys.payer_key.clone()]),
            hollow_accounts: HashSet::new(),
        };
        match self.submit(tx_info, &request) {
            Ok(handles) => PreprocessingResult::pre_handle_failure(
                payer,
                keys,
                code,
                Arc::clone(tx_info),
                handles,
                self.config.config_version,
            ),
            Err(e) => self.unexpected("payer signature scheduling", &e),
        }
    }

    fn schedule(
        &self,
        tx_info: &ParsedTransaction,
        keys: &TransactionKeys,
    ) -> Result<HashMap<Key, PendingVerification>, SchedulerError> {
        let request = VerificationRequest {
            keys: keys.all_keys(),
            hollow_accounts: keys.required_hollow_accounts.clone(),
        };
        self.submit(tx_info, &request)
    }

    fn submit(
        &self,
        tx_info: &ParsedTransaction,
        request: &VerificationRequest,
    ) -> Result<HashMap<Key, PendingVerification>, SchedulerError> {
        metric_inc!(SIGNATURE_SUBMISSIONS, by request.len() as f64);
        self.scheduler
            .verify(tx_info.signed_bytes(), tx_info.signature_map(), request)
    }

    fn unexpected(&self, stage: &str, cause: &dyn std::fmt::Display) -> PreprocessingResult {
        warn!(stage, cause = %cause, "Unexpected pre-handle failure, deferring to execution");
        PreprocessingResult::unknown_failure(self.config.config_version)
    }

    /// Run one transaction's work, turning a panic into an unknown failure.
    fn contain<F>(&self, work: F) -> Arc<PreprocessingResult>
    where
        F: FnOnce() -> Arc<PreprocessingResult>,
    {
        let result = panic::catch_unwind(AssertUnwindSafe(work))
            .unwrap_or_else(|panic| self.recover(panic.as_ref()));
        metric_inc!(PREHANDLE_RESULTS, &[result.status().as_str()]);
        result
    }

    /// Unknown failure standing in for work that panicked.
    fn recover(&self, panic: &(dyn Any + Send)) -> Arc<PreprocessingResult> {
        metric_inc!(PREHANDLE_PANICS);
        error!(panic = %panic_message(panic), "Pre-handle panicked");
        Arc::new(PreprocessingResult::unknown_failure(
            self.config.config_version,
        ))
    }
}

impl PreprocessingApi for PreprocessingPipeline {
    fn pre_handle_transaction(
        &self,
        store: &dyn AccountDirectory,
        creator: &AccountId,
        bytes: &[u8],
        previous: Option<Arc<PreprocessingResult>>,
    ) -> Arc<PreprocessingResult> {
        let _timer = time_histogram!(PREHANDLE_DURATION);

        if let Some(previous) = previous {
            if previous.can_reuse(self.config.config_version) {
                metric_inc!(PREHANDLE_REUSED);
                trace!(status = %previous.status(), "Reusing previous result");
                return previous;
            }
            debug!(
                previous_version = previous.config_version(),
                config_version = self.config.config_version,
                "Configuration changed, reprocessing"
            );
        }

        self.contain(|| self.process(store, creator, bytes))
    }

    fn revalidate(
        &self,
        store: &dyn AccountDirectory,
        creator: &AccountId,
        previous: Arc<PreprocessingResult>,
    ) -> Arc<PreprocessingResult> {
        let Some(tx_info) = previous.tx_info().cloned() else {
            return previous;
        };

        if previous.config_version() != self.config.config_version {
            return self.contain(|| self.process(store, creator, tx_info.transaction_bytes()));
        }
        // A node mismatch is a property of the bytes and cannot change.
        if previous.status() == Status::NodeDueDiligenceFailure
            && previous.response_code() == ResponseCode::InvalidNodeAccount
        {
            return previous;
        }

        self.contain(|| match self.dispatch(store, creator, &tx_info) {
            Ok(dispatched) => {
                if previous.can_reuse_verifications(&dispatched.keys, self.config.config_version) {
                    metric_inc!(PREHANDLE_REUSED);
                    return Arc::clone(&previous);
                }
                if previous.status() == Status::SoFarSoGood {
                    debug!(payer = %dispatched.payer, "Signer requirements changed, rescheduling");
                }
                Arc::new(self.finish(&tx_info, dispatched))
            }
            Err(terminal) => Arc::new(terminal),
        })
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
