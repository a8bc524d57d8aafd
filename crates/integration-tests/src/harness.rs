//! Ledger fixture and pipeline wiring shared by the integration tests.

use std::sync::Arc;
use std::time::Duration;

use qc_prehandle::test_utils::{
    example_router, signed_bytes, transfer_body, CountingParser, CountingRouter,
    CountingScheduler, TestSigner,
};
use qc_prehandle::{
    DeduplicationCache, InMemoryAccountStore, PendingVerification, PreHandleConfig,
    PreprocessingPipeline, SignatureScheduler, SignatureVerification, SignatureVerifier,
    TransactionChecker, TransactionRouter,
};
use shared_types::{Account, AccountId, ContractId, Key, TransactionBody};

pub const NODE: u64 = 3;
pub const PAYER: u64 = 1001;
pub const SENDER: u64 = 1002;
pub const RECEIVER: u64 = 1003;
pub const HOLLOW: u64 = 1004;
pub const DELETED: u64 = 1005;
pub const PLAIN: u64 = 1006;
/// Contract with an admin key that must sign incoming value.
pub const CONTRACT: u64 = 1007;
/// Contract keyed by its own id, with the receiver flag set.
pub const SELF_KEYED: u64 = 1008;

/// How long a test waits for a verification outcome.
pub const VERIFY_TIMEOUT: Duration = Duration::from_secs(5);

pub fn id(num: u64) -> AccountId {
    AccountId::Num(num)
}

pub fn node() -> AccountId {
    id(NODE)
}

/// Signers and the account snapshot built from them.
pub struct Ledger {
    pub payer: TestSigner,
    pub sender: TestSigner,
    pub receiver: TestSigner,
    pub evm: TestSigner,
    pub contract_admin: TestSigner,
    pub sponsor: TestSigner,
    pub store: InMemoryAccountStore,
}

impl Ledger {
    pub fn new() -> Self {
        let payer = TestSigner::ed25519(1);
        let sender = TestSigner::ed25519(2);
        let receiver = TestSigner::ed25519(3);
        let evm = TestSigner::secp256k1(4);
        let contract_admin = TestSigner::ed25519(7);
        let sponsor = TestSigner::ed25519(8);

        let mut receiving = Account::new(RECEIVER, receiver.key());
        receiving.receiver_sig_required = true;
        let mut deleted = Account::new(DELETED, TestSigner::ed25519(5).key());
        deleted.deleted = true;
        let hollow_address = evm.evm_address().unwrap();
        let mut contract = Account::new(CONTRACT, contract_admin.key());
        contract.smart_contract = true;
        contract.receiver_sig_required = true;
        let mut self_keyed = Account::new(SELF_KEYED, Key::ContractId(ContractId::Num(SELF_KEYED)));
        self_keyed.smart_contract = true;
        self_keyed.receiver_sig_required = true;

        let store = InMemoryAccountStore::new()
            .with_account(Account::new(NODE, TestSigner::ed25519(9).key()))
            .with_account(Account::new(PAYER, payer.key()))
            .with_account(Account::new(SENDER, sender.key()))
            .with_account(receiving)
            .with_account(Account::hollow(HOLLOW, hollow_address))
            .with_account(deleted)
            .with_account(Account::new(PLAIN, TestSigner::ed25519(6).key()))
            .with_account(contract)
            .with_account(self_keyed);

        Self {
            payer,
            sender,
            receiver,
            evm,
            contract_admin,
            sponsor,
            store,
        }
    }

    /// Sender pays receiver, signed by payer, sender and receiver.
    pub fn transfer(&self) -> (TransactionBody, Vec<u8>) {
        let body = transfer_body(PAYER, NODE, &[(id(SENDER), -10), (id(RECEIVER), 10)]);
        let bytes = signed_bytes(&body, &[&self.payer, &self.sender, &self.receiver]);
        (body, bytes)
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

/// Pipeline wired with counting wrappers around the reference adapters.
pub struct Harness {
    pub pipeline: PreprocessingPipeline,
    pub parser: Arc<CountingParser>,
    pub router: Arc<CountingRouter>,
    pub scheduler: Arc<CountingScheduler>,
    pub dedup: Arc<DeduplicationCache>,
    pub ledger: Ledger,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(test_config(0))
    }

    pub fn with_config(config: PreHandleConfig) -> Self {
        let scheduler = verifier(&config);
        Self::build(config, example_router(), scheduler)
    }

    pub fn with_router(router: impl TransactionRouter + 'static) -> Self {
        let config = test_config(0);
        let scheduler = verifier(&config);
        Self::build(config, router, scheduler)
    }

    pub fn with_scheduler(scheduler: impl SignatureScheduler + 'static) -> Self {
        Self::build(test_config(0), example_router(), scheduler)
    }

    fn build(
        config: PreHandleConfig,
        router: impl TransactionRouter + 'static,
        scheduler: impl SignatureScheduler + 'static,
    ) -> Self {
        let parser = Arc::new(CountingParser::new(TransactionChecker::new(&config)));
        let router = Arc::new(CountingRouter::new(router));
        let scheduler = Arc::new(CountingScheduler::new(scheduler));
        let dedup = Arc::new(DeduplicationCache::new(Duration::from_secs(
            config.dedup_retention_secs,
        )));

        let pipeline = PreprocessingPipeline::new(
            parser.clone(),
            router.clone(),
            scheduler.clone(),
            dedup.clone(),
            config,
        )
        .unwrap();

        Self {
            pipeline,
            parser,
            router,
            scheduler,
            dedup,
            ledger: Ledger::new(),
        }
    }

    /// Parser, router and scheduler calls so far.
    pub fn collaborator_calls(&self) -> usize {
        self.parser.calls() + self.router.calls() + self.scheduler.calls()
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

pub fn test_config(config_version: u64) -> PreHandleConfig {
    PreHandleConfig {
        config_version,
        worker_threads: 2,
        verification_threads: 2,
        ..PreHandleConfig::default()
    }
}

fn verifier(config: &PreHandleConfig) -> SignatureVerifier {
    SignatureVerifier::new(config.effective_verification_threads()).unwrap()
}

/// Wait for a handle and unwrap its outcome.
pub async fn outcome(pending: &PendingVerification) -> SignatureVerification {
    pending.get(VERIFY_TIMEOUT).await.unwrap()
}
