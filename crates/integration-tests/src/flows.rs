//! # Pipeline Flow Tests
//!
//! Status outcomes for each failure class, result reuse across rounds,
//! revalidation against a newer account snapshot and fault containment.

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use qc_prehandle::test_utils::{
        schedule_body, signed_bytes, transfer_body, Fault, FaultyRouter, InstantScheduler,
        UnavailableScheduler,
    };
    use qc_prehandle::{
        AccountDirectory, DeduplicationRegistry, HandlerRegistry, InMemoryAccountStore,
        KeyRequirementAccumulator, PreHandleError, PreprocessingApi, PreprocessingResult,
        RawTransaction, Status, TransactionHandler,
    };
    use shared_types::{
        Account, ContractCallBody, ContractId, Key, ResponseCode, TransactionBody,
        TransactionData, TransactionKind,
    };

    use crate::harness::*;

    // =========================================================================
    // STATUS OUTCOMES
    // =========================================================================

    #[tokio::test]
    async fn test_valid_transfer_is_so_far_so_good() {
        let h = Harness::new();
        let (_, bytes) = h.ledger.transfer();

        let result = h
            .pipeline
            .pre_handle_transaction(&h.ledger.store, &node(), &bytes, None);

        assert_eq!(result.status(), Status::SoFarSoGood);
        assert_eq!(result.response_code(), ResponseCode::Ok);
        assert_eq!(result.payer(), Some(&id(PAYER)));
        assert_eq!(result.payer_key(), Some(&h.ledger.payer.key()));
        assert_eq!(
            result.required_keys(),
            Some(&HashSet::from([h.ledger.sender.key(), h.ledger.receiver.key()]))
        );
        assert!(result.hollow_accounts().is_empty());
        assert!(result.inner_result().is_none());

        let keys: HashSet<_> = result.verification_keys().cloned().collect();
        assert_eq!(keys.len(), 3);
        for key in &keys {
            let verification = outcome(result.verification_for(key).unwrap()).await;
            assert!(verification.is_passed(), "{key:?} should verify");
        }
    }

    #[test]
    fn test_garbage_bytes_blame_node() {
        let h = Harness::new();

        let result = h
            .pipeline
            .pre_handle_transaction(&h.ledger.store, &node(), &[0xDE, 0xAD], None);

        assert_eq!(result.status(), Status::NodeDueDiligenceFailure);
        assert_eq!(result.response_code(), ResponseCode::InvalidTransaction);
        assert_eq!(result.payer(), Some(&node()));
        assert!(result.tx_info().is_none());
        assert!(result.verification_results().is_none());
        assert_eq!(h.scheduler.calls(), 0);
    }

    #[test]
    fn test_other_node_account_blames_node() {
        let h = Harness::new();
        let body = transfer_body(PAYER, 4, &[(id(SENDER), -1), (id(PLAIN), 1)]);
        let bytes = signed_bytes(&body, &[&h.ledger.payer, &h.ledger.sender]);

        let result = h
            .pipeline
            .pre_handle_transaction(&h.ledger.store, &node(), &bytes, None);

        assert_eq!(result.status(), Status::NodeDueDiligenceFailure);
        assert_eq!(result.response_code(), ResponseCode::InvalidNodeAccount);
        assert_eq!(result.payer(), Some(&node()));
        assert!(result.tx_info().is_some());
        assert_eq!(h.router.calls(), 0);
        // Node mismatches are never registered for deduplication.
        let tx_id = result.tx_info().unwrap().transaction_id().unwrap().clone();
        assert!(!h.dedup.contains(&tx_id));
    }

    #[test]
    fn test_unknown_and_deleted_payers_blame_node() {
        let h = Harness::new();
        for (payer, code) in [
            (7777, ResponseCode::PayerAccountNotFound),
            (DELETED, ResponseCode::PayerAccountDeleted),
        ] {
            let body = transfer_body(payer, NODE, &[(id(SENDER), -1), (id(PLAIN), 1)]);
            let bytes = signed_bytes(&body, &[&h.ledger.payer]);

            let result = h
                .pipeline
                .pre_handle_transaction(&h.ledger.store, &node(), &bytes, None);

            assert_eq!(result.status(), Status::NodeDueDiligenceFailure);
            assert_eq!(result.response_code(), code);
            assert_eq!(result.payer(), Some(&node()));
            assert!(h.dedup.contains(body.transaction_id.as_ref().unwrap()));
        }
        assert_eq!(h.scheduler.calls(), 0);
    }

    #[test]
    fn test_structural_failure_blames_node() {
        let h = Harness::new();
        let body = transfer_body(PAYER, NODE, &[(id(SENDER), -5), (id(PLAIN), 4)]);
        let bytes = signed_bytes(&body, &[&h.ledger.payer, &h.ledger.sender]);

        let result = h
            .pipeline
            .pre_handle_transaction(&h.ledger.store, &node(), &bytes, None);

        assert_eq!(result.status(), Status::NodeDueDiligenceFailure);
        assert_eq!(result.response_code(), ResponseCode::InvalidAccountAmounts);
        assert_eq!(h.scheduler.calls(), 0);
    }

    #[tokio::test]
    async fn test_unresolvable_signer_blames_payer() {
        let h = Harness::new();
        let body = transfer_body(PAYER, NODE, &[(id(8888), -3), (id(PLAIN), 3)]);
        let bytes = signed_bytes(&body, &[&h.ledger.payer]);

        let result = h
            .pipeline
            .pre_handle_transaction(&h.ledger.store, &node(), &bytes, None);

        assert_eq!(result.status(), Status::PreHandleFailure);
        assert_eq!(result.response_code(), ResponseCode::InvalidAccountId);
        assert_eq!(result.payer(), Some(&id(PAYER)));

        // Only the payer's signature is checked.
        let payer_key = h.ledger.payer.key();
        let keys: Vec<_> = result.verification_keys().cloned().collect();
        assert_eq!(keys, vec![payer_key.clone()]);
        assert!(outcome(result.verification_for(&payer_key).unwrap())
            .await
            .is_passed());
    }

    #[tokio::test]
    async fn test_typed_dispatch_failure_blames_payer() {
        let h = Harness::with_router(FaultyRouter(Fault::PopulatePreCheck(
            ResponseCode::InvalidAccountAmounts,
        )));
        let (body, bytes) = h.ledger.transfer();

        let result = h
            .pipeline
            .pre_handle_transaction(&h.ledger.store, &node(), &bytes, None);

        assert_eq!(result.status(), Status::PreHandleFailure);
        assert_eq!(result.response_code(), ResponseCode::InvalidAccountAmounts);
        assert_eq!(result.payer(), Some(&id(PAYER)));
        assert!(h.dedup.contains(body.transaction_id.as_ref().unwrap()));
        let payer = outcome(result.verification_for(&h.ledger.payer.key()).unwrap()).await;
        assert!(payer.is_passed());
    }

    #[tokio::test]
    async fn test_single_signer_transfer_verifies() {
        let h = Harness::new();
        let body = transfer_body(PAYER, NODE, &[(id(SENDER), -4), (id(PLAIN), 4)]);
        let bytes = signed_bytes(&body, &[&h.ledger.payer, &h.ledger.sender]);

        let result = h
            .pipeline
            .pre_handle_transaction(&h.ledger.store, &node(), &bytes, None);

        assert_eq!(result.status(), Status::SoFarSoGood);
        assert_eq!(result.response_code(), ResponseCode::Ok);
        assert_eq!(
            result.required_keys(),
            Some(&HashSet::from([h.ledger.sender.key()]))
        );
        for signer in [&h.ledger.payer, &h.ledger.sender] {
            let verification = outcome(result.verification_for(&signer.key()).unwrap()).await;
            assert!(verification.is_passed());
        }
    }

    #[test]
    fn test_scheduler_failure_is_unknown() {
        let h = Harness::with_scheduler(UnavailableScheduler);
        let (_, bytes) = h.ledger.transfer();

        let result = h
            .pipeline
            .pre_handle_transaction(&h.ledger.store, &node(), &bytes, None);

        assert_eq!(result.status(), Status::UnknownFailure);
        assert!(result.payer().is_none());
        assert!(result.tx_info().is_none());
    }

    #[test]
    fn test_router_faults() {
        let cases = [
            (
                Fault::StructuralPreCheck(ResponseCode::InvalidTransactionBody),
                Status::NodeDueDiligenceFailure,
            ),
            (
                Fault::PopulatePreCheck(ResponseCode::InvalidSignature),
                Status::PreHandleFailure,
            ),
            (Fault::PopulateUnexpected, Status::UnknownFailure),
            (Fault::PopulatePanic, Status::UnknownFailure),
        ];
        for (fault, status) in cases {
            let h = Harness::with_router(FaultyRouter(fault));
            let (_, bytes) = h.ledger.transfer();

            let result = h
                .pipeline
                .pre_handle_transaction(&h.ledger.store, &node(), &bytes, None);

            assert_eq!(result.status(), status, "{fault:?}");
        }
    }

    #[test]
    fn test_duplicates_are_registered_not_rejected() {
        let h = Harness::new();
        let (body, bytes) = h.ledger.transfer();

        let first = h
            .pipeline
            .pre_handle_transaction(&h.ledger.store, &node(), &bytes, None);
        let second = h
            .pipeline
            .pre_handle_transaction(&h.ledger.store, &node(), &bytes, None);

        assert_eq!(first.status(), Status::SoFarSoGood);
        assert_eq!(second.status(), Status::SoFarSoGood);
        assert!(h.dedup.contains(body.transaction_id.as_ref().unwrap()));
        assert_eq!(h.dedup.len(), 1);
    }

    // =========================================================================
    // REQUIREMENT COVERAGE
    // =========================================================================

    /// Contract call that also takes an optional sponsor signature and pays
    /// out of the hollow account.
    struct SponsoredCallHandler {
        sponsor: Key,
    }

    impl TransactionHandler for SponsoredCallHandler {
        fn pre_handle(
            &self,
            context: &mut KeyRequirementAccumulator<'_>,
        ) -> Result<(), PreHandleError> {
            let TransactionData::ContractCall(call) = &context.body().data else {
                return Err(PreHandleError::pre_check(ResponseCode::InvalidTransactionBody));
            };
            let contract = (call.amount > 0).then_some(&call.contract);
            context.require_contract_key_if_receiver_sig_required(
                contract,
                ResponseCode::InvalidContractId,
            )?;
            context.optional_key(self.sponsor.clone());
            context.require_key_or_throw(&id(HOLLOW), ResponseCode::InvalidAccountId)?;
            Ok(())
        }
    }

    fn sponsored_call(h: &Harness, contract: u64) -> Vec<u8> {
        let body = TransactionBody {
            data: TransactionData::ContractCall(ContractCallBody {
                contract: ContractId::Num(contract),
                gas: 50_000,
                amount: 5,
                function_parameters: Vec::new(),
            }),
            ..transfer_body(PAYER, NODE, &[])
        };
        let ledger = &h.ledger;
        signed_bytes(
            &body,
            &[&ledger.payer, &ledger.contract_admin, &ledger.sponsor, &ledger.evm],
        )
    }

    fn sponsored_harness() -> Harness {
        let sponsor = Ledger::new().sponsor.key();
        Harness::with_router(HandlerRegistry::new().register(
            TransactionKind::ContractCall,
            Arc::new(SponsoredCallHandler { sponsor }),
        ))
    }

    #[tokio::test]
    async fn test_handles_cover_every_requirement() {
        let h = sponsored_harness();
        let bytes = sponsored_call(&h, CONTRACT);

        let result = h
            .pipeline
            .pre_handle_transaction(&h.ledger.store, &node(), &bytes, None);

        assert_eq!(result.status(), Status::SoFarSoGood);
        assert_eq!(
            result.required_keys(),
            Some(&HashSet::from([h.ledger.contract_admin.key()]))
        );
        assert_eq!(
            result.optional_keys(),
            Some(&HashSet::from([h.ledger.sponsor.key()]))
        );
        assert_eq!(result.hollow_accounts().len(), 1);

        let handles: HashSet<_> = result.verification_keys().cloned().collect();
        let expected = HashSet::from([
            h.ledger.payer.key(),
            h.ledger.contract_admin.key(),
            h.ledger.sponsor.key(),
            h.ledger.evm.key(),
        ]);
        assert_eq!(handles, expected);
        for key in &handles {
            let verification = outcome(result.verification_for(key).unwrap()).await;
            assert!(verification.is_passed(), "{key:?} should verify");
        }
    }

    #[test]
    fn test_self_keyed_contract_needs_no_signature() {
        let h = sponsored_harness();
        let bytes = sponsored_call(&h, SELF_KEYED);

        let result = h
            .pipeline
            .pre_handle_transaction(&h.ledger.store, &node(), &bytes, None);

        assert_eq!(result.status(), Status::SoFarSoGood);
        assert_eq!(result.required_keys().map(HashSet::len), Some(0));
        assert!(!result
            .verification_keys()
            .any(|key| matches!(key, Key::ContractId(_))));
    }

    #[test]
    fn test_unknown_contract_blames_payer() {
        let h = sponsored_harness();
        let bytes = sponsored_call(&h, PLAIN);

        let result = h
            .pipeline
            .pre_handle_transaction(&h.ledger.store, &node(), &bytes, None);

        assert_eq!(result.status(), Status::PreHandleFailure);
        assert_eq!(result.response_code(), ResponseCode::InvalidContractId);
    }

    // =========================================================================
    // REUSE
    // =========================================================================

    #[test]
    fn test_previous_result_reused_without_collaborators() {
        let h = Harness::new();
        let (_, bytes) = h.ledger.transfer();
        let first = h
            .pipeline
            .pre_handle_transaction(&h.ledger.store, &node(), &bytes, None);
        let calls = h.collaborator_calls();

        let second = h.pipeline.pre_handle_transaction(
            &h.ledger.store,
            &node(),
            &bytes,
            Some(Arc::clone(&first)),
        );

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(h.collaborator_calls(), calls);
    }

    #[test]
    fn test_unknown_failure_reused() {
        let h = Harness::new();
        let (_, bytes) = h.ledger.transfer();
        let previous = Arc::new(PreprocessingResult::unknown_failure(0));

        let result = h.pipeline.pre_handle_transaction(
            &h.ledger.store,
            &node(),
            &bytes,
            Some(Arc::clone(&previous)),
        );

        assert!(Arc::ptr_eq(&previous, &result));
        assert_eq!(h.collaborator_calls(), 0);
    }

    #[test]
    fn test_config_change_reprocesses() {
        let old = Harness::with_config(test_config(1));
        let (_, bytes) = old.ledger.transfer();
        let previous = old
            .pipeline
            .pre_handle_transaction(&old.ledger.store, &node(), &bytes, None);

        let new = Harness::with_config(test_config(2));
        let result = new.pipeline.pre_handle_transaction(
            &new.ledger.store,
            &node(),
            &bytes,
            Some(Arc::clone(&previous)),
        );

        assert!(!Arc::ptr_eq(&previous, &result));
        assert_eq!(result.config_version(), 2);
        assert_eq!(result.status(), Status::SoFarSoGood);
        assert_eq!(new.parser.calls(), 1);
        assert_eq!(new.dedup.len(), 1);
    }

    // =========================================================================
    // BATCHES
    // =========================================================================

    #[test]
    fn test_batch_attaches_metadata_and_completes_once() {
        let h = Harness::new();
        let mut transactions: Vec<RawTransaction> = (0..16)
            .map(|i| {
                let body = transfer_body(PAYER, NODE, &[(id(SENDER), -(i + 1)), (id(PLAIN), i + 1)]);
                RawTransaction::new(signed_bytes(&body, &[&h.ledger.payer, &h.ledger.sender]))
            })
            .collect();
        transactions.push(RawTransaction::new(vec![1, 2, 3]));
        let completions = AtomicUsize::new(0);

        h.pipeline.pre_handle(
            &h.ledger.store,
            &node(),
            transactions.iter_mut(),
            |_| None,
            || {
                completions.fetch_add(1, Ordering::SeqCst);
            },
        );

        assert_eq!(completions.load(Ordering::SeqCst), 1);
        let statuses: Vec<_> = transactions
            .iter()
            .map(|t| t.metadata().unwrap().status())
            .collect();
        assert_eq!(
            statuses.iter().filter(|s| **s == Status::SoFarSoGood).count(),
            16
        );
        assert_eq!(statuses[16], Status::NodeDueDiligenceFailure);
    }

    #[test]
    fn test_batch_panic_is_contained() {
        let h = Harness::with_router(FaultyRouter(Fault::PopulatePanic));
        let mut transactions = vec![
            RawTransaction::new(h.ledger.transfer().1),
            RawTransaction::new(vec![0xFF]),
        ];

        h.pipeline
            .pre_handle_batch(&h.ledger.store, &node(), &mut transactions);

        assert_eq!(
            transactions[0].metadata().unwrap().status(),
            Status::UnknownFailure
        );
        assert_eq!(
            transactions[1].metadata().unwrap().status(),
            Status::NodeDueDiligenceFailure
        );
    }

    #[test]
    fn test_batch_lookup_panic_is_contained() {
        let h = Harness::new();
        let mut transactions: Vec<RawTransaction> = (0..4)
            .map(|i| {
                let body = transfer_body(PAYER, NODE, &[(id(SENDER), -(i + 1)), (id(PLAIN), i + 1)]);
                RawTransaction::new(signed_bytes(&body, &[&h.ledger.payer, &h.ledger.sender]))
            })
            .collect();
        transactions.insert(2, RawTransaction::new(vec![0xAB]));
        let completions = AtomicUsize::new(0);

        h.pipeline.pre_handle(
            &h.ledger.store,
            &node(),
            transactions.iter_mut(),
            |transaction| {
                if transaction.bytes() == [0xAB].as_slice() {
                    panic!("metadata lookup failed");
                }
                None
            },
            || {
                completions.fetch_add(1, Ordering::SeqCst);
            },
        );

        assert_eq!(completions.load(Ordering::SeqCst), 1);
        let statuses: Vec<_> = transactions
            .iter()
            .map(|t| t.metadata().unwrap().status())
            .collect();
        assert_eq!(statuses[2], Status::UnknownFailure);
        assert_eq!(
            statuses.iter().filter(|s| **s == Status::SoFarSoGood).count(),
            4
        );
    }

    #[test]
    fn test_second_round_reuses_attached_metadata() {
        let h = Harness::new();
        let mut transactions = vec![RawTransaction::new(h.ledger.transfer().1)];

        h.pipeline
            .pre_handle_batch(&h.ledger.store, &node(), &mut transactions);
        let first = Arc::clone(transactions[0].metadata().unwrap());
        let calls = h.collaborator_calls();
        h.pipeline
            .pre_handle_batch(&h.ledger.store, &node(), &mut transactions);

        assert!(Arc::ptr_eq(&first, transactions[0].metadata().unwrap()));
        assert_eq!(h.collaborator_calls(), calls);
    }

    // =========================================================================
    // REVALIDATION
    // =========================================================================

    #[test]
    fn test_revalidate_unchanged_keeps_handles() {
        let h = Harness::new();
        let (_, bytes) = h.ledger.transfer();
        let first = h
            .pipeline
            .pre_handle_transaction(&h.ledger.store, &node(), &bytes, None);
        let scheduled = h.scheduler.calls();

        let revalidated = h
            .pipeline
            .revalidate(&h.ledger.store, &node(), Arc::clone(&first));

        assert!(Arc::ptr_eq(&first, &revalidated));
        assert_eq!(h.scheduler.calls(), scheduled);
    }

    #[test]
    fn test_revalidate_reschedules_on_new_requirements() {
        let h = Harness::new();
        let (_, bytes) = h.ledger.transfer();
        let first = h
            .pipeline
            .pre_handle_transaction(&h.ledger.store, &node(), &bytes, None);

        // The receiver stops requiring signatures.
        let mut store = h.ledger.store.clone();
        let mut receiver = store.get_account_by_id(&id(RECEIVER)).unwrap();
        receiver.receiver_sig_required = false;
        store.insert(receiver);

        let revalidated = h.pipeline.revalidate(&store, &node(), Arc::clone(&first));

        assert!(!Arc::ptr_eq(&first, &revalidated));
        assert_eq!(revalidated.status(), Status::SoFarSoGood);
        assert_eq!(
            revalidated.required_keys(),
            Some(&HashSet::from([h.ledger.sender.key()]))
        );
        assert_eq!(h.scheduler.calls(), 2);
    }

    #[test]
    fn test_revalidate_node_mismatch_stays() {
        let h = Harness::new();
        let body = transfer_body(PAYER, 4, &[(id(SENDER), -1), (id(PLAIN), 1)]);
        let bytes = signed_bytes(&body, &[&h.ledger.payer]);
        let first = h
            .pipeline
            .pre_handle_transaction(&h.ledger.store, &node(), &bytes, None);

        let revalidated = h
            .pipeline
            .revalidate(&InMemoryAccountStore::new(), &node(), Arc::clone(&first));

        assert!(Arc::ptr_eq(&first, &revalidated));
    }

    #[test]
    fn test_revalidate_payer_gone() {
        let h = Harness::new();
        let (_, bytes) = h.ledger.transfer();
        let first = h
            .pipeline
            .pre_handle_transaction(&h.ledger.store, &node(), &bytes, None);

        let revalidated = h
            .pipeline
            .revalidate(&InMemoryAccountStore::new(), &node(), first);

        assert_eq!(revalidated.status(), Status::NodeDueDiligenceFailure);
        assert_eq!(revalidated.response_code(), ResponseCode::PayerAccountNotFound);
    }

    // =========================================================================
    // NESTED TRANSACTIONS
    // =========================================================================

    #[tokio::test]
    async fn test_schedule_create_produces_inner_result() {
        let h = Harness::new();
        let inner = transfer_body(SENDER, NODE, &[(id(SENDER), -2), (id(RECEIVER), 2)]);
        let body = schedule_body(PAYER, NODE, inner, None);
        let bytes = signed_bytes(&body, &[&h.ledger.payer, &h.ledger.receiver]);

        let result = h
            .pipeline
            .pre_handle_transaction(&h.ledger.store, &node(), &bytes, None);

        assert_eq!(result.status(), Status::SoFarSoGood);
        let inner = result.inner_result().unwrap();
        assert_eq!(inner.status(), Status::SoFarSoGood);
        // The inner payer defaults to the outer payer.
        assert_eq!(inner.payer(), Some(&id(PAYER)));
        assert_eq!(
            inner.required_keys(),
            Some(&HashSet::from([h.ledger.sender.key(), h.ledger.receiver.key()]))
        );
        assert!(inner.tx_info().unwrap().transaction_id().is_none());

        let receiver = outcome(inner.verification_for(&h.ledger.receiver.key()).unwrap()).await;
        assert!(receiver.is_passed());
        let sender = outcome(inner.verification_for(&h.ledger.sender.key()).unwrap()).await;
        assert!(!sender.is_passed());
    }

    #[test]
    fn test_schedule_with_unknown_inner_signer() {
        let h = Harness::new();
        let inner = transfer_body(SENDER, NODE, &[(id(9999), -2), (id(PLAIN), 2)]);
        let body = schedule_body(PAYER, NODE, inner, None);
        let bytes = signed_bytes(&body, &[&h.ledger.payer]);

        let result = h
            .pipeline
            .pre_handle_transaction(&h.ledger.store, &node(), &bytes, None);

        assert_eq!(result.status(), Status::PreHandleFailure);
        assert_eq!(
            result.response_code(),
            ResponseCode::UnresolvableRequiredSigners
        );
    }

    #[test]
    fn test_nested_schedules_exceed_depth() {
        let h = Harness::with_scheduler(InstantScheduler { passed: true });
        let transfer = transfer_body(SENDER, NODE, &[(id(SENDER), -2), (id(PLAIN), 2)]);
        let inner = schedule_body(SENDER, NODE, transfer, None);
        let body = schedule_body(PAYER, NODE, inner, None);
        let bytes = signed_bytes(&body, &[&h.ledger.payer]);

        let result = h
            .pipeline
            .pre_handle_transaction(&h.ledger.store, &node(), &bytes, None);

        assert_eq!(result.status(), Status::PreHandleFailure);
        assert_eq!(result.response_code(), ResponseCode::NestedDepthExceeded);
    }

    #[test]
    fn test_hollow_payer_account_rejected() {
        let h = Harness::new();
        let mut store = h.ledger.store.clone();
        store.insert(Account::hollow(2001, [0x11; 20]));
        let body = transfer_body(2001, NODE, &[(id(SENDER), -1), (id(PLAIN), 1)]);
        let bytes = signed_bytes(&body, &[&h.ledger.sender]);

        let result = h.pipeline.pre_handle_transaction(&store, &node(), &bytes, None);

        assert_eq!(result.status(), Status::NodeDueDiligenceFailure);
        assert_eq!(result.response_code(), ResponseCode::InvalidPayerAccountId);
    }
}
