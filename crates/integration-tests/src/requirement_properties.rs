//! Property-based tests for signer requirement collection.
//!
//! Whatever keys a handler adds, the payer key and empty keys are never
//! recorded, repeats collapse and a changed requirement set is never taken
//! for the old one.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use proptest::prelude::*;

    use qc_prehandle::test_utils::{example_router, transfer_body};
    use qc_prehandle::{
        KeyRequirementAccumulator, ParsedTransaction, PreprocessingResult, TransactionKeys,
    };
    use shared_types::{AccountId, Key};

    use crate::harness::*;

    /// Primitive keys drawn from a small space so collisions happen.
    fn primitive_key() -> impl Strategy<Value = Key> {
        prop_oneof![
            (0u8..6).prop_map(|b| Key::Ed25519([b; 32])),
            (0u8..6).prop_map(|b| {
                let mut bytes = [b; 33];
                bytes[0] = 0x02;
                Key::EcdsaSecp256k1(bytes)
            }),
            Just(Key::Empty),
            Just(Key::KeyList(vec![])),
        ]
    }

    fn any_key() -> impl Strategy<Value = Key> {
        primitive_key().prop_recursive(2, 8, 3, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..3).prop_map(Key::KeyList),
                (0u32..4, prop::collection::vec(inner, 0..3))
                    .prop_map(|(threshold, keys)| Key::Threshold { threshold, keys }),
            ]
        })
    }

    fn collect(required: &[Key], optional: &[Key]) -> TransactionKeys {
        let ledger = Ledger::new();
        let router = example_router();
        let body = transfer_body(PAYER, NODE, &[]);
        let mut context =
            KeyRequirementAccumulator::new(&ledger.store, &router, &body, &id(PAYER), 1).unwrap();
        context.require_keys(required.iter().cloned());
        context.optional_keys(optional.iter().cloned());
        context.keys()
    }

    proptest! {
        /// Property: the payer key and empty keys are never recorded.
        #[test]
        fn prop_payer_and_empty_keys_excluded(
            required in prop::collection::vec(any_key(), 0..8),
            optional in prop::collection::vec(any_key(), 0..8),
            include_payer in any::<bool>(),
        ) {
            let payer_key = Ledger::new().payer.key();
            let mut required = required;
            if include_payer {
                required.push(payer_key.clone());
            }

            let keys = collect(&required, &optional);

            prop_assert_eq!(&keys.payer_key, &payer_key);
            for key in keys.required_non_payer_keys.iter().chain(&keys.optional_non_payer_keys) {
                prop_assert_ne!(key, &payer_key);
                prop_assert!(!key.is_empty());
            }
            for key in required.iter().filter(|k| !k.is_empty() && **k != payer_key) {
                prop_assert!(keys.required_non_payer_keys.contains(key));
            }
        }

        /// Property: adding the same keys again changes nothing.
        #[test]
        fn prop_requirements_idempotent(
            required in prop::collection::vec(any_key(), 0..8),
        ) {
            let once = collect(&required, &[]);
            let doubled: Vec<Key> = required.iter().chain(&required).cloned().collect();
            let twice = collect(&doubled, &[]);

            prop_assert_eq!(once, twice);
        }

        /// Property: a result only matches the exact requirements it was built with.
        #[test]
        fn prop_requirement_mismatch_detected(
            first in prop::collection::vec(primitive_key(), 0..6),
            second in prop::collection::vec(primitive_key(), 0..6),
        ) {
            let before = collect(&first, &[]);
            let after = collect(&second, &[]);
            let parsed = Arc::new(ParsedTransaction::new(
                transfer_body(PAYER, NODE, &[]),
                Default::default(),
                Vec::new(),
                Vec::new(),
            ));
            let result = PreprocessingResult::so_far_so_good(
                AccountId::Num(PAYER),
                before.clone(),
                parsed,
                Default::default(),
                None,
                0,
            );

            prop_assert!(result.has_same_requirements(&before));
            prop_assert_eq!(result.has_same_requirements(&after), before == after);
            prop_assert_eq!(result.can_reuse_verifications(&after, 0), before == after);
            prop_assert!(!result.can_reuse_verifications(&before, 1));
        }
    }
}
