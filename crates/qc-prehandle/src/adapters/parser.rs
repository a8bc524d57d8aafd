//! # Transaction Checker
//!
//! Reference `TransactionParser`: decodes the wire envelope and applies the
//! syntactic checks that need no ledger state.
//!
//! ## Checks (in order)
//!
//! 1. Non-empty and within the size limit
//! 2. Envelope and body decode
//! 3. No signature prefix is a prefix of another
//! 4. Transaction id present, payer numeric and non-zero, not scheduled
//! 5. Node account present
//! 6. Memo length and no NUL bytes
//! 7. Non-negative fee and valid duration within bounds

use shared_types::{
    AccountId, ResponseCode, SignatureMap, SignedTransaction, TransactionBody,
};
use tracing::debug;

use crate::config::PreHandleConfig;
use crate::domain::entities::ParsedTransaction;
use crate::domain::errors::PreHandleError;
use crate::ports::outbound::TransactionParser;

/// Parses and syntactically checks submitted transactions.
#[derive(Debug, Clone)]
pub struct TransactionChecker {
    max_transaction_size: usize,
    max_memo_bytes: usize,
    min_valid_duration_secs: i64,
    max_valid_duration_secs: i64,
}

impl TransactionChecker {
    pub fn new(config: &PreHandleConfig) -> Self {
        Self {
            max_transaction_size: config.max_signed_transaction_size,
            max_memo_bytes: config.max_memo_bytes,
            min_valid_duration_secs: config.min_valid_duration_secs,
            max_valid_duration_secs: config.max_valid_duration_secs,
        }
    }

    fn check_signature_map(&self, sig_map: &SignatureMap) -> Result<(), PreHandleError> {
        let mut prefixes: Vec<&[u8]> = sig_map
            .pairs
            .iter()
            .map(|pair| pair.pub_key_prefix.as_slice())
            .collect();
        // After sorting, a prefix clash always shows up between neighbours.
        prefixes.sort_unstable();
        for window in prefixes.windows(2) {
            if window[1].starts_with(window[0]) {
                return Err(PreHandleError::pre_check(ResponseCode::KeyPrefixMismatch));
            }
        }
        Ok(())
    }

    fn check_body(&self, body: &TransactionBody) -> Result<(), PreHandleError> {
        let id = body
            .transaction_id
            .as_ref()
            .ok_or(PreHandleError::pre_check(ResponseCode::InvalidTransactionId))?;
        match id.payer {
            AccountId::Num(num) if num > 0 => {}
            _ => return Err(PreHandleError::pre_check(ResponseCode::PayerAccountNotFound)),
        }
        if id.scheduled || id.nonce != 0 {
            return Err(PreHandleError::pre_check(
                ResponseCode::TransactionIdFieldNotAllowed,
            ));
        }

        if body.node_account_id.is_none() {
            return Err(PreHandleError::pre_check(ResponseCode::InvalidNodeAccount));
        }

        if body.memo.len() > self.max_memo_bytes {
            return Err(PreHandleError::pre_check(ResponseCode::MemoTooLong));
        }
        if body.memo.contains('\0') {
            return Err(PreHandleError::pre_check(
                ResponseCode::InvalidZeroByteInString,
            ));
        }

        if body.transaction_fee < 0 {
            return Err(PreHandleError::pre_check(ResponseCode::InsufficientTxFee));
        }
        if body.valid_duration_secs < self.min_valid_duration_secs
            || body.valid_duration_secs > self.max_valid_duration_secs
        {
            return Err(PreHandleError::pre_check(
                ResponseCode::InvalidTransactionDuration,
            ));
        }

        Ok(())
    }
}

impl TransactionParser for TransactionChecker {
    fn parse_and_check(&self, bytes: &[u8]) -> Result<ParsedTransaction, PreHandleError> {
        if bytes.is_empty() {
            return Err(PreHandleError::pre_check(ResponseCode::InvalidTransaction));
        }
        if bytes.len() > self.max_transaction_size {
            return Err(PreHandleError::pre_check(ResponseCode::TransactionOversize));
        }

        let limit = self.max_transaction_size as u64;
        let signed = SignedTransaction::from_bytes(bytes, limit).map_err(|e| {
            debug!(error = %e, "Undecodable transaction envelope");
            PreHandleError::pre_check(ResponseCode::InvalidTransaction)
        })?;
        let body = TransactionBody::from_bytes(&signed.body_bytes, limit).map_err(|e| {
            debug!(error = %e, "Undecodable transaction body");
            PreHandleError::pre_check(ResponseCode::InvalidTransactionBody)
        })?;

        self.check_signature_map(&signed.sig_map)?;
        self.check_body(&body)?;

        Ok(ParsedTransaction::new(
            body,
            signed.sig_map,
            signed.body_bytes,
            bytes.to_vec(),
        ))
    }
}
