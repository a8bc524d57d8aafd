//! Handler registry routing transactions to per-kind rules.

use std::collections::HashMap;
use std::sync::Arc;

use shared_types::{TransactionBody, TransactionKind};

use crate::domain::context::KeyRequirementAccumulator;
use crate::domain::errors::PreHandleError;
use crate::ports::outbound::TransactionRouter;

/// Business rules for one transaction kind.
pub trait TransactionHandler: Send + Sync {
    /// Ledger-independent checks on the body.
    fn pure_checks(&self, _body: &TransactionBody) -> Result<(), PreHandleError> {
        Ok(())
    }

    /// Record the signatures this transaction needs.
    fn pre_handle(&self, context: &mut KeyRequirementAccumulator<'_>) -> Result<(), PreHandleError>;
}

/// `TransactionRouter` dispatching on `TransactionKind`.
///
/// A kind without a registered handler is an unexpected fault, not a
/// validation failure.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<TransactionKind, Arc<dyn TransactionHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, kind: TransactionKind, handler: Arc<dyn TransactionHandler>) -> Self {
        self.handlers.insert(kind, handler);
        self
    }

    pub fn handles(&self, kind: TransactionKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    fn handler_for(&self, body: &TransactionBody) -> Result<&dyn TransactionHandler, PreHandleError> {
        self.handlers
            .get(&body.kind())
            .map(|handler| &**handler)
            .ok_or_else(|| {
                PreHandleError::unexpected(format!("no handler registered for {}", body.kind()))
            })
    }
}

impl TransactionRouter for HandlerRegistry {
    fn structural_check(&self, body: &TransactionBody) -> Result<(), PreHandleError> {
        self.handler_for(body)?.pure_checks(body)
    }

    fn populate_requirements(
        &self,
        context: &mut KeyRequirementAccumulator<'_>,
    ) -> Result<(), PreHandleError> {
        self.handler_for(context.body())?.pre_handle(context)
    }
}
