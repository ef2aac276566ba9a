use super::handlers::{CANCELLED, Complete, EXPIRED, FAILED, Processing, StatusHandler, Unknown};
use super::reconciler::OrderReconciler;
use crate::domain::order::Order;
use crate::domain::transaction::{
    GatewayStatus, GatewayTransaction, ReconciliationResult, TriggerType,
};
use crate::error::Result;
use tracing::debug;

static PROCESSING: Processing = Processing;
static COMPLETE: Complete = Complete;
static UNKNOWN: Unknown = Unknown;

/// Status → handler. New statuses get a row here; anything missing falls through to
/// [`Unknown`].
static HANDLERS: [(GatewayStatus, &dyn StatusHandler); 5] = [
    (GatewayStatus::Processing, &PROCESSING),
    (GatewayStatus::Completed, &COMPLETE),
    (GatewayStatus::Cancelled, &CANCELLED),
    (GatewayStatus::Expired, &EXPIRED),
    (GatewayStatus::Error, &FAILED),
];

pub fn handler_for(status: GatewayStatus) -> &'static dyn StatusHandler {
    HANDLERS
        .iter()
        .find(|(candidate, _)| *candidate == status)
        .map(|(_, handler)| *handler)
        .unwrap_or(&UNKNOWN)
}

/// Routes a gateway transaction to the handler for its status.
pub struct TransactionDispatcher<'a> {
    reconciler: &'a OrderReconciler,
}

impl<'a> TransactionDispatcher<'a> {
    pub fn new(reconciler: &'a OrderReconciler) -> Self {
        Self { reconciler }
    }

    /// Every status, including empty and unrecognized ones, yields a result. Only
    /// persistence failures surface as `Err`.
    pub async fn dispatch(
        &self,
        transaction: &GatewayTransaction,
        order: Order,
        trigger: TriggerType,
    ) -> Result<ReconciliationResult> {
        let status = transaction.gateway_status();
        debug!(
            order_id = order.entity_id,
            status = ?status,
            raw_status = transaction.status.as_deref().unwrap_or_default(),
            %trigger,
            "dispatching transaction"
        );

        handler_for(status)
            .handle(self.reconciler, order, transaction, trigger)
            .await
    }
}
