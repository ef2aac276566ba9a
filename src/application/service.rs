use super::customer::{ClientContext, CustomerProfile, CustomerProfileBuilder};
use super::dispatcher::TransactionDispatcher;
use super::reconciler::OrderReconciler;
use super::redirect::RedirectRequestProcessor;
use crate::domain::order::Order;
use crate::domain::ports::OrderCriteria;
use crate::domain::transaction::{
    GatewayTransaction, ReconciliationResult, RedirectOutcome, TriggerType,
};
use crate::error::{ReconcileError, Result};

/// The entry points the HTTP layer (or the replay CLI) calls, one per trigger.
///
/// Each call loads the order fresh from the store; nothing is cached between calls.
pub struct ReconciliationService {
    reconciler: OrderReconciler,
}

impl ReconciliationService {
    pub fn new(reconciler: OrderReconciler) -> Self {
        Self { reconciler }
    }

    /// Gateway webhook: the authoritative status update.
    pub async fn handle_webhook(
        &self,
        transaction: &GatewayTransaction,
    ) -> Result<ReconciliationResult> {
        self.reconcile(transaction, TriggerType::Webhook).await
    }

    /// The customer's browser returning from the gateway.
    pub async fn handle_return(
        &self,
        transaction: &GatewayTransaction,
    ) -> Result<ReconciliationResult> {
        self.reconcile(transaction, TriggerType::Success).await
    }

    /// Right after the gateway transaction was created for `order_id`.
    pub async fn start_redirect(
        &self,
        order_id: u64,
        transaction: Option<&GatewayTransaction>,
        test_flag: Option<&str>,
    ) -> Result<RedirectOutcome> {
        let order = self.load(OrderCriteria::ById(order_id)).await?;
        RedirectRequestProcessor::new(&self.reconciler)
            .process(order, transaction, test_flag)
            .await
    }

    pub async fn customer_profile(
        &self,
        order_id: u64,
        context: ClientContext,
    ) -> Result<CustomerProfile> {
        let order = self.load(OrderCriteria::ById(order_id)).await?;
        let method = self.reconciler.resolve_method_code(&order);
        Ok(CustomerProfileBuilder::new(self.reconciler.config(), context).build(&order, &method))
    }

    /// Consumes the service and returns the final state of all orders.
    pub async fn into_orders(self) -> Result<Vec<Order>> {
        self.reconciler.orders.all().await
    }

    async fn reconcile(
        &self,
        transaction: &GatewayTransaction,
        trigger: TriggerType,
    ) -> Result<ReconciliationResult> {
        let transaction_id = transaction.transaction_id().ok_or_else(|| {
            ReconcileError::ValidationError("transaction payload has no id".to_string())
        })?;
        let order = self
            .load(OrderCriteria::ByGatewayTransaction(transaction_id.to_string()))
            .await?;

        TransactionDispatcher::new(&self.reconciler)
            .dispatch(transaction, order, trigger)
            .await
    }

    async fn load(&self, criteria: OrderCriteria) -> Result<Order> {
        self.reconciler
            .orders
            .load(criteria.clone())
            .await?
            .ok_or_else(|| ReconcileError::OrderNotFound(format!("{criteria:?}")))
    }
}
