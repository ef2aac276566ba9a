use super::reconciler::OrderReconciler;
use crate::domain::order::{INFO_TEST_MODUS, Order};
use crate::domain::ports::StatusEvent;
use crate::domain::transaction::{GatewayTransaction, RedirectOutcome};
use crate::error::Result;
use tracing::{debug, info};

pub const REDIRECT_UNAVAILABLE: &str = "could not fetch redirect url";

/// Handles the browser leaving for (or returning from) the gateway right after a
/// transaction was created.
pub struct RedirectRequestProcessor<'a> {
    reconciler: &'a OrderReconciler,
}

impl<'a> RedirectRequestProcessor<'a> {
    pub fn new(reconciler: &'a OrderReconciler) -> Self {
        Self { reconciler }
    }

    /// Records the pending gateway order and works out where to send the browser.
    ///
    /// The gateway error is checked twice: once to decide whether to persist, and again
    /// after persisting to pick the outcome. The second check is what surfaces an error for
    /// a payload that carries no transaction id, so the two must stay separate.
    pub async fn process(
        &self,
        order: Order,
        transaction: Option<&GatewayTransaction>,
        test_flag: Option<&str>,
    ) -> Result<RedirectOutcome> {
        let mut order = order;
        let method = self.reconciler.resolve_method_code(&order);
        let config = self.reconciler.config();

        if let Some(tx) = transaction {
            self.reconciler
                .apply_mailing_address_template(&mut order, &method, tx);
        }
        config.log(
            "transaction",
            &serde_json::to_value(transaction).unwrap_or_default(),
        );

        let gateway_error = transaction.and_then(GatewayTransaction::gateway_error);
        let transaction_id = transaction
            .and_then(GatewayTransaction::transaction_id)
            .map(str::to_string);

        if let Some(id) = transaction_id.as_deref()
            && gateway_error.is_none()
        {
            let status = config.status_code_for(&method, StatusEvent::Pending, order.store_id);
            order.add_status_to_history(status, format!("Gateway order ID: {id}"), false);
            order.gateway_transaction_id = Some(id.to_string());
            if let Some(flag) = test_flag {
                order.payment.set_info(INFO_TEST_MODUS, flag);
            }

            info!(order_id = order.entity_id, transaction_id = id, "transaction started");
            self.reconciler.orders.save(order).await?;
        }

        if let Some(error) = gateway_error {
            debug!(error = %error, "gateway reported an error");
            return Ok(RedirectOutcome::Error(error));
        }

        if config.is_bank_transfer_like(&method) || method.capabilities().redirect_to_process_page {
            let url = self
                .reconciler
                .urls
                .success_process_url(transaction_id.as_deref().unwrap_or_default())?;
            return Ok(RedirectOutcome::Redirect(url.to_string()));
        }

        if let Some(url) = transaction.and_then(GatewayTransaction::payment_url) {
            return Ok(RedirectOutcome::Redirect(url.to_string()));
        }

        Ok(RedirectOutcome::Error(REDIRECT_UNAVAILABLE.to_string()))
    }
}
