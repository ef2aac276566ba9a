//! One handler per gateway-reported status.
//!
//! Handlers are stateless unit values; everything they touch comes in through the borrowed
//! [`OrderReconciler`]. The dispatcher picks one from its table by [`GatewayStatus`].
//!
//! [`GatewayStatus`]: crate::domain::transaction::GatewayStatus

use super::reconciler::OrderReconciler;
use crate::domain::order::{Order, PaymentRecordKind};
use crate::domain::ports::{LastOrder, StatusEvent};
use crate::domain::transaction::{GatewayTransaction, ReconciliationResult, TriggerType};
use crate::error::Result;
use async_trait::async_trait;
use tracing::{info, warn};

#[async_trait]
pub trait StatusHandler: Send + Sync {
    async fn handle(
        &self,
        reconciler: &OrderReconciler,
        order: Order,
        transaction: &GatewayTransaction,
        trigger: TriggerType,
    ) -> Result<ReconciliationResult>;
}

fn log_result(reconciler: &OrderReconciler, result: &ReconciliationResult) {
    info!(
        order_id = result.order_id,
        status = %result.status,
        trigger = %result.r#type,
        success = result.success,
        "reconciled"
    );
    reconciler
        .config()
        .log("success", &serde_json::to_value(result).unwrap_or_default());
}

/// `processing`: only meaningful for bank-transfer-like methods, where the customer has
/// received payment instructions and the order waits for the money.
pub struct Processing;

#[async_trait]
impl StatusHandler for Processing {
    async fn handle(
        &self,
        reconciler: &OrderReconciler,
        order: Order,
        transaction: &GatewayTransaction,
        trigger: TriggerType,
    ) -> Result<ReconciliationResult> {
        let method = reconciler.resolve_method_code(&order);
        if !reconciler.config().is_bank_transfer_like(&method) {
            let result = ReconciliationResult::new(false, "processing", order.entity_id, trigger);
            log_result(reconciler, &result);
            return Ok(result);
        }

        let mut order = order;
        if trigger == TriggerType::Webhook {
            let transaction_id = transaction.transaction_id().unwrap_or_default();
            order = reconciler
                .register_transaction(order, transaction_id, PaymentRecordKind::Auth)
                .await?;
            order = reconciler.send_order_email(order).await?;
        }

        let result = ReconciliationResult::new(true, "processing", order.entity_id, trigger);
        log_result(reconciler, &result);
        Ok(result)
    }
}

/// `completed`: the money is in. Capture once, notify, and move to the configured status.
pub struct Complete;

#[async_trait]
impl StatusHandler for Complete {
    async fn handle(
        &self,
        reconciler: &OrderReconciler,
        order: Order,
        transaction: &GatewayTransaction,
        trigger: TriggerType,
    ) -> Result<ReconciliationResult> {
        let mut order = order;

        if trigger == TriggerType::Webhook && !order.payment.is_transaction_closed {
            order = reconciler.capture_transaction(order, transaction).await?;
            order = reconciler.send_order_email(order).await?;
            order = reconciler.send_invoice_email(order).await?;

            let method = reconciler.resolve_method_code(&order);
            let status =
                reconciler
                    .config()
                    .status_code_for(&method, StatusEvent::Processing, order.store_id);
            order = reconciler.update_status(order, &status).await?;
        }

        if trigger == TriggerType::Success {
            reconciler.session.remember_last_order(LastOrder {
                quote_id: order.quote_id,
                increment_id: order.increment_id.clone(),
                order_id: order.entity_id,
            });
        }

        let result = ReconciliationResult::new(true, "complete", order.entity_id, trigger);
        log_result(reconciler, &result);
        Ok(result)
    }
}

/// Terminal failure statuses. All of them cancel the order on webhook and tell the
/// customer to try again; they differ only in wording.
pub struct CancelOnWebhook {
    pub status: &'static str,
    pub cart_msg: &'static str,
}

pub static CANCELLED: CancelOnWebhook = CancelOnWebhook {
    status: "cancelled",
    cart_msg: "There was a problem processing your payment because it has been cancelled. \
               Please try again.",
};

pub static EXPIRED: CancelOnWebhook = CancelOnWebhook {
    status: "expired",
    cart_msg: "There was a problem processing your payment because it expired. Please try again.",
};

pub static FAILED: CancelOnWebhook = CancelOnWebhook {
    status: "error",
    cart_msg: "There was a problem processing your payment because it failed. Please try again.",
};

#[async_trait]
impl StatusHandler for CancelOnWebhook {
    async fn handle(
        &self,
        reconciler: &OrderReconciler,
        order: Order,
        _transaction: &GatewayTransaction,
        trigger: TriggerType,
    ) -> Result<ReconciliationResult> {
        let order_id = order.entity_id;
        if trigger == TriggerType::Webhook {
            let (_, cancelled) = reconciler.cancel(order).await?;
            if !cancelled {
                info!(order_id, status = self.status, "order was already canceled");
            }
        }

        let result = ReconciliationResult::new(false, self.status, order_id, trigger)
            .with_cart_msg(self.cart_msg);
        log_result(reconciler, &result);
        Ok(result)
    }
}

/// Any status without a dedicated handler. Logged and reported as unsuccessful; the order is
/// left untouched.
pub struct Unknown;

#[async_trait]
impl StatusHandler for Unknown {
    async fn handle(
        &self,
        reconciler: &OrderReconciler,
        order: Order,
        transaction: &GatewayTransaction,
        trigger: TriggerType,
    ) -> Result<ReconciliationResult> {
        let status = transaction
            .status
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or("unknown");
        warn!(order_id = order.entity_id, status, "unrecognized gateway status");

        let result = ReconciliationResult::new(false, status, order.entity_id, trigger);
        log_result(reconciler, &result);
        Ok(result)
    }
}
