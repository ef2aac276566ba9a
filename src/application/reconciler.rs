use crate::domain::method::MethodCode;
use crate::domain::order::{
    INFO_MAILING_ADDRESS, Order, OrderState, PaymentRecord, PaymentRecordKind,
};
use crate::domain::ports::{
    CheckoutSessionBox, CommentHistoryBox, ConfigProvider, ConfigProviderBox, NotifierBox,
    OrderStoreBox,
};
use crate::domain::transaction::GatewayTransaction;
use crate::domain::urls::UrlProvider;
use crate::error::Result;
use serde_json::json;
use tracing::{debug, info, warn};

const CANCEL_COMMENT: &str = "The order was canceled";

/// Shared order/payment mutations used by every status handler and the redirect path.
///
/// Owns the collaborators explicitly; handlers borrow the reconciler instead of holding
/// their own copies. Every mutating primitive persists through the order store and returns
/// the stored copy, which callers must use from then on.
pub struct OrderReconciler {
    pub(crate) orders: OrderStoreBox,
    pub(crate) notifier: NotifierBox,
    pub(crate) comments: CommentHistoryBox,
    pub(crate) config: ConfigProviderBox,
    pub(crate) session: CheckoutSessionBox,
    pub(crate) urls: UrlProvider,
}

impl OrderReconciler {
    pub fn new(
        orders: OrderStoreBox,
        notifier: NotifierBox,
        comments: CommentHistoryBox,
        config: ConfigProviderBox,
        session: CheckoutSessionBox,
        urls: UrlProvider,
    ) -> Self {
        Self {
            orders,
            notifier,
            comments,
            config,
            session,
            urls,
        }
    }

    pub fn config(&self) -> &dyn ConfigProvider {
        self.config.as_ref()
    }

    /// Binds a gateway transaction to the order and leaves the payment leg open.
    ///
    /// Re-invocation overwrites the id; callers must not call it twice for one event.
    pub async fn register_transaction(
        &self,
        mut order: Order,
        transaction_id: &str,
        kind: PaymentRecordKind,
    ) -> Result<Order> {
        order.payment.last_transaction_id = Some(transaction_id.to_string());
        order.payment.is_transaction_closed = false;
        order.payment.transactions.push(PaymentRecord {
            transaction_id: transaction_id.to_string(),
            kind,
        });

        debug!(order_id = order.entity_id, transaction_id, ?kind, "registered transaction");
        self.orders.save(order).await
    }

    /// Books the captured amount and advances the order state.
    ///
    /// A no-op when the order already has an invoice or a paid amount, so a duplicate
    /// webhook never captures twice.
    pub async fn capture_transaction(
        &self,
        mut order: Order,
        transaction: &GatewayTransaction,
    ) -> Result<Order> {
        if order.has_invoices() || !order.payment.amount_paid.is_zero() {
            let message = format!(
                "Order {} already invoiced/paid, no need for capture",
                order.increment_id
            );
            info!(order_id = order.entity_id, "{message}");
            self.config.log("info", &json!(message));
            return Ok(order);
        }

        let transaction_id = transaction
            .transaction_id()
            .or_else(|| transaction.first_leg().and_then(|leg| leg.id.as_deref()))
            .unwrap_or_default()
            .to_string();
        let amount = transaction.amount.unwrap_or_default().to_major();

        order.payment.last_transaction_id = Some(transaction_id.clone());
        order.payment.is_transaction_closed = true;
        order.register_capture(&transaction_id, amount);
        order.state = if order.is_virtual {
            OrderState::Complete
        } else {
            OrderState::Processing
        };

        info!(
            order_id = order.entity_id,
            transaction_id = %transaction_id,
            amount = %amount.value(),
            state = %order.state,
            "captured transaction"
        );
        self.orders.save(order).await
    }

    pub fn resolve_method_code(&self, order: &Order) -> MethodCode {
        order.payment.method.clone()
    }

    /// Renders the bank-transfer instructions onto the payment leg. No-op for other methods.
    ///
    /// The caller is responsible for persisting the order.
    pub fn apply_mailing_address_template(
        &self,
        order: &mut Order,
        method: &MethodCode,
        transaction: &GatewayTransaction,
    ) {
        if !self.config.is_bank_transfer_like(method) {
            return;
        }

        let amount = transaction.amount.unwrap_or_default().to_major();
        let template = self.config.mailing_address_template_for(method);
        let rendered = template
            .replace("%AMOUNT%", &self.config.format_amount(amount.value()))
            .replace("%REFERENCE%", transaction.payment_reference().unwrap_or_default())
            .replace("\\n", "\n");

        order.payment.set_info(INFO_MAILING_ADDRESS, rendered);
    }

    /// Cancels the order unless it already is. Returns whether a cancellation happened.
    pub async fn cancel(&self, mut order: Order) -> Result<(Order, bool)> {
        if order.is_canceled() {
            debug!(order_id = order.entity_id, "order already canceled");
            return Ok((order, false));
        }

        info!(order_id = order.entity_id, "{CANCEL_COMMENT}");
        self.config
            .log("info", &json!(format!("{} {}", order.increment_id, CANCEL_COMMENT)));
        order.register_cancellation(CANCEL_COMMENT);

        let order = self.orders.save(order).await?;
        Ok((order, true))
    }

    pub async fn update_status(&self, mut order: Order, status: &str) -> Result<Order> {
        if order.status == status {
            return Ok(order);
        }

        let comment = format!("Status updated from {} to {}", order.status, status);
        order.add_status_to_history(status, comment, false);
        self.orders.save(order).await
    }

    /// Sends the order confirmation once per order.
    ///
    /// Delivery failures are logged and swallowed; the payment state is already booked and a
    /// redelivered webhook would skip the capture branch anyway.
    pub async fn send_order_email(&self, mut order: Order) -> Result<Order> {
        if order.email_sent {
            return Ok(order);
        }

        match self.notifier.send_order_confirmation(&order).await {
            Ok(true) => {
                order.email_sent = true;
                let message = format!("Order email sent to {}", order.customer_email);
                self.comments.append(&order, &message, true).await?;
                self.orders.save(order).await
            }
            Ok(false) => Ok(order),
            Err(e) => {
                warn!(order_id = order.entity_id, error = %e, "order email failed");
                Ok(order)
            }
        }
    }

    /// Sends the invoice email when the method is configured to and one is outstanding.
    pub async fn send_invoice_email(&self, mut order: Order) -> Result<Order> {
        let method = self.resolve_method_code(&order);
        if !self.config.send_invoice_email(&method, order.store_id) {
            return Ok(order);
        }
        if order.pending_invoice_mut().is_none() {
            return Ok(order);
        }

        match self.notifier.send_invoice(&order).await {
            Ok(true) => {
                if let Some(invoice) = order.pending_invoice_mut() {
                    invoice.email_sent = true;
                }
                let message = format!("Invoice email sent to {}", order.customer_email);
                self.comments.append(&order, &message, true).await?;
                self.orders.save(order).await
            }
            Ok(false) => Ok(order),
            Err(e) => {
                warn!(order_id = order.entity_id, error = %e, "invoice email failed");
                Ok(order)
            }
        }
    }
}
