use super::method::MethodCode;
use super::order::Order;
use crate::error::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How the reconciler locates an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderCriteria {
    ById(u64),
    ByIncrementId(String),
    /// The gateway order id recorded when the transaction was started.
    ByGatewayTransaction(String),
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn load(&self, criteria: OrderCriteria) -> Result<Option<Order>>;
    /// Persists the order and returns the stored copy.
    ///
    /// Fails with `PersistenceError` when the order was modified since it was loaded.
    async fn save(&self, order: Order) -> Result<Order>;
    async fn all(&self) -> Result<Vec<Order>>;
}

/// Outbound customer email. Both calls are idempotent and report whether a message went out.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_order_confirmation(&self, order: &Order) -> Result<bool>;
    async fn send_invoice(&self, order: &Order) -> Result<bool>;
}

#[async_trait]
pub trait CommentHistory: Send + Sync {
    /// Appends a comment to the order's history; an empty message is ignored.
    async fn append(&self, order: &Order, message: &str, notify_customer: bool) -> Result<()>;
}

/// The order-status event a configured status code is looked up for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEvent {
    Pending,
    Processing,
}

/// Store-scoped settings plus the audit log.
pub trait ConfigProvider: Send + Sync {
    fn status_code_for(&self, method: &MethodCode, event: StatusEvent, store_id: u32) -> String;
    fn mailing_address_template_for(&self, method: &MethodCode) -> String;
    fn is_bank_transfer_like(&self, method: &MethodCode) -> bool;
    fn format_amount(&self, amount: Decimal) -> String;
    fn send_invoice_email(&self, method: &MethodCode, store_id: u32) -> bool;
    /// Writes an audit entry; must never fail the caller.
    fn log(&self, channel: &str, payload: &serde_json::Value);
}

/// Identifiers the storefront needs to render the success page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastOrder {
    pub quote_id: Option<u64>,
    pub increment_id: String,
    pub order_id: u64,
}

pub trait CheckoutSession: Send + Sync {
    fn remember_last_order(&self, last_order: LastOrder);
}

pub type OrderStoreBox = Box<dyn OrderStore>;
pub type NotifierBox = Box<dyn Notifier>;
pub type CommentHistoryBox = Box<dyn CommentHistory>;
pub type ConfigProviderBox = Box<dyn ConfigProvider>;
pub type CheckoutSessionBox = Box<dyn CheckoutSession>;
