use crate::domain::order::Order;
use crate::domain::ports::{
    CheckoutSession, CommentHistory, LastOrder, Notifier, OrderCriteria, OrderStore,
};
use crate::error::{ReconcileError, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::RwLock;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A thread-safe in-memory order store.
///
/// Uses `Arc<RwLock<BTreeMap<u64, Order>>>` so clones share state. Saves are checked
/// against the stored `version`: a copy loaded before another writer saved is rejected
/// instead of silently overwriting.
#[derive(Default, Clone)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<BTreeMap<u64, Order>>>,
}

impl InMemoryOrderStore {
    /// Creates a new, empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `orders`, e.g. from a fixture file.
    pub fn with_orders(orders: impl IntoIterator<Item = Order>) -> Self {
        let orders = orders
            .into_iter()
            .map(|order| (order.entity_id, order))
            .collect();
        Self {
            orders: Arc::new(RwLock::new(orders)),
        }
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn load(&self, criteria: OrderCriteria) -> Result<Option<Order>> {
        let orders = self.orders.read().await;
        let found = match criteria {
            OrderCriteria::ById(id) => orders.get(&id),
            OrderCriteria::ByIncrementId(increment_id) => orders
                .values()
                .find(|order| order.increment_id == increment_id),
            OrderCriteria::ByGatewayTransaction(transaction_id) => orders.values().find(|order| {
                order.gateway_transaction_id.as_deref() == Some(transaction_id.as_str())
            }),
        };
        Ok(found.cloned())
    }

    async fn save(&self, mut order: Order) -> Result<Order> {
        let mut orders = self.orders.write().await;
        if let Some(current) = orders.get(&order.entity_id)
            && current.version != order.version
        {
            return Err(ReconcileError::PersistenceError(format!(
                "order {} was modified concurrently (stored version {}, saving version {})",
                order.entity_id, current.version, order.version
            )));
        }

        order.version += 1;
        orders.insert(order.entity_id, order.clone());
        Ok(order)
    }

    async fn all(&self) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        Ok(orders.values().cloned().collect())
    }
}

/// Records which emails would have gone out. Each order gets at most one of each kind.
#[derive(Default, Clone)]
pub struct InMemoryNotifier {
    order_emails: Arc<Mutex<Vec<u64>>>,
    invoice_emails: Arc<Mutex<Vec<u64>>>,
    fail_next: Arc<AtomicBool>,
}

impl InMemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next send fail, to exercise delivery errors.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn order_emails(&self) -> Vec<u64> {
        lock(&self.order_emails).clone()
    }

    pub fn invoice_emails(&self) -> Vec<u64> {
        lock(&self.invoice_emails).clone()
    }

    fn record(&self, sent: &Mutex<Vec<u64>>, order: &Order) -> Result<bool> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(ReconcileError::NotificationError(format!(
                "mail transport unavailable for order {}",
                order.increment_id
            )));
        }

        let mut sent = lock(sent);
        if sent.contains(&order.entity_id) {
            return Ok(false);
        }
        sent.push(order.entity_id);
        Ok(true)
    }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
    async fn send_order_confirmation(&self, order: &Order) -> Result<bool> {
        self.record(&self.order_emails, order)
    }

    async fn send_invoice(&self, order: &Order) -> Result<bool> {
        self.record(&self.invoice_emails, order)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub order_id: u64,
    pub message: String,
    pub notify_customer: bool,
}

#[derive(Default, Clone)]
pub struct InMemoryCommentHistory {
    comments: Arc<Mutex<Vec<Comment>>>,
}

impl InMemoryCommentHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn comments(&self) -> Vec<Comment> {
        lock(&self.comments).clone()
    }
}

#[async_trait]
impl CommentHistory for InMemoryCommentHistory {
    async fn append(&self, order: &Order, message: &str, notify_customer: bool) -> Result<()> {
        if message.is_empty() {
            return Ok(());
        }
        lock(&self.comments).push(Comment {
            order_id: order.entity_id,
            message: message.to_string(),
            notify_customer,
        });
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryCheckoutSession {
    last_order: Arc<Mutex<Option<LastOrder>>>,
    remembered: Arc<Mutex<HashSet<u64>>>,
}

impl InMemoryCheckoutSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_order(&self) -> Option<LastOrder> {
        lock(&self.last_order).clone()
    }

    pub fn has_seen(&self, order_id: u64) -> bool {
        lock(&self.remembered).contains(&order_id)
    }
}

impl CheckoutSession for InMemoryCheckoutSession {
    fn remember_last_order(&self, last_order: LastOrder) {
        lock(&self.remembered).insert(last_order.order_id);
        *lock(&self.last_order) = Some(last_order);
    }
}
