use crate::domain::order::Order;
use crate::domain::ports::{OrderCriteria, OrderStore};
use crate::error::{ReconcileError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for storing orders, keyed by entity id.
pub const CF_ORDERS: &str = "orders";
/// Column Family mapping gateway transaction ids to order entity ids.
pub const CF_ORDER_TRANSACTIONS: &str = "order_transactions";

/// A persistent order store backed by RocksDB.
///
/// Orders are stored as JSON under their big-endian entity id. A secondary column family
/// indexes them by gateway transaction id so webhook lookups avoid a full scan.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`). Saves are
/// serialized through a write lock so the version check and the write are atomic.
#[derive(Clone)]
pub struct RocksDbOrderStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDbOrderStore {
    /// Opens or creates a RocksDB instance at `path`, creating both column families.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_orders = ColumnFamilyDescriptor::new(CF_ORDERS, Options::default());
        let cf_index = ColumnFamilyDescriptor::new(CF_ORDER_TRANSACTIONS, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_orders, cf_index])?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            ReconcileError::InternalError(Box::new(std::io::Error::other(format!(
                "{name} column family not found"
            ))))
        })
    }

    fn get(&self, entity_id: u64) -> Result<Option<Order>> {
        let cf = self.cf(CF_ORDERS)?;
        match self.db.get_cf(&cf, entity_id.to_be_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn scan(&self) -> Result<Vec<Order>> {
        let cf = self.cf(CF_ORDERS)?;
        let mut orders = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_key, value) = item?;
            orders.push(serde_json::from_slice(&value)?);
        }
        Ok(orders)
    }
}

#[async_trait]
impl OrderStore for RocksDbOrderStore {
    async fn load(&self, criteria: OrderCriteria) -> Result<Option<Order>> {
        match criteria {
            OrderCriteria::ById(id) => self.get(id),
            OrderCriteria::ByGatewayTransaction(transaction_id) => {
                let cf = self.cf(CF_ORDER_TRANSACTIONS)?;
                let Some(bytes) = self.db.get_cf(&cf, transaction_id.as_bytes())? else {
                    return Ok(None);
                };
                let id: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    ReconcileError::PersistenceError(format!(
                        "corrupt index entry for transaction {transaction_id}"
                    ))
                })?;
                self.get(u64::from_be_bytes(id))
            }
            OrderCriteria::ByIncrementId(increment_id) => Ok(self
                .scan()?
                .into_iter()
                .find(|order| order.increment_id == increment_id)),
        }
    }

    async fn save(&self, mut order: Order) -> Result<Order> {
        let _guard = self.write_lock.lock().await;

        if let Some(current) = self.get(order.entity_id)?
            && current.version != order.version
        {
            return Err(ReconcileError::PersistenceError(format!(
                "order {} was modified concurrently (stored version {}, saving version {})",
                order.entity_id, current.version, order.version
            )));
        }

        order.version += 1;
        let key = order.entity_id.to_be_bytes();
        let value = serde_json::to_vec(&order)?;

        let cf_orders = self.cf(CF_ORDERS)?;
        self.db.put_cf(&cf_orders, key, value)?;
        if let Some(transaction_id) = &order.gateway_transaction_id {
            let cf_index = self.cf(CF_ORDER_TRANSACTIONS)?;
            self.db.put_cf(&cf_index, transaction_id.as_bytes(), key)?;
        }

        Ok(order)
    }

    async fn all(&self) -> Result<Vec<Order>> {
        self.scan()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::PaymentLeg;
    use tempfile::tempdir;

    fn order(id: u64) -> Order {
        Order::new(id, format!("{id:09}"), PaymentLeg::new("ideal"))
    }

    #[tokio::test]
    async fn test_rocksdb_order_store() {
        let dir = tempdir().unwrap();
        let store = RocksDbOrderStore::open(dir.path()).unwrap();

        let mut new_order = order(7);
        new_order.gateway_transaction_id = Some("gw-7".to_string());
        let saved = store.save(new_order).await.unwrap();
        assert_eq!(saved.version, 1);

        let by_id = store.load(OrderCriteria::ById(7)).await.unwrap();
        assert_eq!(by_id.as_ref(), Some(&saved));

        let by_tx = store
            .load(OrderCriteria::ByGatewayTransaction("gw-7".to_string()))
            .await
            .unwrap();
        assert_eq!(by_tx.as_ref(), Some(&saved));

        let by_increment = store
            .load(OrderCriteria::ByIncrementId("000000007".to_string()))
            .await
            .unwrap();
        assert_eq!(by_increment, Some(saved));
    }

    #[tokio::test]
    async fn test_rocksdb_rejects_stale_save() {
        let dir = tempdir().unwrap();
        let store = RocksDbOrderStore::open(dir.path()).unwrap();
        let loaded = store.save(order(1)).await.unwrap();

        store.save(loaded.clone()).await.unwrap();
        let result = store.save(loaded).await;
        assert!(matches!(result, Err(ReconcileError::PersistenceError(_))));
    }

    #[tokio::test]
    async fn test_rocksdb_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = RocksDbOrderStore::open(dir.path()).unwrap();
            store.save(order(1)).await.unwrap();
            store.save(order(2)).await.unwrap();
        }

        let store = RocksDbOrderStore::open(dir.path()).unwrap();
        let all = store.all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].entity_id, 1);
    }
}
