use crate::domain::order::Order;
use crate::error::Result;
use std::io::Read;

/// Reads an order snapshot: a JSON array of orders.
pub fn read_orders<R: Read>(source: R) -> Result<Vec<Order>> {
    Ok(serde_json::from_reader(source)?)
}
