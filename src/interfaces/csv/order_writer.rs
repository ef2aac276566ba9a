use crate::domain::order::Order;
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

/// One summary row per order.
#[derive(Debug, Serialize)]
struct OrderRow<'a> {
    entity_id: u64,
    increment_id: &'a str,
    state: String,
    status: &'a str,
    gateway_transaction_id: &'a str,
    amount_paid: Decimal,
    invoiced: bool,
    email_sent: bool,
}

impl<'a> From<&'a Order> for OrderRow<'a> {
    fn from(order: &'a Order) -> Self {
        Self {
            entity_id: order.entity_id,
            increment_id: &order.increment_id,
            state: order.state.to_string(),
            status: &order.status,
            gateway_transaction_id: order.gateway_transaction_id.as_deref().unwrap_or_default(),
            amount_paid: order.payment.amount_paid.value().normalize(),
            invoiced: order.has_invoices(),
            email_sent: order.email_sent,
        }
    }
}

/// Writes the final order state as CSV, one row per order in entity id order.
pub struct OrderWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> OrderWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_orders(&mut self, mut orders: Vec<Order>) -> Result<()> {
        orders.sort_by_key(|order| order.entity_id);
        for order in &orders {
            self.writer.serialize(OrderRow::from(order))?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
