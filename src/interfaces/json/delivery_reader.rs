use crate::domain::transaction::GatewayTransaction;
use crate::error::Result;
use serde::Deserialize;
use std::io::{BufRead, BufReader, Read};

/// One recorded gateway interaction, replayed against the order store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Delivery {
    /// Gateway-to-server status notification.
    Webhook { transaction: GatewayTransaction },
    /// Customer browser returning from the gateway.
    Success { transaction: GatewayTransaction },
    /// The response to creating a transaction for `order_id`.
    Redirect {
        order_id: u64,
        #[serde(default)]
        test_mode: Option<String>,
        #[serde(default)]
        transaction: Option<GatewayTransaction>,
    },
}

/// Reads deliveries from a newline-delimited JSON source.
///
/// Each non-blank line is one delivery. A malformed line yields an error for that line only;
/// the iterator keeps going.
pub struct DeliveryReader<R: Read> {
    reader: BufReader<R>,
}

impl<R: Read> DeliveryReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            reader: BufReader::new(source),
        }
    }

    /// Lazily reads and deserializes deliveries, one per line.
    pub fn deliveries(self) -> impl Iterator<Item = Result<Delivery>> {
        self.reader
            .lines()
            .filter(|line| !matches!(line, Ok(l) if l.trim().is_empty()))
            .map(|line| -> Result<Delivery> { Ok(serde_json::from_str(&line?)?) })
    }
}
