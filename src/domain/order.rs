use super::method::MethodCode;
use super::money::Money;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Additional-information key for the rendered bank-transfer instructions.
pub const INFO_MAILING_ADDRESS: &str = "mailing_address";
/// Additional-information key recording which test mode the transaction was started in.
pub const INFO_TEST_MODUS: &str = "test_modus";
/// Additional-information key for the customer's salutation, sent as gender.
pub const INFO_PREFIX: &str = "prefix";
/// Additional-information key for the customer's date of birth.
pub const INFO_DOB: &str = "dob";

pub const STATUS_CANCELED: &str = "canceled";

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    #[default]
    New,
    PendingPayment,
    Processing,
    Complete,
    Canceled,
    Holded,
    Closed,
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderState::New => "new",
            OrderState::PendingPayment => "pending_payment",
            OrderState::Processing => "processing",
            OrderState::Complete => "complete",
            OrderState::Canceled => "canceled",
            OrderState::Holded => "holded",
            OrderState::Closed => "closed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum PaymentRecordKind {
    Auth,
    Capture,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct PaymentRecord {
    pub transaction_id: String,
    pub kind: PaymentRecordKind,
}

/// The payment side of an order: bound method, gateway transaction, and what has been paid.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct PaymentLeg {
    pub method: MethodCode,
    #[serde(default)]
    pub last_transaction_id: Option<String>,
    #[serde(default)]
    pub is_transaction_closed: bool,
    #[serde(default)]
    pub amount_paid: Money,
    #[serde(default)]
    pub transactions: Vec<PaymentRecord>,
    #[serde(default)]
    pub additional_information: BTreeMap<String, String>,
}

impl PaymentLeg {
    pub fn new(method: impl Into<MethodCode>) -> Self {
        Self {
            method: method.into(),
            last_transaction_id: None,
            is_transaction_closed: false,
            amount_paid: Money::ZERO,
            transactions: Vec::new(),
            additional_information: BTreeMap::new(),
        }
    }

    pub fn info(&self, key: &str) -> Option<&str> {
        self.additional_information.get(key).map(String::as_str)
    }

    pub fn set_info(&mut self, key: &str, value: impl Into<String>) {
        self.additional_information
            .insert(key.to_string(), value.into());
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Invoice {
    pub transaction_id: String,
    pub amount: Money,
    #[serde(default)]
    pub email_sent: bool,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Default)]
pub struct BillingAddress {
    #[serde(default)]
    pub entity_id: Option<u64>,
    #[serde(default)]
    pub address_type: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    /// Street lines as entered; joined with a space before parsing.
    #[serde(default)]
    pub street: Vec<String>,
    #[serde(default)]
    pub postcode: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country_id: String,
    #[serde(default)]
    pub telephone: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct StatusHistoryEntry {
    pub status: String,
    pub comment: String,
    #[serde(default)]
    pub is_customer_notified: bool,
}

/// A commerce order as owned by the order store.
///
/// The reconciler only ever mutates a freshly loaded copy and hands it back through
/// `OrderStore::save`; `version` lets the store reject a stale copy.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Order {
    pub entity_id: u64,
    pub increment_id: String,
    #[serde(default)]
    pub quote_id: Option<u64>,
    #[serde(default)]
    pub store_id: u32,
    #[serde(default)]
    pub state: OrderState,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub is_virtual: bool,
    #[serde(default)]
    pub email_sent: bool,
    #[serde(default)]
    pub customer_email: String,
    #[serde(default)]
    pub remote_ip: Option<String>,
    #[serde(default)]
    pub x_forwarded_for: Option<String>,
    #[serde(default)]
    pub billing_address: BillingAddress,
    pub payment: PaymentLeg,
    #[serde(default)]
    pub invoices: Vec<Invoice>,
    #[serde(default)]
    pub status_history: Vec<StatusHistoryEntry>,
    #[serde(default)]
    pub gateway_transaction_id: Option<String>,
    #[serde(default)]
    pub version: u64,
}

impl Order {
    pub fn new(entity_id: u64, increment_id: impl Into<String>, payment: PaymentLeg) -> Self {
        Self {
            entity_id,
            increment_id: increment_id.into(),
            quote_id: None,
            store_id: 0,
            state: OrderState::New,
            status: "pending".to_string(),
            is_virtual: false,
            email_sent: false,
            customer_email: String::new(),
            remote_ip: None,
            x_forwarded_for: None,
            billing_address: BillingAddress::default(),
            payment,
            invoices: Vec::new(),
            status_history: Vec::new(),
            gateway_transaction_id: None,
            version: 0,
        }
    }

    pub fn has_invoices(&self) -> bool {
        !self.invoices.is_empty()
    }

    pub fn is_canceled(&self) -> bool {
        self.state == OrderState::Canceled
    }

    /// Sets the status code and records the change in the order history.
    pub fn add_status_to_history(
        &mut self,
        status: impl Into<String>,
        comment: impl Into<String>,
        is_customer_notified: bool,
    ) {
        let status = status.into();
        self.status_history.push(StatusHistoryEntry {
            status: status.clone(),
            comment: comment.into(),
            is_customer_notified,
        });
        self.status = status;
    }

    /// Books a settled amount: opens an invoice and adds to the amount paid.
    pub fn register_capture(&mut self, transaction_id: &str, amount: Money) {
        self.payment.amount_paid += amount;
        self.payment.transactions.push(PaymentRecord {
            transaction_id: transaction_id.to_string(),
            kind: PaymentRecordKind::Capture,
        });
        self.invoices.push(Invoice {
            transaction_id: transaction_id.to_string(),
            amount,
            email_sent: false,
        });
    }

    pub fn register_cancellation(&mut self, comment: impl Into<String>) {
        self.state = OrderState::Canceled;
        self.add_status_to_history(STATUS_CANCELED, comment, false);
    }

    /// The first invoice whose email has not gone out yet.
    pub fn pending_invoice_mut(&mut self) -> Option<&mut Invoice> {
        self.invoices.iter_mut().find(|invoice| !invoice.email_sent)
    }
}
