use super::method::MethodCode;
use super::money::MinorUnits;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status reported by the gateway for a transaction.
///
/// Anything the reconciler has no handler for, including a missing or empty status,
/// parses to `Unknown`; the raw string stays on the transaction for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayStatus {
    Processing,
    Completed,
    Cancelled,
    Expired,
    Error,
    Unknown,
}

impl GatewayStatus {
    pub fn parse(status: Option<&str>) -> Self {
        match status.unwrap_or_default() {
            "processing" => GatewayStatus::Processing,
            "completed" => GatewayStatus::Completed,
            "cancelled" => GatewayStatus::Cancelled,
            "expired" => GatewayStatus::Expired,
            "error" => GatewayStatus::Error,
            _ => GatewayStatus::Unknown,
        }
    }
}

/// What caused a reconciliation: the gateway calling us, or the customer's browser returning.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum TriggerType {
    Webhook,
    Success,
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerType::Webhook => f.write_str("webhook"),
            TriggerType::Success => f.write_str("success"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Default)]
pub struct PaymentMethodDetails {
    #[serde(default)]
    pub reference: Option<String>,
}

/// One leg of a gateway order, e.g. the iDEAL payment attempt.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Default)]
pub struct TransactionLeg {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub payment_url: Option<String>,
    #[serde(default)]
    pub payment_method_details: Option<PaymentMethodDetails>,
}

/// A gateway order as delivered by a webhook or returned when the transaction was created.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Default)]
pub struct GatewayTransaction {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub amount: Option<MinorUnits>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub transactions: Vec<TransactionLeg>,
}

impl GatewayTransaction {
    pub fn gateway_status(&self) -> GatewayStatus {
        GatewayStatus::parse(self.status.as_deref())
    }

    /// The transaction id, treating an empty string as absent.
    pub fn transaction_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn first_leg(&self) -> Option<&TransactionLeg> {
        self.transactions.first()
    }

    pub fn payment_reference(&self) -> Option<&str> {
        self.first_leg()?
            .payment_method_details
            .as_ref()?
            .reference
            .as_deref()
    }

    pub fn payment_url(&self) -> Option<&str> {
        self.first_leg()?
            .payment_url
            .as_deref()
            .filter(|url| !url.is_empty())
    }

    /// The customer-facing error encoded in the payload, if any.
    ///
    /// An `error` status surfaces the first leg's reason. A `cancelled` status only counts as
    /// an error for methods that reject at checkout (the pay-later methods); other
    /// cancellations are left to the status handlers.
    pub fn gateway_error(&self) -> Option<String> {
        let leg = self.first_leg()?;
        match self.gateway_status() {
            GatewayStatus::Error => leg.reason.clone().filter(|reason| !reason.is_empty()),
            GatewayStatus::Cancelled => leg
                .payment_method
                .as_deref()
                .map(MethodCode::from)
                .and_then(|method| method.capabilities().rejection_message)
                .map(str::to_string),
            _ => None,
        }
    }
}

/// Outcome of a status handler, returned to the HTTP layer as JSON.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct ReconciliationResult {
    pub success: bool,
    pub status: String,
    pub order_id: u64,
    #[serde(rename = "type")]
    pub r#type: TriggerType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cart_msg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

impl ReconciliationResult {
    pub fn new(success: bool, status: impl Into<String>, order_id: u64, r#type: TriggerType) -> Self {
        Self {
            success,
            status: status.into(),
            order_id,
            r#type,
            cart_msg: None,
            error: None,
            redirect: None,
        }
    }

    pub fn with_cart_msg(mut self, message: impl Into<String>) -> Self {
        self.cart_msg = Some(message.into());
        self
    }
}

/// Where to send the customer's browser after starting a transaction.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[serde(rename_all = "lowercase")]
pub enum RedirectOutcome {
    Redirect(String),
    Error(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn transaction(value: serde_json::Value) -> GatewayTransaction {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!(GatewayStatus::parse(Some("completed")), GatewayStatus::Completed);
        assert_eq!(GatewayStatus::parse(Some("new")), GatewayStatus::Unknown);
        assert_eq!(GatewayStatus::parse(Some("")), GatewayStatus::Unknown);
        assert_eq!(GatewayStatus::parse(None), GatewayStatus::Unknown);
    }

    #[test]
    fn test_deserialization_ignores_unknown_fields() {
        let tx = transaction(json!({
            "id": "abc",
            "status": "completed",
            "amount": 10050,
            "currency": "EUR",
            "transactions": [{
                "id": "t1",
                "payment_method": "ideal",
                "payment_url": "https://pay.example/t1",
                "payment_method_details": { "reference": "REF 1", "issuer": "X" }
            }]
        }));
        assert_eq!(tx.amount, Some(MinorUnits::new(10050)));
        assert_eq!(tx.payment_reference(), Some("REF 1"));
        assert_eq!(tx.payment_url(), Some("https://pay.example/t1"));
    }

    #[test]
    fn test_gateway_error_reason() {
        let tx = transaction(json!({
            "status": "error",
            "transactions": [{ "reason": "Card declined" }]
        }));
        assert_eq!(tx.gateway_error().as_deref(), Some("Card declined"));
    }

    #[test]
    fn test_gateway_error_pay_later_rejection() {
        let tx = transaction(json!({
            "status": "cancelled",
            "transactions": [{ "payment_method": "afterpay" }]
        }));
        assert!(tx.gateway_error().unwrap().contains("Afterpay"));

        let tx = transaction(json!({
            "status": "cancelled",
            "transactions": [{ "payment_method": "ideal" }]
        }));
        assert_eq!(tx.gateway_error(), None);
    }

    #[test]
    fn test_gateway_error_without_legs() {
        let tx = transaction(json!({ "status": "error", "reason": "top level" }));
        assert_eq!(tx.gateway_error(), None);
    }

    #[test]
    fn test_result_serialization() {
        let result = ReconciliationResult::new(false, "cancelled", 5, TriggerType::Webhook)
            .with_cart_msg("try again");
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            json!({
                "success": false,
                "status": "cancelled",
                "order_id": 5,
                "type": "webhook",
                "cart_msg": "try again"
            })
        );
    }

    #[test]
    fn test_redirect_outcome_serialization() {
        let outcome = RedirectOutcome::Error("could not fetch redirect url".to_string());
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({ "error": "could not fetch redirect url" })
        );
    }
}
