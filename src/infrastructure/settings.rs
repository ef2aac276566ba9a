use crate::domain::method::MethodCode;
use crate::domain::ports::{ConfigProvider, StatusEvent};
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

pub const AUDIT_TARGET: &str = "payrecon::audit";

fn default_base_url() -> String {
    "https://localhost/".to_string()
}

fn default_currency_symbol() -> String {
    "€".to_string()
}

fn default_locale() -> String {
    "nl_NL".to_string()
}

fn default_pending_status() -> String {
    "pending_payment".to_string()
}

fn default_processing_status() -> String {
    "processing".to_string()
}

fn default_true() -> bool {
    true
}

/// Merchant bank details printed on bank-transfer instructions.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct BankAccount {
    pub iban: String,
    pub bic: String,
    pub holder: String,
    pub city: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct MethodSettings {
    #[serde(default = "default_pending_status")]
    pub order_status_pending: String,
    #[serde(default = "default_processing_status")]
    pub order_status_processing: String,
    #[serde(default = "default_true")]
    pub invoice_notify: bool,
    /// Overrides the generated bank-transfer template.
    #[serde(default)]
    pub mailing_address: Option<String>,
    /// Overrides the built-in capability for this method.
    #[serde(default)]
    pub bank_transfer_like: Option<bool>,
}

impl Default for MethodSettings {
    fn default() -> Self {
        Self {
            order_status_pending: default_pending_status(),
            order_status_processing: default_processing_status(),
            invoice_notify: true,
            mailing_address: None,
            bank_transfer_like: None,
        }
    }
}

/// Shop settings, loaded from a JSON file.
///
/// Every field has a default, so an empty object is a valid settings file. Methods missing
/// from `methods` use `MethodSettings::default()`.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub debug: bool,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default)]
    pub bank_account: Option<BankAccount>,
    #[serde(default)]
    pub methods: HashMap<String, MethodSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: false,
            base_url: default_base_url(),
            currency_symbol: default_currency_symbol(),
            locale: default_locale(),
            bank_account: None,
            methods: HashMap::new(),
        }
    }
}

impl Settings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn method(&self, method: &MethodCode) -> MethodSettings {
        self.methods
            .get(method.as_str())
            .cloned()
            .unwrap_or_default()
    }

    fn default_mailing_address(&self) -> String {
        let mut lines = vec![
            "Amount: %AMOUNT%".to_string(),
            "Reference: %REFERENCE%".to_string(),
        ];
        if let Some(account) = &self.bank_account {
            lines.push(format!("IBAN: {}", account.iban));
            lines.push(format!("BIC: {}", account.bic));
            lines.push(format!("Account holder: {}", account.holder));
            lines.push(format!("City: {}", account.city));
        }
        lines.join("\\n")
    }
}

// Settings are not scoped per store yet; `store_id` is accepted for the port's sake.
impl ConfigProvider for Settings {
    fn status_code_for(&self, method: &MethodCode, event: StatusEvent, _store_id: u32) -> String {
        let settings = self.method(method);
        match event {
            StatusEvent::Pending => settings.order_status_pending,
            StatusEvent::Processing => settings.order_status_processing,
        }
    }

    fn mailing_address_template_for(&self, method: &MethodCode) -> String {
        self.method(method)
            .mailing_address
            .unwrap_or_else(|| self.default_mailing_address())
    }

    fn is_bank_transfer_like(&self, method: &MethodCode) -> bool {
        self.method(method)
            .bank_transfer_like
            .unwrap_or_else(|| method.capabilities().bank_transfer_like)
    }

    fn format_amount(&self, amount: Decimal) -> String {
        format!("{}{:.2}", self.currency_symbol, amount)
    }

    fn send_invoice_email(&self, method: &MethodCode, _store_id: u32) -> bool {
        self.method(method).invoice_notify
    }

    fn log(&self, channel: &str, payload: &serde_json::Value) {
        if channel == "error" {
            tracing::error!(target: AUDIT_TARGET, channel, %payload);
        } else if self.debug {
            tracing::debug!(target: AUDIT_TARGET, channel, %payload);
        }
    }
}
