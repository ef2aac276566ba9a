//! Payment method codes and the per-method capabilities the reconciler cares about.
//!
//! Capabilities live in one table so adding a method means adding a row, not hunting down
//! string comparisons across handlers.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const IDEAL: &str = "ideal";
pub const BANK_TRANSFER: &str = "banktransfer";
pub const AFTERPAY: &str = "afterpay";
pub const KLARNA: &str = "klarna";
pub const KLARNA_DIRECT: &str = "klarnadirect";
pub const CREDIT_CARD: &str = "creditcard";
pub const BANCONTACT: &str = "bancontact";
pub const AMEX: &str = "amex";
pub const TIKKIE: &str = "tikkie";

/// How the `address` field of the customer payload is assembled for a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFormat {
    /// The full street line as entered.
    Street,
    /// `"<street> <postal code> <city>"`.
    StreetPostalCity,
    /// `"<city> <parsed street>"`.
    CityStreet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodCapabilities {
    /// The customer pays out-of-band against a reference; the order stays open until then.
    pub bank_transfer_like: bool,
    /// The browser goes to our own process page instead of a gateway-hosted page.
    pub redirect_to_process_page: bool,
    pub address_format: AddressFormat,
    /// Shown when the gateway cancels a transaction for this method at checkout.
    pub rejection_message: Option<&'static str>,
}

const DEFAULT_CAPABILITIES: MethodCapabilities = MethodCapabilities {
    bank_transfer_like: false,
    redirect_to_process_page: false,
    address_format: AddressFormat::Street,
    rejection_message: None,
};

static CAPABILITIES: &[(&str, MethodCapabilities)] = &[
    (
        BANK_TRANSFER,
        MethodCapabilities {
            bank_transfer_like: true,
            redirect_to_process_page: true,
            ..DEFAULT_CAPABILITIES
        },
    ),
    (
        AFTERPAY,
        MethodCapabilities {
            redirect_to_process_page: true,
            address_format: AddressFormat::StreetPostalCity,
            rejection_message: Some(
                "Unfortunately, we can not currently accept your purchase with Afterpay. \
                 Please choose another payment option to complete your order. \
                 We apologize for the inconvenience.",
            ),
            ..DEFAULT_CAPABILITIES
        },
    ),
    (
        KLARNA,
        MethodCapabilities {
            address_format: AddressFormat::StreetPostalCity,
            rejection_message: Some(
                "Unfortunately, we can not currently accept your purchase with Klarna. \
                 Please choose another payment option to complete your order. \
                 We apologize for the inconvenience.",
            ),
            ..DEFAULT_CAPABILITIES
        },
    ),
    (
        KLARNA_DIRECT,
        MethodCapabilities {
            address_format: AddressFormat::CityStreet,
            ..DEFAULT_CAPABILITIES
        },
    ),
    (IDEAL, DEFAULT_CAPABILITIES),
    (CREDIT_CARD, DEFAULT_CAPABILITIES),
    (BANCONTACT, DEFAULT_CAPABILITIES),
    (AMEX, DEFAULT_CAPABILITIES),
    (TIKKIE, DEFAULT_CAPABILITIES),
];

/// A payment method code as bound to an order's payment leg.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MethodCode(String);

impl MethodCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_known(&self) -> bool {
        CAPABILITIES.iter().any(|(code, _)| *code == self.0)
    }

    /// Capabilities for this method; unknown codes get the defaults.
    pub fn capabilities(&self) -> MethodCapabilities {
        CAPABILITIES
            .iter()
            .find(|(code, _)| *code == self.0)
            .map(|(_, caps)| *caps)
            .unwrap_or(DEFAULT_CAPABILITIES)
    }
}

impl fmt::Display for MethodCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MethodCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bank_transfer_capabilities() {
        let caps = MethodCode::from(BANK_TRANSFER).capabilities();
        assert!(caps.bank_transfer_like);
        assert!(caps.redirect_to_process_page);
        assert_eq!(caps.address_format, AddressFormat::Street);
    }

    #[test]
    fn test_address_formats() {
        assert_eq!(
            MethodCode::from(AFTERPAY).capabilities().address_format,
            AddressFormat::StreetPostalCity
        );
        assert_eq!(
            MethodCode::from(KLARNA).capabilities().address_format,
            AddressFormat::StreetPostalCity
        );
        assert_eq!(
            MethodCode::from(KLARNA_DIRECT).capabilities().address_format,
            AddressFormat::CityStreet
        );
    }

    #[test]
    fn test_unknown_method_gets_defaults() {
        let method = MethodCode::from("voucher");
        assert!(!method.is_known());
        assert_eq!(method.capabilities(), DEFAULT_CAPABILITIES);
    }
}
