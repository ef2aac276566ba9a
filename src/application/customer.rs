use crate::domain::address::{AddressParser, AddressParts};
use crate::domain::method::{AddressFormat, MethodCode};
use crate::domain::order::{INFO_DOB, INFO_PREFIX, Order};
use crate::domain::ports::ConfigProvider;
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::warn;

const DOB_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%d.%m.%Y", "%m/%d/%Y"];

/// Request metadata that is not stored on the order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientContext {
    pub user_agent: Option<String>,
    pub locale: String,
}

/// Customer payload submitted to the gateway with a new transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub merchant_customer_id: Option<u64>,
    pub email_address: String,
    pub first_name: String,
    pub last_name: String,
    pub address_type: String,
    pub address: String,
    pub postal_code: String,
    pub housenumber: String,
    pub country: String,
    pub phone_numbers: Vec<String>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub forwarded_ip: Option<String>,
    pub locale: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthdate: Option<String>,
}

/// The address pieces a formatter can draw from.
pub struct AddressFields<'a> {
    /// The street line as entered, house number included.
    pub street: &'a str,
    pub parsed: &'a AddressParts,
    pub postal_code: &'a str,
    pub city: &'a str,
}

pub type AddressFormatter = fn(&AddressFields<'_>) -> String;

fn format_street(fields: &AddressFields<'_>) -> String {
    fields.street.to_string()
}

fn format_street_postal_city(fields: &AddressFields<'_>) -> String {
    [fields.street.trim(), fields.postal_code, fields.city.trim()].join(" ")
}

fn format_city_street(fields: &AddressFields<'_>) -> String {
    [fields.city.trim(), fields.parsed.street.trim()].join(" ")
}

static ADDRESS_FORMATTERS: [(AddressFormat, AddressFormatter); 3] = [
    (AddressFormat::Street, format_street),
    (AddressFormat::StreetPostalCity, format_street_postal_city),
    (AddressFormat::CityStreet, format_city_street),
];

/// The address formatter registered for a method, via its capability row.
pub fn address_formatter_for(method: &MethodCode) -> AddressFormatter {
    let format = method.capabilities().address_format;
    ADDRESS_FORMATTERS
        .iter()
        .find(|(candidate, _)| *candidate == format)
        .map(|(_, formatter)| *formatter)
        .unwrap_or(format_street)
}

/// Inserts a space after the fourth character of a six-character postal code
/// (`1234AB` → `1234 AB`). Anything else is returned as is.
pub fn normalize_postal_code(postal_code: &str) -> String {
    if postal_code.chars().count() != 6 {
        return postal_code.to_string();
    }
    let (head, tail) = postal_code.split_at(postal_code.char_indices().nth(4).map_or(4, |(i, _)| i));
    format!("{head} {tail}")
}

/// Normalizes a date of birth to `YYYY-MM-DD`.
pub fn normalize_birthdate(dob: &str) -> Option<String> {
    let dob = dob.trim();
    DOB_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(dob, format).ok())
        .or_else(|| DateTime::parse_from_rfc3339(dob).ok().map(|dt| dt.date_naive()))
        .map(|date| date.format("%Y-%m-%d").to_string())
}

pub struct CustomerProfileBuilder<'a> {
    config: &'a dyn ConfigProvider,
    context: ClientContext,
}

impl<'a> CustomerProfileBuilder<'a> {
    pub fn new(config: &'a dyn ConfigProvider, context: ClientContext) -> Self {
        Self { config, context }
    }

    pub fn build(&self, order: &Order, method: &MethodCode) -> CustomerProfile {
        let billing = &order.billing_address;
        let street = billing.street.join(" ");
        let parsed = AddressParser::parse(&street);
        let postal_code = normalize_postal_code(&billing.postcode);

        let fields = AddressFields {
            street: &street,
            parsed: &parsed,
            postal_code: &postal_code,
            city: &billing.city,
        };
        let address = address_formatter_for(method)(&fields);

        let birthdate = order.payment.info(INFO_DOB).and_then(|dob| {
            let normalized = normalize_birthdate(dob);
            if normalized.is_none() {
                warn!(order_id = order.entity_id, "unparseable date of birth, omitting");
            }
            normalized
        });

        let profile = CustomerProfile {
            merchant_customer_id: billing.entity_id,
            email_address: billing.email.clone(),
            first_name: billing.firstname.clone(),
            last_name: billing.lastname.clone(),
            address_type: billing.address_type.clone(),
            address,
            postal_code,
            housenumber: parsed.house_number,
            country: billing.country_id.clone(),
            phone_numbers: vec![billing.telephone.clone()],
            user_agent: self.context.user_agent.clone(),
            ip_address: order.remote_ip.clone(),
            forwarded_ip: order.x_forwarded_for.clone(),
            locale: self.context.locale.clone(),
            gender: order.payment.info(INFO_PREFIX).map(str::to_string),
            birthdate,
        };

        self.config
            .log("customer", &serde_json::to_value(&profile).unwrap_or_default());
        profile
    }
}
