//! Street/house-number splitting for gateway customer payloads.
//!
//! This is a heuristic, not an address grammar. It assumes Latin-script addresses where the
//! house number sits near one end of the street line ("Keizersgracht 123", "12 Main Street").
//! Addresses from locales that put numbers mid-string or use non-ASCII digits are not split
//! reliably; callers should treat an empty house number as "unknown", not "absent".

use serde::{Deserialize, Serialize};

/// Characters stripped from a leading house-number token.
const HOUSE_NUMBER_TRIM: &[char] = &[',', ' ', '\t', '\n', '\r', '\0', '\x0B'];

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AddressParts {
    pub street: String,
    pub house_number: String,
}

pub struct AddressParser;

impl AddressParser {
    /// Splits a free-text street line into street and house number.
    ///
    /// Checks run tail-first: the last space followed by a digit wins. Only if that finds
    /// nothing is a leading numeric token considered.
    pub fn parse(street_address: &str) -> AddressParts {
        if let Some(parts) = Self::split_at_trailing_number(street_address) {
            return parts;
        }

        if let Some(parts) = Self::split_at_leading_number(street_address) {
            return parts;
        }

        AddressParts {
            street: street_address.trim().to_string(),
            house_number: String::new(),
        }
    }

    fn split_at_trailing_number(input: &str) -> Option<AddressParts> {
        input
            .rmatch_indices(' ')
            .map(|(offset, _)| offset)
            .find(|&offset| starts_with_digit(&input[offset + 1..]))
            .map(|offset| AddressParts {
                street: input[..offset].trim().to_string(),
                house_number: input[offset + 1..].trim().to_string(),
            })
    }

    fn split_at_leading_number(input: &str) -> Option<AddressParts> {
        if !starts_with_digit(input) {
            return None;
        }

        let (number, rest) = input.split_once(' ')?;
        Some(AddressParts {
            street: rest.trim().to_string(),
            house_number: number.trim_matches(HOUSE_NUMBER_TRIM).to_string(),
        })
    }
}

fn starts_with_digit(s: &str) -> bool {
    s.chars().next().is_some_and(|c| c.is_ascii_digit())
}
