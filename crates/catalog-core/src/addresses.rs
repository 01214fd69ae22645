//! Shipping address validation for user registration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::normalize_text;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub city: String,
    pub country: String,
    pub postal_code: String,
}

/// Address as submitted; any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInput {
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
}

/// Registration accepts either one address object or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum AddressesInput {
    Many(Vec<AddressInput>),
    One(AddressInput),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressValidationError {
    #[error("At least one address is required")]
    Missing,
    #[error(
        "Address {position} is invalid. All fields (street, city, country, postalCode) are required and must be non-empty strings."
    )]
    Invalid { position: usize },
}

/// Validates the submitted addresses and returns them trimmed, as a list.
///
/// # Errors
///
/// Returns [`AddressValidationError::Missing`] for absent or empty input, or
/// [`AddressValidationError::Invalid`] for the first incomplete address.
pub fn validate_addresses(
    input: Option<&AddressesInput>,
) -> Result<Vec<Address>, AddressValidationError> {
    let list: &[AddressInput] = match input {
        None => &[],
        Some(AddressesInput::Many(list)) => list,
        Some(AddressesInput::One(single)) => std::slice::from_ref(single),
    };

    if list.is_empty() {
        return Err(AddressValidationError::Missing);
    }

    list.iter()
        .enumerate()
        .map(|(index, raw)| {
            let field = |v: &Option<String>| normalize_text(v.as_deref());
            match (
                field(&raw.street),
                field(&raw.city),
                field(&raw.country),
                field(&raw.postal_code),
            ) {
                (Some(street), Some(city), Some(country), Some(postal_code)) => Ok(Address {
                    street,
                    city,
                    country,
                    postal_code,
                }),
                _ => Err(AddressValidationError::Invalid {
                    position: index + 1,
                }),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn parse(value: serde_json::Value) -> AddressesInput {
        serde_json::from_value(value).expect("addresses should deserialize")
    }

    #[test]
    fn missing_input_is_rejected() {
        assert_eq!(validate_addresses(None), Err(AddressValidationError::Missing));
    }

    #[test]
    fn empty_list_is_rejected() {
        let input = parse(json!([]));
        assert_eq!(
            validate_addresses(Some(&input)),
            Err(AddressValidationError::Missing)
        );
    }

    #[test]
    fn single_object_becomes_one_element_list() {
        let input = parse(json!({
            "street": " 1 Main St ",
            "city": "Beirut",
            "country": "Lebanon",
            "postalCode": "1100"
        }));
        let addresses = validate_addresses(Some(&input)).expect("valid address");
        assert_eq!(addresses.len(), 1);
        assert_eq!(addresses[0].street, "1 Main St");
        assert_eq!(addresses[0].postal_code, "1100");
    }

    #[test]
    fn blank_field_reports_one_based_position() {
        let input = parse(json!([
            { "street": "a", "city": "b", "country": "c", "postalCode": "d" },
            { "street": "a", "city": "  ", "country": "c", "postalCode": "d" },
        ]));
        let err = validate_addresses(Some(&input)).unwrap_err();
        assert_eq!(err, AddressValidationError::Invalid { position: 2 });
        assert_eq!(
            err.to_string(),
            "Address 2 is invalid. All fields (street, city, country, postalCode) are required and must be non-empty strings."
        );
    }

    #[test]
    fn missing_field_is_rejected() {
        let input = parse(json!([{ "street": "a", "city": "b", "country": "c" }]));
        assert_eq!(
            validate_addresses(Some(&input)),
            Err(AddressValidationError::Invalid { position: 1 })
        );
    }
}
