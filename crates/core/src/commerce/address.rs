//! Shipping and billing addresses.

use serde::{Deserialize, Serialize};

use crate::types::{AddressId, AddressKind};

/// An address owned by the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    #[serde(rename = "type")]
    pub kind: AddressKind,
    pub recipient: String,
    pub street: String,
    pub number: String,
    #[serde(default)]
    pub apartment: Option<String>,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default)]
    pub phone: Option<String>,
}

fn default_country() -> String {
    "AR".to_string()
}

impl Address {
    /// Single-line summary, e.g. `"Av. Corrientes 1234 4B, CABA (1043)"`.
    #[must_use]
    pub fn one_line(&self) -> String {
        let apartment = self
            .apartment
            .as_deref()
            .map(|a| format!(" {a}"))
            .unwrap_or_default();
        format!(
            "{} {}{}, {} ({})",
            self.street, self.number, apartment, self.city, self.postal_code
        )
    }
}

/// Input for creating an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAddress {
    #[serde(rename = "type")]
    pub kind: AddressKind,
    pub recipient: String,
    pub street: String,
    pub number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apartment: Option<String>,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl NewAddress {
    /// Names of required fields that are blank.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("recipient", &self.recipient),
            ("street", &self.street),
            ("number", &self.number),
            ("city", &self.city),
            ("province", &self.province),
            ("postal_code", &self.postal_code),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

/// Partial update for an address. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apartment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_address_wire_format_uses_type() {
        let json = r#"{
            "id": 4, "type": "BILLING", "recipient": "Ana", "street": "Florida",
            "number": "100", "city": "CABA", "province": "Buenos Aires",
            "postal_code": "1005"
        }"#;
        let address: Address = serde_json::from_str(json).unwrap();
        assert_eq!(address.kind, AddressKind::Billing);
        assert_eq!(address.country, "AR");
        assert_eq!(address.one_line(), "Florida 100, CABA (1005)");
    }

    #[test]
    fn test_missing_fields() {
        let input = NewAddress {
            kind: AddressKind::Shipping,
            recipient: "Ana".to_string(),
            street: " ".to_string(),
            number: "10".to_string(),
            apartment: None,
            city: String::new(),
            province: "Córdoba".to_string(),
            postal_code: "5000".to_string(),
            country: "AR".to_string(),
            phone: None,
        };
        assert_eq!(input.missing_fields(), vec!["street", "city"]);
    }
}
