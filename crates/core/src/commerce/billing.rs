//! Billing (tax identity) profiles.

use serde::{Deserialize, Serialize};

use crate::types::{AddressId, BillingProfileId, DocumentType, TaxCondition};

/// A tax identity used for invoicing, bound to one billing address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingProfile {
    pub id: BillingProfileId,
    pub document_type: DocumentType,
    pub document_number: String,
    pub tax_condition: TaxCondition,
    #[serde(default)]
    pub business_name: Option<String>,
    /// The billing address this profile invoices to.
    pub address_id: AddressId,
}

/// Input for creating a billing profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBillingProfile {
    pub document_type: DocumentType,
    pub document_number: String,
    pub tax_condition: TaxCondition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    pub address_id: AddressId,
}

impl NewBillingProfile {
    /// Strip separators from the document number (`20-12345678-9` → `20123456789`).
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.document_number.retain(|c| c.is_ascii_alphanumeric());
        self
    }
}

/// Partial update for a billing profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingProfilePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<DocumentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_condition: Option<TaxCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_id: Option<AddressId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_document_number() {
        let input = NewBillingProfile {
            document_type: DocumentType::Cuit,
            document_number: "20-12345678-9".to_string(),
            tax_condition: TaxCondition::Monotax,
            business_name: None,
            address_id: AddressId::new(1),
        }
        .normalized();
        assert_eq!(input.document_number, "20123456789");
    }
}
