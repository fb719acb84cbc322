//! Checkout result reconciliation.
//!
//! After paying, the processor sends the shopper back to
//! `/checkout/result/{success|failure|pending}` with its own query
//! parameters. The route status is only a hint: the order is looked up by
//! the number embedded in `external_reference` and its payment status wins.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{instrument, warn};
use vitrina_core::{CheckoutOutcome, Order};

use crate::backend::{BackendClient, Caller};

/// Query parameter carrying our order reference.
pub const EXTERNAL_REFERENCE_PARAM: &str = "external_reference";

static ORDER_REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"ORD-([A-Za-z0-9][A-Za-z0-9_-]*)").expect("Invalid regex")
});

/// Extract the order number from an `ORD-<token>` reference.
///
/// The token is returned verbatim.
#[must_use]
pub fn order_number_from_reference(value: &str) -> Option<&str> {
    ORDER_REFERENCE_RE
        .captures(value)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

/// Find the order number in the result page's query parameters.
///
/// `external_reference` is checked first; when it is absent every other
/// value is scanned.
#[must_use]
pub fn find_order_number(params: &[(String, String)]) -> Option<String> {
    if let Some((_, value)) = params.iter().find(|(k, _)| k == EXTERNAL_REFERENCE_PARAM) {
        return order_number_from_reference(value).map(str::to_string);
    }
    params
        .iter()
        .find_map(|(_, value)| order_number_from_reference(value))
        .map(str::to_string)
}

/// What the result page shows.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutResult {
    /// Outcome to display.
    pub status: CheckoutOutcome,
    /// Outcome the processor redirected to.
    pub route_status: CheckoutOutcome,
    pub order_number: Option<String>,
    pub order: Option<Order>,
    /// The order's payment status overrode the route status.
    pub reconciled: bool,
    /// The order could not be looked up; the route status is shown as-is.
    pub degraded: bool,
}

/// Reconcile the route status with the order's actual payment status.
#[instrument(skip(backend, caller, params))]
pub async fn reconcile(
    backend: &BackendClient,
    caller: &Caller,
    route_status: CheckoutOutcome,
    params: &[(String, String)],
) -> CheckoutResult {
    let mut result = CheckoutResult {
        status: route_status,
        route_status,
        order_number: find_order_number(params),
        order: None,
        reconciled: false,
        degraded: false,
    };

    let Some(number) = result.order_number.as_deref() else {
        result.degraded = true;
        return result;
    };

    match backend.get_order_by_number(caller, number).await {
        Ok(order) => {
            if let Some(outcome) = order.payment_status().map(|s| s.outcome())
                && outcome != route_status
            {
                tracing::info!(
                    route = route_status.as_str(),
                    actual = outcome.as_str(),
                    "Checkout result reconciled with order payment status"
                );
                result.status = outcome;
                result.reconciled = true;
            }
            result.order = Some(order);
        }
        Err(e) => {
            warn!(error = %e, order_number = number, "Order lookup failed on result page");
            result.degraded = true;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_reference_token_taken_verbatim() {
        assert_eq!(order_number_from_reference("ORD-A1b2_C3-x"), Some("A1b2_C3-x"));
        assert_eq!(order_number_from_reference("prefix ORD-991 suffix"), Some("991"));
        assert_eq!(order_number_from_reference("ORD-"), None);
        assert_eq!(order_number_from_reference("ORD--1"), None);
        assert_eq!(order_number_from_reference("order 12"), None);
    }

    #[test]
    fn test_external_reference_preferred() {
        let found = find_order_number(&params(&[
            ("collection_id", "ORD-WRONG"),
            ("external_reference", "ORD-X9Y8"),
        ]));
        assert_eq!(found.as_deref(), Some("X9Y8"));
    }

    #[test]
    fn test_other_params_scanned_without_external_reference() {
        let found = find_order_number(&params(&[
            ("payment_id", "123"),
            ("merchant_order", "ref ORD-55"),
        ]));
        assert_eq!(found.as_deref(), Some("55"));
    }

    #[test]
    fn test_malformed_external_reference_yields_nothing() {
        let found = find_order_number(&params(&[
            ("external_reference", "garbage"),
            ("other", "ORD-77"),
        ]));
        assert_eq!(found, None);
    }
}
