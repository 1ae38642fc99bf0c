use serde::{Deserialize, Serialize};

/// Lifecycle of a paid order with respect to supplier fulfillment.
///
/// `Paid` is the entry state written by the payment layer. The dispatcher
/// moves an order to `FulfillmentPending` once the supplier has accepted it;
/// `Fulfilled` and `FulfillmentFailed` are terminal states set by later
/// tracking outside this core. A dispatch failure leaves the order in
/// `Paid` so it surfaces for manual retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Paid,
    FulfillmentPending,
    Fulfilled,
    FulfillmentFailed,
}

impl OrderStatus {
    /// The wire/database representation of the status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Paid => "paid",
            OrderStatus::FulfillmentPending => "fulfillment_pending",
            OrderStatus::Fulfilled => "fulfilled",
            OrderStatus::FulfillmentFailed => "fulfillment_failed",
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "paid" => Ok(OrderStatus::Paid),
            "fulfillment_pending" => Ok(OrderStatus::FulfillmentPending),
            "fulfilled" => Ok(OrderStatus::Fulfilled),
            "fulfillment_failed" => Ok(OrderStatus::FulfillmentFailed),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One purchased line of an order. `price_cents` is the price the customer
/// actually paid, already final when the payment event arrives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    /// Local [`crate::CatalogProduct`] id the line was purchased from.
    pub product_id: i64,
    pub title: String,
    pub price_cents: i64,
    pub quantity: i32,
    pub image: String,
}

/// A persisted order, created by the payment layer in `Paid` state and
/// mutated only through the dispatcher's status transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FulfillmentOrder {
    pub id: i64,
    pub total_cents: i64,
    pub status: OrderStatus,
    /// Payment session id from the checkout collaborator.
    pub payment_id: String,
    /// Supplier-side order reference; set only on dispatch success.
    /// References starting with a `*-MOCK-` prefix are synthetic
    /// placeholders from adapters without a real order API.
    pub external_order_id: Option<String>,
    pub customer_email: String,
    pub customer_name: String,
    pub shipping_address: String,
    pub items: Vec<OrderLine>,
}

/// Input to [`crate::store::OrderStore::create_order`].
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub total_cents: i64,
    pub payment_id: String,
    pub customer_email: String,
    pub customer_name: String,
    pub shipping_address: String,
    pub items: Vec<OrderLine>,
}

/// A confirmed-payment event from the checkout collaborator.
///
/// Signature verification happens upstream; this payload is trusted and its
/// `items` are already-priced, final line items.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutEvent {
    pub session_id: String,
    pub amount_total_cents: i64,
    pub items: Vec<CheckoutItem>,
    #[serde(default)]
    pub customer_email: String,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub shipping_address: String,
}

/// One line of a [`CheckoutEvent`].
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutItem {
    pub product_id: i64,
    pub title: String,
    pub price_cents: i64,
    pub quantity: i32,
    #[serde(default)]
    pub image: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            OrderStatus::Paid,
            OrderStatus::FulfillmentPending,
            OrderStatus::Fulfilled,
            OrderStatus::FulfillmentFailed,
        ] {
            assert_eq!(OrderStatus::from_str(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(OrderStatus::from_str("shipped").is_err());
    }

    #[test]
    fn checkout_event_deserializes_with_missing_customer_fields() {
        let event: CheckoutEvent = serde_json::from_str(
            r#"{
                "session_id": "cs_test_123",
                "amount_total_cents": 4998,
                "items": [
                    {"product_id": 7, "title": "Reloj", "price_cents": 2499, "quantity": 2}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(event.items.len(), 1);
        assert_eq!(event.items[0].quantity, 2);
        assert!(event.customer_email.is_empty());
        assert!(event.items[0].image.is_empty());
    }
}
