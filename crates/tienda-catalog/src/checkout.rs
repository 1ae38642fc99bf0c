//! Checkout intake: payment event in, paid order persisted, dispatch kicked.
//!
//! The payment provider is the source of truth for amounts; the event is
//! persisted verbatim as a `paid` order. Fulfillment is then attempted
//! inline but best-effort: a supplier outage must never lose a paid order,
//! so dispatch failures are logged and the order stays `paid`.

use thiserror::Error;
use tienda_core::{CheckoutEvent, FulfillmentOrder, NewOrder, OrderLine, OrderStore, ProductStore, StoreError};
use tienda_suppliers::SupplierRegistry;

use crate::fulfill::fulfill_order;

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("checkout session {session_id} has no items")]
    EmptyCart { session_id: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Persists a completed checkout as a paid order and attempts dispatch.
///
/// Returns the order as stored after the dispatch attempt, so the caller
/// sees `fulfillment_pending` when dispatch succeeded and `paid` when it
/// did not.
///
/// # Errors
///
/// Returns [`CheckoutError::EmptyCart`] for an event without items and
/// [`CheckoutError::Store`] when the order cannot be persisted.
pub async fn handle_checkout(
    registry: &SupplierRegistry,
    products: &dyn ProductStore,
    orders: &dyn OrderStore,
    event: CheckoutEvent,
) -> Result<FulfillmentOrder, CheckoutError> {
    if event.items.is_empty() {
        return Err(CheckoutError::EmptyCart {
            session_id: event.session_id,
        });
    }

    let order = orders
        .create_order(NewOrder {
            total_cents: event.amount_total_cents,
            payment_id: event.session_id,
            customer_email: event.customer_email,
            customer_name: event.customer_name,
            shipping_address: event.shipping_address,
            items: event
                .items
                .into_iter()
                .map(|item| OrderLine {
                    product_id: item.product_id,
                    title: item.title,
                    price_cents: item.price_cents,
                    quantity: item.quantity,
                    image: item.image,
                })
                .collect(),
        })
        .await?;
    tracing::info!(order_id = order.id, total_cents = order.total_cents, "order persisted");

    match fulfill_order(registry, products, orders, order.id).await {
        Ok(outcome) if outcome.dispatched => {
            tracing::info!(order_id = order.id, references = ?outcome.references, "order dispatched");
        }
        Ok(_) => {
            tracing::warn!(order_id = order.id, "dispatch incomplete, order left in paid state");
        }
        Err(err) => {
            tracing::warn!(order_id = order.id, error = %err, "dispatch attempt failed");
        }
    }

    let refreshed = orders.find_order(order.id).await?;
    Ok(refreshed.unwrap_or(order))
}
