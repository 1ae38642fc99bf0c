//! Fulfillment dispatch: paid orders out to their suppliers.
//!
//! Dispatch is status-gated and best-effort. Only an order still in
//! `paid` state is eligible; lines are grouped by the supplier of their
//! catalog product and one supplier order is placed per group. The order
//! transitions to `fulfillment_pending` only when every group was
//! accepted, through a compare-and-set so a concurrent dispatcher cannot
//! double-submit. Any supplier failure leaves the order in `paid` for a
//! manual retry.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tienda_core::{OrderStatus, OrderStore, ProductStore, StoreError};
use tienda_suppliers::{SupplierAdapter, SupplierOrder, SupplierOrderItem, SupplierRegistry};

#[derive(Debug, Error)]
pub enum FulfillError {
    #[error("order {order_id} not found")]
    OrderNotFound { order_id: i64 },
    #[error("order {order_id} is {status}, not eligible for dispatch")]
    NotEligible { order_id: i64, status: OrderStatus },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What a dispatch attempt achieved.
#[derive(Debug)]
pub struct FulfillmentOutcome {
    pub order_id: i64,
    /// Supplier order references collected before the attempt stopped.
    pub references: Vec<String>,
    /// `true` when every supplier group was accepted and the status
    /// transition was won.
    pub dispatched: bool,
}

/// Dispatches order `order_id` to its suppliers.
///
/// # Errors
///
/// Returns [`FulfillError::OrderNotFound`] for an unknown id,
/// [`FulfillError::NotEligible`] when the order is not in `paid` state,
/// and [`FulfillError::Store`] on persistence failures. Supplier rejections
/// are not errors: they produce an outcome with `dispatched == false`.
pub async fn fulfill_order(
    registry: &SupplierRegistry,
    products: &dyn ProductStore,
    orders: &dyn OrderStore,
    order_id: i64,
) -> Result<FulfillmentOutcome, FulfillError> {
    let order = orders
        .find_order(order_id)
        .await?
        .ok_or(FulfillError::OrderNotFound { order_id })?;
    if order.status != OrderStatus::Paid {
        return Err(FulfillError::NotEligible {
            order_id,
            status: order.status,
        });
    }

    // Group lines by the adapter that owns their catalog product. A line
    // whose product row has disappeared cannot be ordered anywhere and is
    // skipped rather than blocking the whole order.
    let mut groups: BTreeMap<&'static str, (Arc<dyn SupplierAdapter>, Vec<SupplierOrderItem>)> =
        BTreeMap::new();
    for line in &order.items {
        let Some(product) = products.find_by_id(line.product_id).await? else {
            tracing::warn!(
                order_id,
                product_id = line.product_id,
                "catalog product gone, skipping line"
            );
            continue;
        };
        let adapter = registry.resolve(Some(product.supplier.as_str()));
        groups
            .entry(adapter.name())
            .or_insert_with(|| (adapter, Vec::new()))
            .1
            .push(SupplierOrderItem {
                external_product_id: product.external_id,
                title: line.title.clone(),
                price_cents: line.price_cents,
                quantity: line.quantity,
            });
    }
    if groups.is_empty() {
        tracing::warn!(order_id, "no dispatchable lines, leaving order in paid state");
        return Ok(FulfillmentOutcome {
            order_id,
            references: vec![],
            dispatched: false,
        });
    }

    let mut references = Vec::with_capacity(groups.len());
    for (supplier, (adapter, items)) in groups {
        let total_cents = items
            .iter()
            .map(|i| i.price_cents.saturating_mul(i64::from(i.quantity)))
            .sum();
        let supplier_order = SupplierOrder {
            local_order_id: order.id,
            items,
            total_cents,
            shipping_address: order.shipping_address.clone(),
            customer_name: order.customer_name.clone(),
        };
        match adapter.place_order(&supplier_order).await {
            Ok(reference) => references.push(reference),
            Err(err) => {
                tracing::warn!(
                    order_id,
                    supplier,
                    error = %err,
                    "supplier rejected order, leaving it in paid state"
                );
                return Ok(FulfillmentOutcome {
                    order_id,
                    references,
                    dispatched: false,
                });
            }
        }
    }

    let reference = references.join(",");
    let transitioned = orders
        .update_status_if(
            order_id,
            OrderStatus::Paid,
            OrderStatus::FulfillmentPending,
            Some(&reference),
        )
        .await?;
    if !transitioned {
        tracing::warn!(order_id, "lost dispatch race, order already claimed");
    }
    Ok(FulfillmentOutcome {
        order_id,
        references,
        dispatched: transitioned,
    })
}

#[cfg(test)]
#[path = "fulfill_test.rs"]
mod tests;
