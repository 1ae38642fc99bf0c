//! The uniform supplier capability set.

use async_trait::async_trait;
use tienda_core::SupplierProduct;

use crate::error::SupplierError;

/// Result of a liveness probe. Never an error: internal failures are folded
/// into `connected: false` plus a human-readable reason.
#[derive(Debug, Clone)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub message: String,
}

impl ConnectionStatus {
    #[must_use]
    pub fn up(message: impl Into<String>) -> Self {
        Self {
            connected: true,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn down(message: impl Into<String>) -> Self {
        Self {
            connected: false,
            message: message.into(),
        }
    }
}

/// One line of an order submitted to a supplier.
#[derive(Debug, Clone)]
pub struct SupplierOrderItem {
    /// The supplier's product identifier, taken from the catalog row the
    /// customer bought.
    pub external_product_id: String,
    pub title: String,
    pub price_cents: i64,
    pub quantity: i32,
}

/// An order as handed to [`SupplierAdapter::place_order`].
#[derive(Debug, Clone)]
pub struct SupplierOrder {
    pub local_order_id: i64,
    pub items: Vec<SupplierOrderItem>,
    pub total_cents: i64,
    pub shipping_address: String,
    pub customer_name: String,
}

/// A supplier-specific implementation of the uniform
/// {search, details, place-order, health-check} capability set.
///
/// Raw upstream response shapes never leak past implementations of this
/// trait: every adapter maps into [`SupplierProduct`] at the boundary.
#[async_trait]
pub trait SupplierAdapter: Send + Sync {
    /// Logical supplier name as known to the registry.
    fn name(&self) -> &'static str;

    /// Searches the supplier's catalog.
    ///
    /// Never fails for recoverable conditions: transport errors, rate
    /// limits, and empty result pages all degrade to an empty vec with a
    /// log line, so one failing supplier cannot torpedo an aggregate
    /// search. Result ordering is whatever the upstream returns; the count
    /// is capped per adapter to bound cost.
    async fn search(&self, query: &str) -> Vec<SupplierProduct>;

    /// Fetches full details for one product.
    ///
    /// # Errors
    ///
    /// - [`SupplierError::NotFound`] when the supplier does not know the id.
    /// - [`SupplierError::RateLimited`] when quota blocks the call.
    /// - Transient transport failures are retried a bounded number of
    ///   times (fixed delay) inside the adapter before surfacing as
    ///   [`SupplierError::Http`] / [`SupplierError::UnexpectedStatus`].
    async fn product_details(&self, external_id: &str)
        -> Result<SupplierProduct, SupplierError>;

    /// Submits an order to the supplier and returns its external reference.
    ///
    /// Adapters without a real order-placement API return a synthetic
    /// reference carrying a `-MOCK-` marker (e.g. `API-MOCK-<millis>`)
    /// instead of failing; callers distinguish real references by that
    /// prefix convention.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`Self::product_details`].
    async fn place_order(&self, order: &SupplierOrder) -> Result<String, SupplierError>;

    /// Lightweight liveness probe. Never errors.
    async fn check_status(&self) -> ConnectionStatus;
}

/// Returns `true` when an external order reference is a synthetic
/// placeholder rather than a real supplier reference.
#[must_use]
pub fn is_mock_reference(reference: &str) -> bool {
    reference.contains("-MOCK-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_references_are_recognizable() {
        assert!(is_mock_reference("CJ-ORDER-MOCK-1714000000000"));
        assert!(is_mock_reference("API-MOCK-1714000000000"));
        assert!(!is_mock_reference("CJ20240425123456"));
    }
}
