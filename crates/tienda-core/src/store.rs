//! Boundary traits for the product and order stores.
//!
//! The relational store is an external collaborator; the core only requires
//! upsert-by-external-id semantics for products and an atomic status
//! transition for orders. `tienda-db` implements these over Postgres; the
//! in-memory implementations here back unit tests and local experiments.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::orders::{FulfillmentOrder, NewOrder, OrderStatus};
use crate::products::{CatalogProduct, NewCatalogProduct};

/// Errors surfaced by a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Catalog product persistence.
///
/// Keys are case-sensitive strings; all price fields are integer cents.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn find_by_external_id(
        &self,
        supplier: &str,
        external_id: &str,
    ) -> Result<Option<CatalogProduct>, StoreError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<CatalogProduct>, StoreError>;

    /// Inserts or updates by `(supplier, external_id)`.
    ///
    /// On conflict the content and price fields are replaced and the stored
    /// `active`/`verified` flags are preserved; a fresh insert starts
    /// active and unverified. Returns the stored row.
    async fn upsert(&self, product: NewCatalogProduct) -> Result<CatalogProduct, StoreError>;
}

/// Order persistence for the fulfillment dispatcher.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a new order in [`OrderStatus::Paid`] state with its lines.
    async fn create_order(&self, order: NewOrder) -> Result<FulfillmentOrder, StoreError>;

    async fn find_order(&self, id: i64) -> Result<Option<FulfillmentOrder>, StoreError>;

    /// Compare-and-set on the order status.
    ///
    /// Transitions `id` from `expected` to `next` (recording
    /// `external_ref` when given) and returns `true`; returns `false`
    /// without writing when the stored status is no longer `expected`.
    /// This is the write-time gate that keeps concurrent dispatch attempts
    /// from double-submitting an order to a supplier.
    async fn update_status_if(
        &self,
        id: i64,
        expected: OrderStatus,
        next: OrderStatus,
        external_ref: Option<&str>,
    ) -> Result<bool, StoreError>;
}

// ---------------------------------------------------------------------------
// In-memory implementations
// ---------------------------------------------------------------------------

/// In-memory [`ProductStore`] with the same upsert semantics as the
/// Postgres implementation.
#[derive(Debug, Default)]
pub struct MemoryProductStore {
    inner: Mutex<ProductsInner>,
}

#[derive(Debug, Default)]
struct ProductsInner {
    next_id: i64,
    rows: Vec<CatalogProduct>,
}

impl MemoryProductStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows; used by idempotence tests.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.rows.is_empty()
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn find_by_external_id(
        &self,
        supplier: &str,
        external_id: &str,
    ) -> Result<Option<CatalogProduct>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .rows
            .iter()
            .find(|p| p.supplier == supplier && p.external_id == external_id)
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<CatalogProduct>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.rows.iter().find(|p| p.id == id).cloned())
    }

    async fn upsert(&self, product: NewCatalogProduct) -> Result<CatalogProduct, StoreError> {
        let mut inner = self.inner.lock().await;
        if let Some(existing) = inner
            .rows
            .iter_mut()
            .find(|p| p.supplier == product.supplier && p.external_id == product.external_id)
        {
            existing.title = product.title;
            existing.description = product.description;
            existing.image = product.image;
            existing.images = product.images;
            existing.cost_cents = product.cost_cents;
            existing.shipping_cents = product.shipping_cents;
            existing.sell_cents = product.sell_cents;
            return Ok(existing.clone());
        }

        inner.next_id += 1;
        let row = CatalogProduct {
            id: inner.next_id,
            title: product.title,
            description: product.description,
            image: product.image,
            images: product.images,
            cost_cents: product.cost_cents,
            shipping_cents: product.shipping_cents,
            sell_cents: product.sell_cents,
            supplier: product.supplier,
            external_id: product.external_id,
            active: true,
            verified: false,
        };
        inner.rows.push(row.clone());
        Ok(row)
    }
}

/// In-memory [`OrderStore`] mirroring the Postgres CAS semantics.
#[derive(Debug, Default)]
pub struct MemoryOrderStore {
    inner: Mutex<OrdersInner>,
}

#[derive(Debug, Default)]
struct OrdersInner {
    next_id: i64,
    rows: HashMap<i64, FulfillmentOrder>,
}

impl MemoryOrderStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn create_order(&self, order: NewOrder) -> Result<FulfillmentOrder, StoreError> {
        let mut inner = self.inner.lock().await;
        inner.next_id += 1;
        let row = FulfillmentOrder {
            id: inner.next_id,
            total_cents: order.total_cents,
            status: OrderStatus::Paid,
            payment_id: order.payment_id,
            external_order_id: None,
            customer_email: order.customer_email,
            customer_name: order.customer_name,
            shipping_address: order.shipping_address,
            items: order.items,
        };
        inner.rows.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_order(&self, id: i64) -> Result<Option<FulfillmentOrder>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.rows.get(&id).cloned())
    }

    async fn update_status_if(
        &self,
        id: i64,
        expected: OrderStatus,
        next: OrderStatus,
        external_ref: Option<&str>,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().await;
        let Some(order) = inner.rows.get_mut(&id) else {
            return Ok(false);
        };
        if order.status != expected {
            return Ok(false);
        }
        order.status = next;
        if let Some(reference) = external_ref {
            order.external_order_id = Some(reference.to_owned());
        }
        Ok(true)
    }
}
