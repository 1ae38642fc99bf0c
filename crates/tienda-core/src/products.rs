use serde::{Deserialize, Serialize};

/// A product as returned by a supplier adapter, already mapped out of the
/// supplier's own response shape. Produced fresh on every adapter call and
/// owned by the caller; never persisted as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierProduct {
    /// The supplier's own identifier for the product. Opaque beyond
    /// uniqueness within one supplier.
    pub external_id: String,
    pub title: String,
    /// Supplier price in minor currency units (cents). Never negative.
    pub price_cents: i64,
    /// Estimated shipping to the configured target country, in cents.
    /// `0` when the supplier exposes no estimate.
    pub shipping_cents: i64,
    /// Supplier description; frequently raw HTML, possibly empty.
    pub description: String,
    /// Ordered image URLs. May be empty for sparse search results.
    pub images: Vec<String>,
    /// Logical supplier name, as registered in the registry.
    pub supplier: String,
    /// Canonical product page at the supplier.
    pub source_url: String,
}

impl SupplierProduct {
    /// Returns the primary image URL, if any image was captured.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

/// A product persisted in the local catalog.
///
/// At most one row exists per `(supplier, external_id)` pair; the importer's
/// upsert on that key is the sole deduplication mechanism.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogProduct {
    /// Store-assigned local identity.
    pub id: i64,
    pub title: String,
    pub description: String,
    /// Primary image URL, sanitized at import time.
    pub image: String,
    pub images: Vec<String>,
    /// Supplier cost in cents, frozen at import time.
    pub cost_cents: i64,
    /// Shipping estimate in cents, frozen at import time.
    pub shipping_cents: i64,
    /// Computed retail price in cents (landed cost times margin).
    pub sell_cents: i64,
    pub supplier: String,
    pub external_id: String,
    pub active: bool,
    /// Manually curated flag; never written by the import path.
    pub verified: bool,
}

/// Input to [`crate::store::ProductStore::upsert`]: a catalog product
/// without a local identity. On conflict with an existing
/// `(supplier, external_id)` row the content fields are updated in place
/// and `active`/`verified` keep their stored values.
#[derive(Debug, Clone)]
pub struct NewCatalogProduct {
    pub title: String,
    pub description: String,
    pub image: String,
    pub images: Vec<String>,
    pub cost_cents: i64,
    pub shipping_cents: i64,
    pub sell_cents: i64,
    pub supplier: String,
    pub external_id: String,
}
