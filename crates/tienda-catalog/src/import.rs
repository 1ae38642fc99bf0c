//! Catalog import: supplier product in, priced catalog row out.
//!
//! An import takes whatever the merchant pasted (product URL, bare id, or
//! something that only contains an id), resolves it against a supplier
//! adapter, prices the result, and upserts it into the catalog keyed by
//! `(supplier, external_id)`. Re-importing the same product refreshes it
//! in place.

use thiserror::Error;
use tienda_core::pricing::PricingPolicy;
use tienda_core::{CatalogProduct, NewCatalogProduct, ProductStore, StoreError, SupplierProduct};
use tienda_suppliers::{extract_external_id, SupplierAdapter, SupplierError};

#[derive(Debug, Error)]
pub enum ImportError {
    /// No supplier product id could be extracted from the input.
    #[error("no product id found in {input:?}")]
    NotImportable { input: String },
    #[error(transparent)]
    Supplier(#[from] SupplierError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Imports one product from `input` through `adapter` into the catalog.
///
/// # Errors
///
/// Returns [`ImportError::NotImportable`] when `input` carries no
/// extractable product id, [`ImportError::Supplier`] when the detail fetch
/// fails (including [`SupplierError::NotFound`]), and
/// [`ImportError::Store`] when persistence fails.
pub async fn import_product(
    adapter: &dyn SupplierAdapter,
    store: &dyn ProductStore,
    policy: &PricingPolicy,
    input: &str,
) -> Result<CatalogProduct, ImportError> {
    let external_id =
        extract_external_id(input).ok_or_else(|| ImportError::NotImportable {
            input: input.to_owned(),
        })?;

    let product = adapter.product_details(&external_id).await?;
    let row = to_catalog_row(&product, policy);
    let stored = store.upsert(row).await?;
    tracing::info!(
        supplier = stored.supplier,
        external_id = stored.external_id,
        id = stored.id,
        sell_cents = stored.sell_cents,
        "imported product"
    );
    Ok(stored)
}

/// Prices a supplier product and shapes it for the catalog.
#[must_use]
pub fn to_catalog_row(product: &SupplierProduct, policy: &PricingPolicy) -> NewCatalogProduct {
    let image = product
        .primary_image()
        .map(first_image)
        .unwrap_or_default();
    let images: Vec<String> = product.images.iter().map(|i| first_image(i)).collect();
    NewCatalogProduct {
        title: product.title.clone(),
        description: product.description.clone(),
        image,
        images,
        cost_cents: product.price_cents,
        shipping_cents: product.shipping_cents,
        sell_cents: policy.sell_for(product.price_cents, product.shipping_cents),
        supplier: product.supplier.clone(),
        external_id: product.external_id.clone(),
    }
}

/// Unwraps an image field that arrived as a JSON array serialized into a
/// string, a defect observed in older catalog rows. A plain URL passes
/// through untouched.
#[must_use]
pub fn first_image(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('[') {
        if let Ok(urls) = serde_json::from_str::<Vec<String>>(trimmed) {
            return urls.into_iter().next().unwrap_or_default();
        }
    }
    raw.to_owned()
}

#[cfg(test)]
#[path = "import_test.rs"]
mod tests;
