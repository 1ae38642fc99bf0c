//! Database operations for the `products` table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tienda_core::{CatalogProduct, NewCatalogProduct, ProductStore, StoreError};

use crate::store_error;

/// A row from the `products` table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct ProductRow {
    id: i64,
    title: String,
    description: String,
    image: String,
    images: Vec<String>,
    cost_cents: i64,
    shipping_cents: i64,
    sell_cents: i64,
    supplier: String,
    external_id: String,
    active: bool,
    verified: bool,
    #[allow(dead_code)]
    created_at: DateTime<Utc>,
    #[allow(dead_code)]
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for CatalogProduct {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            image: row.image,
            images: row.images,
            cost_cents: row.cost_cents,
            shipping_cents: row.shipping_cents,
            sell_cents: row.sell_cents,
            supplier: row.supplier,
            external_id: row.external_id,
            active: row.active,
            verified: row.verified,
        }
    }
}

/// [`ProductStore`] over Postgres.
#[derive(Clone)]
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn find_by_external_id(
        &self,
        supplier: &str,
        external_id: &str,
    ) -> Result<Option<CatalogProduct>, StoreError> {
        let row = sqlx::query_as::<_, ProductRow>(
            "SELECT * FROM products WHERE supplier = $1 AND external_id = $2",
        )
        .bind(supplier)
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;
        Ok(row.map(CatalogProduct::from))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<CatalogProduct>, StoreError> {
        let row = sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(row.map(CatalogProduct::from))
    }

    async fn upsert(&self, product: NewCatalogProduct) -> Result<CatalogProduct, StoreError> {
        // active/verified are deliberately absent from the update list: a
        // re-import refreshes content and prices without resurrecting a
        // product the merchant deactivated or dropping its verified badge.
        let row = sqlx::query_as::<_, ProductRow>(
            "INSERT INTO products \
                 (title, description, image, images, cost_cents, shipping_cents, \
                  sell_cents, supplier, external_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (supplier, external_id) DO UPDATE SET \
                 title          = EXCLUDED.title, \
                 description    = EXCLUDED.description, \
                 image          = EXCLUDED.image, \
                 images         = EXCLUDED.images, \
                 cost_cents     = EXCLUDED.cost_cents, \
                 shipping_cents = EXCLUDED.shipping_cents, \
                 sell_cents     = EXCLUDED.sell_cents, \
                 updated_at     = NOW() \
             RETURNING *",
        )
        .bind(&product.title)
        .bind(&product.description)
        .bind(&product.image)
        .bind(&product.images)
        .bind(product.cost_cents)
        .bind(product.shipping_cents)
        .bind(product.sell_cents)
        .bind(&product.supplier)
        .bind(&product.external_id)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error)?;
        Ok(CatalogProduct::from(row))
    }
}
