//! Database operations for the `orders` and `order_items` tables.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tienda_core::{FulfillmentOrder, NewOrder, OrderLine, OrderStatus, OrderStore, StoreError};

use crate::store_error;

#[derive(Debug, Clone, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    total_cents: i64,
    status: String,
    payment_id: String,
    external_order_id: Option<String>,
    customer_email: String,
    customer_name: String,
    shipping_address: String,
    #[allow(dead_code)]
    created_at: DateTime<Utc>,
    #[allow(dead_code)]
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct OrderItemRow {
    product_id: i64,
    title: String,
    price_cents: i64,
    quantity: i32,
    image: String,
}

impl From<OrderItemRow> for OrderLine {
    fn from(row: OrderItemRow) -> Self {
        Self {
            product_id: row.product_id,
            title: row.title,
            price_cents: row.price_cents,
            quantity: row.quantity,
            image: row.image,
        }
    }
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderLine>) -> Result<FulfillmentOrder, StoreError> {
        let status =
            OrderStatus::from_str(&self.status).map_err(|e| StoreError::Backend(e.into()))?;
        Ok(FulfillmentOrder {
            id: self.id,
            total_cents: self.total_cents,
            status,
            payment_id: self.payment_id,
            external_order_id: self.external_order_id,
            customer_email: self.customer_email,
            customer_name: self.customer_name,
            shipping_address: self.shipping_address,
            items,
        })
    }
}

/// [`OrderStore`] over Postgres.
#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_items(&self, order_id: i64) -> Result<Vec<OrderLine>, StoreError> {
        let rows = sqlx::query_as::<_, OrderItemRow>(
            "SELECT product_id, title, price_cents, quantity, image \
             FROM order_items WHERE order_id = $1 ORDER BY id",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;
        Ok(rows.into_iter().map(OrderLine::from).collect())
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn create_order(&self, order: NewOrder) -> Result<FulfillmentOrder, StoreError> {
        // Order header and lines commit together; a half-written order
        // would be dispatched with missing lines.
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        let row = sqlx::query_as::<_, OrderRow>(
            "INSERT INTO orders \
                 (total_cents, status, payment_id, customer_email, customer_name, \
                  shipping_address) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING *",
        )
        .bind(order.total_cents)
        .bind(OrderStatus::Paid.as_str())
        .bind(&order.payment_id)
        .bind(&order.customer_email)
        .bind(&order.customer_name)
        .bind(&order.shipping_address)
        .fetch_one(&mut *tx)
        .await
        .map_err(store_error)?;

        for item in &order.items {
            sqlx::query(
                "INSERT INTO order_items \
                     (order_id, product_id, title, price_cents, quantity, image) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(row.id)
            .bind(item.product_id)
            .bind(&item.title)
            .bind(item.price_cents)
            .bind(item.quantity)
            .bind(&item.image)
            .execute(&mut *tx)
            .await
            .map_err(store_error)?;
        }

        tx.commit().await.map_err(store_error)?;
        row.into_order(order.items)
    }

    async fn find_order(&self, id: i64) -> Result<Option<FulfillmentOrder>, StoreError> {
        let Some(row) = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?
        else {
            return Ok(None);
        };
        let items = self.load_items(row.id).await?;
        row.into_order(items).map(Some)
    }

    async fn update_status_if(
        &self,
        id: i64,
        expected: OrderStatus,
        next: OrderStatus,
        external_ref: Option<&str>,
    ) -> Result<bool, StoreError> {
        // Single-statement compare-and-set; the WHERE clause is the gate
        // that keeps two dispatchers from both claiming the order.
        let result = sqlx::query(
            "UPDATE orders SET \
                 status = $1, \
                 external_order_id = COALESCE($2, external_order_id), \
                 updated_at = NOW() \
             WHERE id = $3 AND status = $4",
        )
        .bind(next.as_str())
        .bind(external_ref)
        .bind(id)
        .bind(expected.as_str())
        .execute(&self.pool)
        .await
        .map_err(store_error)?;
        Ok(result.rows_affected() == 1)
    }
}
