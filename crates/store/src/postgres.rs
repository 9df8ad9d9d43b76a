use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, ProductId, UserId};
use domain::{Cart, CartItem, Money, Order, Product, RatingSummary, Review};
use sqlx::{
    PgConnection, PgPool, Row,
    postgres::{PgPoolOptions, PgRow},
};
use uuid::Uuid;

use crate::{
    Result, StoreError,
    store::{CartStore, CatalogStore, CheckoutStore, OrderStore, StockReservation},
};

const PRODUCT_COLUMNS: &str =
    "id, name, sku, price_cents, original_price_cents, stock, is_active, rating, review_count";

const UNIQUE_REVIEW_CONSTRAINT: &str = "unique_review_per_user";

/// PostgreSQL-backed store implementation.
///
/// A checkout commit is one transaction: the cart row is claimed with a
/// conditional `DELETE`, each stock decrement is a conditional `UPDATE`, and
/// the order is inserted before `COMMIT`. Any failure rolls all of it back.
/// Orders are stored as a JSONB document next to the columns used for
/// filtering and the optimistic version check.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a pool of up to `max_connections` to `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        let original_price: Option<i64> = row.try_get("original_price_cents")?;

        Ok(Product {
            id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            sku: row.try_get("sku")?,
            price: Money::from_cents(row.try_get("price_cents")?),
            original_price: original_price.map(Money::from_cents),
            stock: to_u32(row.try_get("stock")?, "products.stock")?,
            is_active: row.try_get("is_active")?,
            rating: row.try_get("rating")?,
            review_count: to_u32(row.try_get("review_count")?, "products.review_count")?,
        })
    }

    fn row_to_review(row: PgRow) -> Result<Review> {
        let rating: i16 = row.try_get("rating")?;

        Ok(Review {
            id: row.try_get("id")?,
            product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            rating: u8::try_from(rating)
                .map_err(|_| StoreError::Corrupt(format!("reviews.rating = {rating}")))?,
            comment: row.try_get("comment")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let document: serde_json::Value = row.try_get("document")?;
        Ok(serde_json::from_value(document)?)
    }
}

fn to_u32(value: i32, column: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| StoreError::Corrupt(format!("{column} = {value}")))
}

fn to_i32(value: u32) -> Result<i32> {
    i32::try_from(value).map_err(|_| StoreError::Corrupt(format!("quantity {value} out of range")))
}

fn to_i64(value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| StoreError::Corrupt(format!("version {value} out of range")))
}

async fn insert_order(conn: &mut PgConnection, order: &Order) -> Result<()> {
    let document = serde_json::to_value(order)?;

    sqlx::query(
        r#"
        INSERT INTO orders
            (id, owner_id, order_status, total_cents, version, created_at, updated_at, document)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(order.id().as_uuid())
    .bind(order.owner_id().as_uuid())
    .bind(order.order_status().as_str())
    .bind(order.total_price().cents())
    .bind(to_i64(order.version())?)
    .bind(order.created_at())
    .bind(order.updated_at())
    .bind(document)
    .execute(conn)
    .await?;

    Ok(())
}

/// Applies one conditional decrement inside the caller's transaction.
async fn take_stock(conn: &mut PgConnection, reservation: StockReservation) -> Result<()> {
    let StockReservation {
        product_id,
        quantity,
    } = reservation;

    let remaining: Option<i32> = sqlx::query_scalar(
        "UPDATE products SET stock = stock - $2 WHERE id = $1 AND stock >= $2 RETURNING stock",
    )
    .bind(product_id.as_uuid())
    .bind(to_i32(quantity)?)
    .fetch_optional(&mut *conn)
    .await?;

    if remaining.is_some() {
        return Ok(());
    }

    // Nothing matched: either the product is gone or stock was short.
    let available: Option<i32> = sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
        .bind(product_id.as_uuid())
        .fetch_optional(&mut *conn)
        .await?;

    match available {
        None => Err(StoreError::ProductNotFound(product_id)),
        Some(available) => Err(StoreError::InsufficientStock {
            product_id,
            requested: quantity,
            available: to_u32(available, "products.stock")?,
        }),
    }
}

fn is_duplicate_review(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.constraint())
        .is_some_and(|name| name == UNIQUE_REVIEW_CONSTRAINT)
}

#[async_trait]
impl CatalogStore for PostgresStore {
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn insert_product(&self, product: Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products
                (id, name, sku, price_cents, original_price_cents, stock, is_active, rating, review_count)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.sku)
        .bind(product.price.cents())
        .bind(product.original_price.map(|p| p.cents()))
        .bind(to_i32(product.stock)?)
        .bind(product.is_active)
        .bind(product.rating)
        .bind(to_i32(product.review_count)?)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn set_price(&self, id: ProductId, price: Money) -> Result<Product> {
        let sql =
            format!("UPDATE products SET price_cents = $2 WHERE id = $1 RETURNING {PRODUCT_COLUMNS}");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .bind(price.cents())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::ProductNotFound(id))?;

        Self::row_to_product(row)
    }

    async fn add_review(&self, review: Review) -> Result<Product> {
        let mut tx = self.pool.begin().await?;

        // Serializes concurrent reviews of the same product.
        let locked: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM products WHERE id = $1 FOR UPDATE")
                .bind(review.product_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Err(StoreError::ProductNotFound(review.product_id));
        }

        sqlx::query(
            r#"
            INSERT INTO reviews (id, product_id, user_id, rating, comment, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(review.id)
        .bind(review.product_id.as_uuid())
        .bind(review.user_id.as_uuid())
        .bind(i16::from(review.rating))
        .bind(&review.comment)
        .bind(review.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_duplicate_review(&e) {
                StoreError::DuplicateReview {
                    user_id: review.user_id,
                    product_id: review.product_id,
                }
            } else {
                StoreError::Database(e)
            }
        })?;

        let ratings: Vec<i16> = sqlx::query_scalar("SELECT rating FROM reviews WHERE product_id = $1")
            .bind(review.product_id.as_uuid())
            .fetch_all(&mut *tx)
            .await?;
        let ratings = ratings
            .into_iter()
            .map(|r| u8::try_from(r).map_err(|_| StoreError::Corrupt(format!("reviews.rating = {r}"))))
            .collect::<Result<Vec<u8>>>()?;
        let summary = RatingSummary::from_ratings(ratings);

        let sql = format!(
            "UPDATE products SET rating = $2, review_count = $3 WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(review.product_id.as_uuid())
            .bind(summary.rating)
            .bind(to_i32(summary.review_count)?)
            .fetch_one(&mut *tx)
            .await?;
        let product = Self::row_to_product(row)?;

        tx.commit().await?;
        Ok(product)
    }

    async fn list_reviews(&self, product_id: ProductId) -> Result<Vec<Review>> {
        let rows = sqlx::query(
            r#"
            SELECT id, product_id, user_id, rating, comment, created_at
            FROM reviews
            WHERE product_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(product_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_review).collect()
    }
}

#[async_trait]
impl CartStore for PostgresStore {
    async fn get_cart(&self, owner_id: UserId) -> Result<Option<Cart>> {
        let updated_at: Option<DateTime<Utc>> =
            sqlx::query_scalar("SELECT updated_at FROM carts WHERE owner_id = $1")
                .bind(owner_id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;
        let Some(updated_at) = updated_at else {
            return Ok(None);
        };

        let rows = sqlx::query(
            r#"
            SELECT product_id, quantity, price_cents
            FROM cart_items
            WHERE owner_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(owner_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(|row| {
                Ok(CartItem {
                    product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
                    quantity: to_u32(row.try_get("quantity")?, "cart_items.quantity")?,
                    price: Money::from_cents(row.try_get("price_cents")?),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(Cart::from_parts(owner_id, items, updated_at)))
    }

    async fn save_cart(&self, cart: &Cart) -> Result<()> {
        let owner_id = cart.owner_id().as_uuid();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO carts (owner_id, updated_at)
            VALUES ($1, $2)
            ON CONFLICT (owner_id) DO UPDATE SET updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(owner_id)
        .bind(cart.updated_at())
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM cart_items WHERE owner_id = $1")
            .bind(owner_id)
            .execute(&mut *tx)
            .await?;

        for (position, item) in cart.items().iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO cart_items (owner_id, product_id, position, quantity, price_cents)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(owner_id)
            .bind(item.product_id.as_uuid())
            .bind(position as i32)
            .bind(to_i32(item.quantity)?)
            .bind(item.price.cents())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete_cart(&self, owner_id: UserId) -> Result<()> {
        // cart_items rows go with the cart via ON DELETE CASCADE
        sqlx::query("DELETE FROM carts WHERE owner_id = $1")
            .bind(owner_id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query("SELECT document FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn list_orders_for_user(&self, owner_id: UserId) -> Result<Vec<Order>> {
        let rows = sqlx::query(
            "SELECT document FROM orders WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn list_all_orders(&self) -> Result<Vec<Order>> {
        let rows = sqlx::query("SELECT document FROM orders ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn update_order(&self, order: &Order, expected_version: u64) -> Result<()> {
        let document = serde_json::to_value(order)?;

        let result = sqlx::query(
            r#"
            UPDATE orders
            SET order_status = $3, total_cents = $4, version = $5, updated_at = $6, document = $7
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(to_i64(expected_version)?)
        .bind(order.order_status().as_str())
        .bind(order.total_price().cents())
        .bind(to_i64(order.version())?)
        .bind(order.updated_at())
        .bind(document)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        let actual: Option<i64> = sqlx::query_scalar("SELECT version FROM orders WHERE id = $1")
            .bind(order.id().as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        match actual {
            None => Err(StoreError::OrderNotFound(order.id())),
            Some(actual) => Err(StoreError::ConcurrencyConflict {
                order_id: order.id(),
                expected: expected_version,
                actual: actual.max(0) as u64,
            }),
        }
    }
}

#[async_trait]
impl CheckoutStore for PostgresStore {
    #[tracing::instrument(skip_all, fields(order_id = %order.id(), owner_id = %order.owner_id()))]
    async fn commit_checkout(&self, order: &Order, cart_updated_at: DateTime<Utc>) -> Result<()> {
        let owner_id = order.owner_id();
        let mut tx = self.pool.begin().await?;

        // Claiming the cart row serializes checkouts of the same cart: a
        // second transaction blocks here and then finds nothing to delete.
        let claimed = sqlx::query("DELETE FROM carts WHERE owner_id = $1 AND updated_at = $2")
            .bind(owner_id.as_uuid())
            .bind(cart_updated_at)
            .execute(&mut *tx)
            .await?;

        if claimed.rows_affected() == 0 {
            let exists: Option<Uuid> =
                sqlx::query_scalar("SELECT owner_id FROM carts WHERE owner_id = $1")
                    .bind(owner_id.as_uuid())
                    .fetch_optional(&mut *tx)
                    .await?;
            tx.rollback().await?;
            return Err(match exists {
                Some(_) => {
                    tracing::warn!("cart changed after it was priced");
                    StoreError::CartChanged(owner_id)
                }
                None => StoreError::CartNotFound(owner_id),
            });
        }

        for reservation in StockReservation::for_order(order) {
            if let Err(e) = take_stock(&mut *tx, reservation).await {
                tracing::warn!(
                    product_id = %reservation.product_id,
                    quantity = reservation.quantity,
                    error = %e,
                    "stock reservation failed, rolling back"
                );
                tx.rollback().await?;
                return Err(e);
            }
        }

        insert_order(&mut *tx, order).await?;
        tx.commit().await?;

        tracing::debug!("checkout committed");
        Ok(())
    }
}
