use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::{
    CartId, CartItemId, CartItemRecord, CartRecord, CartStoreError, ProductId, Result, UserId,
    Version,
    store::{CartStore, SaveOptions, validate_record_for_save},
};

/// PostgreSQL-backed cart store implementation.
///
/// `carts.user_id` carries a unique constraint and every conditional write
/// compares the stored version inside the same transaction that rewrites the
/// items, so a save is all-or-nothing.
#[derive(Clone)]
pub struct PostgresCartStore {
    pool: PgPool,
}

impl PostgresCartStore {
    /// Creates a new PostgreSQL cart store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_item(row: PgRow) -> Result<CartItemRecord> {
        let quantity: i32 = row.try_get("quantity")?;
        let quantity = u32::try_from(quantity).map_err(|_| {
            CartStoreError::InvalidRecord(format!("stored quantity {quantity} is negative"))
        })?;

        Ok(CartItemRecord {
            id: CartItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
            product_id: ProductId::new(row.try_get::<String, _>("product_id")?),
            quantity,
        })
    }

    async fn current_version(
        tx: &mut Transaction<'_, Postgres>,
        user_id: &UserId,
    ) -> Result<Version> {
        let version: Option<i64> =
            sqlx::query_scalar("SELECT version FROM carts WHERE user_id = $1")
                .bind(user_id.as_str())
                .fetch_optional(&mut **tx)
                .await?;
        Ok(version.map(Version::new).unwrap_or(Version::initial()))
    }

    async fn write_header(
        tx: &mut Transaction<'_, Postgres>,
        cart: &CartRecord,
        options: &SaveOptions,
        new_version: Version,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let expected = options.expected_version;
        if options.creates() {
            sqlx::query(
                r#"
                INSERT INTO carts (id, user_id, version, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(cart.id.as_uuid())
            .bind(cart.user_id.as_str())
            .bind(new_version.as_i64())
            .bind(cart.created_at)
            .bind(now)
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.constraint() == Some("unique_cart_user")
                {
                    return CartStoreError::DuplicateCart {
                        user_id: cart.user_id.clone(),
                    };
                }
                CartStoreError::Database(e)
            })?;
        } else {
            let updated = sqlx::query(
                r#"
                UPDATE carts SET version = $1, updated_at = $2
                WHERE id = $3 AND user_id = $4 AND version = $5
                "#,
            )
            .bind(new_version.as_i64())
            .bind(now)
            .bind(cart.id.as_uuid())
            .bind(cart.user_id.as_str())
            .bind(expected.as_i64())
            .execute(&mut **tx)
            .await?;

            if updated.rows_affected() == 0 {
                let actual = Self::current_version(tx, &cart.user_id).await?;
                return Err(CartStoreError::ConcurrencyConflict {
                    cart_id: cart.id,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CartStore for PostgresCartStore {
    async fn find_by_user_id(&self, user_id: &UserId) -> Result<Option<CartRecord>> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT id, user_id, version, created_at, updated_at
            FROM carts
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let cart_id = CartId::from_uuid(row.try_get::<Uuid, _>("id")?);

        let items = sqlx::query(
            r#"
            SELECT id, product_id, quantity
            FROM cart_items
            WHERE cart_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(cart_id.as_uuid())
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Self::row_to_item)
        .collect::<Result<Vec<_>>>()?;

        Ok(Some(CartRecord {
            id: cart_id,
            user_id: UserId::new(row.try_get::<String, _>("user_id")?),
            version: Version::new(row.try_get("version")?),
            items,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        }))
    }

    async fn save(&self, mut cart: CartRecord, options: SaveOptions) -> Result<CartRecord> {
        validate_record_for_save(&cart)?;

        let mut tx = self.pool.begin().await?;

        let new_version = options.expected_version.next();
        let now = Utc::now();

        Self::write_header(&mut tx, &cart, &options, new_version, now).await?;

        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart.id.as_uuid())
            .execute(&mut *tx)
            .await?;

        for (position, item) in cart.items.iter().enumerate() {
            let quantity = i32::try_from(item.quantity).map_err(|_| {
                CartStoreError::InvalidRecord(format!(
                    "quantity {} for product {} is out of range",
                    item.quantity, item.product_id
                ))
            })?;
            let position = i32::try_from(position).map_err(|_| {
                CartStoreError::InvalidRecord("cart has too many items".to_string())
            })?;

            sqlx::query(
                r#"
                INSERT INTO cart_items (id, cart_id, product_id, quantity, position)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(item.id.as_uuid())
            .bind(cart.id.as_uuid())
            .bind(item.product_id.as_str())
            .bind(quantity)
            .bind(position)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::debug!(cart_id = %cart.id, version = %new_version, "cart saved");

        cart.version = new_version;
        cart.updated_at = now;
        Ok(cart)
    }
}
