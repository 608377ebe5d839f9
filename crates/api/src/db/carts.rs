//! Cart repository.
//!
//! A buyer's cart holds at most one line per product, enforced by the
//! table's primary key at insert time. Lines keep their insertion order;
//! checkout walks them in that order.

use sqlx::{PgPool, Row};

use threadcart_core::{CartLine, ProductId, UserId};

use super::RepositoryError;

/// Repository for cart operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A user's cart lines, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let rows = sqlx::query(
            r"
            SELECT product_id, size, quantity
            FROM cart_lines
            WHERE user_id = $1
            ORDER BY added_at ASC, product_id ASC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        let mut lines = Vec::with_capacity(rows.len());
        for row in rows {
            let quantity: i32 = row.try_get("quantity")?;
            lines.push(CartLine {
                product_id: row.try_get("product_id")?,
                size: row.try_get("size")?,
                quantity: u32::try_from(quantity).map_err(|_| {
                    RepositoryError::DataCorruption(format!("cart quantity {quantity}"))
                })?,
            });
        }
        Ok(lines)
    }

    /// Add a line to the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the product is already in the
    /// cart, `RepositoryError::Database` for other failures.
    pub async fn add_line(&self, user_id: UserId, line: &CartLine) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO cart_lines (user_id, product_id, size, quantity)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(user_id)
        .bind(line.product_id)
        .bind(&line.size)
        .bind(i32::try_from(line.quantity).unwrap_or(i32::MAX))
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("product already in cart".to_owned());
            }
            RepositoryError::Database(e)
        })?;
        Ok(())
    }

    /// Change the size and quantity of an existing line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product isn't in the cart.
    pub async fn update_line(
        &self,
        user_id: UserId,
        product_id: ProductId,
        size: &str,
        quantity: u32,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE cart_lines
            SET size = $3, quantity = $4
            WHERE user_id = $1 AND product_id = $2
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(size)
        .bind(i32::try_from(quantity).unwrap_or(i32::MAX))
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Remove a line from the cart.
    ///
    /// Returns `true` if a line was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove_line(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_lines WHERE user_id = $1 AND product_id = $2")
            .bind(user_id)
            .bind(product_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
