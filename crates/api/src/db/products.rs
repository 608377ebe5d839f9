//! Product catalog repository, including the stock ledger.
//!
//! Stock reservation is a single conditional `UPDATE` ("decrement by N only
//! if at least N remain") so concurrent checkouts can never oversell a
//! size; a read-then-write here would be a race. The product's derived
//! `availability` flag is recomputed in the same transaction as every
//! stock mutation.

use serde::Deserialize;
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};

use threadcart_core::product::derive_availability;
use threadcart_core::{CategoryId, Product, ProductDescription, ProductId, SizeStock, UserId};

use super::RepositoryError;

/// Fields accepted when a seller lists a new product.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub brand: String,
    pub name: String,
    /// Minor currency units, non-negative.
    pub price: i64,
    /// 0-100.
    pub discount_percent: u8,
    pub sizes: Vec<SizeStock>,
    pub tags: Vec<String>,
    pub description: ProductDescription,
    #[serde(default)]
    pub image_urls: Vec<String>,
    pub category_id: CategoryId,
    /// Denormalized category path names, root first.
    pub categories: Vec<String>,
}

/// Repository for catalog and stock operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

fn product_from_row(row: &PgRow, sizes: Vec<SizeStock>) -> Result<Product, RepositoryError> {
    let discount: i16 = row.try_get("discount_percent")?;
    let discount_percent = u8::try_from(discount)
        .map_err(|_| RepositoryError::DataCorruption(format!("discount {discount} out of range")))?;

    Ok(Product {
        id: row.try_get("id")?,
        seller_id: row.try_get("seller_id")?,
        brand: row.try_get("brand")?,
        name: row.try_get("name")?,
        price: row.try_get("price")?,
        discount_percent,
        sizes,
        tags: row.try_get("tags")?,
        description: ProductDescription {
            about: row.try_get("description_about")?,
            manufactured: row.try_get("description_manufactured")?,
            packed: row.try_get("description_packed")?,
        },
        image_urls: row.try_get("image_urls")?,
        category_id: row.try_get("category_id")?,
        categories: row.try_get("category_path")?,
        availability: row.try_get("availability")?,
    })
}

fn size_from_row(row: &PgRow) -> Result<SizeStock, RepositoryError> {
    let quantity: i32 = row.try_get("quantity")?;
    Ok(SizeStock {
        label: row.try_get("label")?,
        quantity: u32::try_from(quantity)
            .map_err(|_| RepositoryError::DataCorruption(format!("negative stock {quantity}")))?,
    })
}

const PRODUCT_COLUMNS: &str = r"
    id, seller_id, brand, name, price, discount_percent, tags,
    description_about, description_manufactured, description_packed,
    image_urls, category_id, category_path, availability
";

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a product with its size list.
    ///
    /// Availability is derived from the sizes at insert time.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a size label repeats,
    /// `RepositoryError::Database` for other failures.
    pub async fn create(
        &self,
        seller_id: UserId,
        new: &NewProduct,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let availability = derive_availability(&new.sizes);
        let row = sqlx::query(&format!(
            r"
            INSERT INTO products
                (seller_id, brand, name, price, discount_percent,
                 description_about, description_manufactured, description_packed,
                 tags, image_urls, category_id, category_path, availability)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(seller_id)
        .bind(&new.brand)
        .bind(&new.name)
        .bind(new.price)
        .bind(i16::from(new.discount_percent))
        .bind(&new.description.about)
        .bind(&new.description.manufactured)
        .bind(&new.description.packed)
        .bind(&new.tags)
        .bind(&new.image_urls)
        .bind(new.category_id)
        .bind(&new.categories)
        .bind(availability)
        .fetch_one(&mut *tx)
        .await?;

        let product_id: ProductId = row.try_get("id")?;
        for (position, size) in new.sizes.iter().enumerate() {
            sqlx::query(
                r"
                INSERT INTO product_sizes (product_id, label, quantity, position)
                VALUES ($1, $2, $3, $4)
                ",
            )
            .bind(product_id)
            .bind(&size.label)
            .bind(i32::try_from(size.quantity).unwrap_or(i32::MAX))
            .bind(i32::try_from(position).unwrap_or(i32::MAX))
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_unique_violation()
                {
                    return RepositoryError::Conflict(format!(
                        "duplicate size label {:?}",
                        size.label
                    ));
                }
                RepositoryError::Database(e)
            })?;
        }

        tx.commit().await?;
        product_from_row(&row, new.sizes.clone())
    }

    /// Get a product by id, with its ordered size list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let sizes = self.sizes_for(id).await?;
        Ok(Some(product_from_row(&row, sizes)?))
    }

    /// Case-insensitive substring search over name, brand, tags and the
    /// category path.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(&self, query: &str) -> Result<Vec<Product>, RepositoryError> {
        let pattern = format!("%{}%", query.trim());
        let rows = sqlx::query(&format!(
            r"
            SELECT {PRODUCT_COLUMNS} FROM products
            WHERE name ILIKE $1
               OR brand ILIKE $1
               OR EXISTS (SELECT 1 FROM unnest(tags) t WHERE t ILIKE $1)
               OR EXISTS (SELECT 1 FROM unnest(category_path) c WHERE c ILIKE $1)
            ORDER BY id DESC
            "
        ))
        .bind(&pattern)
        .fetch_all(self.pool)
        .await?;
        self.attach_sizes(rows).await
    }

    /// List products in a category, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE category_id = $1 ORDER BY id DESC"
        ))
        .bind(category_id)
        .fetch_all(self.pool)
        .await?;
        self.attach_sizes(rows).await
    }

    /// List a seller's products, optionally filtered by search term.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_seller(
        &self,
        seller_id: UserId,
        search: Option<&str>,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows = match search {
            Some(term) if !term.trim().is_empty() => {
                let pattern = format!("%{}%", term.trim());
                sqlx::query(&format!(
                    r"
                    SELECT {PRODUCT_COLUMNS} FROM products
                    WHERE seller_id = $1
                      AND (name ILIKE $2
                           OR brand ILIKE $2
                           OR EXISTS (SELECT 1 FROM unnest(tags) t WHERE t ILIKE $2)
                           OR EXISTS (SELECT 1 FROM unnest(category_path) c WHERE c ILIKE $2))
                    ORDER BY id DESC
                    "
                ))
                .bind(seller_id)
                .bind(pattern)
                .fetch_all(self.pool)
                .await?
            }
            _ => {
                sqlx::query(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products WHERE seller_id = $1 ORDER BY id DESC"
                ))
                .bind(seller_id)
                .fetch_all(self.pool)
                .await?
            }
        };
        self.attach_sizes(rows).await
    }

    /// Delete a seller's product.
    ///
    /// Returns `true` if a row was deleted; scoped to the seller so one
    /// merchant cannot delete another's listing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(
        &self,
        id: ProductId,
        seller_id: UserId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1 AND seller_id = $2")
            .bind(id)
            .bind(seller_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn sizes_for(&self, product_id: ProductId) -> Result<Vec<SizeStock>, RepositoryError> {
        let rows = sqlx::query(
            r"
            SELECT label, quantity FROM product_sizes
            WHERE product_id = $1
            ORDER BY position ASC
            ",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        rows.iter().map(size_from_row).collect()
    }

    async fn attach_sizes(&self, rows: Vec<PgRow>) -> Result<Vec<Product>, RepositoryError> {
        let mut products = Vec::with_capacity(rows.len());
        for row in &rows {
            let id: ProductId = row.try_get("id")?;
            let sizes = self.sizes_for(id).await?;
            products.push(product_from_row(row, sizes)?);
        }
        Ok(products)
    }
}

/// Reserve stock for one line inside an open checkout transaction.
///
/// A single conditional decrement: takes `quantity` units of `size` only if
/// at least that much remains, then recomputes the product's `availability`
/// over the same connection. Returns `false` when the size label is absent
/// or short; the caller owns the transaction and rolls it back.
pub(crate) async fn reserve_line(
    conn: &mut PgConnection,
    product_id: ProductId,
    size: &str,
    quantity: u32,
) -> Result<bool, sqlx::Error> {
    let quantity = i32::try_from(quantity).unwrap_or(i32::MAX);
    let result = sqlx::query(
        r"
        UPDATE product_sizes
        SET quantity = quantity - $3
        WHERE product_id = $1 AND label = $2 AND quantity >= $3
        ",
    )
    .bind(product_id)
    .bind(size)
    .bind(quantity)
    .execute(&mut *conn)
    .await?;
    if result.rows_affected() == 0 {
        return Ok(false);
    }

    sqlx::query(
        r"
        UPDATE products
        SET availability = EXISTS (
            SELECT 1 FROM product_sizes
            WHERE product_id = $1 AND quantity > 0
        )
        WHERE id = $1
        ",
    )
    .bind(product_id)
    .execute(&mut *conn)
    .await?;
    Ok(true)
}
