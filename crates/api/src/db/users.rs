//! User and address repository.
//!
//! Users own their address book; addresses referenced by orders are
//! snapshotted into the order row at checkout, so deleting rows here never
//! touches order history.

use sqlx::PgPool;
use sqlx::postgres::PgRow;
use sqlx::Row;

use threadcart_core::{Address, AddressId, UserId};

use super::RepositoryError;
use crate::models::user::{AddressFields, User};

/// Repository for user and address database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

fn address_from_row(row: &PgRow) -> Result<Address, sqlx::Error> {
    Ok(Address {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        phone: row.try_get("phone")?,
        pincode: row.try_get("pincode")?,
        state: row.try_get("state")?,
        city: row.try_get("city")?,
        house: row.try_get("house")?,
        area: row.try_get("area")?,
    })
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Whether an account with this email already exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn email_exists(&self, email: &str) -> Result<bool, RepositoryError> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1) AS found")
            .bind(email)
            .fetch_one(self.pool)
            .await?;
        Ok(row.try_get("found")?)
    }

    /// Whether an account with this phone number already exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn phone_exists(&self, phone: &str) -> Result<bool, RepositoryError> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM users WHERE phone = $1) AS found")
            .bind(phone)
            .fetch_one(self.pool)
            .await?;
        Ok(row.try_get("found")?)
    }

    /// Create a new user with a pre-hashed password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email or phone is already
    /// registered, `RepositoryError::Database` for other failures.
    pub async fn create(
        &self,
        name: &str,
        email: &str,
        phone: &str,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(
            r"
            INSERT INTO users (name, email, phone, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, phone, is_seller, is_admin, created_at
            ",
        )
        .bind(name)
        .bind(email)
        .bind(phone)
        .bind(password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email or phone already registered".to_owned());
            }
            RepositoryError::Database(e)
        })
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r"
            SELECT id, name, email, phone, is_seller, is_admin, created_at
            FROM users
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(user)
    }

    /// Get a user and their password hash by email.
    ///
    /// Returns `None` if no account exists for the email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_with_password_hash(
        &self,
        email: &str,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query(
            r"
            SELECT id, name, email, phone, is_seller, is_admin, created_at, password_hash
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let user = User {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            is_seller: row.try_get("is_seller")?,
            is_admin: row.try_get("is_admin")?,
            created_at: row.try_get("created_at")?,
        };
        let password_hash: String = row.try_get("password_hash")?;
        Ok(Some((user, password_hash)))
    }

    /// Mark a user as a seller.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn set_seller(&self, id: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE users SET is_seller = TRUE WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Grant the admin flag to the account with this email.
    ///
    /// Used by the CLI only.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no account has the email.
    pub async fn grant_admin(&self, email: &str) -> Result<UserId, RepositoryError> {
        let row = sqlx::query("UPDATE users SET is_admin = TRUE WHERE email = $1 RETURNING id")
            .bind(email)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        Ok(row.try_get("id")?)
    }

    // =========================================================================
    // Address book
    // =========================================================================

    /// List a user's saved addresses, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_addresses(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let rows = sqlx::query(
            r"
            SELECT id, name, phone, pincode, state, city, house, area
            FROM addresses
            WHERE user_id = $1
            ORDER BY id ASC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        let mut addresses = Vec::with_capacity(rows.len());
        for row in &rows {
            addresses.push(address_from_row(row)?);
        }
        Ok(addresses)
    }

    /// Fetch one of a user's addresses by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_address(
        &self,
        user_id: UserId,
        address_id: AddressId,
    ) -> Result<Option<Address>, RepositoryError> {
        let row = sqlx::query(
            r"
            SELECT id, name, phone, pincode, state, city, house, area
            FROM addresses
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(address_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        row.as_ref().map(address_from_row).transpose().map_err(Into::into)
    }

    /// Add a new address to a user's address book.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn add_address(
        &self,
        user_id: UserId,
        fields: &AddressFields,
    ) -> Result<Address, RepositoryError> {
        let row = sqlx::query(
            r"
            INSERT INTO addresses (user_id, name, phone, pincode, state, city, house, area)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, name, phone, pincode, state, city, house, area
            ",
        )
        .bind(user_id)
        .bind(&fields.name)
        .bind(&fields.phone)
        .bind(&fields.pincode)
        .bind(&fields.state)
        .bind(&fields.city)
        .bind(&fields.house)
        .bind(&fields.area)
        .fetch_one(self.pool)
        .await?;

        Ok(address_from_row(&row)?)
    }

    /// Replace an address's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address doesn't exist or
    /// belongs to another user.
    pub async fn update_address(
        &self,
        user_id: UserId,
        address_id: AddressId,
        fields: &AddressFields,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE addresses
            SET name = $3, phone = $4, pincode = $5, state = $6,
                city = $7, house = $8, area = $9
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(address_id)
        .bind(user_id)
        .bind(&fields.name)
        .bind(&fields.phone)
        .bind(&fields.pincode)
        .bind(&fields.state)
        .bind(&fields.city)
        .bind(&fields.house)
        .bind(&fields.area)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete an address.
    ///
    /// Returns `true` if a row was deleted. Orders keep their own snapshot
    /// of the address, so this never affects order history.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_address(
        &self,
        user_id: UserId,
        address_id: AddressId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM addresses WHERE id = $1 AND user_id = $2")
            .bind(address_id)
            .bind(user_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
