//! Customer persistence.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use driftwood_core::{CustomerId, Email, StoreId};

use crate::models::customer::Customer;

use super::RepositoryError;

#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: i32,
    store_id: i32,
    email: Email,
    first_name: String,
    last_name: String,
    created_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Self {
            id: CustomerId::new(row.id),
            store_id: StoreId::new(row.store_id),
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            created_at: row.created_at,
        }
    }
}

/// Repository for registered customers.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new customer.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Conflict`] if the email is already
    /// registered with this store, [`RepositoryError::Database`] on any
    /// other failure.
    pub async fn create(
        &self,
        store_id: StoreId,
        email: &Email,
        password_hash: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<Customer, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            r"
            INSERT INTO customer (store_id, email, password_hash, first_name, last_name)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, store_id, email, first_name, last_name, created_at
            ",
        )
        .bind(store_id)
        .bind(email)
        .bind(password_hash)
        .bind(first_name)
        .bind(last_name)
        .fetch_one(self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepositoryError::Conflict(format!("email {email} already registered"))
            }
            _ => RepositoryError::Database(e),
        })?;

        Ok(row.into())
    }

    /// Look up a customer by email, scoped to a store.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if the query fails.
    pub async fn get_by_email(
        &self,
        store_id: StoreId,
        email: &Email,
    ) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            r"
            SELECT id, store_id, email, first_name, last_name, created_at
            FROM customer
            WHERE store_id = $1 AND email = $2
            ",
        )
        .bind(store_id)
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Customer::from))
    }

    /// Look up a customer by ID.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Database`] if the query fails.
    pub async fn get_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            r"
            SELECT id, store_id, email, first_name, last_name, created_at
            FROM customer
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Customer::from))
    }
}
