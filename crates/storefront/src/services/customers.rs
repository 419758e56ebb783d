//! Customer registration.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;
use thiserror::Error;

use driftwood_core::{Email, EmailError};

use crate::db::RepositoryError;
use crate::db::customers::CustomerRepository;
use crate::models::customer::Customer;
use crate::models::store::Store;

const MIN_PASSWORD_LENGTH: usize = 8;

/// Errors from customer registration.
#[derive(Debug, Error)]
pub enum CustomerError {
    /// The submitted email address is not valid.
    #[error(transparent)]
    InvalidEmail(#[from] EmailError),

    /// The submitted password does not meet the minimum requirements.
    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters")]
    WeakPassword,

    /// The email is already registered with this store.
    #[error("email already registered")]
    AlreadyRegistered,

    /// Password hashing failed.
    #[error("password hashing failed")]
    Hash,

    /// The storage layer failed.
    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for CustomerError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(_) => Self::AlreadyRegistered,
            other => Self::Repository(other),
        }
    }
}

/// A registration request, as submitted by the API.
#[derive(Debug)]
pub struct RegistrationRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// Registers customers with a store.
pub struct CustomerService<'a> {
    customers: CustomerRepository<'a>,
}

impl<'a> CustomerService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            customers: CustomerRepository::new(pool),
        }
    }

    /// Register a new customer.
    ///
    /// # Errors
    ///
    /// Returns [`CustomerError::InvalidEmail`] or
    /// [`CustomerError::WeakPassword`] for bad input,
    /// [`CustomerError::AlreadyRegistered`] when the email is taken, and
    /// [`CustomerError::Hash`] or [`CustomerError::Repository`] for
    /// infrastructure failures.
    pub async fn register(
        &self,
        store: &Store,
        request: &RegistrationRequest,
    ) -> Result<Customer, CustomerError> {
        let email = Email::parse(&request.email)?;
        validate_password(&request.password)?;
        let password_hash = hash_password(&request.password)?;

        let customer = self
            .customers
            .create(
                store.id,
                &email,
                &password_hash,
                request.first_name.trim(),
                request.last_name.trim(),
            )
            .await?;

        tracing::info!(customer_id = %customer.id, store = %store.code, "registered customer");
        Ok(customer)
    }

    /// Look up a customer by email.
    ///
    /// # Errors
    ///
    /// Returns [`CustomerError::InvalidEmail`] or
    /// [`CustomerError::Repository`].
    pub async fn find_by_email(
        &self,
        store: &Store,
        email: &str,
    ) -> Result<Option<Customer>, CustomerError> {
        let email = Email::parse(email)?;
        Ok(self.customers.get_by_email(store.id, &email).await?)
    }
}

fn validate_password(password: &str) -> Result<(), CustomerError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(CustomerError::WeakPassword);
    }
    Ok(())
}

fn hash_password(password: &str) -> Result<String, CustomerError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| CustomerError::Hash)
}

/// Verify a password against its stored hash.
#[must_use]
pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}
