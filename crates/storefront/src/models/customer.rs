//! Customer domain type.

use chrono::{DateTime, Utc};

use driftwood_core::{CustomerId, Email, StoreId};

/// A registered customer (domain type).
///
/// The password hash never leaves the repository layer; this type carries
/// only what the API may expose.
#[derive(Debug, Clone)]
pub struct Customer {
    /// Unique customer ID.
    pub id: CustomerId,
    /// Store the customer registered with.
    pub store_id: StoreId,
    /// Validated email address, unique per store.
    pub email: Email,
    /// Customer's first name.
    pub first_name: String,
    /// Customer's last name.
    pub last_name: String,
    /// When the customer registered.
    pub created_at: DateTime<Utc>,
}
