//! Database operations for the `users` table.

use catalog_core::{Address, Role};
use chrono::{DateTime, Utc};
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `users` table.
///
/// `addresses` is a JSONB array; each element was validated before insert.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub public_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub phone: String,
    pub addresses: Json<Vec<Address>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    /// Parses the stored role.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidData`] if the column holds an unknown role.
    pub fn role(&self) -> Result<Role, DbError> {
        self.role
            .parse::<Role>()
            .map_err(|e| DbError::InvalidData(e.to_string()))
    }
}

/// Fields required to insert a user. The password must already be hashed.
#[derive(Debug, Clone, Copy)]
pub struct NewUser<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: Role,
    pub phone: &'a str,
    pub addresses: &'a [Address],
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Inserts a user and returns the full row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails, including a unique violation
/// on `email`.
pub async fn create_user(pool: &PgPool, user: &NewUser<'_>) -> Result<UserRow, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "INSERT INTO users \
             (public_id, first_name, last_name, email, password_hash, role, phone, addresses) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING id, public_id, first_name, last_name, email, password_hash, role, phone, \
                   addresses, created_at, updated_at",
    )
    .bind(Uuid::new_v4())
    .bind(user.first_name)
    .bind(user.last_name)
    .bind(user.email)
    .bind(user.password_hash)
    .bind(user.role.as_str())
    .bind(user.phone)
    .bind(Json(user.addresses))
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns the user with the given email, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_user_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRow>, DbError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, public_id, first_name, last_name, email, password_hash, role, phone, \
                addresses, created_at, updated_at \
         FROM users \
         WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
