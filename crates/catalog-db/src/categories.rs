//! Database operations for the `categories` table.
//!
//! Categories form a tree through the nullable self-reference `parent_id`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from `categories`, joined with its parent's public id.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryRow {
    pub id: i64,
    pub public_id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub parent_id: Option<i64>,
    pub parent_public_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CategoryRow {
    #[must_use]
    pub fn is_subcategory(&self) -> bool {
        self.parent_id.is_some()
    }
}

/// Fields for a new category. `slug` must already be normalized.
#[derive(Debug, Clone, Copy)]
pub struct NewCategory<'a> {
    pub name: &'a str,
    pub slug: &'a str,
    pub description: Option<&'a str>,
    pub parent_id: Option<i64>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Inserts a category and returns it with the parent's public id resolved.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails, including a unique violation
/// on `slug`.
pub async fn create_category(
    pool: &PgPool,
    category: &NewCategory<'_>,
) -> Result<CategoryRow, DbError> {
    let row = sqlx::query_as::<_, CategoryRow>(
        "WITH inserted AS ( \
             INSERT INTO categories (public_id, name, slug, description, parent_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING * \
         ) \
         SELECT c.id, c.public_id, c.name, c.slug, c.description, c.parent_id, \
                p.public_id AS parent_public_id, c.created_at, c.updated_at \
         FROM inserted c \
         LEFT JOIN categories p ON p.id = c.parent_id",
    )
    .bind(Uuid::new_v4())
    .bind(category.name)
    .bind(category.slug)
    .bind(category.description)
    .bind(category.parent_id)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns every category ordered by name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_categories(pool: &PgPool) -> Result<Vec<CategoryRow>, DbError> {
    let rows = sqlx::query_as::<_, CategoryRow>(
        "SELECT c.id, c.public_id, c.name, c.slug, c.description, c.parent_id, \
                p.public_id AS parent_public_id, c.created_at, c.updated_at \
         FROM categories c \
         LEFT JOIN categories p ON p.id = c.parent_id \
         ORDER BY c.name, c.id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a single category by public id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_category_by_public_id(
    pool: &PgPool,
    public_id: Uuid,
) -> Result<Option<CategoryRow>, DbError> {
    let row = sqlx::query_as::<_, CategoryRow>(
        "SELECT c.id, c.public_id, c.name, c.slug, c.description, c.parent_id, \
                p.public_id AS parent_public_id, c.created_at, c.updated_at \
         FROM categories c \
         LEFT JOIN categories p ON p.id = c.parent_id \
         WHERE c.public_id = $1",
    )
    .bind(public_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns `true` when a category already uses `slug`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn category_slug_exists(pool: &PgPool, slug: &str) -> Result<bool, DbError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM categories WHERE slug = $1)",
    )
    .bind(slug)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}
