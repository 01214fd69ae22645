//! Database operations for `products` and `product_variants`.
//!
//! A product's variants are always written as a whole set: create inserts
//! them, and an update that carries variants deletes and reinserts them in
//! the same transaction.

use catalog_core::NormalizedVariant;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from `products`, joined with its category's public id.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub public_id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub images: Vec<String>,
    /// Stored as unconstrained `NUMERIC`.
    pub price: Decimal,
    pub category_id: i64,
    pub category_public_id: Uuid,
    pub brand: Option<String>,
    pub ratings_average: Option<f64>,
    pub ratings_count: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row from `product_variants`. `position` preserves submission order.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VariantRow {
    pub id: i64,
    pub public_id: Uuid,
    pub product_id: i64,
    pub position: i32,
    pub size: Option<String>,
    pub color: Option<String>,
    pub name: Option<String>,
    pub sku: Option<String>,
    pub stock: f64,
    pub price: Option<Decimal>,
    pub available: bool,
}

/// Fields for a new product. Text fields must already be trimmed and the slug
/// normalized.
#[derive(Debug, Clone, Copy)]
pub struct NewProduct<'a> {
    pub name: &'a str,
    pub slug: &'a str,
    pub description: Option<&'a str>,
    pub images: &'a [String],
    pub price: f64,
    pub category_id: i64,
    pub brand: Option<&'a str>,
    pub ratings_average: f64,
    pub ratings_count: i64,
}

/// Sparse product update. `None` keeps the stored value.
///
/// `description` and `brand` are nullable: `Some(None)` clears them.
// Option<Option<T>> distinguishes "not supplied" from "explicitly cleared".
#[allow(clippy::option_option)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductUpdate<'a> {
    pub name: Option<&'a str>,
    pub slug: Option<&'a str>,
    pub description: Option<Option<&'a str>>,
    pub images: Option<&'a [String]>,
    pub price: Option<f64>,
    pub category_id: Option<i64>,
    pub brand: Option<Option<&'a str>>,
    pub ratings_average: Option<f64>,
    pub ratings_count: Option<i64>,
    /// When present, replaces the product's whole variant set.
    pub variants: Option<&'a [NormalizedVariant]>,
}

/// Filters for the product listing. Every filter is optional.
#[derive(Debug, Clone, Default)]
pub struct ProductListFilters {
    pub category_public_id: Option<Uuid>,
    /// Case-insensitive substring match on name, description, or slug.
    pub search: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// Case-insensitive substring match on brand.
    pub brand: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

// ---------------------------------------------------------------------------
// SQL fragments
// ---------------------------------------------------------------------------

const PRODUCT_COLUMNS: &str = "p.id, p.public_id, p.name, p.slug, p.description, p.images, \
     p.price, p.category_id, c.public_id AS category_public_id, p.brand, \
     p.ratings_average, p.ratings_count, p.created_at, p.updated_at";

const PRODUCT_FILTERS: &str = "($1::UUID IS NULL OR c.public_id = $1) \
     AND ($2::TEXT IS NULL OR p.name ILIKE $2 OR p.description ILIKE $2 OR p.slug ILIKE $2) \
     AND ($3::NUMERIC IS NULL OR p.price >= $3::NUMERIC) \
     AND ($4::NUMERIC IS NULL OR p.price <= $4::NUMERIC) \
     AND ($5::TEXT IS NULL OR p.brand ILIKE $5)";

/// Wraps `term` as a `%term%` `ILIKE` pattern with wildcards escaped.
pub(crate) fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

// ---------------------------------------------------------------------------
// products operations
// ---------------------------------------------------------------------------

/// Inserts a product and its variants in one transaction.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails, including a unique
/// violation on `slug`.
pub async fn create_product(
    pool: &PgPool,
    product: &NewProduct<'_>,
    variants: &[NormalizedVariant],
) -> Result<(ProductRow, Vec<VariantRow>), DbError> {
    let mut tx = pool.begin().await?;

    let product_id: i64 = sqlx::query_scalar::<_, i64>(
        "INSERT INTO products \
             (public_id, name, slug, description, images, price, category_id, brand, \
              ratings_average, ratings_count) \
         VALUES ($1, $2, $3, $4, $5, $6::NUMERIC, $7, $8, $9, $10) \
         RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(product.name)
    .bind(product.slug)
    .bind(product.description)
    .bind(product.images)
    .bind(product.price)
    .bind(product.category_id)
    .bind(product.brand)
    .bind(product.ratings_average)
    .bind(product.ratings_count)
    .fetch_one(&mut *tx)
    .await?;

    let variant_rows = insert_variants(&mut tx, product_id, variants).await?;
    let row = fetch_product_by_id(&mut tx, product_id).await?;

    tx.commit().await?;
    Ok((row, variant_rows))
}

/// Returns one page of products, newest first, plus the total match count.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either query fails.
pub async fn list_products(
    pool: &PgPool,
    filters: &ProductListFilters,
) -> Result<(Vec<ProductRow>, i64), DbError> {
    let search = filters.search.as_deref().map(contains_pattern);
    let brand = filters.brand.as_deref().map(contains_pattern);

    let page_sql = format!(
        "SELECT {PRODUCT_COLUMNS} \
         FROM products p \
         JOIN categories c ON c.id = p.category_id \
         WHERE {PRODUCT_FILTERS} \
         ORDER BY p.created_at DESC, p.id DESC \
         LIMIT $6 OFFSET $7"
    );
    let rows = sqlx::query_as::<_, ProductRow>(&page_sql)
        .bind(filters.category_public_id)
        .bind(search.as_deref())
        .bind(filters.min_price)
        .bind(filters.max_price)
        .bind(brand.as_deref())
        .bind(filters.limit)
        .bind(filters.offset)
        .fetch_all(pool)
        .await?;

    let count_sql = format!(
        "SELECT COUNT(*) \
         FROM products p \
         JOIN categories c ON c.id = p.category_id \
         WHERE {PRODUCT_FILTERS}"
    );
    let total = sqlx::query_scalar::<_, i64>(&count_sql)
        .bind(filters.category_public_id)
        .bind(search.as_deref())
        .bind(filters.min_price)
        .bind(filters.max_price)
        .bind(brand.as_deref())
        .fetch_one(pool)
        .await?;

    Ok((rows, total))
}

/// Returns a single product by public id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product_by_public_id(
    pool: &PgPool,
    public_id: Uuid,
) -> Result<Option<ProductRow>, DbError> {
    let sql = format!(
        "SELECT {PRODUCT_COLUMNS} \
         FROM products p \
         JOIN categories c ON c.id = p.category_id \
         WHERE p.public_id = $1"
    );
    let row = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(public_id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Returns `true` when a product other than `except_id` already uses `slug`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn product_slug_exists(
    pool: &PgPool,
    slug: &str,
    except_id: Option<i64>,
) -> Result<bool, DbError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS ( \
             SELECT 1 FROM products \
             WHERE slug = $1 AND ($2::BIGINT IS NULL OR id <> $2) \
         )",
    )
    .bind(slug)
    .bind(except_id)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Applies a sparse update and, when supplied, replaces the variant set.
///
/// Both writes share one transaction. Returns the updated product and its
/// current variants.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no product has `product_id`, or
/// [`DbError::Sqlx`] if any statement fails.
pub async fn update_product(
    pool: &PgPool,
    product_id: i64,
    update: &ProductUpdate<'_>,
) -> Result<(ProductRow, Vec<VariantRow>), DbError> {
    let description_supplied = update.description.is_some();
    let description_val = update.description.flatten();
    let brand_supplied = update.brand.is_some();
    let brand_val = update.brand.flatten();

    let mut tx = pool.begin().await?;

    let updated = sqlx::query(
        "UPDATE products \
         SET name            = COALESCE($2, name), \
             slug            = COALESCE($3, slug), \
             description     = CASE WHEN $4::BOOL THEN $5 ELSE description END, \
             images          = COALESCE($6, images), \
             price           = COALESCE($7::NUMERIC, price), \
             category_id     = COALESCE($8, category_id), \
             brand           = CASE WHEN $9::BOOL THEN $10 ELSE brand END, \
             ratings_average = COALESCE($11, ratings_average), \
             ratings_count   = COALESCE($12, ratings_count), \
             updated_at      = NOW() \
         WHERE id = $1",
    )
    .bind(product_id)
    .bind(update.name)
    .bind(update.slug)
    .bind(description_supplied)
    .bind(description_val)
    .bind(update.images)
    .bind(update.price)
    .bind(update.category_id)
    .bind(brand_supplied)
    .bind(brand_val)
    .bind(update.ratings_average)
    .bind(update.ratings_count)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    let variants = if let Some(variants) = update.variants {
        sqlx::query("DELETE FROM product_variants WHERE product_id = $1")
            .bind(product_id)
            .execute(&mut *tx)
            .await?;
        insert_variants(&mut tx, product_id, variants).await?
    } else {
        fetch_variants(&mut tx, product_id).await?
    };
    let row = fetch_product_by_id(&mut tx, product_id).await?;

    tx.commit().await?;
    Ok((row, variants))
}

/// Deletes a product by public id. Its variants are removed by cascade.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no product matched, or [`DbError::Sqlx`]
/// if the delete fails.
pub async fn delete_product(pool: &PgPool, public_id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM products WHERE public_id = $1")
        .bind(public_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// product_variants operations
// ---------------------------------------------------------------------------

/// Returns the variants of every listed product, ordered by product and
/// position.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_variants_for_products(
    pool: &PgPool,
    product_ids: &[i64],
) -> Result<Vec<VariantRow>, DbError> {
    if product_ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = sqlx::query_as::<_, VariantRow>(
        "SELECT id, public_id, product_id, position, size, color, name, sku, stock, price, \
                available \
         FROM product_variants \
         WHERE product_id = ANY($1) \
         ORDER BY product_id, position",
    )
    .bind(product_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

async fn insert_variants(
    tx: &mut Transaction<'_, Postgres>,
    product_id: i64,
    variants: &[NormalizedVariant],
) -> Result<Vec<VariantRow>, DbError> {
    let mut rows = Vec::with_capacity(variants.len());

    for (position, variant) in (0_i32..).zip(variants) {
        let row = sqlx::query_as::<_, VariantRow>(
            "INSERT INTO product_variants \
                 (public_id, product_id, position, size, color, name, sku, stock, price, available) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9::NUMERIC, $10) \
             RETURNING id, public_id, product_id, position, size, color, name, sku, stock, \
                       price, available",
        )
        .bind(Uuid::new_v4())
        .bind(product_id)
        .bind(position)
        .bind(&variant.size)
        .bind(&variant.color)
        .bind(&variant.name)
        .bind(&variant.sku)
        .bind(variant.stock)
        .bind(variant.price)
        .bind(variant.available)
        .fetch_one(&mut **tx)
        .await?;
        rows.push(row);
    }

    Ok(rows)
}

async fn fetch_variants(
    tx: &mut Transaction<'_, Postgres>,
    product_id: i64,
) -> Result<Vec<VariantRow>, DbError> {
    let rows = sqlx::query_as::<_, VariantRow>(
        "SELECT id, public_id, product_id, position, size, color, name, sku, stock, price, \
                available \
         FROM product_variants \
         WHERE product_id = $1 \
         ORDER BY position",
    )
    .bind(product_id)
    .fetch_all(&mut **tx)
    .await?;

    Ok(rows)
}

async fn fetch_product_by_id(
    tx: &mut Transaction<'_, Postgres>,
    product_id: i64,
) -> Result<ProductRow, DbError> {
    let sql = format!(
        "SELECT {PRODUCT_COLUMNS} \
         FROM products p \
         JOIN categories c ON c.id = p.category_id \
         WHERE p.id = $1"
    );
    let row = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(product_id)
        .fetch_one(&mut **tx)
        .await?;

    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_pattern_wraps_term() {
        assert_eq!(contains_pattern("phone"), "%phone%");
    }

    #[test]
    fn contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }

    #[test]
    fn product_update_default_changes_nothing() {
        let update = ProductUpdate::default();
        assert!(update.name.is_none());
        assert!(update.description.is_none());
        assert!(update.variants.is_none());
    }
}
