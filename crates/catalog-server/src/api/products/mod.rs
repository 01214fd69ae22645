//! Product handlers.
//!
//! - `GET    /api/v1/products`      filtered, paginated listing
//! - `GET    /api/v1/products/{id}` one product with its variants
//! - `POST   /api/v1/products`      (protected) create
//! - `PUT    /api/v1/products/{id}` (protected) sparse update, same as PATCH
//! - `DELETE /api/v1/products/{id}` (protected) delete

mod detail;
mod list;
mod write;

pub(super) use detail::get_product;
pub(super) use list::list_products;
pub(super) use write::{create_product, delete_product, update_product};

use catalog_db::{ProductRow, VariantRow};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::{map_db_error, parse_public_id, ApiError};

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(in crate::api) struct VariantItem {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    pub stock: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    pub available: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct ProductItem {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub images: Vec<String>,
    pub price: f64,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    pub variants: Vec<VariantItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratings_average: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratings_count: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<VariantRow> for VariantItem {
    fn from(row: VariantRow) -> Self {
        Self {
            id: row.public_id.to_string(),
            size: row.size,
            color: row.color,
            name: row.name,
            sku: row.sku,
            stock: row.stock,
            price: row.price.map(decimal_to_f64),
            available: row.available,
        }
    }
}

impl ProductItem {
    pub(in crate::api) fn from_rows(row: ProductRow, variants: Vec<VariantRow>) -> Self {
        Self {
            id: row.public_id.to_string(),
            name: row.name,
            slug: row.slug,
            description: row.description,
            images: row.images,
            price: decimal_to_f64(row.price),
            category: row.category_public_id.to_string(),
            brand: row.brand,
            variants: variants.into_iter().map(VariantItem::from).collect(),
            ratings_average: row.ratings_average,
            ratings_count: row.ratings_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct ProductEnvelope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub product: ProductItem,
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Stored prices come from `f64` inputs, so converting back is lossless in practice.
fn decimal_to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

fn parse_product_id(rid: &str, raw: &str) -> Result<Uuid, ApiError> {
    parse_public_id(rid, raw, "Invalid product ID")
}

/// Resolve a product public id to its row, returning 404 if not found.
async fn resolve_product(
    pool: &sqlx::PgPool,
    rid: &str,
    raw_id: &str,
) -> Result<ProductRow, ApiError> {
    let public_id = parse_product_id(rid, raw_id)?;
    catalog_db::get_product_by_public_id(pool, public_id)
        .await
        .map_err(|e| map_db_error(rid.to_owned(), &e))?
        .ok_or_else(|| ApiError::new(rid, "not_found", "Product not found"))
}

/// Resolve a category public id to its internal id for product writes.
async fn resolve_category_id(
    pool: &sqlx::PgPool,
    rid: &str,
    raw_id: &str,
) -> Result<i64, ApiError> {
    let public_id = parse_public_id(rid, raw_id, "Invalid category ID")?;
    catalog_db::get_category_by_public_id(pool, public_id)
        .await
        .map_err(|e| map_db_error(rid.to_owned(), &e))?
        .map(|category| category.id)
        .ok_or_else(|| ApiError::new(rid, "not_found", "Category not found"))
}
