//! GET /api/v1/products: filtered, paginated product listing.

use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use catalog_core::{normalize_text, Pagination};
use catalog_db::{ProductListFilters, VariantRow};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::super::{map_db_error, parse_public_id, ApiError, ApiResponse, AppState};
use super::ProductItem;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct ListProductsQuery {
    pub category_id: Option<String>,
    pub search: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub brand: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct PaginationInfo {
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub total_pages: i64,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct ProductPage {
    pub products: Vec<ProductItem>,
    pub pagination: PaginationInfo,
}

fn parse_price_filter(
    rid: &str,
    name: &str,
    raw: Option<&str>,
) -> Result<Option<f64>, ApiError> {
    match normalize_text(raw) {
        None => Ok(None),
        Some(value) => value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Some)
            .ok_or_else(|| {
                ApiError::new(rid, "bad_request", format!("{name} must be a number"))
            }),
    }
}

pub(in crate::api) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ListProductsQuery>,
) -> Result<Json<ApiResponse<ProductPage>>, ApiError> {
    let rid = &req_id.0;

    let category_public_id = normalize_text(query.category_id.as_deref())
        .map(|raw| parse_public_id(rid, &raw, "Invalid category ID"))
        .transpose()?;
    let min_price = parse_price_filter(rid, "minPrice", query.min_price.as_deref())?;
    let max_price = parse_price_filter(rid, "maxPrice", query.max_price.as_deref())?;
    let pagination = Pagination::from_query(query.page.as_deref(), query.limit.as_deref());

    let filters = ProductListFilters {
        category_public_id,
        search: normalize_text(query.search.as_deref()),
        min_price,
        max_price,
        brand: normalize_text(query.brand.as_deref()),
        limit: pagination.page_size,
        offset: pagination.offset(),
    };

    let (rows, total) = catalog_db::list_products(&state.pool, &filters)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
    let mut variants_by_product: HashMap<i64, Vec<VariantRow>> = HashMap::new();
    for variant in catalog_db::list_variants_for_products(&state.pool, &ids)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
    {
        variants_by_product
            .entry(variant.product_id)
            .or_default()
            .push(variant);
    }

    let products = rows
        .into_iter()
        .map(|row| {
            let variants = variants_by_product.remove(&row.id).unwrap_or_default();
            ProductItem::from_rows(row, variants)
        })
        .collect();

    Ok(Json(ApiResponse::new(
        req_id.0.clone(),
        ProductPage {
            products,
            pagination: PaginationInfo {
                page: pagination.page,
                page_size: pagination.page_size,
                total,
                total_pages: pagination.total_pages(total),
            },
        },
    )))
}
