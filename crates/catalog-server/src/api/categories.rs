//! Category handlers.
//!
//! - `POST /api/v1/categories`      (protected) create a category or subcategory
//! - `GET  /api/v1/categories`      all categories ordered by name
//! - `GET  /api/v1/categories/{id}` one category by public id

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use catalog_core::{normalize_slug, normalize_text};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{
    json_body, map_db_error, map_unique_violation, parse_public_id, ApiError, ApiResponse,
    AppState,
};

const DUPLICATE_SLUG: &str = "Category with this slug already exists";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CreateCategoryRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub parent_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CategoryItem {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parent: Option<String>,
    pub is_subcategory: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<catalog_db::CategoryRow> for CategoryItem {
    fn from(row: catalog_db::CategoryRow) -> Self {
        let is_subcategory = row.is_subcategory();
        Self {
            id: row.public_id.to_string(),
            name: row.name,
            slug: row.slug,
            description: row.description,
            parent: row.parent_public_id.map(|id| id.to_string()),
            is_subcategory,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct CreatedCategory {
    pub message: &'static str,
    pub category: CategoryItem,
}

#[derive(Debug, Serialize)]
pub(super) struct CategoryList {
    pub count: usize,
    pub categories: Vec<CategoryItem>,
}

#[derive(Debug, Serialize)]
pub(super) struct CategoryDetail {
    pub category: CategoryItem,
}

pub(super) async fn create_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<CreateCategoryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<CreatedCategory>>), ApiError> {
    let rid = &req_id.0;
    let body = json_body(rid, body)?;

    let name = normalize_text(body.name.as_deref())
        .ok_or_else(|| ApiError::new(rid, "bad_request", "Category name is required"))?;
    let slug = normalize_text(body.slug.as_deref())
        .map(|s| normalize_slug(&s))
        .ok_or_else(|| ApiError::new(rid, "bad_request", "Category slug is required"))?;

    let slug_taken = catalog_db::category_slug_exists(&state.pool, &slug)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    if slug_taken {
        return Err(ApiError::new(rid, "conflict", DUPLICATE_SLUG));
    }

    let parent_id = match normalize_text(body.parent_id.as_deref()) {
        Some(raw) => {
            let public_id = parse_public_id(rid, &raw, "Invalid parent category ID")?;
            let parent = catalog_db::get_category_by_public_id(&state.pool, public_id)
                .await
                .map_err(|e| map_db_error(rid.clone(), &e))?
                .ok_or_else(|| ApiError::new(rid, "not_found", "Parent category not found"))?;
            Some(parent.id)
        }
        None => None,
    };

    let description = normalize_text(body.description.as_deref());
    let row = catalog_db::create_category(
        &state.pool,
        &catalog_db::NewCategory {
            name: &name,
            slug: &slug,
            description: description.as_deref(),
            parent_id,
        },
    )
    .await
    .map_err(|e| map_unique_violation(rid, &e, DUPLICATE_SLUG))?;

    let message = if parent_id.is_some() {
        "Subcategory created successfully"
    } else {
        "Category created successfully"
    };

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            req_id.0.clone(),
            CreatedCategory {
                message,
                category: row.into(),
            },
        )),
    ))
}

pub(super) async fn list_categories(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<CategoryList>>, ApiError> {
    let rows = catalog_db::list_categories(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let categories: Vec<CategoryItem> = rows.into_iter().map(CategoryItem::from).collect();
    Ok(Json(ApiResponse::new(
        req_id.0,
        CategoryList {
            count: categories.len(),
            categories,
        },
    )))
}

pub(super) async fn get_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<CategoryDetail>>, ApiError> {
    let rid = &req_id.0;
    let public_id = parse_public_id(rid, &id, "Invalid category ID")?;

    let row = catalog_db::get_category_by_public_id(&state.pool, public_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid, "not_found", "Category not found"))?;

    Ok(Json(ApiResponse::new(
        req_id.0.clone(),
        CategoryDetail {
            category: row.into(),
        },
    )))
}
