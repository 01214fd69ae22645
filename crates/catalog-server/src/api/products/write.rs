//! Product write handlers: create, update, delete.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use catalog_core::{
    normalize_slug, normalize_text, validate_and_normalize_variants, validate_product_numbers,
    NormalizedVariant, VariantInput,
};
use serde::{Deserialize, Deserializer, Serialize};

use crate::middleware::{AuthUser, RequestId};

use super::super::{
    json_body, map_db_error, map_unique_violation, ApiError, ApiResponse, AppState,
};
use super::{
    parse_product_id, resolve_category_id, resolve_product, ProductEnvelope, ProductItem,
};

const DUPLICATE_SLUG: &str = "Product with this slug already exists";

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct CreateProductRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub images: Option<Vec<String>>,
    pub price: Option<f64>,
    pub category_id: Option<String>,
    pub brand: Option<String>,
    pub ratings_average: Option<f64>,
    pub ratings_count: Option<i64>,
    pub variants: Option<Vec<VariantInput>>,
}

// None: not supplied. Some(None): cleared. Some(Some(v)): set.
#[allow(clippy::option_option)]
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct UpdateProductRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    pub images: Option<Vec<String>>,
    pub price: Option<f64>,
    pub category_id: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub brand: Option<Option<String>>,
    pub ratings_average: Option<f64>,
    pub ratings_count: Option<i64>,
    pub variants: Option<Vec<VariantInput>>,
}

/// Marks a field as supplied even when its value is `null`.
#[allow(clippy::option_option)]
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct DeletedProduct {
    pub message: &'static str,
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

fn validate_variants_or_400(
    rid: &str,
    variants: Option<&[VariantInput]>,
) -> Result<Vec<NormalizedVariant>, ApiError> {
    validate_and_normalize_variants(variants)
        .map_err(|e| ApiError::new(rid, "validation_error", e.reason()))
}

fn validate_numbers_or_400(
    rid: &str,
    price: Option<f64>,
    ratings_average: Option<f64>,
    ratings_count: Option<i64>,
) -> Result<(), ApiError> {
    validate_product_numbers(price, ratings_average, ratings_count)
        .map_err(|e| ApiError::new(rid, "validation_error", e.to_string()))
}

fn trimmed_images(images: Option<Vec<String>>) -> Option<Vec<String>> {
    images.map(|list| {
        list.iter()
            .filter_map(|url| normalize_text(Some(url.as_str())))
            .collect()
    })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/products
pub(in crate::api) async fn create_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<AuthUser>,
    body: Result<Json<CreateProductRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<ProductEnvelope>>), ApiError> {
    let rid = &req_id.0;
    let body = json_body(rid, body)?;

    let (Some(name), Some(slug), Some(price), Some(category_id)) = (
        normalize_text(body.name.as_deref()),
        normalize_text(body.slug.as_deref()).map(|s| normalize_slug(&s)),
        body.price,
        normalize_text(body.category_id.as_deref()),
    ) else {
        return Err(ApiError::new(
            rid,
            "bad_request",
            "Name, slug, price, and categoryId are required",
        ));
    };

    let variants = validate_variants_or_400(rid, body.variants.as_deref())?;
    validate_numbers_or_400(rid, Some(price), body.ratings_average, body.ratings_count)?;

    let category_id = resolve_category_id(&state.pool, rid, &category_id).await?;

    let slug_taken = catalog_db::product_slug_exists(&state.pool, &slug, None)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    if slug_taken {
        return Err(ApiError::new(rid, "conflict", DUPLICATE_SLUG));
    }

    let description = normalize_text(body.description.as_deref());
    let brand = normalize_text(body.brand.as_deref());
    let images = trimmed_images(body.images).unwrap_or_default();

    let (row, variant_rows) = catalog_db::create_product(
        &state.pool,
        &catalog_db::NewProduct {
            name: &name,
            slug: &slug,
            description: description.as_deref(),
            images: &images,
            price,
            category_id,
            brand: brand.as_deref(),
            ratings_average: body.ratings_average.unwrap_or(0.0),
            ratings_count: body.ratings_count.unwrap_or(0),
        },
        &variants,
    )
    .await
    .map_err(|e| map_unique_violation(rid, &e, DUPLICATE_SLUG))?;

    tracing::info!(
        product_id = %row.public_id,
        user_id = %user.user_id,
        variants = variant_rows.len(),
        "product created"
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            req_id.0.clone(),
            ProductEnvelope {
                message: Some("Product created successfully"),
                product: ProductItem::from_rows(row, variant_rows),
            },
        )),
    ))
}

/// PUT|PATCH /api/v1/products/{id}: sparse update.
pub(in crate::api) async fn update_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    body: Result<Json<UpdateProductRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<ProductEnvelope>>, ApiError> {
    let rid = &req_id.0;
    let body = json_body(rid, body)?;
    let product = resolve_product(&state.pool, rid, &id).await?;

    let variants = match body.variants.as_deref() {
        Some(list) => Some(validate_variants_or_400(rid, Some(list))?),
        None => None,
    };
    validate_numbers_or_400(rid, body.price, body.ratings_average, body.ratings_count)?;

    let category_id = match normalize_text(body.category_id.as_deref()) {
        Some(raw) => Some(resolve_category_id(&state.pool, rid, &raw).await?),
        None => None,
    };

    let slug = normalize_text(body.slug.as_deref()).map(|s| normalize_slug(&s));
    if let Some(ref slug) = slug {
        if *slug != product.slug {
            let slug_taken = catalog_db::product_slug_exists(&state.pool, slug, Some(product.id))
                .await
                .map_err(|e| map_db_error(rid.clone(), &e))?;
            if slug_taken {
                return Err(ApiError::new(rid, "conflict", DUPLICATE_SLUG));
            }
        }
    }

    let name = normalize_text(body.name.as_deref());
    let description = body
        .description
        .as_ref()
        .map(|value| normalize_text(value.as_deref()));
    let brand = body
        .brand
        .as_ref()
        .map(|value| normalize_text(value.as_deref()));
    let images = trimmed_images(body.images);

    let (row, variant_rows) = catalog_db::update_product(
        &state.pool,
        product.id,
        &catalog_db::ProductUpdate {
            name: name.as_deref(),
            slug: slug.as_deref(),
            description: description.as_ref().map(Option::as_deref),
            images: images.as_deref(),
            price: body.price,
            category_id,
            brand: brand.as_ref().map(Option::as_deref),
            ratings_average: body.ratings_average,
            ratings_count: body.ratings_count,
            variants: variants.as_deref(),
        },
    )
    .await
    .map_err(|e| match e {
        catalog_db::DbError::NotFound => ApiError::new(rid, "not_found", "Product not found"),
        other => map_unique_violation(rid, &other, DUPLICATE_SLUG),
    })?;

    tracing::info!(product_id = %row.public_id, user_id = %user.user_id, "product updated");

    Ok(Json(ApiResponse::new(
        req_id.0.clone(),
        ProductEnvelope {
            message: Some("Product updated successfully"),
            product: ProductItem::from_rows(row, variant_rows),
        },
    )))
}

/// DELETE /api/v1/products/{id}
pub(in crate::api) async fn delete_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<DeletedProduct>>, ApiError> {
    let rid = &req_id.0;
    let public_id = parse_product_id(rid, &id)?;

    catalog_db::delete_product(&state.pool, public_id)
        .await
        .map_err(|e| match e {
            catalog_db::DbError::NotFound => ApiError::new(rid, "not_found", "Product not found"),
            other => map_db_error(rid.clone(), &other),
        })?;

    tracing::info!(product_id = %public_id, user_id = %user.user_id, "product deleted");

    Ok(Json(ApiResponse::new(
        req_id.0.clone(),
        DeletedProduct {
            message: "Product deleted successfully",
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_request_distinguishes_null_from_missing() {
        let missing: UpdateProductRequest = serde_json::from_str("{}").expect("parse");
        assert!(missing.description.is_none());

        let cleared: UpdateProductRequest =
            serde_json::from_str(r#"{"description": null}"#).expect("parse");
        assert_eq!(cleared.description, Some(None));

        let set: UpdateProductRequest =
            serde_json::from_str(r#"{"brand": "Acme"}"#).expect("parse");
        assert_eq!(set.brand, Some(Some("Acme".to_string())));
    }

    #[test]
    fn create_request_keeps_invalid_variant_values() {
        let body: CreateProductRequest = serde_json::from_str(
            r#"{"name":"Tee","slug":"tee","price":10,"categoryId":"x",
                "variants":[{"sku":"A","stock":"lots"}]}"#,
        )
        .expect("parse");
        let variants = body.variants.expect("variants");
        let err = validate_variants_or_400("r", Some(variants.as_slice())).unwrap_err();
        assert_eq!(err.error.code, "validation_error");
        assert!(err.error.message.starts_with("Invalid stock value for A"));
    }

    #[test]
    fn trimmed_images_drops_blank_urls() {
        let images = trimmed_images(Some(vec![
            " https://cdn.example.com/a.png ".to_string(),
            "   ".to_string(),
        ]));
        assert_eq!(images, Some(vec!["https://cdn.example.com/a.png".to_string()]));
        assert_eq!(trimmed_images(None), None);
    }
}
