//! GET /api/v1/products/{id}

use axum::{
    extract::{Path, State},
    Extension, Json,
};

use crate::middleware::RequestId;

use super::super::{map_db_error, ApiError, ApiResponse, AppState};
use super::{resolve_product, ProductEnvelope, ProductItem};

pub(in crate::api) async fn get_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ProductEnvelope>>, ApiError> {
    let rid = &req_id.0;
    let product = resolve_product(&state.pool, rid, &id).await?;

    let variants = catalog_db::list_variants_for_products(&state.pool, &[product.id])
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse::new(
        req_id.0.clone(),
        ProductEnvelope {
            message: None,
            product: ProductItem::from_rows(product, variants),
        },
    )))
}
