use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use catalog_core::{NewProduct, Product, ProductPatch};
use catalog_db::ProductFilter;
use catalog_service::{Page, ProductCard, ProductDetail};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{
    map_service_error, normalize_limit, normalize_offset, ApiError, ApiResponse, AppState,
};

#[derive(Debug, Deserialize)]
pub(super) struct ProductQuery {
    pub brand: Option<String>,
    pub level0: Option<String>,
    pub level1: Option<String>,
    pub level2: Option<String>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SearchQuery {
    pub q: Option<String>,
    pub limit: Option<i64>,
}

/// GET /api/v1/products: one representative per model and brand.
pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<ApiResponse<Page<ProductCard>>>, ApiError> {
    let filter = ProductFilter {
        brand: query.brand.as_deref(),
        level0: query.level0.as_deref(),
        level1: query.level1.as_deref(),
        level2: query.level2.as_deref(),
    };
    let page = state
        .catalog
        .list_products(
            filter,
            normalize_offset(query.offset),
            normalize_limit(query.limit),
        )
        .await
        .map_err(|e| map_service_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(page, req_id.0))
}

/// GET /api/v1/products/search?q=
pub(super) async fn search_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<Vec<ProductCard>>>, ApiError> {
    let q = query.q.unwrap_or_default();
    let items = state
        .catalog
        .search_products(&q, normalize_limit(query.limit))
        .await
        .map_err(|e| map_service_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(items, req_id.0))
}

pub(super) async fn get_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(sku): Path<String>,
) -> Result<Json<ApiResponse<ProductDetail>>, ApiError> {
    let detail = state
        .catalog
        .get_product(&sku)
        .await
        .map_err(|e| map_service_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(detail, req_id.0))
}

/// POST /api/v1/products
pub(super) async fn create_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<NewProduct>,
) -> Result<(StatusCode, Json<ApiResponse<Product>>), ApiError> {
    let product = state
        .catalog
        .create_product(body)
        .await
        .map_err(|e| map_service_error(req_id.0.clone(), &e))?;

    Ok((StatusCode::CREATED, ApiResponse::new(product, req_id.0)))
}

/// PATCH /api/v1/products/{sku}: absent fields keep their value.
pub(super) async fn update_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(sku): Path<String>,
    Json(body): Json<ProductPatch>,
) -> Result<Json<ApiResponse<Product>>, ApiError> {
    let product = state
        .catalog
        .update_product(&sku, body)
        .await
        .map_err(|e| map_service_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(product, req_id.0))
}

/// DELETE /api/v1/products/{sku}: also drops the stored price.
pub(super) async fn delete_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(sku): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .catalog
        .delete_product(&sku)
        .await
        .map_err(|e| map_service_error(req_id.0, &e))?;

    Ok(StatusCode::NO_CONTENT)
}
