use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use catalog_core::{PriceQuote, PriceUpdate};
use catalog_feed::SyncReport;
use catalog_service::{ServiceError, SetPrice};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_service_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct BulkSetResponse {
    updated: usize,
}

#[derive(Debug, Deserialize)]
pub(super) struct SyncQuery {
    #[serde(default)]
    pub dry_run: bool,
}

pub(super) async fn get_price(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(sku): Path<String>,
) -> Result<Json<ApiResponse<PriceQuote>>, ApiError> {
    let quote = state
        .catalog
        .get_price(&sku)
        .await
        .map_err(|e| map_service_error(req_id.0.clone(), &e))?
        .ok_or_else(|| {
            ApiError::new(&req_id.0, "not_found", format!("price for '{sku}' not found"))
        })?;

    Ok(ApiResponse::new(quote, req_id.0))
}

pub(super) async fn list_prices(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<BTreeMap<String, PriceQuote>>>, ApiError> {
    let prices = state
        .catalog
        .list_prices()
        .await
        .map_err(|e| map_service_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(prices, req_id.0))
}

/// GET /api/v1/prices/tracked: SKUs the feed sync will refresh.
pub(super) async fn list_tracked(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<String>>>, ApiError> {
    let skus = state
        .catalog
        .list_tracked()
        .await
        .map_err(|e| map_service_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(skus, req_id.0))
}

/// PUT /api/v1/prices/{sku}: replaces the stored price.
pub(super) async fn set_price(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(sku): Path<String>,
    Json(body): Json<SetPrice>,
) -> Result<Json<ApiResponse<PriceQuote>>, ApiError> {
    let quote = state
        .catalog
        .set_price(&sku, body)
        .await
        .map_err(|e| map_service_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(quote, req_id.0))
}

/// POST /api/v1/prices/bulk: `{sku: {price, old_price?, currency?, is_tracked?}}`.
pub(super) async fn bulk_set_prices(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<BTreeMap<String, PriceUpdate>>,
) -> Result<Json<ApiResponse<BulkSetResponse>>, ApiError> {
    let updated = state
        .catalog
        .bulk_set_prices(&body)
        .await
        .map_err(|e| map_service_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(BulkSetResponse { updated }, req_id.0))
}

pub(super) async fn delete_price(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(sku): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .catalog
        .delete_price(&sku)
        .await
        .map_err(|e| map_service_error(req_id.0, &e))?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/prices/sync?dry_run=true
pub(super) async fn sync_prices(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<SyncQuery>,
) -> Result<Json<ApiResponse<SyncReport>>, ApiError> {
    let Some(client) = state.feed.as_deref() else {
        return Err(map_service_error(
            req_id.0,
            &ServiceError::FeedNotConfigured,
        ));
    };

    let report = state
        .catalog
        .sync_prices(client, query.dry_run)
        .await
        .map_err(|e| map_service_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(report, req_id.0))
}
