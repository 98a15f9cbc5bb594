use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use catalog_core::{ImageSet, ModelDescription};
use catalog_service::{ModelView, ProductCard};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{map_service_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct DescriptionRequest {
    pub description: String,
    #[serde(default = "empty_details")]
    pub details: serde_json::Value,
}

fn empty_details() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

#[derive(Debug, Deserialize)]
pub(super) struct ImageSetQuery {
    pub level2: Option<String>,
}

pub(super) async fn get_model(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(level2): Path<String>,
) -> Result<Json<ApiResponse<ModelView>>, ApiError> {
    let view = state
        .catalog
        .get_model(&level2)
        .await
        .map_err(|e| map_service_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(view, req_id.0))
}

/// GET /api/v1/models/{level2}/variants
pub(super) async fn list_variants(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(level2): Path<String>,
) -> Result<Json<ApiResponse<Vec<ProductCard>>>, ApiError> {
    let variants = state
        .catalog
        .get_variants(&level2)
        .await
        .map_err(|e| map_service_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(variants, req_id.0))
}

/// PUT /api/v1/models/{level2}: stores the model description.
pub(super) async fn set_description(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(level2): Path<String>,
    Json(body): Json<DescriptionRequest>,
) -> Result<Json<ApiResponse<ModelDescription>>, ApiError> {
    let description = state
        .catalog
        .set_model_description(ModelDescription {
            level2,
            description: body.description,
            details: body.details,
        })
        .await
        .map_err(|e| map_service_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(description, req_id.0))
}

pub(super) async fn list_image_sets(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ImageSetQuery>,
) -> Result<Json<ApiResponse<Vec<ImageSet>>>, ApiError> {
    let sets = state
        .catalog
        .list_image_sets(query.level2.as_deref())
        .await
        .map_err(|e| map_service_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(sets, req_id.0))
}

/// PUT /api/v1/image-sets: creates or replaces one `(level2, color)` set.
pub(super) async fn put_image_set(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<ImageSet>,
) -> Result<Json<ApiResponse<ImageSet>>, ApiError> {
    let set = state
        .catalog
        .put_image_set(body)
        .await
        .map_err(|e| map_service_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(set, req_id.0))
}
