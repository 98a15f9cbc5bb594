use axum::{extract::State, http::StatusCode, Extension, Json};
use catalog_core::{CategoryNode, CategorySeed};
use catalog_service::RenameReport;
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{map_service_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct RenameRequest {
    pub old_name: String,
    pub new_name: String,
}

/// GET /api/v1/categories: the level0/level1/level2 tree with product counts.
pub(super) async fn category_tree(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<CategoryNode>>>, ApiError> {
    let tree = state
        .catalog
        .category_tree()
        .await
        .map_err(|e| map_service_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(tree, req_id.0))
}

pub(super) async fn create_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CategorySeed>,
) -> Result<(StatusCode, Json<ApiResponse<CategorySeed>>), ApiError> {
    let created = state
        .catalog
        .create_category(body)
        .await
        .map_err(|e| map_service_error(req_id.0.clone(), &e))?;

    Ok((StatusCode::CREATED, ApiResponse::new(created, req_id.0)))
}

/// POST /api/v1/categories/rename: renames a level0 across products,
/// categories and variant field settings.
pub(super) async fn rename_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<RenameRequest>,
) -> Result<Json<ApiResponse<RenameReport>>, ApiError> {
    let report = state
        .catalog
        .rename_category(&body.old_name, &body.new_name)
        .await
        .map_err(|e| map_service_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(report, req_id.0))
}
