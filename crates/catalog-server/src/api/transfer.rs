//! Spreadsheet import and export.
//!
//! Uploads are the raw request body, either an XLSX workbook or CSV text;
//! the format is sniffed from the leading bytes. Downloads pick their
//! format from `?format=xlsx|csv` (default `xlsx`).

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Extension, Json,
};
use catalog_service::{ImportReport, ServiceError};
use catalog_sheets::{SheetFormat, TemplateKind};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{map_service_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct FormatQuery {
    pub format: Option<String>,
}

fn parse_format(request_id: &str, raw: Option<&str>) -> Result<SheetFormat, ApiError> {
    raw.map_or(Ok(SheetFormat::default()), str::parse::<SheetFormat>)
        .map_err(|message: String| ApiError::new(request_id, "validation_error", message))
}

fn require_body(request_id: &str, body: &Bytes) -> Result<(), ApiError> {
    if body.is_empty() {
        return Err(ApiError::new(
            request_id,
            "validation_error",
            "request body must contain a spreadsheet",
        ));
    }
    Ok(())
}

fn attachment(format: SheetFormat, stem: &str, bytes: Vec<u8>) -> Response {
    let disposition = format!("attachment; filename=\"{stem}.{}\"", format.extension());
    (
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response()
}

/// POST /api/v1/import/products
pub(super) async fn import_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Bytes,
) -> Result<Json<ApiResponse<ImportReport>>, ApiError> {
    require_body(&req_id.0, &body)?;
    let report = state
        .catalog
        .import_products(&body)
        .await
        .map_err(|e| map_service_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(report, req_id.0))
}

/// POST /api/v1/import/prices
pub(super) async fn import_prices(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Bytes,
) -> Result<Json<ApiResponse<ImportReport>>, ApiError> {
    require_body(&req_id.0, &body)?;
    let report = state
        .catalog
        .import_prices(&body)
        .await
        .map_err(|e| map_service_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(report, req_id.0))
}

pub(super) async fn export_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<FormatQuery>,
) -> Result<Response, ApiError> {
    let format = parse_format(&req_id.0, query.format.as_deref())?;
    let bytes = state
        .catalog
        .export_products(format)
        .await
        .map_err(|e| map_service_error(req_id.0, &e))?;

    Ok(attachment(format, "products", bytes))
}

pub(super) async fn export_prices(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<FormatQuery>,
) -> Result<Response, ApiError> {
    let format = parse_format(&req_id.0, query.format.as_deref())?;
    let bytes = state
        .catalog
        .export_prices(format)
        .await
        .map_err(|e| map_service_error(req_id.0, &e))?;

    Ok(attachment(format, "prices", bytes))
}

/// GET /api/v1/export/templates/{kind}: an empty import sheet with one example row.
pub(super) async fn export_template(
    Extension(req_id): Extension<RequestId>,
    Path(kind): Path<String>,
    Query(query): Query<FormatQuery>,
) -> Result<Response, ApiError> {
    let kind: TemplateKind = kind
        .parse()
        .map_err(|message: String| ApiError::new(&req_id.0, "not_found", message))?;
    let format = parse_format(&req_id.0, query.format.as_deref())?;
    let bytes = catalog_sheets::template(kind, format)
        .map_err(|e| map_service_error(req_id.0, &ServiceError::Sheet(e)))?;

    let stem = match kind {
        TemplateKind::Products => "products_template",
        TemplateKind::Prices => "prices_template",
    };
    Ok(attachment(format, stem, bytes))
}
