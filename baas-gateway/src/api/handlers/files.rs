use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use baas_core::BaasError;
use baas_core::files::{FilesController, SavedFile};
use bytes::Bytes;
use serde_json::json;
use tracing::info;

use super::require_writable_master;
use crate::api::RequestContext;
use crate::error::ApiResult;
use crate::server::AppState;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

pub async fn upload_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    ctx: RequestContext,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Response> {
    if body.is_empty() {
        return Err(BaasError::FileSaveError("Invalid file upload.".into()).into());
    }
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    info!("API: upload file {} ({} bytes)", filename, body.len());

    let saved: SavedFile = state
        .files
        .create_file(&ctx.auth, &filename, body.to_vec(), content_type)
        .await?;

    let mut response = (StatusCode::CREATED, Json(&saved)).into_response();
    if let Ok(location) = HeaderValue::from_str(&saved.url) {
        response.headers_mut().insert(header::LOCATION, location);
    }
    Ok(response)
}

pub async fn get_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ApiResult<Response> {
    let data = state.files.get_file_data(&filename).await?;
    let content_type =
        FilesController::content_type(&filename).unwrap_or(FALLBACK_CONTENT_TYPE);
    Ok(([(header::CONTENT_TYPE, content_type)], data).into_response())
}

pub async fn delete_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    ctx: RequestContext,
) -> ApiResult<Json<serde_json::Value>> {
    require_writable_master(&ctx.auth)?;
    info!("API: delete file {}", filename);
    state.files.delete_file(&filename).await?;
    Ok(Json(json!({})))
}
