use axum::{
    Json,
    extract::{Path, State},
};
use baas_models::Object;
use bytes::Bytes;
use tracing::debug;

use super::object_body;
use crate::error::ApiResult;
use crate::server::AppState;

const APP_OPENED: &str = "AppOpened";

pub async fn track_event(
    State(state): State<AppState>,
    Path(event_name): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Object>> {
    let body = object_body(&body)?;
    debug!(event = %event_name, "API: analytics event");
    let response = if event_name == APP_OPENED {
        state.analytics.app_opened(&body).await?
    } else {
        state.analytics.track_event(&event_name, &body).await?
    };
    Ok(Json(response))
}
