use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use baas_models::Object;
use bytes::Bytes;
use serde_json::Value;
use tracing::info;

use super::object_body;
use crate::api::RequestContext;
use crate::error::ApiResult;
use crate::server::AppState;

/// Call a cloud function. Query parameters and the JSON body are merged,
/// body keys winning.
pub async fn call_function(
    State(state): State<AppState>,
    Path(name): Path<String>,
    ctx: RequestContext,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    info!("API: call function {}", name);
    let mut params: Object = query
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect();
    params.extend(object_body(&body)?);

    let result = state.functions.call(&name, &ctx.auth, params).await?;
    Ok(Json(result))
}
