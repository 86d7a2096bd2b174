use axum::{Json, extract::State};
use baas_models::{OBJECT_ID, Object, where_object_id};
use baas_storage::FindOptions;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use super::require_writable_master;
use crate::api::RequestContext;
use crate::error::ApiResult;
use crate::server::AppState;

pub const GLOBAL_CONFIG_CLASS: &str = "_GlobalConfig";
const GLOBAL_CONFIG_ID: &str = "1";

#[derive(Debug, Deserialize)]
pub struct ConfigUpdate {
    #[serde(default)]
    pub params: Object,
}

async fn load_params(state: &AppState) -> ApiResult<Object> {
    let params = state
        .storage
        .find(
            GLOBAL_CONFIG_CLASS,
            &where_object_id(GLOBAL_CONFIG_ID),
            &FindOptions::default(),
        )
        .await?
        .into_iter()
        .next()
        .and_then(|mut config| match config.remove("params") {
            Some(Value::Object(params)) => Some(params),
            _ => None,
        })
        .unwrap_or_default();
    Ok(params)
}

pub async fn get_config(
    State(state): State<AppState>,
    _ctx: RequestContext,
) -> ApiResult<Json<Value>> {
    let params = load_params(&state).await?;
    Ok(Json(json!({ "params": params })))
}

/// Merge the given params into the stored config, creating it if needed.
pub async fn update_config(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(update): Json<ConfigUpdate>,
) -> ApiResult<Json<Value>> {
    require_writable_master(&ctx.auth)?;
    info!("API: update config ({} params)", update.params.len());

    let dotted: Object = update
        .params
        .iter()
        .map(|(k, v)| (format!("params.{}", k), v.clone()))
        .collect();
    let updated = state
        .storage
        .update(
            GLOBAL_CONFIG_CLASS,
            &where_object_id(GLOBAL_CONFIG_ID),
            &dotted,
            false,
        )
        .await?;
    if updated.is_empty() {
        let mut config = Object::new();
        config.insert(OBJECT_ID.into(), json!(GLOBAL_CONFIG_ID));
        config.insert("params".into(), Value::Object(update.params));
        state.storage.create(GLOBAL_CONFIG_CLASS, &config).await?;
    }
    Ok(Json(json!({ "result": true })))
}
