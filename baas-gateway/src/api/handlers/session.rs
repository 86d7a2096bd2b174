use axum::{Json, extract::State};
use baas_core::rest::SESSION_CLASS;
use baas_models::{Auth, Object, QueryOptions, object_id};
use serde_json::{Value, json};
use tracing::info;

use crate::api::RequestContext;
use crate::error::ApiResult;
use crate::server::AppState;

/// Destroy the caller's session, if any.
pub async fn logout(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> ApiResult<Json<Value>> {
    let Some(token) = ctx.auth.session_token() else {
        return Ok(Json(json!({})));
    };
    let mut where_ = Object::new();
    where_.insert("sessionToken".into(), json!(token));

    let master = Auth::master();
    let sessions = state
        .pipeline
        .find(
            &master,
            SESSION_CLASS,
            where_,
            QueryOptions {
                limit: Some(1),
                ..Default::default()
            },
            &ctx.client,
        )
        .await?;
    if let Some(id) = sessions.results.first().and_then(object_id) {
        info!("API: logout session {}", id);
        state.pipeline.delete(&master, SESSION_CLASS, id).await?;
    }
    Ok(Json(json!({})))
}
