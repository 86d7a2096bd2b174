use axum::{
    Json,
    extract::State,
    http::HeaderValue,
    response::{IntoResponse, Response},
};
use baas_core::BaasError;
use baas_models::Object;
use serde_json::{Value, json};
use tokio::sync::oneshot;
use tracing::info;

use super::require_writable_master;
use crate::api::{PUSH_STATUS_ID_HEADER, RequestContext};
use crate::error::{ApiError, ApiResult};
use crate::server::AppState;

/// Start a push job and answer once it is running.
///
/// Delivery continues in the background; the job id is returned in the
/// `x-baas-push-status-id` header. Failures before the job starts running
/// are returned to the caller.
pub async fn send_push(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(mut body): Json<Object>,
) -> ApiResult<Response> {
    require_writable_master(&ctx.auth)?;
    let where_ = match body.remove("where") {
        None | Some(Value::Null) => Object::new(),
        Some(Value::Object(where_)) => where_,
        Some(_) => {
            return Err(ApiError::Baas(BaasError::PushMisconfigured(
                "where must be an object".into(),
            )));
        }
    };

    let (tx, rx) = oneshot::channel::<String>();
    let push = state.push.clone();
    let auth = ctx.auth.clone();
    let job = tokio::spawn(async move {
        push.send_push(body, where_, &auth, move |id| {
            let _ = tx.send(id.to_string());
        })
        .await
    });

    let job_id = match rx.await {
        Ok(id) => id,
        // the job finished without reaching Running
        Err(_) => match job.await {
            Ok(Ok(status)) => status.id().to_string(),
            Ok(Err(e)) => return Err(e.into()),
            Err(e) => return Err(BaasError::Internal(e.to_string()).into()),
        },
    };
    info!(job_id = %job_id, "API: push job started");

    let mut response = Json(json!({ "result": true })).into_response();
    if let Ok(value) = HeaderValue::from_str(&job_id) {
        response.headers_mut().insert(PUSH_STATUS_ID_HEADER, value);
    }
    Ok(response)
}
