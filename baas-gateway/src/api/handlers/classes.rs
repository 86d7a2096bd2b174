use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use baas_core::BaasError;
use baas_models::{Object, QueryOptions};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use crate::api::RequestContext;
use crate::error::{ApiError, ApiResult};
use crate::server::AppState;

/// Query string of a find or get. `where` carries a JSON document.
#[derive(Debug, Default, Deserialize)]
pub struct FindParams {
    #[serde(rename = "where")]
    pub where_: Option<String>,
    pub limit: Option<i64>,
    pub skip: Option<i64>,
    pub include: Option<String>,
    pub keys: Option<String>,
    pub order: Option<String>,
    pub count: Option<String>,
    pub distinct: Option<String>,
}

impl FindParams {
    pub fn parse_where(&self) -> ApiResult<Object> {
        match self.where_.as_deref() {
            None | Some("") => Ok(Object::new()),
            Some(raw) => serde_json::from_str(raw).map_err(|e| {
                ApiError::Baas(BaasError::InvalidQuery(format!(
                    "invalid where clause: {}",
                    e
                )))
            }),
        }
    }

    pub fn options(&self) -> QueryOptions {
        let count = self
            .count
            .as_deref()
            .is_some_and(|c| !matches!(c, "0" | "false"));
        QueryOptions {
            limit: self.limit,
            skip: self.skip,
            include: self.include.clone(),
            keys: self.keys.clone(),
            order: self.order.clone(),
            count,
            aggregate: None,
            distinct: self.distinct.clone(),
        }
    }
}

fn internal(e: serde_json::Error) -> ApiError {
    ApiError::Baas(BaasError::Internal(e.to_string()))
}

pub async fn find_objects(
    State(state): State<AppState>,
    Path(class_name): Path<String>,
    ctx: RequestContext,
    Query(params): Query<FindParams>,
) -> ApiResult<Json<Value>> {
    info!("API: find {}", class_name);
    let where_ = params.parse_where()?;
    let found = state
        .pipeline
        .find(&ctx.auth, &class_name, where_, params.options(), &ctx.client)
        .await?;

    let mut body = serde_json::to_value(&found).map_err(internal)?;
    if let Some(results) = body.get_mut("results") {
        state.files.expand_files_in_object(results);
    }
    Ok(Json(body))
}

pub async fn get_object(
    State(state): State<AppState>,
    Path((class_name, object_id)): Path<(String, String)>,
    ctx: RequestContext,
    Query(params): Query<FindParams>,
) -> ApiResult<Json<Value>> {
    info!("API: get {}/{}", class_name, object_id);
    let object = state
        .pipeline
        .get(&ctx.auth, &class_name, &object_id, params.options(), &ctx.client)
        .await?;
    let mut body = Value::Object(object);
    state.files.expand_files_in_object(&mut body);
    Ok(Json(body))
}

pub async fn create_object(
    State(state): State<AppState>,
    Path(class_name): Path<String>,
    ctx: RequestContext,
    Json(object): Json<Object>,
) -> ApiResult<Response> {
    info!("API: create {}", class_name);
    let created = state
        .pipeline
        .create(&ctx.auth, &class_name, object, &ctx.client)
        .await?;

    let status =
        StatusCode::from_u16(created.status).unwrap_or(StatusCode::CREATED);
    let mut response = (status, Json(created.response)).into_response();
    if let Some(location) = created
        .location
        .as_deref()
        .and_then(|l| HeaderValue::from_str(l).ok())
    {
        response.headers_mut().insert(header::LOCATION, location);
    }
    Ok(response)
}

pub async fn update_object(
    State(state): State<AppState>,
    Path((class_name, object_id)): Path<(String, String)>,
    ctx: RequestContext,
    Json(object): Json<Object>,
) -> ApiResult<Json<Object>> {
    info!("API: update {}/{}", class_name, object_id);
    let updated = state
        .pipeline
        .update(&ctx.auth, &class_name, &object_id, object, &ctx.client)
        .await?;
    Ok(Json(updated.response))
}

pub async fn delete_object(
    State(state): State<AppState>,
    Path((class_name, object_id)): Path<(String, String)>,
    ctx: RequestContext,
) -> ApiResult<Json<Value>> {
    info!("API: delete {}/{}", class_name, object_id);
    state
        .pipeline
        .delete(&ctx.auth, &class_name, &object_id)
        .await?;
    Ok(Json(json!({})))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_params_options() {
        let params = FindParams {
            where_: Some(r#"{"score":{"$gt":3}}"#.into()),
            limit: Some(5),
            count: Some("1".into()),
            order: Some("-score".into()),
            ..Default::default()
        };
        let options = params.options();
        assert!(options.count);
        assert_eq!(options.limit, Some(5));
        assert_eq!(options.order.as_deref(), Some("-score"));
        assert_eq!(params.parse_where().unwrap()["score"]["$gt"], json!(3));

        let params = FindParams {
            where_: Some("{not json".into()),
            count: Some("0".into()),
            ..Default::default()
        };
        assert!(!params.options().count);
        assert!(params.parse_where().is_err());
    }
}
