use std::collections::HashMap;

use axum::extract::FromRequestParts;
use baas_core::BaasError;
use baas_core::rest::{SESSION_CLASS, USER_CLASS};
use baas_models::{Auth, ClientInfo, OBJECT_ID, Object, where_object_id};
use baas_storage::FindOptions;
use chrono::{DateTime, Utc};
use http::{HeaderMap, request::Parts};
use serde_json::Value;
use tracing::debug;

use crate::error::ApiError;
use crate::server::AppState;

pub const MASTER_KEY_HEADER: &str = "x-baas-master-key";
pub const SESSION_TOKEN_HEADER: &str = "x-baas-session-token";
pub const INSTALLATION_ID_HEADER: &str = "x-baas-installation-id";
pub const CLIENT_VERSION_HEADER: &str = "x-baas-client-version";

/// Caller identity and client info resolved from request headers.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub auth: Auth,
    pub client: ClientInfo,
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Headers handed on to hooks; credentials stay behind.
fn forwarded_headers(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter(|(name, _)| {
            name.as_str() != MASTER_KEY_HEADER
                && name.as_str() != SESSION_TOKEN_HEADER
        })
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}

fn invalid_session() -> BaasError {
    BaasError::InvalidSessionToken("Invalid session token".into())
}

async fn resolve_session(state: &AppState, token: &str) -> Result<Auth, BaasError> {
    let mut where_ = Object::new();
    where_.insert("sessionToken".into(), Value::String(token.to_string()));
    let options = FindOptions {
        limit: Some(1),
        ..Default::default()
    };
    let session = state
        .storage
        .find(SESSION_CLASS, &where_, &options)
        .await?
        .into_iter()
        .next()
        .ok_or_else(invalid_session)?;

    let expired = session
        .get("expiresAt")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .is_some_and(|at| at < Utc::now());
    if expired {
        return Err(BaasError::InvalidSessionToken(
            "Session token is expired.".into(),
        ));
    }

    let user_id = session
        .get("user")
        .and_then(|u| u.get(OBJECT_ID))
        .and_then(Value::as_str)
        .ok_or_else(invalid_session)?;
    let user = state
        .storage
        .find(USER_CLASS, &where_object_id(user_id), &FindOptions::default())
        .await?
        .into_iter()
        .next()
        .ok_or_else(invalid_session)?;
    debug!(user_id, "session resolved");
    Ok(Auth::for_user(user))
}

impl FromRequestParts<AppState> for RequestContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let headers = &parts.headers;
        let config = &state.config;

        let auth = match header(headers, MASTER_KEY_HEADER) {
            Some(key) if config.master_key.as_deref() == Some(key.as_str()) => {
                Auth::master()
            }
            Some(key)
                if config.read_only_master_key.as_deref()
                    == Some(key.as_str()) =>
            {
                Auth::read_only_master()
            }
            Some(_) => return Err(ApiError::forbidden("unauthorized")),
            None => match header(headers, SESSION_TOKEN_HEADER) {
                Some(token) => resolve_session(state, &token)
                    .await?
                    .with_session_token(token),
                None => Auth::nobody(),
            },
        };
        let auth = match header(headers, INSTALLATION_ID_HEADER) {
            Some(id) => auth.with_installation_id(id),
            None => auth,
        };

        let mut client = ClientInfo::new();
        if let Some(version) = header(headers, CLIENT_VERSION_HEADER) {
            client.insert("clientVersion".into(), version);
        }

        Ok(RequestContext {
            auth: auth.with_headers(forwarded_headers(headers)),
            client,
        })
    }
}
