pub mod analytics;
pub mod classes;
pub mod config;
pub mod files;
pub mod functions;
pub mod push;
pub mod session;

pub use analytics::*;
pub use classes::*;
pub use config::*;
pub use files::*;
pub use functions::*;
pub use push::*;
pub use session::*;

use baas_models::{Auth, Object};
use bytes::Bytes;

use crate::error::{ApiError, ApiResult};

/// Parse an optional JSON object body; an empty body is an empty object.
pub(crate) fn object_body(body: &Bytes) -> ApiResult<Object> {
    if body.is_empty() {
        return Ok(Object::new());
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {}", e)))
}

pub(crate) fn require_writable_master(auth: &Auth) -> ApiResult<()> {
    if !auth.is_master() || auth.is_read_only() {
        return Err(ApiError::forbidden("unauthorized: master key is required"));
    }
    Ok(())
}
