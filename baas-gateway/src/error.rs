use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use baas_core::BaasError;
use baas_storage::StorageError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Baas(#[from] BaasError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Baas(BaasError::OperationForbidden(message.into()))
    }

    fn code(&self) -> i32 {
        match self {
            ApiError::Baas(e) => e.code(),
            ApiError::BadRequest(_) => BaasError::INVALID_QUERY,
        }
    }

    fn status(&self) -> StatusCode {
        let ApiError::Baas(e) = self else {
            return StatusCode::BAD_REQUEST;
        };
        match e {
            BaasError::OperationForbidden(_) => StatusCode::FORBIDDEN,
            BaasError::ObjectNotFound(_) => StatusCode::NOT_FOUND,
            BaasError::SessionMissing(_) | BaasError::InvalidSessionToken(_) => {
                StatusCode::UNAUTHORIZED
            }
            BaasError::Storage(StorageError::NotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            BaasError::Storage(_) | BaasError::Config(_) | BaasError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        let body = Json(json!({
            "code": self.code(),
            "error": self.to_string(),
        }));
        (status, body).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        ApiError::Baas(e.into())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::forbidden("no").status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::from(BaasError::InvalidSessionToken("bad".into())).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(BaasError::hook(141, "hook says no")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(BaasError::Internal("x".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ApiError::BadRequest("x".into()).code(), 102);
    }
}
