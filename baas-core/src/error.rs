use baas_storage::StorageError;
use thiserror::Error;

pub type BaasResult<T> = Result<T, BaasError>;

/// Failure kinds surfaced by the access pipeline, hooks, and push dispatch.
///
/// Every variant maps onto a stable numeric code that clients switch on.
#[derive(Error, Debug)]
pub enum BaasError {
    #[error("{0}")]
    OperationForbidden(String),

    #[error("{0}")]
    SessionMissing(String),

    #[error("{0}")]
    InvalidSessionToken(String),

    #[error("{0}")]
    ObjectNotFound(String),

    #[error("{0}")]
    PushMisconfigured(String),

    #[error("{0}")]
    ScriptFailed(String),

    #[error("{0}")]
    ValidationError(String),

    #[error("{0}")]
    InvalidQuery(String),

    #[error("{0}")]
    FileSaveError(String),

    /// Raised by a user hook; code and message reach the client untouched.
    #[error("{message}")]
    Hook { code: i32, message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BaasError {
    pub const OPERATION_FORBIDDEN: i32 = 119;
    pub const SESSION_MISSING: i32 = 206;
    pub const INVALID_SESSION_TOKEN: i32 = 209;
    pub const OBJECT_NOT_FOUND: i32 = 101;
    pub const PUSH_MISCONFIGURED: i32 = 115;
    pub const SCRIPT_FAILED: i32 = 141;
    pub const VALIDATION_ERROR: i32 = 142;
    pub const INVALID_QUERY: i32 = 102;
    pub const FILE_SAVE_ERROR: i32 = 130;
    pub const INTERNAL_SERVER_ERROR: i32 = 1;

    pub fn hook(code: i32, message: impl Into<String>) -> Self {
        Self::Hook {
            code,
            message: message.into(),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            Self::OperationForbidden(_) => Self::OPERATION_FORBIDDEN,
            Self::SessionMissing(_) => Self::SESSION_MISSING,
            Self::InvalidSessionToken(_) => Self::INVALID_SESSION_TOKEN,
            Self::ObjectNotFound(_) => Self::OBJECT_NOT_FOUND,
            Self::PushMisconfigured(_) => Self::PUSH_MISCONFIGURED,
            Self::ScriptFailed(_) => Self::SCRIPT_FAILED,
            Self::ValidationError(_) => Self::VALIDATION_ERROR,
            Self::InvalidQuery(_) => Self::INVALID_QUERY,
            Self::FileSaveError(_) => Self::FILE_SAVE_ERROR,
            Self::Hook { code, .. } => *code,
            Self::Storage(StorageError::NotFound(_)) => Self::OBJECT_NOT_FOUND,
            Self::Storage(
                StorageError::InvalidQuery(_) | StorageError::InvalidUpdate(_),
            ) => Self::INVALID_QUERY,
            Self::Storage(_) | Self::Config(_) | Self::Internal(_) => {
                Self::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(BaasError::OperationForbidden("x".into()).code(), 119);
        assert_eq!(BaasError::SessionMissing("x".into()).code(), 206);
        assert_eq!(BaasError::InvalidSessionToken("x".into()).code(), 209);
        assert_eq!(BaasError::PushMisconfigured("x".into()).code(), 115);
        assert_eq!(
            BaasError::Storage(StorageError::InvalidQuery("bad".into())).code(),
            102
        );
        assert_eq!(BaasError::Internal("boom".into()).code(), 1);
    }

    #[test]
    fn test_hook_error_is_verbatim() {
        let err = BaasError::hook(777, "nope");
        assert_eq!(err.code(), 777);
        assert_eq!(err.to_string(), "nope");
    }
}
