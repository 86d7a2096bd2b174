use http::{HeaderName, Method, header};
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::extractors::{
    CLIENT_VERSION_HEADER, INSTALLATION_ID_HEADER, MASTER_KEY_HEADER,
    SESSION_TOKEN_HEADER,
};

pub const PUSH_STATUS_ID_HEADER: &str = "x-baas-push-status-id";

pub fn trace_layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>> {
    TraceLayer::new_for_http()
}

/// Browser clients send the identity headers on every request.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(MASTER_KEY_HEADER),
            HeaderName::from_static(SESSION_TOKEN_HEADER),
            HeaderName::from_static(INSTALLATION_ID_HEADER),
            HeaderName::from_static(CLIENT_VERSION_HEADER),
        ])
        .expose_headers([
            header::LOCATION,
            HeaderName::from_static(PUSH_STATUS_ID_HEADER),
        ])
}
