use async_trait::async_trait;
use baas_models::Object;
use tracing::debug;

use crate::error::BaasResult;

/// Sink for client analytics events.
#[async_trait]
pub trait AnalyticsAdapter: Send + Sync {
    async fn app_opened(&self, body: &Object) -> BaasResult<Object>;

    async fn track_event(&self, name: &str, body: &Object) -> BaasResult<Object>;
}

/// Drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAnalytics;

#[async_trait]
impl AnalyticsAdapter for NullAnalytics {
    async fn app_opened(&self, _body: &Object) -> BaasResult<Object> {
        debug!("app opened");
        Ok(Object::new())
    }

    async fn track_event(&self, name: &str, _body: &Object) -> BaasResult<Object> {
        debug!(event = name, "track event");
        Ok(Object::new())
    }
}
