use std::sync::Arc;

use async_trait::async_trait;
use baas_models::{Object, get_str};
use serde_json::{Value, json};
use tracing::info;

use crate::error::{BaasError, BaasResult};

/// Delivery backend for push notifications.
#[async_trait]
pub trait PushSender: Send + Sync {
    /// Deliver `payload` to `installations`; one result object per device.
    async fn send(
        &self,
        payload: &Object,
        installations: &[Object],
        job_id: &str,
    ) -> Vec<Object>;

    /// Device types this backend can reach.
    fn valid_push_types(&self) -> Vec<String>;
}

const DEFAULT_PUSH_TYPES: [&str; 2] = ["ios", "android"];

fn default_push_types() -> Vec<String> {
    DEFAULT_PUSH_TYPES.iter().map(|t| t.to_string()).collect()
}

/// Accepts every push and delivers nothing.
#[derive(Debug, Clone, Default)]
pub struct NoopPushSender;

#[async_trait]
impl PushSender for NoopPushSender {
    async fn send(
        &self,
        _payload: &Object,
        _installations: &[Object],
        _job_id: &str,
    ) -> Vec<Object> {
        Vec::new()
    }

    fn valid_push_types(&self) -> Vec<String> {
        default_push_types()
    }
}

/// Logs each delivery and reports it as transmitted.
#[derive(Debug, Clone, Default)]
pub struct LogPushSender;

#[async_trait]
impl PushSender for LogPushSender {
    async fn send(
        &self,
        payload: &Object,
        installations: &[Object],
        job_id: &str,
    ) -> Vec<Object> {
        let payload = Value::Object(payload.clone());
        info!(
            job_id,
            devices = installations.len(),
            payload = %payload,
            "push delivery"
        );
        installations
            .iter()
            .map(|installation| {
                let result = json!({
                    "transmitted": true,
                    "device": {
                        "deviceType": get_str(installation, "deviceType"),
                        "deviceToken": get_str(installation, "deviceToken"),
                    },
                });
                result.as_object().cloned().unwrap_or_default()
            })
            .collect()
    }

    fn valid_push_types(&self) -> Vec<String> {
        default_push_types()
    }
}

pub fn create_push_sender(name: &str) -> BaasResult<Arc<dyn PushSender>> {
    match name {
        "noop" => Ok(Arc::new(NoopPushSender)),
        "log" => Ok(Arc::new(LogPushSender)),
        other => Err(BaasError::Config(format!(
            "unsupported push adapter: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_sender_reports_each_device() {
        let sender = create_push_sender("log").unwrap();
        let devices = vec![
            json!({"deviceType": "ios", "deviceToken": "a"})
                .as_object()
                .cloned()
                .unwrap(),
            json!({"deviceType": "android", "deviceToken": "b"})
                .as_object()
                .cloned()
                .unwrap(),
        ];
        let results = sender.send(&Object::new(), &devices, "job").await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[1]["device"]["deviceToken"], json!("b"));
    }

    #[test]
    fn test_unknown_adapter() {
        assert!(matches!(
            create_push_sender("carrier-pigeon"),
            Err(BaasError::Config(_))
        ));
        let noop = create_push_sender("noop").unwrap();
        assert_eq!(noop.valid_push_types(), vec!["ios", "android"]);
    }
}
