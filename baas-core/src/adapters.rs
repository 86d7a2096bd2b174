use std::sync::Arc;

use tracing::info;

use crate::analytics::{AnalyticsAdapter, NullAnalytics};
use crate::config::AdapterConfig;
use crate::error::BaasResult;
use crate::files::{FileStore, create_file_store};
use crate::push::{PushSender, create_push_sender};

/// Capability backends chosen once at startup and injected where needed.
#[derive(Clone)]
pub struct Adapters {
    pub push: Arc<dyn PushSender>,
    pub files: Arc<dyn FileStore>,
    pub analytics: Arc<dyn AnalyticsAdapter>,
}

impl Adapters {
    pub fn from_config(config: &AdapterConfig) -> BaasResult<Self> {
        info!(
            push = %config.push_adapter,
            files = %config.file_adapter,
            "select adapters"
        );
        Ok(Self {
            push: create_push_sender(&config.push_adapter)?,
            files: create_file_store(config)?,
            analytics: Arc::new(NullAnalytics),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BaasError;

    fn config(push: &str, files: &str) -> AdapterConfig {
        AdapterConfig {
            push_adapter: push.into(),
            file_adapter: files.into(),
            file_dir: "files".into(),
            server_url: "http://localhost/v1".into(),
        }
    }

    #[test]
    fn test_known_adapters() {
        let adapters = Adapters::from_config(&config("log", "disk")).unwrap();
        assert_eq!(
            adapters.files.file_location("a.txt"),
            "http://localhost/v1/files/a.txt"
        );
    }

    #[test]
    fn test_unknown_adapter_is_config_error() {
        assert!(matches!(
            Adapters::from_config(&config("noop", "s3")),
            Err(BaasError::Config(_))
        ));
        assert!(matches!(
            Adapters::from_config(&config("apns", "memory")),
            Err(BaasError::Config(_))
        ));
    }
}
