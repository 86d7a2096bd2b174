use std::sync::Arc;

use async_trait::async_trait;
use baas_models::{Auth, Object};
use baas_storage::ObjectStorage;
use tracing::debug;

use super::DestroyExecutor;
use crate::error::{BaasError, BaasResult};
use crate::livequery::LiveQueryRegistry;
use crate::triggers::{TriggerRegistry, TriggerType, maybe_run_trigger};

pub struct StoreDestroyExecutor {
    storage: Arc<dyn ObjectStorage>,
    triggers: Arc<TriggerRegistry>,
    live_query: Arc<dyn LiveQueryRegistry>,
}

impl StoreDestroyExecutor {
    pub fn new(
        storage: Arc<dyn ObjectStorage>,
        triggers: Arc<TriggerRegistry>,
        live_query: Arc<dyn LiveQueryRegistry>,
    ) -> Self {
        Self {
            storage,
            triggers,
            live_query,
        }
    }
}

#[async_trait]
impl DestroyExecutor for StoreDestroyExecutor {
    async fn execute(
        &self,
        auth: &Auth,
        class_name: &str,
        query: Object,
        original: Option<Object>,
    ) -> BaasResult<()> {
        if let Some(original) = &original {
            maybe_run_trigger(
                &self.triggers,
                TriggerType::BeforeDelete,
                auth,
                class_name,
                original,
                None,
            )
            .await?;
        }

        let removed = self.storage.delete(class_name, &query).await?;
        if removed == 0 {
            return Err(BaasError::ObjectNotFound(
                "Object not found for delete.".into(),
            ));
        }
        debug!(class_name, removed, "objects deleted");

        if let Some(original) = &original {
            maybe_run_trigger(
                &self.triggers,
                TriggerType::AfterDelete,
                auth,
                class_name,
                original,
                None,
            )
            .await?;
            self.live_query.on_after_delete(class_name, original).await;
        }
        Ok(())
    }
}
