use std::sync::Arc;

use async_trait::async_trait;
use baas_models::{Auth, ClientInfo, FindResponse, Object, QueryOptions};
use baas_storage::{FindOptions, ObjectStorage};
use tracing::debug;

use super::QueryExecutor;
use crate::error::BaasResult;
use crate::triggers::{TriggerRegistry, maybe_run_after_find_trigger};

/// Query executor backed by [`ObjectStorage`]; runs `afterFind` on results.
pub struct StoreQueryExecutor {
    storage: Arc<dyn ObjectStorage>,
    triggers: Arc<TriggerRegistry>,
}

impl StoreQueryExecutor {
    pub fn new(
        storage: Arc<dyn ObjectStorage>,
        triggers: Arc<TriggerRegistry>,
    ) -> Self {
        Self { storage, triggers }
    }
}

fn find_options(options: &QueryOptions) -> FindOptions {
    FindOptions {
        limit: options.limit.map(|l| l.max(0) as usize),
        skip: options.skip.map(|s| s.max(0) as usize),
        order: options
            .order
            .as_deref()
            .map(FindOptions::parse_order)
            .unwrap_or_default(),
        keys: options.keys.as_deref().map(FindOptions::parse_keys),
    }
}

#[async_trait]
impl QueryExecutor for StoreQueryExecutor {
    async fn execute(
        &self,
        auth: &Auth,
        class_name: &str,
        where_: Object,
        options: QueryOptions,
        _client: &ClientInfo,
    ) -> BaasResult<FindResponse> {
        let objects = self
            .storage
            .find(class_name, &where_, &find_options(&options))
            .await?;
        let count = if options.count {
            Some(self.storage.count(class_name, &where_).await?)
        } else {
            None
        };
        debug!(class_name, found = objects.len(), "query executed");
        let results = maybe_run_after_find_trigger(
            &self.triggers,
            auth,
            class_name,
            objects,
            &where_,
            &options,
        )
        .await?;
        Ok(FindResponse { results, count })
    }
}
