use std::sync::Arc;

use async_trait::async_trait;
use baas_models::{
    CLASS_NAME, CREATED_AT, OBJECT_ID, Object, UPDATED_AT, WriteResponse,
    now_timestamp, object_id,
};
use baas_storage::{ObjectStorage, matcher::apply_update};
use serde_json::Value;
use tracing::debug;

use super::{WriteExecutor, WriteRequest};
use crate::error::{BaasError, BaasResult};
use crate::id::new_object_id;
use crate::livequery::LiveQueryRegistry;
use crate::triggers::{TriggerRegistry, TriggerType, maybe_run_trigger};

const RESERVED_FIELDS: [&str; 4] = [OBJECT_ID, CREATED_AT, UPDATED_AT, CLASS_NAME];

fn strip_reserved(object: &mut Object) {
    for field in RESERVED_FIELDS {
        object.remove(field);
    }
}

/// Fields a `beforeSave` hook changed relative to `seen`.
fn hook_changes(seen: &Object, returned: Object) -> Object {
    returned
        .into_iter()
        .filter(|(k, v)| {
            !RESERVED_FIELDS.contains(&k.as_str()) && seen.get(k) != Some(v)
        })
        .collect()
}

/// Write executor backed by [`ObjectStorage`].
///
/// Runs `beforeSave`/`afterSave` around single-object writes and notifies
/// live query subscribers. Bulk (`many`) updates skip both.
pub struct StoreWriteExecutor {
    storage: Arc<dyn ObjectStorage>,
    triggers: Arc<TriggerRegistry>,
    live_query: Arc<dyn LiveQueryRegistry>,
    server_url: String,
}

impl StoreWriteExecutor {
    pub fn new(
        storage: Arc<dyn ObjectStorage>,
        triggers: Arc<TriggerRegistry>,
        live_query: Arc<dyn LiveQueryRegistry>,
        server_url: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            triggers,
            live_query,
            server_url: server_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn create(&self, request: WriteRequest) -> BaasResult<WriteResponse> {
        let WriteRequest {
            auth,
            class_name,
            mut data,
            ..
        } = request;
        strip_reserved(&mut data);

        if let Some(response) = maybe_run_trigger(
            &self.triggers,
            TriggerType::BeforeSave,
            &auth,
            &class_name,
            &data,
            None,
        )
        .await?
        {
            if let Some(returned) = response.object {
                let changes = hook_changes(&data, returned);
                data.extend(changes);
            }
        }

        let id = new_object_id();
        let now = now_timestamp();
        let mut object = data;
        object.insert(OBJECT_ID.into(), Value::String(id.clone()));
        object.insert(CREATED_AT.into(), Value::String(now.clone()));
        object.insert(UPDATED_AT.into(), Value::String(now.clone()));
        self.storage.create(&class_name, &object).await?;
        debug!(class_name, object_id = %id, "object created");

        maybe_run_trigger(
            &self.triggers,
            TriggerType::AfterSave,
            &auth,
            &class_name,
            &object,
            None,
        )
        .await?;
        self.live_query
            .on_after_save(&class_name, &object, None)
            .await;

        let mut response = Object::new();
        response.insert(OBJECT_ID.into(), Value::String(id.clone()));
        response.insert(CREATED_AT.into(), Value::String(now));
        let location =
            format!("{}/classes/{}/{}", self.server_url, class_name, id);
        Ok(WriteResponse::created(response, location))
    }

    async fn update(
        &self,
        query: Object,
        request: WriteRequest,
    ) -> BaasResult<WriteResponse> {
        let WriteRequest {
            auth,
            class_name,
            mut data,
            original,
            many,
            ..
        } = request;
        strip_reserved(&mut data);
        let mut response = Object::new();

        if !many && self.triggers.exists(TriggerType::BeforeSave, &class_name) {
            let mut preview = original.clone().unwrap_or_default();
            if let Some(id) = object_id(&query) {
                preview
                    .entry(OBJECT_ID)
                    .or_insert_with(|| Value::String(id.to_string()));
            }
            apply_update(&mut preview, &data)?;
            if let Some(hook) = maybe_run_trigger(
                &self.triggers,
                TriggerType::BeforeSave,
                &auth,
                &class_name,
                &preview,
                original.as_ref(),
            )
            .await?
            {
                if let Some(returned) = hook.object {
                    for (k, v) in hook_changes(&preview, returned) {
                        data.insert(k.clone(), v.clone());
                        response.insert(k, v);
                    }
                }
            }
        }

        let now = now_timestamp();
        data.insert(UPDATED_AT.into(), Value::String(now.clone()));
        let updated = self.storage.update(&class_name, &query, &data, many).await?;
        debug!(class_name, many, updated = updated.len(), "objects updated");

        if !many {
            let Some(object) = updated.first() else {
                return Err(BaasError::ObjectNotFound("Object not found.".into()));
            };
            maybe_run_trigger(
                &self.triggers,
                TriggerType::AfterSave,
                &auth,
                &class_name,
                object,
                original.as_ref(),
            )
            .await?;
            self.live_query
                .on_after_save(&class_name, object, original.as_ref())
                .await;
        }

        response.insert(UPDATED_AT.into(), Value::String(now));
        Ok(WriteResponse::updated(response))
    }
}

#[async_trait]
impl WriteExecutor for StoreWriteExecutor {
    async fn execute(&self, request: WriteRequest) -> BaasResult<WriteResponse> {
        match request.query.clone() {
            None => self.create(request).await,
            Some(query) => self.update(query, request).await,
        }
    }
}
