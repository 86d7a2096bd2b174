use baas_models::{Auth, CLASS_NAME, Object, QueryOptions};
use serde_json::Value;
use tracing::debug;

use super::registry::TriggerRegistry;
use super::types::{FileInfo, TriggerRequest, TriggerResponse, TriggerType};
use crate::error::BaasResult;

fn with_class_name(object: &Object, class_name: &str) -> Object {
    let mut object = object.clone();
    object
        .entry(CLASS_NAME)
        .or_insert_with(|| Value::String(class_name.to_string()));
    object
}

/// Run a save or delete hook bound on `class_name`, if any.
///
/// Returns `None` when nothing is registered. Hook errors propagate
/// unchanged.
pub async fn maybe_run_trigger(
    registry: &TriggerRegistry,
    trigger_type: TriggerType,
    auth: &Auth,
    class_name: &str,
    object: &Object,
    original: Option<&Object>,
) -> BaasResult<Option<TriggerResponse>> {
    let Some(handler) = registry.lookup(trigger_type, class_name) else {
        return Ok(None);
    };
    debug!(trigger = %trigger_type, class_name, "run trigger");
    let request = TriggerRequest::new(trigger_type, auth)
        .with_object(with_class_name(object, class_name))
        .with_original(original.map(|o| with_class_name(o, class_name)));
    handler.handle(request).await.map(Some)
}

/// Run `beforeFind` and fold its overrides into the query.
pub async fn maybe_run_query_trigger(
    registry: &TriggerRegistry,
    auth: &Auth,
    class_name: &str,
    where_: Object,
    options: QueryOptions,
    is_get: bool,
) -> BaasResult<(Object, QueryOptions)> {
    let Some(handler) =
        registry.lookup(TriggerType::BeforeFind, class_name)
    else {
        return Ok((where_, options));
    };
    debug!(class_name, is_get, "run beforeFind trigger");
    let request = TriggerRequest::new(TriggerType::BeforeFind, auth)
        .with_query(&where_, &options, is_get);
    let response = handler.handle(request).await?;
    Ok(response.query.apply(where_, options))
}

/// Run `afterFind`; a returned object list replaces the results.
pub async fn maybe_run_after_find_trigger(
    registry: &TriggerRegistry,
    auth: &Auth,
    class_name: &str,
    objects: Vec<Object>,
    where_: &Object,
    options: &QueryOptions,
) -> BaasResult<Vec<Object>> {
    let Some(handler) = registry.lookup(TriggerType::AfterFind, class_name)
    else {
        return Ok(objects);
    };
    debug!(class_name, count = objects.len(), "run afterFind trigger");
    let request = TriggerRequest::new(TriggerType::AfterFind, auth)
        .with_query(where_, options, false)
        .with_objects(objects.clone());
    let response = handler.handle(request).await?;
    Ok(response.objects.unwrap_or(objects))
}

/// Run a file hook bound on `extension`, if any.
pub async fn maybe_run_file_trigger(
    registry: &TriggerRegistry,
    trigger_type: TriggerType,
    auth: &Auth,
    extension: &str,
    file: FileInfo,
) -> BaasResult<Option<TriggerResponse>> {
    let Some(handler) = registry.lookup(trigger_type, extension) else {
        return Ok(None);
    };
    debug!(trigger = %trigger_type, extension, file = %file.name, "run file trigger");
    let request = TriggerRequest::new(trigger_type, auth).with_file(file);
    handler.handle(request).await.map(Some)
}
