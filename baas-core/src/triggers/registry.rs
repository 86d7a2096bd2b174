use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::types::{TriggerRequest, TriggerResult, TriggerType};
use crate::error::{BaasError, BaasResult};

const SESSION_CLASS: &str = "_Session";

/// User code bound to a lifecycle point.
#[async_trait]
pub trait TriggerHandler: Send + Sync {
    async fn handle(&self, request: TriggerRequest) -> TriggerResult;
}

#[async_trait]
impl<F, Fut> TriggerHandler for F
where
    F: Fn(TriggerRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = TriggerResult> + Send + 'static,
{
    async fn handle(&self, request: TriggerRequest) -> TriggerResult {
        (self)(request).await
    }
}

type TriggerKey = (TriggerType, String);

/// Process-wide hook table keyed by (trigger type, class name or file
/// extension). Populated at startup, read on every operation.
#[derive(Default)]
pub struct TriggerRegistry {
    triggers: scc::HashMap<TriggerKey, Arc<dyn TriggerHandler>>,
}

impl TriggerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `handler` to `trigger_type` on `selector`, replacing any earlier
    /// binding. Class hooks on `_Session` are refused.
    pub fn register<H>(
        &self,
        trigger_type: TriggerType,
        selector: &str,
        handler: H,
    ) -> BaasResult<()>
    where
        H: TriggerHandler + 'static,
    {
        if !trigger_type.is_file_trigger() && selector == SESSION_CLASS {
            return Err(BaasError::ScriptFailed(
                "Triggers are not supported for _Session class.".into(),
            ));
        }
        debug!(trigger = %trigger_type, selector, "register trigger");
        self.triggers.upsert(
            (trigger_type, selector.to_string()),
            Arc::new(handler) as Arc<dyn TriggerHandler>,
        );
        Ok(())
    }

    pub fn before_save<H: TriggerHandler + 'static>(
        &self,
        class_name: &str,
        handler: H,
    ) -> BaasResult<()> {
        self.register(TriggerType::BeforeSave, class_name, handler)
    }

    pub fn after_save<H: TriggerHandler + 'static>(
        &self,
        class_name: &str,
        handler: H,
    ) -> BaasResult<()> {
        self.register(TriggerType::AfterSave, class_name, handler)
    }

    pub fn before_delete<H: TriggerHandler + 'static>(
        &self,
        class_name: &str,
        handler: H,
    ) -> BaasResult<()> {
        self.register(TriggerType::BeforeDelete, class_name, handler)
    }

    pub fn after_delete<H: TriggerHandler + 'static>(
        &self,
        class_name: &str,
        handler: H,
    ) -> BaasResult<()> {
        self.register(TriggerType::AfterDelete, class_name, handler)
    }

    pub fn before_find<H: TriggerHandler + 'static>(
        &self,
        class_name: &str,
        handler: H,
    ) -> BaasResult<()> {
        self.register(TriggerType::BeforeFind, class_name, handler)
    }

    pub fn after_find<H: TriggerHandler + 'static>(
        &self,
        class_name: &str,
        handler: H,
    ) -> BaasResult<()> {
        self.register(TriggerType::AfterFind, class_name, handler)
    }

    pub fn before_save_file<H: TriggerHandler + 'static>(
        &self,
        extension: &str,
        handler: H,
    ) -> BaasResult<()> {
        self.register(TriggerType::BeforeFileUpload, extension, handler)
    }

    pub fn after_save_file<H: TriggerHandler + 'static>(
        &self,
        extension: &str,
        handler: H,
    ) -> BaasResult<()> {
        self.register(TriggerType::AfterFileUpload, extension, handler)
    }

    pub fn lookup(
        &self,
        trigger_type: TriggerType,
        selector: &str,
    ) -> Option<Arc<dyn TriggerHandler>> {
        self.triggers
            .read(&(trigger_type, selector.to_string()), |_, h| h.clone())
    }

    pub fn exists(&self, trigger_type: TriggerType, selector: &str) -> bool {
        self.triggers
            .contains(&(trigger_type, selector.to_string()))
    }

    /// True when any of `trigger_types` is bound on `selector`.
    pub fn exists_any(
        &self,
        trigger_types: &[TriggerType],
        selector: &str,
    ) -> bool {
        trigger_types.iter().any(|t| self.exists(*t, selector))
    }

    pub fn unregister(&self, trigger_type: TriggerType, selector: &str) -> bool {
        self.triggers
            .remove(&(trigger_type, selector.to_string()))
            .is_some()
    }

    pub fn unregister_all(&self) {
        self.triggers.clear();
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triggers::TriggerResponse;
    use baas_models::Auth;

    async fn noop(_req: TriggerRequest) -> TriggerResult {
        Ok(TriggerResponse::empty())
    }

    #[tokio::test]
    async fn test_register_and_lookup() {
        let registry = TriggerRegistry::new();
        registry.before_save("GameScore", noop).unwrap();
        assert!(registry.exists(TriggerType::BeforeSave, "GameScore"));
        assert!(!registry.exists(TriggerType::AfterSave, "GameScore"));
        assert!(registry.exists_any(
            &[TriggerType::AfterSave, TriggerType::BeforeSave],
            "GameScore"
        ));

        let handler = registry
            .lookup(TriggerType::BeforeSave, "GameScore")
            .unwrap();
        let req = TriggerRequest::new(TriggerType::BeforeSave, &Auth::master());
        assert_eq!(handler.handle(req).await.unwrap(), TriggerResponse::empty());
    }

    #[test]
    fn test_session_class_hooks_rejected() {
        let registry = TriggerRegistry::new();
        let err = registry.before_delete("_Session", noop).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Triggers are not supported for _Session class."
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unregister() {
        let registry = TriggerRegistry::new();
        registry.after_find("Post", noop).unwrap();
        registry.before_save_file("png", noop).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.unregister(TriggerType::AfterFind, "Post"));
        assert!(!registry.unregister(TriggerType::AfterFind, "Post"));
        registry.unregister_all();
        assert!(registry.is_empty());
    }
}
