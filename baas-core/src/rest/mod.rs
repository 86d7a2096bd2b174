//! Trigger-aware access pipeline in front of the execution engines.

mod security;

use std::sync::Arc;

use baas_models::{
    Auth, CLASS_NAME, ClientInfo, FindResponse, OBJECT_ID, Object, QueryOptions,
    WriteResponse, where_object_id,
};
use baas_storage::ObjectStorage;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::{BaasError, BaasResult};
use crate::executor::{
    DestroyExecutor, QueryExecutor, StoreDestroyExecutor, StoreQueryExecutor,
    StoreWriteExecutor, WriteExecutor, WriteRequest,
};
use crate::livequery::LiveQueryRegistry;
use crate::triggers::{TriggerRegistry, TriggerType, maybe_run_query_trigger};

pub use security::{
    INSTALLATION_CLASS, MASTER_ONLY_CLASSES, Method, SESSION_CLASS, USER_CLASS,
    enforce_role_security,
};

const SAVE_TRIGGERS: [TriggerType; 2] =
    [TriggerType::BeforeSave, TriggerType::AfterSave];
const DELETE_TRIGGERS: [TriggerType; 2] =
    [TriggerType::BeforeDelete, TriggerType::AfterDelete];

/// Entry point for every client data operation.
///
/// Each operation checks class-level role security, decides whether the
/// current object must be fetched first, runs query hooks, and then hands
/// off to the injected executors. Errors from any step end the operation.
pub struct AccessPipeline {
    triggers: Arc<TriggerRegistry>,
    live_query: Arc<dyn LiveQueryRegistry>,
    query: Arc<dyn QueryExecutor>,
    write: Arc<dyn WriteExecutor>,
    destroy: Arc<dyn DestroyExecutor>,
}

impl AccessPipeline {
    pub fn new(
        triggers: Arc<TriggerRegistry>,
        live_query: Arc<dyn LiveQueryRegistry>,
        query: Arc<dyn QueryExecutor>,
        write: Arc<dyn WriteExecutor>,
        destroy: Arc<dyn DestroyExecutor>,
    ) -> Self {
        Self {
            triggers,
            live_query,
            query,
            write,
            destroy,
        }
    }

    /// Pipeline wired to the storage-backed executors.
    pub fn with_storage(
        storage: Arc<dyn ObjectStorage>,
        triggers: Arc<TriggerRegistry>,
        live_query: Arc<dyn LiveQueryRegistry>,
        server_url: impl Into<String>,
    ) -> Self {
        let query =
            Arc::new(StoreQueryExecutor::new(storage.clone(), triggers.clone()));
        let write = Arc::new(StoreWriteExecutor::new(
            storage.clone(),
            triggers.clone(),
            live_query.clone(),
            server_url,
        ));
        let destroy = Arc::new(StoreDestroyExecutor::new(
            storage,
            triggers.clone(),
            live_query.clone(),
        ));
        Self::new(triggers, live_query, query, write, destroy)
    }

    pub fn triggers(&self) -> &Arc<TriggerRegistry> {
        &self.triggers
    }

    #[instrument(level = "debug", skip(self, auth, where_, options, client))]
    pub async fn find(
        &self,
        auth: &Auth,
        class_name: &str,
        where_: Object,
        options: QueryOptions,
        client: &ClientInfo,
    ) -> BaasResult<FindResponse> {
        enforce_role_security(Method::Find, class_name, auth)?;
        let (where_, options) = maybe_run_query_trigger(
            &self.triggers,
            auth,
            class_name,
            where_,
            options,
            false,
        )
        .await?;
        self.query
            .execute(auth, class_name, where_, options, client)
            .await
    }

    /// Find restricted to one objectId; an empty result is `ObjectNotFound`.
    #[instrument(level = "debug", skip(self, auth, options, client))]
    pub async fn get(
        &self,
        auth: &Auth,
        class_name: &str,
        object_id: &str,
        options: QueryOptions,
        client: &ClientInfo,
    ) -> BaasResult<Object> {
        enforce_role_security(Method::Get, class_name, auth)?;
        let (where_, options) = maybe_run_query_trigger(
            &self.triggers,
            auth,
            class_name,
            where_object_id(object_id),
            options,
            true,
        )
        .await?;
        self.query
            .execute(auth, class_name, where_, options, client)
            .await?
            .into_first()
            .ok_or_else(|| BaasError::ObjectNotFound("Object not found.".into()))
    }

    #[instrument(level = "debug", skip(self, auth, object, client))]
    pub async fn create(
        &self,
        auth: &Auth,
        class_name: &str,
        object: Object,
        client: &ClientInfo,
    ) -> BaasResult<WriteResponse> {
        enforce_role_security(Method::Create, class_name, auth)?;
        let request =
            WriteRequest::create(auth, class_name, object).with_client(client);
        self.write.execute(request).await
    }

    #[instrument(level = "debug", skip(self, auth, object, client))]
    pub async fn update(
        &self,
        auth: &Auth,
        class_name: &str,
        object_id: &str,
        object: Object,
        client: &ClientInfo,
    ) -> BaasResult<WriteResponse> {
        enforce_role_security(Method::Update, class_name, auth)?;

        let original = if self.triggers.exists_any(&SAVE_TRIGGERS, class_name)
            || self.live_query.has_subscription(class_name)
        {
            debug!(class_name, object_id, "fetch original before update");
            Some(
                self.fetch_original(auth, class_name, object_id, client)
                    .await?,
            )
        } else {
            None
        };

        let request = WriteRequest::update(
            auth,
            class_name,
            where_object_id(object_id),
            object,
        )
        .with_original(original)
        .with_client(client);
        self.write.execute(request).await
    }

    #[instrument(level = "debug", skip(self, auth))]
    pub async fn delete(
        &self,
        auth: &Auth,
        class_name: &str,
        object_id: &str,
    ) -> BaasResult<()> {
        if class_name == USER_CLASS && !auth.could_update_user_id(object_id) {
            return Err(BaasError::SessionMissing(
                "insufficient auth to delete user".into(),
            ));
        }
        enforce_role_security(Method::Delete, class_name, auth)?;

        let original = if self.triggers.exists_any(&DELETE_TRIGGERS, class_name)
            || self.live_query.has_subscription(class_name)
            || class_name == SESSION_CLASS
        {
            let mut original = self
                .fetch_original(auth, class_name, object_id, &ClientInfo::new())
                .await?;
            original.insert(
                CLASS_NAME.into(),
                Value::String(class_name.to_string()),
            );
            if class_name == SESSION_CLASS && !auth.is_master() {
                ensure_session_owner(auth, &original)?;
            }
            Some(original)
        } else {
            None
        };

        self.destroy
            .execute(auth, class_name, where_object_id(object_id), original)
            .await
    }

    /// Bulk update bypassing role security and per-object hooks.
    ///
    /// Used by internal jobs that act with master authority.
    pub async fn update_many(
        &self,
        class_name: &str,
        where_: Object,
        data: Object,
    ) -> BaasResult<WriteResponse> {
        let request =
            WriteRequest::update(&Auth::master(), class_name, where_, data).many();
        self.write.execute(request).await
    }

    async fn fetch_original(
        &self,
        auth: &Auth,
        class_name: &str,
        object_id: &str,
        client: &ClientInfo,
    ) -> BaasResult<Object> {
        self.find(
            auth,
            class_name,
            where_object_id(object_id),
            QueryOptions::default(),
            client,
        )
        .await?
        .into_first()
        .ok_or_else(|| BaasError::ObjectNotFound("Object not found.".into()))
    }
}

fn ensure_session_owner(auth: &Auth, session: &Object) -> BaasResult<()> {
    let owner = session
        .get("user")
        .and_then(|u| u.get(OBJECT_ID))
        .and_then(Value::as_str);
    match (owner, auth.user_id()) {
        (Some(owner), Some(caller)) if owner == caller => Ok(()),
        _ => Err(BaasError::InvalidSessionToken("invalid session token".into())),
    }
}
