//! Execution engines the access pipeline delegates to once security and
//! hook bookkeeping are done.

mod destroy;
mod query;
mod write;

use async_trait::async_trait;
use baas_models::{Auth, ClientInfo, FindResponse, Object, QueryOptions, WriteResponse};

use crate::error::BaasResult;

pub use destroy::StoreDestroyExecutor;
pub use query::StoreQueryExecutor;
pub use write::StoreWriteExecutor;

#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(
        &self,
        auth: &Auth,
        class_name: &str,
        where_: Object,
        options: QueryOptions,
        client: &ClientInfo,
    ) -> BaasResult<FindResponse>;
}

/// A create (no `query`) or an update (with `query`).
#[derive(Debug, Clone)]
pub struct WriteRequest {
    pub auth: Auth,
    pub class_name: String,
    pub query: Option<Object>,
    pub data: Object,
    pub original: Option<Object>,
    /// Apply to every match and skip per-object hooks.
    pub many: bool,
    pub client: ClientInfo,
}

impl WriteRequest {
    pub fn create(auth: &Auth, class_name: &str, data: Object) -> Self {
        Self {
            auth: auth.clone(),
            class_name: class_name.to_string(),
            query: None,
            data,
            original: None,
            many: false,
            client: ClientInfo::new(),
        }
    }

    pub fn update(
        auth: &Auth,
        class_name: &str,
        query: Object,
        data: Object,
    ) -> Self {
        Self {
            query: Some(query),
            ..Self::create(auth, class_name, data)
        }
    }

    pub fn with_original(mut self, original: Option<Object>) -> Self {
        self.original = original;
        self
    }

    pub fn with_client(mut self, client: &ClientInfo) -> Self {
        self.client = client.clone();
        self
    }

    pub fn many(mut self) -> Self {
        self.many = true;
        self
    }
}

#[async_trait]
pub trait WriteExecutor: Send + Sync {
    async fn execute(&self, request: WriteRequest) -> BaasResult<WriteResponse>;
}

#[async_trait]
pub trait DestroyExecutor: Send + Sync {
    /// Delete what `query` matches. `original` is the pre-fetched object
    /// when hooks or live query need it.
    async fn execute(
        &self,
        auth: &Auth,
        class_name: &str,
        query: Object,
        original: Option<Object>,
    ) -> BaasResult<()>;
}
