#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use baas_core::livequery::LiveQueryRegistry;
use baas_core::{AccessPipeline, TriggerRegistry};
use baas_models::Object;
use baas_storage::memory::MemoryObjectStorage;
use baas_storage::{FindOptions, ObjectStorage, StorageHealth, StorageResult};
use serde_json::Value;

pub fn obj(v: Value) -> Object {
    v.as_object().cloned().expect("object literal")
}

/// Memory storage that counts the calls it serves.
#[derive(Default)]
pub struct CountingStorage {
    inner: MemoryObjectStorage,
    pub finds: AtomicUsize,
    pub counts: AtomicUsize,
    pub creates: AtomicUsize,
    pub updates: AtomicUsize,
    pub deletes: AtomicUsize,
}

impl CountingStorage {
    pub fn total(&self) -> usize {
        self.finds.load(Ordering::SeqCst)
            + self.counts.load(Ordering::SeqCst)
            + self.creates.load(Ordering::SeqCst)
            + self.updates.load(Ordering::SeqCst)
            + self.deletes.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        for counter in [
            &self.finds,
            &self.counts,
            &self.creates,
            &self.updates,
            &self.deletes,
        ] {
            counter.store(0, Ordering::SeqCst);
        }
    }

    pub async fn seed(&self, class_name: &str, object: Value) {
        self.inner
            .create(class_name, &obj(object))
            .await
            .expect("seed object");
    }

    pub async fn all(&self, class_name: &str) -> Vec<Object> {
        self.inner
            .find(class_name, &Object::new(), &FindOptions::default())
            .await
            .expect("list objects")
    }
}

#[async_trait]
impl StorageHealth for CountingStorage {
    async fn health(&self) -> StorageResult<()> {
        self.inner.health().await
    }
}

#[async_trait]
impl ObjectStorage for CountingStorage {
    async fn find(
        &self,
        class_name: &str,
        where_: &Object,
        options: &FindOptions,
    ) -> StorageResult<Vec<Object>> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        self.inner.find(class_name, where_, options).await
    }

    async fn count(&self, class_name: &str, where_: &Object) -> StorageResult<u64> {
        self.counts.fetch_add(1, Ordering::SeqCst);
        self.inner.count(class_name, where_).await
    }

    async fn create(&self, class_name: &str, object: &Object) -> StorageResult<()> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.inner.create(class_name, object).await
    }

    async fn update(
        &self,
        class_name: &str,
        where_: &Object,
        update: &Object,
        many: bool,
    ) -> StorageResult<Vec<Object>> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.inner.update(class_name, where_, update, many).await
    }

    async fn delete(&self, class_name: &str, where_: &Object) -> StorageResult<u64> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(class_name, where_).await
    }
}

pub struct Harness {
    pub storage: Arc<CountingStorage>,
    pub triggers: Arc<TriggerRegistry>,
    pub pipeline: Arc<AccessPipeline>,
}

pub fn harness_with(live_query: Arc<dyn LiveQueryRegistry>) -> Harness {
    let storage = Arc::new(CountingStorage::default());
    let triggers = Arc::new(TriggerRegistry::new());
    let pipeline = Arc::new(AccessPipeline::with_storage(
        storage.clone(),
        triggers.clone(),
        live_query,
        "http://localhost:8080/v1",
    ));
    Harness {
        storage,
        triggers,
        pipeline,
    }
}

pub fn harness() -> Harness {
    harness_with(Arc::new(baas_core::NoLiveQuery))
}
