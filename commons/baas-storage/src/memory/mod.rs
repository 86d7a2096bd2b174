use async_trait::async_trait;
use baas_models::{Object, object_id};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::StorageError;
use crate::matcher::{apply_update, matches, project, sort_objects};
use crate::traits::*;

type ClassStore = BTreeMap<String, Object>;
type MemoryStore = Arc<RwLock<HashMap<String, ClassStore>>>;

/// Process-local object storage, mainly for development and tests.
#[derive(Clone, Default)]
pub struct MemoryObjectStorage {
    store: MemoryStore,
}

impl MemoryObjectStorage {
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

fn filter_matches<'a>(
    class: &'a ClassStore,
    where_: &Object,
) -> StorageResult<Vec<&'a Object>> {
    let mut out = Vec::new();
    for object in class.values() {
        if matches(where_, object)? {
            out.push(object);
        }
    }
    Ok(out)
}

#[async_trait]
impl StorageHealth for MemoryObjectStorage {
    async fn health(&self) -> StorageResult<()> {
        Ok(())
    }
}

#[async_trait]
impl ObjectStorage for MemoryObjectStorage {
    async fn find(
        &self,
        class_name: &str,
        where_: &Object,
        options: &FindOptions,
    ) -> StorageResult<Vec<Object>> {
        let store = self.store.read().await;
        let Some(class) = store.get(class_name) else {
            return Ok(vec![]);
        };
        let mut found: Vec<Object> = filter_matches(class, where_)?
            .into_iter()
            .cloned()
            .collect();
        sort_objects(&mut found, &options.order);

        let skip = options.skip.unwrap_or(0);
        let limit = options.limit.unwrap_or(usize::MAX);
        let found = found.into_iter().skip(skip).take(limit);
        let found = match &options.keys {
            Some(keys) => found.map(|o| project(&o, keys)).collect(),
            None => found.collect(),
        };
        Ok(found)
    }

    async fn count(
        &self,
        class_name: &str,
        where_: &Object,
    ) -> StorageResult<u64> {
        let store = self.store.read().await;
        match store.get(class_name) {
            Some(class) => Ok(filter_matches(class, where_)?.len() as u64),
            None => Ok(0),
        }
    }

    async fn create(
        &self,
        class_name: &str,
        object: &Object,
    ) -> StorageResult<()> {
        let id = object_id(object)
            .ok_or_else(|| StorageError::InvalidKey("missing objectId".into()))?
            .to_string();
        let mut store = self.store.write().await;
        let class = store.entry(class_name.to_string()).or_default();
        if class.contains_key(&id) {
            return Err(StorageError::AlreadyExists(format!(
                "{}/{}",
                class_name, id
            )));
        }
        class.insert(id, object.clone());
        Ok(())
    }

    async fn update(
        &self,
        class_name: &str,
        where_: &Object,
        update: &Object,
        many: bool,
    ) -> StorageResult<Vec<Object>> {
        let mut store = self.store.write().await;
        let Some(class) = store.get_mut(class_name) else {
            return Ok(vec![]);
        };
        // every target is updated on a copy; nothing is committed unless all succeed
        let mut staged = Vec::new();
        for (id, object) in class.iter() {
            if matches(where_, object)? {
                let mut next = object.clone();
                apply_update(&mut next, update)?;
                staged.push((id.clone(), next));
                if !many {
                    break;
                }
            }
        }
        let mut updated = Vec::with_capacity(staged.len());
        for (id, next) in staged {
            class.insert(id, next.clone());
            updated.push(next);
        }
        Ok(updated)
    }

    async fn delete(
        &self,
        class_name: &str,
        where_: &Object,
    ) -> StorageResult<u64> {
        let mut store = self.store.write().await;
        let Some(class) = store.get_mut(class_name) else {
            return Ok(0);
        };
        let mut targets = Vec::new();
        for (id, object) in class.iter() {
            if matches(where_, object)? {
                targets.push(id.clone());
            }
        }
        for id in &targets {
            class.remove(id);
        }
        Ok(targets.len() as u64)
    }
}
