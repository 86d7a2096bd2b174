use crate::error::StorageError;
use async_trait::async_trait;
use baas_models::Object;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub descending: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub limit: Option<usize>,
    pub skip: Option<usize>,
    pub order: Vec<SortKey>,
    /// Projection; `None` returns every field.
    pub keys: Option<Vec<String>>,
}

impl FindOptions {
    /// Parse a comma separated sort spec such as `-score,name`.
    pub fn parse_order(order: &str) -> Vec<SortKey> {
        order
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| match s.strip_prefix('-') {
                Some(field) => SortKey {
                    field: field.to_string(),
                    descending: true,
                },
                None => SortKey {
                    field: s.to_string(),
                    descending: false,
                },
            })
            .collect()
    }

    pub fn parse_keys(keys: &str) -> Vec<String> {
        keys.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }
}

#[async_trait]
pub trait StorageHealth: Send + Sync {
    /// Lightweight connectivity check to the backing store.
    async fn health(&self) -> StorageResult<()>;
}

/// Class-partitioned document store.
///
/// `where_` clauses use the document-store shape understood by
/// [`crate::matcher::matches`]; update payloads use the operator shape
/// understood by [`crate::matcher::apply_update`].
#[async_trait]
pub trait ObjectStorage: Send + Sync + StorageHealth {
    async fn find(
        &self,
        class_name: &str,
        where_: &Object,
        options: &FindOptions,
    ) -> StorageResult<Vec<Object>>;

    async fn count(&self, class_name: &str, where_: &Object)
    -> StorageResult<u64>;

    /// Insert `object`; it must carry an `objectId` unique within the class.
    async fn create(&self, class_name: &str, object: &Object)
    -> StorageResult<()>;

    /// Apply `update` to the first match, or to every match when `many` is set.
    /// Returns the updated objects.
    async fn update(
        &self,
        class_name: &str,
        where_: &Object,
        update: &Object,
        many: bool,
    ) -> StorageResult<Vec<Object>>;

    /// Remove every match and return how many were removed.
    async fn delete(&self, class_name: &str, where_: &Object)
    -> StorageResult<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_order() {
        let keys = FindOptions::parse_order("-score, name,");
        assert_eq!(
            keys,
            vec![
                SortKey {
                    field: "score".into(),
                    descending: true
                },
                SortKey {
                    field: "name".into(),
                    descending: false
                },
            ]
        );
    }
}
