use std::sync::Arc;

use tracing::info;

use crate::error::StorageError;
use crate::traits::{ObjectStorage, StorageResult};

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub storage_type: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            storage_type: "memory".to_string(),
        }
    }
}

/// Select the object storage backend named by `config.storage_type`.
pub fn create_object_storage(
    config: &StorageConfig,
) -> StorageResult<Arc<dyn ObjectStorage>> {
    info!("create object storage: {}", config.storage_type);
    match config.storage_type.as_str() {
        #[cfg(feature = "memory")]
        "memory" => Ok(Arc::new(crate::memory::MemoryObjectStorage::new())),
        other => Err(StorageError::Config(format!(
            "unsupported storage type: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_storage_type_rejected() {
        let conf = StorageConfig {
            storage_type: "cassandra".into(),
        };
        assert!(matches!(
            create_object_storage(&conf),
            Err(StorageError::Config(_))
        ));
    }

    #[test]
    fn test_memory_storage_selected_by_default() {
        assert!(create_object_storage(&StorageConfig::default()).is_ok());
    }
}
