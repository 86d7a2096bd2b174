use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use baas_models::{Auth, Object};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::AdapterConfig;
use crate::error::{BaasError, BaasResult};
use crate::id::new_file_prefix;
use crate::triggers::{
    FileInfo, TriggerRegistry, TriggerType, maybe_run_file_trigger,
};

const CONTENT_TYPES: [(&str, &str); 11] = [
    ("txt", "text/plain"),
    ("html", "text/html"),
    ("json", "application/json"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("pdf", "application/pdf"),
    ("mp3", "audio/mpeg"),
    ("mp4", "video/mp4"),
    ("zip", "application/zip"),
];

pub fn content_type_for(extension: &str) -> Option<&'static str> {
    let extension = extension.to_ascii_lowercase();
    CONTENT_TYPES
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, ct)| *ct)
}

pub fn extension_for(content_type: &str) -> Option<&'static str> {
    CONTENT_TYPES
        .iter()
        .find(|(_, ct)| *ct == content_type)
        .map(|(ext, _)| *ext)
}

fn extension_of(filename: &str) -> Option<&str> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
}

/// Backing store for uploaded file bytes.
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn create_file(
        &self,
        filename: &str,
        data: &[u8],
        content_type: Option<&str>,
    ) -> BaasResult<()>;

    async fn delete_file(&self, filename: &str) -> BaasResult<()>;

    async fn get_file_data(&self, filename: &str) -> BaasResult<Vec<u8>>;

    /// Public URL at which `filename` is served.
    fn file_location(&self, filename: &str) -> String;
}

#[derive(Default)]
pub struct MemoryFileStore {
    files: scc::HashMap<String, Vec<u8>>,
    base_url: String,
}

impl MemoryFileStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            files: scc::HashMap::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn create_file(
        &self,
        filename: &str,
        data: &[u8],
        _content_type: Option<&str>,
    ) -> BaasResult<()> {
        self.files
            .upsert_async(filename.to_string(), data.to_vec())
            .await;
        Ok(())
    }

    async fn delete_file(&self, filename: &str) -> BaasResult<()> {
        self.files.remove_async(filename).await;
        Ok(())
    }

    async fn get_file_data(&self, filename: &str) -> BaasResult<Vec<u8>> {
        self.files
            .read_async(filename, |_, data| data.clone())
            .await
            .ok_or_else(|| {
                BaasError::ObjectNotFound(format!("File not found: {}", filename))
            })
    }

    fn file_location(&self, filename: &str) -> String {
        format!("{}/files/{}", self.base_url, filename)
    }
}

/// Files kept as plain files under one directory.
pub struct DiskFileStore {
    root: PathBuf,
    base_url: String,
}

impl DiskFileStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }

    fn path_for(&self, filename: &str) -> BaasResult<PathBuf> {
        let name = Path::new(filename);
        let mut components = name.components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.root.join(name)),
            _ => Err(BaasError::FileSaveError(format!(
                "Invalid file name: {}",
                filename
            ))),
        }
    }
}

#[async_trait]
impl FileStore for DiskFileStore {
    async fn create_file(
        &self,
        filename: &str,
        data: &[u8],
        _content_type: Option<&str>,
    ) -> BaasResult<()> {
        let path = self.path_for(filename)?;
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| BaasError::FileSaveError(e.to_string()))?;
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| BaasError::FileSaveError(e.to_string()))
    }

    async fn delete_file(&self, filename: &str) -> BaasResult<()> {
        let path = self.path_for(filename)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BaasError::FileSaveError(e.to_string())),
        }
    }

    async fn get_file_data(&self, filename: &str) -> BaasResult<Vec<u8>> {
        let path = self.path_for(filename)?;
        tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                BaasError::ObjectNotFound(format!("File not found: {}", filename))
            }
            _ => BaasError::Internal(e.to_string()),
        })
    }

    fn file_location(&self, filename: &str) -> String {
        format!("{}/files/{}", self.base_url, filename)
    }
}

pub fn create_file_store(config: &AdapterConfig) -> BaasResult<Arc<dyn FileStore>> {
    match config.file_adapter.as_str() {
        "memory" => Ok(Arc::new(MemoryFileStore::new(config.server_url.clone()))),
        "disk" => Ok(Arc::new(DiskFileStore::new(
            config.file_dir.clone(),
            config.server_url.clone(),
        ))),
        other => Err(BaasError::Config(format!(
            "unsupported file adapter: {}",
            other
        ))),
    }
}

/// Outcome of an upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavedFile {
    pub url: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Upload and lookup of files, with `beforeSaveFile`/`afterSaveFile` hooks
/// keyed by extension.
pub struct FilesController {
    store: Arc<dyn FileStore>,
    triggers: Arc<TriggerRegistry>,
}

impl FilesController {
    pub fn new(store: Arc<dyn FileStore>, triggers: Arc<TriggerRegistry>) -> Self {
        Self { store, triggers }
    }

    pub async fn create_file(
        &self,
        auth: &Auth,
        filename: &str,
        data: Vec<u8>,
        content_type: Option<&str>,
    ) -> BaasResult<SavedFile> {
        let mut filename = filename.to_string();
        let mut content_type = content_type.map(String::from);
        if extension_of(&filename).is_none() {
            if let Some(ext) = content_type.as_deref().and_then(extension_for) {
                filename = format!("{}.{}", filename, ext);
            }
        } else if content_type.is_none() {
            content_type = Self::content_type(&filename).map(String::from);
        }
        let extension = extension_of(&filename).unwrap_or_default().to_string();
        let stored_name = format!("{}_{}", new_file_prefix(), filename);
        let location = self.store.file_location(&stored_name);

        let file = FileInfo {
            name: filename.clone(),
            content_type: content_type.clone(),
            data,
            url: None,
        };
        let mut data = file.data.clone();
        if let Some(hook) = maybe_run_file_trigger(
            &self.triggers,
            TriggerType::BeforeFileUpload,
            auth,
            &extension,
            file,
        )
        .await?
        {
            if let Some(replaced) = hook.file_data {
                data = replaced;
            }
        }

        self.store
            .create_file(&stored_name, &data, content_type.as_deref())
            .await?;
        debug!(file = %stored_name, bytes = data.len(), "file stored");

        let saved = FileInfo {
            name: stored_name.clone(),
            content_type,
            data: Vec::new(),
            url: Some(location.clone()),
        };
        let hook_data = maybe_run_file_trigger(
            &self.triggers,
            TriggerType::AfterFileUpload,
            auth,
            &extension,
            saved,
        )
        .await?
        .and_then(|hook| hook.data);

        Ok(SavedFile {
            url: location,
            name: stored_name,
            data: hook_data,
        })
    }

    pub async fn get_file_data(&self, filename: &str) -> BaasResult<Vec<u8>> {
        self.store.get_file_data(filename).await
    }

    pub async fn delete_file(&self, filename: &str) -> BaasResult<()> {
        self.store.delete_file(filename).await
    }

    pub fn content_type(filename: &str) -> Option<&'static str> {
        extension_of(filename).and_then(content_type_for)
    }

    /// Fill in `url` on `{"__type": "File"}` fields that lack one.
    pub fn expand_files_in_object(&self, value: &mut Value) {
        match value {
            Value::Array(items) => {
                for item in items {
                    self.expand_files_in_object(item);
                }
            }
            Value::Object(object) => self.expand_file_fields(object),
            _ => {}
        }
    }

    fn expand_file_fields(&self, object: &mut Object) {
        for field in object.values_mut() {
            let Some(file) = field.as_object_mut() else {
                continue;
            };
            if file.get("__type").and_then(Value::as_str) != Some("File")
                || file.contains_key("url")
            {
                continue;
            }
            if let Some(name) = file.get("name").and_then(Value::as_str) {
                let url = self.store.file_location(name);
                file.insert("url".into(), Value::String(url));
            }
        }
    }
}
