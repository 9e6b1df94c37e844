//! Output sinks for normalized frames
//! Uses Apache Arrow object_store crate

pub mod format;

pub use format::OutputFormat;

use async_trait::async_trait;
use object_store::{ObjectStore, local::LocalFileSystem, path::Path as StoragePath};
use polars::prelude::DataFrame;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::dates::DateRange;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Invalid output format [{0}]. Must be one of: csv, parquet.")]
    InvalidFormat(String),

    #[error("Encoding failed: {0}")]
    Encode(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Object store error: {0}")]
    ObjectStoreError(#[from] object_store::Error),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, SinkError>;

/// `{prefix}_{startUnix}_{endUnix}.{ext}` for the first and last day of the range
pub fn output_file_name(prefix: &str, date_range: &DateRange, format: OutputFormat) -> String {
    format!(
        "{}_{}_{}.{}",
        prefix,
        date_range.start_timestamp(),
        date_range.end_timestamp(),
        format.extension()
    )
}

/// Metadata returned after upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadMetadata {
    pub key: String,
    pub etag: Option<String>,
    pub size: usize,
}

/// Durable destination for normalized frames
#[async_trait]
pub trait Sink: Send + Sync {
    /// Write `frame` as `file_name` encoded in `format`
    async fn write(&self, frame: &DataFrame, file_name: &str, format: OutputFormat) -> Result<UploadMetadata>;
}

/// Storage client wrapping object_store
#[derive(Clone)]
pub struct StorageClient {
    store: Arc<dyn ObjectStore>,
    root: Option<PathBuf>,
}

impl StorageClient {
    /// Create new storage client with any object_store backend
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store, root: None }
    }

    /// Store files under a local directory, creating it if needed
    pub fn local(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let store = LocalFileSystem::new_with_prefix(dir)?;

        Ok(Self {
            store: Arc::new(store),
            root: Some(dir.to_path_buf()),
        })
    }

    /// Create in-memory storage for testing/development
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(object_store::memory::InMemory::new()),
            root: None,
        }
    }

    /// Local directory backing this client, if any
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Upload bytes to storage
    pub async fn upload(&self, key: &str, data: Vec<u8>) -> Result<UploadMetadata> {
        let path = StoragePath::from(key);
        let size = data.len();

        let put_result = self.store.put(&path, data.into()).await?;

        tracing::debug!(key, size, "Uploaded to storage");

        Ok(UploadMetadata {
            key: key.to_string(),
            etag: put_result.e_tag.clone(),
            size,
        })
    }

    /// Download from storage
    pub async fn download(&self, key: &str) -> Result<Vec<u8>> {
        let path = StoragePath::from(key);

        let result = self.store.get(&path).await?;
        let bytes = result.bytes().await?;

        Ok(bytes.to_vec())
    }

    /// Check if key exists
    pub async fn exists(&self, key: &str) -> Result<bool> {
        let path = StoragePath::from(key);

        match self.store.head(&path).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Sink that encodes frames and uploads them through a [`StorageClient`]
#[derive(Clone)]
pub struct ObjectStoreSink {
    storage: StorageClient,
}

impl ObjectStoreSink {
    pub fn new(storage: StorageClient) -> Self {
        Self { storage }
    }

    pub fn local(dir: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(StorageClient::local(dir)?))
    }

    pub fn in_memory() -> Self {
        Self::new(StorageClient::in_memory())
    }

    pub fn storage(&self) -> &StorageClient {
        &self.storage
    }
}

#[async_trait]
impl Sink for ObjectStoreSink {
    async fn write(&self, frame: &DataFrame, file_name: &str, format: OutputFormat) -> Result<UploadMetadata> {
        let bytes = format.encode(frame)?;
        let metadata = self.storage.upload(file_name, bytes).await?;

        match self.storage.root() {
            Some(root) => tracing::info!(
                path = %root.join(file_name).display(),
                rows = frame.height(),
                "Saved ETL output"
            ),
            None => tracing::info!(key = file_name, rows = frame.height(), "Saved ETL output"),
        }

        Ok(metadata)
    }
}
