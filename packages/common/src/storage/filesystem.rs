use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};

use super::error::StorageError;
use super::key::ObjectKey;
use super::traits::{BoxReader, ObjectStore, StoredObject, join_url};

/// Filesystem-backed object store.
///
/// Objects live at `{base_path}/{key}`; URLs are `{public_url}/{key}`, which
/// the server resolves through its own `/objects` route.
pub struct FilesystemObjectStore {
    base_path: PathBuf,
    public_url: String,
    max_size: u64,
}

impl FilesystemObjectStore {
    /// Create a new filesystem object store.
    pub async fn new(
        base_path: PathBuf,
        public_url: impl Into<String>,
        max_size: u64,
    ) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            public_url: public_url.into(),
            max_size,
        })
    }

    fn object_path(&self, key: &ObjectKey) -> PathBuf {
        key.segments()
            .fold(self.base_path.clone(), |path, segment| path.join(segment))
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }
}

#[async_trait]
impl ObjectStore for FilesystemObjectStore {
    async fn put_stream(
        &self,
        key: &ObjectKey,
        mut reader: BoxReader,
        _content_type: &str,
    ) -> Result<StoredObject, StorageError> {
        let temp_path = self.temp_path();
        let mut total_bytes: u64 = 0;

        let mut buf = vec![0u8; 64 * 1024];
        let mut temp_file = fs::File::create(&temp_path).await?;

        loop {
            let n = match reader.read(&mut buf).await {
                Ok(n) => n,
                Err(e) => {
                    drop(temp_file);
                    let _ = fs::remove_file(&temp_path).await;
                    return Err(e.into());
                }
            };
            if n == 0 {
                break;
            }

            total_bytes += n as u64;
            if total_bytes > self.max_size {
                drop(temp_file);
                let _ = fs::remove_file(&temp_path).await;
                return Err(StorageError::SizeLimitExceeded {
                    actual: total_bytes,
                    limit: self.max_size,
                });
            }

            temp_file.write_all(&buf[..n]).await?;
        }

        temp_file.flush().await?;
        drop(temp_file);

        let object_path = self.object_path(key);
        if let Some(parent) = object_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        if let Err(e) = fs::rename(&temp_path, &object_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        tracing::debug!(key = %key, bytes = total_bytes, "Stored object on filesystem");

        Ok(StoredObject {
            key: key.clone(),
            url: self.url_for(key),
        })
    }

    async fn get_stream(&self, key: &ObjectKey) -> Result<BoxReader, StorageError> {
        match fs::File::open(self.object_path(key)).await {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &ObjectKey) -> Result<bool, StorageError> {
        Ok(fs::try_exists(self.object_path(key)).await?)
    }

    async fn delete(&self, key: &ObjectKey) -> Result<bool, StorageError> {
        let path = self.object_path(key);
        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        }

        // Drop the per-upload directory once it is empty.
        if let Some(parent) = path.parent().filter(|p| *p != self.base_path) {
            match fs::remove_dir(parent).await {
                Ok(()) => {}
                Err(e)
                    if matches!(
                        e.kind(),
                        ErrorKind::NotFound | ErrorKind::DirectoryNotEmpty
                    ) => {}
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Failed to remove object directory")
                }
            }
        }
        Ok(true)
    }

    fn url_for(&self, key: &ObjectKey) -> String {
        join_url(&self.public_url, key)
    }
}
