use std::io::Cursor;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::StorageError;
use super::key::ObjectKey;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Result of a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: ObjectKey,
    /// Durable URL the object can be fetched from.
    pub url: String,
}

/// Remote object storage that hands back a durable URL for every write.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store bytes under `key`.
    async fn put(
        &self,
        key: &ObjectKey,
        data: &[u8],
        content_type: &str,
    ) -> Result<StoredObject, StorageError> {
        let reader: BoxReader = Box::new(Cursor::new(data.to_vec()));
        self.put_stream(key, reader, content_type).await
    }

    /// Store data from an async reader under `key`.
    async fn put_stream(
        &self,
        key: &ObjectKey,
        reader: BoxReader,
        content_type: &str,
    ) -> Result<StoredObject, StorageError>;

    /// Retrieve all bytes of an object.
    async fn get(&self, key: &ObjectKey) -> Result<Vec<u8>, StorageError> {
        let mut reader = self.get_stream(key).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Retrieve an object as a streaming async reader.
    async fn get_stream(&self, key: &ObjectKey) -> Result<BoxReader, StorageError>;

    /// Check whether an object exists.
    async fn exists(&self, key: &ObjectKey) -> Result<bool, StorageError>;

    /// Delete an object.
    ///
    /// Returns `true` if the object was deleted, `false` if it did not exist.
    async fn delete(&self, key: &ObjectKey) -> Result<bool, StorageError>;

    /// Public URL of the object stored under `key`.
    fn url_for(&self, key: &ObjectKey) -> String;
}

/// Join a base URL and a key with exactly one `/` between them.
pub(crate) fn join_url(base: &str, key: &ObjectKey) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key.as_str())
}
