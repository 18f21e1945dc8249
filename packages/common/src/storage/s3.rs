use async_trait::async_trait;
use s3::bucket::Bucket;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::region::Region;

use super::error::StorageError;
use super::key::ObjectKey;
use super::traits::{BoxReader, ObjectStore, StoredObject, join_url};
use crate::config::S3StorageConfig;

/// S3-compatible object store backed by `rust-s3`.
pub struct S3ObjectStore {
    bucket: Box<Bucket>,
    public_url: String,
}

impl S3ObjectStore {
    pub fn new(config: &S3StorageConfig) -> Result<Self, StorageError> {
        let region = match &config.endpoint {
            Some(endpoint) => Region::Custom {
                region: config.region.clone(),
                endpoint: endpoint.clone(),
            },
            None => config
                .region
                .parse::<Region>()
                .map_err(|e| StorageError::Config(format!("invalid region: {e}")))?,
        };

        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Config(format!("invalid credentials: {e}")))?;

        let mut bucket = Bucket::new(&config.bucket, region, credentials)?;
        if config.path_style {
            bucket = bucket.with_path_style();
        }

        let public_url = config.public_url.clone().unwrap_or_else(|| bucket.url());

        Ok(Self { bucket, public_url })
    }
}

impl From<S3Error> for StorageError {
    fn from(err: S3Error) -> Self {
        StorageError::Provider(err.to_string())
    }
}

fn check_status(code: u16, key: &ObjectKey, action: &str) -> Result<(), StorageError> {
    match code {
        200..=299 => Ok(()),
        404 => Err(StorageError::NotFound(key.to_string())),
        other => Err(StorageError::Provider(format!(
            "{action} {key} failed with HTTP {other}"
        ))),
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_stream(
        &self,
        key: &ObjectKey,
        mut reader: BoxReader,
        content_type: &str,
    ) -> Result<StoredObject, StorageError> {
        let response = self
            .bucket
            .put_object_stream_with_content_type(&mut reader, key.as_str(), content_type)
            .await?;
        check_status(response.status_code(), key, "PUT")?;

        tracing::debug!(key = %key, bucket = %self.bucket.name(), "Stored object in S3");

        Ok(StoredObject {
            key: key.clone(),
            url: self.url_for(key),
        })
    }

    async fn get_stream(&self, key: &ObjectKey) -> Result<BoxReader, StorageError> {
        let response = self.bucket.get_object(key.as_str()).await?;
        check_status(response.status_code(), key, "GET")?;
        Ok(Box::new(std::io::Cursor::new(response.bytes().to_vec())))
    }

    async fn exists(&self, key: &ObjectKey) -> Result<bool, StorageError> {
        let (_, code) = self.bucket.head_object(key.as_str()).await?;
        match check_status(code, key, "HEAD") {
            Ok(()) => Ok(true),
            Err(StorageError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn delete(&self, key: &ObjectKey) -> Result<bool, StorageError> {
        // S3 answers 204 whether or not the key existed.
        if !self.exists(key).await? {
            return Ok(false);
        }
        let response = self.bucket.delete_object(key.as_str()).await?;
        check_status(response.status_code(), key, "DELETE")?;
        Ok(true)
    }

    fn url_for(&self, key: &ObjectKey) -> String {
        join_url(&self.public_url, key)
    }
}
