use std::path::PathBuf;

use serde::Deserialize;

/// Which object storage backend uploaded files are written to.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Filesystem,
    S3,
}

/// Object storage configuration shared by the server and its tooling.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Active backend. Default: "filesystem".
    #[serde(default)]
    pub backend: StorageBackend,
    /// Largest accepted upload in bytes. Default: 32 MiB.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,
    /// MIME types accepted for upload. Default: PDF and common image formats.
    #[serde(default = "default_allowed_content_types")]
    pub allowed_content_types: Vec<String>,
    #[serde(default)]
    pub filesystem: FilesystemStorageConfig,
    pub s3: Option<S3StorageConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FilesystemStorageConfig {
    /// Directory objects are written under. Default: "./data/objects".
    #[serde(default = "default_filesystem_path")]
    pub path: PathBuf,
    /// Public base URL objects are served from. When unset, the server's own
    /// `/objects` route under `app.public_url` is used.
    pub public_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct S3StorageConfig {
    pub bucket: String,
    /// Region name, e.g. "us-east-1".
    pub region: String,
    /// Custom endpoint for S3-compatible providers (MinIO, R2, ...).
    pub endpoint: Option<String>,
    pub access_key: String,
    pub secret_key: String,
    /// Public base URL objects are reachable at. Defaults to the bucket URL.
    pub public_url: Option<String>,
    /// Use path-style addressing. Default: false.
    #[serde(default)]
    pub path_style: bool,
}

fn default_max_upload_size() -> u64 {
    32 * 1024 * 1024
}

fn default_allowed_content_types() -> Vec<String> {
    [
        "application/pdf",
        "image/jpeg",
        "image/png",
        "image/gif",
        "image/webp",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_filesystem_path() -> PathBuf {
    PathBuf::from("./data/objects")
}

impl Default for FilesystemStorageConfig {
    fn default() -> Self {
        Self {
            path: default_filesystem_path(),
            public_url: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            max_upload_size: default_max_upload_size(),
            allowed_content_types: default_allowed_content_types(),
            filesystem: FilesystemStorageConfig::default(),
            s3: None,
        }
    }
}

impl StorageConfig {
    /// Whether `content_type` may be uploaded. Parameters such as `; charset=`
    /// are ignored and the comparison is case-insensitive.
    pub fn accepts(&self, content_type: &str) -> bool {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim();
        self.allowed_content_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(essence))
    }
}
