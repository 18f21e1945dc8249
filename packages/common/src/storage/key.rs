use std::fmt;

use uuid::Uuid;

use super::error::StorageError;

/// Prefix under which every uploaded object is stored.
const UPLOAD_PREFIX: &str = "uploads";

/// Longest accepted key, matching the S3 object key limit.
const MAX_KEY_LEN: usize = 1024;

/// A validated, relative object key such as `uploads/<uuid>/report.pdf`.
///
/// Keys are `/`-separated, never absolute, and never contain `..` segments,
/// backslashes or control characters, so they can be joined onto a
/// filesystem root or used verbatim as an S3 object path.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Generate a fresh key for an uploaded file.
    ///
    /// Each call yields a distinct key, so two uploads of the same file never
    /// overwrite each other.
    pub fn for_upload(filename: &str) -> Self {
        Self(format!(
            "{UPLOAD_PREFIX}/{}/{}",
            Uuid::now_v7(),
            sanitize_segment(filename)
        ))
    }

    /// Parse and validate an existing key.
    pub fn parse(raw: &str) -> Result<Self, StorageError> {
        if raw.is_empty() {
            return Err(StorageError::InvalidKey("key is empty".into()));
        }
        if raw.len() > MAX_KEY_LEN {
            return Err(StorageError::InvalidKey(format!(
                "key exceeds {MAX_KEY_LEN} bytes"
            )));
        }
        if raw.starts_with('/') {
            return Err(StorageError::InvalidKey("key must be relative".into()));
        }
        if raw.contains('\\') {
            return Err(StorageError::InvalidKey(
                "key must not contain backslashes".into(),
            ));
        }
        if raw.chars().any(|c| c.is_control()) {
            return Err(StorageError::InvalidKey(
                "key must not contain control characters".into(),
            ));
        }
        if raw
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..")
        {
            return Err(StorageError::InvalidKey(format!(
                "key has an empty or relative segment: {raw}"
            )));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the key was minted by [`ObjectKey::for_upload`].
    pub fn is_upload(&self) -> bool {
        self.segments().next() == Some(UPLOAD_PREFIX)
    }

    /// Iterate over the `/`-separated segments of the key.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

/// Reduce an arbitrary filename to a single safe key segment.
fn sanitize_segment(filename: &str) -> String {
    let cleaned: String = filename
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

impl AsRef<str> for ObjectKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectKey({})", self.0)
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
