use std::path::PathBuf;

use axum::extract::Multipart;
use axum::extract::multipart::Field;
use common::StorageConfig;
use common::storage::BoxReader;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use super::service::IncomingFile;
use crate::error::AppError;
use crate::utils::filename::{resolve_content_type, validate_upload_filename};

/// An uploaded file part spooled to a temp file. The temp file is removed on drop.
pub struct SpooledFile {
    pub name: String,
    pub content_type: String,
    pub size: u64,
    path: PathBuf,
}

impl SpooledFile {
    /// Reopen the spooled bytes for streaming into storage.
    pub async fn open(&self) -> Result<IncomingFile, AppError> {
        let file = tokio::fs::File::open(&self.path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to reopen temp file: {e}")))?;
        let reader: BoxReader = Box::new(file);
        Ok(IncomingFile {
            name: self.name.clone(),
            content_type: self.content_type.clone(),
            size: self.size,
            reader,
        })
    }
}

impl Drop for SpooledFile {
    fn drop(&mut self) {
        // Best effort.
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Fields of an upload form.
#[derive(Default)]
pub struct UploadForm {
    pub file: Option<SpooledFile>,
    pub email: Option<String>,
}

impl UploadForm {
    pub fn require_file(self) -> Result<(SpooledFile, Option<String>), AppError> {
        match self.file {
            Some(file) => Ok((file, self.email)),
            None => Err(AppError::Validation("No file uploaded".into())),
        }
    }
}

/// Read the `file` and `email` fields of a multipart upload. Unknown fields
/// are ignored.
pub async fn read_upload_form(
    mut multipart: Multipart,
    storage: &StorageConfig,
) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("file") => {
                form.file = Some(spool_file_field(field, storage).await?);
            }
            Some("email") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read email: {e}")))?;
                let text = text.trim();
                if !text.is_empty() {
                    form.email = Some(text.to_string());
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

async fn spool_file_field(
    mut field: Field<'_>,
    storage: &StorageConfig,
) -> Result<SpooledFile, AppError> {
    let raw_name = field
        .file_name()
        .ok_or_else(|| AppError::Validation("File field must have a filename".into()))?;
    let name = validate_upload_filename(raw_name)
        .map_err(|e| AppError::Validation(e.message().into()))?
        .to_string();

    let content_type = resolve_content_type(field.content_type(), &name);
    if !storage.accepts(&content_type) {
        return Err(AppError::Validation(format!(
            "Unsupported file type: {content_type}"
        )));
    }

    let path = std::env::temp_dir().join(format!("qrdrop-upload-{}", Uuid::new_v4()));
    let mut temp_file = tokio::fs::File::create(&path)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create temp file: {e}")))?;

    // From here on the guard owns cleanup of `path`.
    let mut spooled = SpooledFile {
        name,
        content_type,
        size: 0,
        path,
    };

    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
    {
        spooled.size += chunk.len() as u64;
        if spooled.size > storage.max_upload_size {
            return Err(AppError::Validation(format!(
                "File exceeds maximum size of {} bytes",
                storage.max_upload_size
            )));
        }
        temp_file
            .write_all(&chunk)
            .await
            .map_err(|e| AppError::Internal(format!("Temp file write failed: {e}")))?;
    }

    temp_file
        .flush()
        .await
        .map_err(|e| AppError::Internal(format!("Temp file flush failed: {e}")))?;

    if spooled.size == 0 {
        return Err(AppError::Validation("Uploaded file is empty".into()));
    }

    Ok(spooled)
}
