use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::file;

/// Response DTO for a single stored file.
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileResponse {
    /// File ID (UUIDv7).
    #[schema(example = "01936f0e-1234-7abc-8000-000000000001")]
    pub id: Uuid,
    /// Original upload filename.
    #[schema(example = "report.pdf")]
    pub name: String,
    /// Size in bytes.
    #[schema(example = 10)]
    pub size: i64,
    /// Durable storage URL of the current content.
    pub url: String,
    #[schema(example = "application/pdf")]
    pub content_type: String,
    /// PNG data URL of a QR code pointing at the viewer route.
    #[schema(example = "data:image/png;base64,iVBORw0KGgo...")]
    pub qr_code: Option<String>,
    /// ID of the owning user.
    pub owner_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<file::Model> for FileResponse {
    fn from(model: file::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            size: model.size,
            url: model.url,
            content_type: model.content_type,
            qr_code: model.qr_code,
            owner_id: model.owner_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Response for a successful upload.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    #[schema(example = "File uploaded successfully")]
    pub message: String,
    pub data: FileResponse,
    /// Same value as `data.qrCode`.
    #[schema(example = "data:image/png;base64,iVBORw0KGgo...")]
    pub qr_code: String,
}

/// Response for a successful content replacement.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UpdateResponse {
    #[schema(example = "File updated successfully")]
    pub message: String,
    pub data: FileResponse,
}

/// Request body for listing one owner's files.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct OwnerFilesRequest {
    #[schema(example = "alice@example.com")]
    pub email: String,
}
