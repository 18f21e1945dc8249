use chrono::Utc;
use common::storage::{BoxReader, ObjectKey, ObjectStore};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::entity::{file, user};
use crate::error::AppError;
use crate::extractors::auth::AuthContext;
use crate::utils::qr;

/// Path segment of the public viewer route QR codes point at.
pub const VIEWER_ROUTE: &str = "TRADELICENCE";

/// A validated upload ready to be written to storage.
pub struct IncomingFile {
    pub name: String,
    pub content_type: String,
    pub size: u64,
    pub reader: BoxReader,
}

/// Public, stable link to the viewer page of file `id`.
pub fn viewer_link(public_url: &str, id: Uuid) -> String {
    format!("{}/{VIEWER_ROUTE}/{id}", public_url.trim_end_matches('/'))
}

/// Parse a file ID from a path segment. Malformed IDs are reported as missing.
pub fn parse_file_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound("File not found".into()))
}

/// Upload pipeline and file metadata access.
pub struct FileService<'a, C: ConnectionTrait> {
    conn: &'a C,
    store: &'a dyn ObjectStore,
    public_url: &'a str,
}

impl<'a, C: ConnectionTrait> FileService<'a, C> {
    pub fn new(conn: &'a C, store: &'a dyn ObjectStore, public_url: &'a str) -> Self {
        Self {
            conn,
            store,
            public_url,
        }
    }

    /// Store `incoming` for the user registered under `owner_email`.
    ///
    /// The owner is resolved before anything is written. The record is
    /// created without a QR code, then patched with one once its ID is known.
    /// If that second step fails the record keeps its usable URL and no QR
    /// code; nothing is rolled back or retried.
    pub async fn upload(
        &self,
        incoming: IncomingFile,
        owner_email: &str,
    ) -> Result<file::Model, AppError> {
        let owner = find_user_by_email(self.conn, owner_email).await?;

        let key = ObjectKey::for_upload(&incoming.name);
        let stored = self
            .store
            .put_stream(&key, incoming.reader, &incoming.content_type)
            .await?;

        let now = Utc::now();
        let record = file::ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(incoming.name),
            size: Set(i64::try_from(incoming.size).unwrap_or(i64::MAX)),
            url: Set(stored.url),
            storage_key: Set(stored.key.to_string()),
            content_type: Set(incoming.content_type),
            qr_code: Set(None),
            owner_id: Set(owner.id),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.conn)
        .await?;

        info!(file_id = %record.id, owner_id = owner.id, key = %key, "File stored");

        let file_id = record.id;
        self.bind_qr_code(record).await.inspect_err(|e| {
            warn!(%file_id, error = ?e, "File saved without QR code");
        })
    }

    /// Generate the QR code for `record`'s viewer link and persist it.
    async fn bind_qr_code(&self, record: file::Model) -> Result<file::Model, AppError> {
        let link = viewer_link(self.public_url, record.id);
        let qr_code = qr::to_data_url(&link)?;

        let mut active: file::ActiveModel = record.into();
        active.qr_code = Set(Some(qr_code));
        Ok(active.update(self.conn).await?)
    }

    /// Replace the content of file `id` in place.
    ///
    /// URL, name, size and content type change; the QR code does not, since
    /// the viewer link it encodes stays valid. The previous object is left in
    /// storage.
    pub async fn replace_content(
        &self,
        id: Uuid,
        incoming: IncomingFile,
    ) -> Result<file::Model, AppError> {
        let existing = self.get_by_id(id).await?;

        let key = ObjectKey::for_upload(&incoming.name);
        let stored = self
            .store
            .put_stream(&key, incoming.reader, &incoming.content_type)
            .await?;

        let previous_key = existing.storage_key.clone();
        let mut active: file::ActiveModel = existing.into();
        active.name = Set(incoming.name);
        active.size = Set(i64::try_from(incoming.size).unwrap_or(i64::MAX));
        active.url = Set(stored.url);
        active.storage_key = Set(stored.key.to_string());
        active.content_type = Set(incoming.content_type);
        active.updated_at = Set(Utc::now());
        let updated = active.update(self.conn).await?;

        info!(file_id = %id, key = %key, previous_key = %previous_key, "File content replaced");
        Ok(updated)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<file::Model, AppError> {
        file::Entity::find_by_id(id)
            .one(self.conn)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".into()))
    }

    /// All files, newest first.
    pub async fn list_all(&self) -> Result<Vec<file::Model>, AppError> {
        Ok(file::Entity::find()
            .order_by_desc(file::Column::CreatedAt)
            .order_by_desc(file::Column::Id)
            .all(self.conn)
            .await?)
    }

    /// Files owned by the user registered under `email`, newest first.
    pub async fn list_by_owner(&self, email: &str) -> Result<Vec<file::Model>, AppError> {
        let owner = find_user_by_email(self.conn, email).await?;
        Ok(file::Entity::find()
            .filter(file::Column::OwnerId.eq(owner.id))
            .order_by_desc(file::Column::CreatedAt)
            .order_by_desc(file::Column::Id)
            .all(self.conn)
            .await?)
    }

    /// Delete file `id` on behalf of `caller`, then drop its stored object.
    ///
    /// Removing the object is best effort: the record is already gone.
    pub async fn delete(&self, caller: &AuthContext, id: Uuid) -> Result<(), AppError> {
        let existing = self.get_by_id(id).await?;
        if !caller.can_manage(existing.owner_id) {
            return Err(AppError::PermissionDenied);
        }

        file::Entity::delete_by_id(id).exec(self.conn).await?;

        match ObjectKey::parse(&existing.storage_key) {
            Ok(key) => {
                if let Err(e) = self.store.delete(&key).await {
                    warn!(file_id = %id, key = %key, error = %e, "Failed to delete stored object");
                }
            }
            Err(e) => warn!(file_id = %id, error = %e, "Stored key is invalid, object left behind"),
        }

        info!(file_id = %id, caller = caller.user_id, "File deleted");
        Ok(())
    }
}

/// Look up a user by (normalized) email.
pub async fn find_user_by_email<C: ConnectionTrait>(
    conn: &C,
    email: &str,
) -> Result<user::Model, AppError> {
    let email = crate::models::auth::normalize_email(email);
    user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}
