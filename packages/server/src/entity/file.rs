use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "file")]
pub struct Model {
    /// UUIDv7 primary key. Also the stable part of the viewer link.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Original upload filename.
    pub name: String,
    /// Size in bytes.
    pub size: i64,
    /// Durable storage URL of the current content.
    pub url: String,
    /// Object key the current content is stored under.
    pub storage_key: String,
    pub content_type: String,

    /// PNG data URL encoding the viewer link. Absent until bound after insert.
    #[sea_orm(column_type = "Text")]
    pub qr_code: Option<String>,

    pub owner_id: i32,
    #[sea_orm(belongs_to, from = "owner_id", to = "id")]
    pub owner: HasOne<super::user::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
