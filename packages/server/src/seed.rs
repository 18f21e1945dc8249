use chrono::Utc;
use sea_orm::sea_query::{Index, PostgresQueryBuilder};
use sea_orm::*;
use tracing::info;

use crate::config::AuthConfig;
use crate::entity::user::Role;
use crate::entity::{file, user};
use crate::models::auth::{normalize_email, validate_email};
use crate::utils::hash;

/// Ensure the configured admin account exists and holds the `ADMIN` role.
///
/// Does nothing unless both `auth.admin_email` and `auth.admin_password` are
/// set. An existing account with that email is promoted only when its stored
/// password matches `admin_password`; otherwise it is left untouched.
pub async fn ensure_admin(db: &DatabaseConnection, auth: &AuthConfig) -> Result<(), DbErr> {
    let (Some(email), Some(password)) = (&auth.admin_email, &auth.admin_password) else {
        return Ok(());
    };

    if validate_email(email).is_err() || password.is_empty() {
        tracing::warn!("Admin bootstrap skipped: admin_email or admin_password is invalid");
        return Ok(());
    }
    let email = normalize_email(email);

    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(db)
        .await?;

    match existing {
        Some(u) if u.role == Role::Admin => {}
        Some(u) => {
            let password_ok = hash::verify_password(password, &u.password)
                .map_err(|e| DbErr::Custom(format!("Password verify error: {e}")))?;
            if !password_ok {
                tracing::warn!(
                    user_id = u.id,
                    "Admin bootstrap skipped: an account with admin_email exists and its password does not match"
                );
                return Ok(());
            }
            let id = u.id;
            let mut active: user::ActiveModel = u.into();
            active.role = Set(Role::Admin);
            active.updated_at = Set(Utc::now());
            active.update(db).await?;
            info!(user_id = id, "Promoted configured account to admin");
        }
        None => {
            let hash = hash::hash_password(password)
                .map_err(|e| DbErr::Custom(format!("Password hash error: {e}")))?;
            let now = Utc::now();
            let admin = user::ActiveModel {
                name: Set(auth.admin_name.clone()),
                email: Set(email),
                password: Set(hash),
                role: Set(Role::Admin),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(db)
            .await?;
            info!(user_id = admin.id, "Created admin account");
        }
    }

    Ok(())
}

/// Create composite indexes that entity definitions can't express.
///
/// SeaORM's schema-sync doesn't support composite non-unique indexes,
/// so we create them manually on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Owner listings: WHERE owner_id = ? ORDER BY created_at DESC
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_file_owner_created")
        .table(file::Entity)
        .col(file::Column::OwnerId)
        .col(file::Column::CreatedAt)
        .to_string(PostgresQueryBuilder);

    match db.execute_unprepared(&stmt).await {
        Ok(_) => info!("Ensured index idx_file_owner_created exists"),
        Err(e) => tracing::warn!("Failed to create index idx_file_owner_created: {}", e),
    }

    Ok(())
}
