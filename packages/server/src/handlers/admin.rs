use axum::{Json, extract::State};
use sea_orm::{EntityTrait, QueryOrder};
use tracing::instrument;

use crate::entity::user::{self, Role};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthContext;
use crate::models::auth::UserResponse;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/users",
    tag = "Admin",
    operation_id = "listUsers",
    summary = "List all users",
    description = "Returns every account, newest first. Password hashes are never included. \
        Requires the `ADMIN` role.",
    responses(
        (status = 200, description = "All users", body = Vec<UserResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth), fields(user_id = auth.user_id))]
pub async fn list_users(
    auth: AuthContext,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    auth.require_role(Role::Admin)?;

    let users = user::Entity::find()
        .order_by_desc(user::Column::CreatedAt)
        .order_by_desc(user::Column::Id)
        .all(&state.db)
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Ok(Json(users))
}
