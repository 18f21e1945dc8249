use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::StatusCode;
use axum::{Json, response::IntoResponse};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthContext;
use crate::extractors::json::AppJson;
use crate::extractors::multipart::AppMultipart;
use crate::files::multipart::read_upload_form;
use crate::files::service::{FileService, parse_file_id};
use crate::models::auth::validate_email;
use crate::models::file::{FileResponse, OwnerFilesRequest, UpdateResponse, UploadResponse};
use crate::state::AppState;

/// Multipart slack on top of the configured file size limit.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn upload_body_limit(max_upload_size: u64) -> DefaultBodyLimit {
    let limit = usize::try_from(max_upload_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);
    DefaultBodyLimit::max(limit)
}

fn service(state: &AppState) -> FileService<'_, sea_orm::DatabaseConnection> {
    FileService::new(&state.db, &*state.store, &state.config.app.public_url)
}

#[utoipa::path(
    post,
    path = "/upload",
    tag = "Files",
    operation_id = "uploadFile",
    summary = "Upload a file",
    description = "Stores the `file` part for the user registered under the `email` part, \
        then binds a QR code that links to the public viewer page of the new record.",
    request_body(content_type = "multipart/form-data", description = "`file` part and owner `email`"),
    responses(
        (status = 200, description = "File stored", body = UploadResponse),
        (status = 400, description = "Missing file or email, bad filename or type (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "No user with that email (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Storage or QR generation failed (UPSTREAM_FAILURE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart), fields(email, file_id))]
pub async fn upload_file(
    State(state): State<AppState>,
    AppMultipart(multipart): AppMultipart,
) -> Result<Json<UploadResponse>, AppError> {
    let form = read_upload_form(multipart, &state.config.storage).await?;
    let (spooled, email) = form.require_file()?;
    let email = email.ok_or_else(|| AppError::Validation("Email is required".into()))?;
    validate_email(&email)?;
    tracing::Span::current().record("email", email.as_str());

    let incoming = spooled.open().await?;
    let record = service(&state).upload(incoming, &email).await?;
    tracing::Span::current().record("file_id", tracing::field::display(record.id));

    let qr_code = record
        .qr_code
        .clone()
        .ok_or_else(|| AppError::Internal("QR code missing after binding".into()))?;

    Ok(Json(UploadResponse {
        message: "File uploaded successfully".into(),
        data: FileResponse::from(record),
        qr_code,
    }))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Files",
    operation_id = "updateFile",
    summary = "Replace a file's content",
    description = "Stores the new `file` part and points the record at it. The ID and QR code \
        stay the same, so printed codes keep working.",
    params(("id" = String, Path, description = "File ID (UUID)")),
    request_body(content_type = "multipart/form-data", description = "Replacement `file` part"),
    responses(
        (status = 200, description = "File updated", body = UpdateResponse),
        (status = 400, description = "Missing file, bad filename or type (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Storage failed (UPSTREAM_FAILURE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart), fields(file_id = %id))]
pub async fn update_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppMultipart(multipart): AppMultipart,
) -> Result<Json<UpdateResponse>, AppError> {
    let id = parse_file_id(&id)?;
    let svc = service(&state);
    // Reject unknown IDs before reading the body into storage.
    svc.get_by_id(id).await?;

    let form = read_upload_form(multipart, &state.config.storage).await?;
    let (spooled, _) = form.require_file()?;
    let incoming = spooled.open().await?;
    let record = svc.replace_content(id, incoming).await?;

    Ok(Json(UpdateResponse {
        message: "File updated successfully".into(),
        data: FileResponse::from(record),
    }))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Files",
    operation_id = "listFiles",
    summary = "List all files",
    description = "Returns every stored file, newest first.",
    responses((status = 200, description = "All files", body = Vec<FileResponse>)),
)]
#[instrument(skip(state))]
pub async fn list_files(State(state): State<AppState>) -> Result<Json<Vec<FileResponse>>, AppError> {
    let files = service(&state).list_all().await?;
    Ok(Json(files.into_iter().map(FileResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/user",
    tag = "Files",
    operation_id = "listFilesByOwner",
    summary = "List one user's files",
    description = "Returns the files owned by the user registered under `email`, newest first.",
    request_body = OwnerFilesRequest,
    responses(
        (status = 200, description = "Owner's files", body = Vec<FileResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "No user with that email (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn list_files_by_owner(
    State(state): State<AppState>,
    AppJson(payload): AppJson<OwnerFilesRequest>,
) -> Result<Json<Vec<FileResponse>>, AppError> {
    validate_email(&payload.email)?;
    let files = service(&state).list_by_owner(&payload.email).await?;
    Ok(Json(files.into_iter().map(FileResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Files",
    operation_id = "getFile",
    summary = "Get a file by ID",
    params(("id" = String, Path, description = "File ID (UUID)")),
    responses(
        (status = 200, description = "File record", body = FileResponse),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(file_id = %id))]
pub async fn get_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FileResponse>, AppError> {
    let id = parse_file_id(&id)?;
    let file = service(&state).get_by_id(id).await?;
    Ok(Json(FileResponse::from(file)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Files",
    operation_id = "deleteFile",
    summary = "Delete a file",
    description = "Removes the record, then the stored object on a best-effort basis. \
        Only the owner or an admin may delete.",
    params(("id" = String, Path, description = "File ID (UUID)")),
    responses(
        (status = 204, description = "File deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth), fields(file_id = %id, user_id = auth.user_id))]
pub async fn delete_file(
    auth: AuthContext,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_file_id(&id)?;
    service(&state).delete(&auth, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
