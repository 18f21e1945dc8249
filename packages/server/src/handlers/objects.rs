use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use common::storage::ObjectKey;
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::error::AppError;
use crate::state::AppState;

/// Build a safe inline `Content-Disposition` header value.
fn content_disposition_value(filename: &str) -> String {
    let ascii_safe: String = filename
        .chars()
        .filter(|c| c.is_ascii_graphic() && !matches!(c, '"' | ';' | '\\'))
        .collect();
    let ascii_name = if ascii_safe.is_empty() {
        "file".to_string()
    } else {
        ascii_safe
    };

    // RFC 5987 percent-encoding for filename*.
    let encoded: String = filename
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                String::from(b as char)
            }
            _ => format!("%{b:02X}"),
        })
        .collect();

    format!("inline; filename=\"{ascii_name}\"; filename*=UTF-8''{encoded}")
}

/// Serve a stored object by key. This is what filesystem-backed file URLs
/// resolve to.
#[instrument(skip(state), fields(key = %raw_key))]
pub async fn get_object(
    State(state): State<AppState>,
    Path(raw_key): Path<String>,
) -> Result<Response, AppError> {
    let key = ObjectKey::parse(&raw_key)
        .ok()
        .filter(ObjectKey::is_upload)
        .ok_or_else(|| AppError::NotFound("Object not found".into()))?;

    let reader = state.store.get_stream(&key).await?;
    let body = Body::from_stream(ReaderStream::new(reader));

    let filename = key.segments().last().unwrap_or_default();
    let content_type = mime_guess::from_path(filename).first_or_octet_stream();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type.essence_str())
        .header(header::CONTENT_DISPOSITION, content_disposition_value(filename))
        .header(header::X_CONTENT_TYPE_OPTIONS, "nosniff")
        .header(header::CACHE_CONTROL, "public, max-age=3600")
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}
