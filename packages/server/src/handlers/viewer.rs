use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use tracing::instrument;
use uuid::Uuid;

use crate::entity::file;
use crate::error::AppError;
use crate::files::service::FileService;
use crate::state::AppState;
use crate::utils::filename::looks_like_pdf;

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n</head>\n<body>\n{body}\n</body>\n</html>\n",
        title = escape_html(title),
    )
}

/// Render the embed for a stored file: an iframe for PDFs, an image otherwise.
pub fn render_viewer(file: &file::Model) -> String {
    let url = escape_html(&file.url);
    let name = escape_html(&file.name);
    let embed = if looks_like_pdf(&file.name, &file.url) {
        format!("<iframe src=\"{url}\" title=\"{name}\" width=\"100%\" height=\"750px\"></iframe>")
    } else {
        format!("<img src=\"{url}\" alt=\"{name}\" style=\"max-width:100%\">")
    };
    page(&file.name, &embed)
}

fn not_found_page() -> Response {
    (
        StatusCode::NOT_FOUND,
        Html(page("File not found", "<h1>File not found</h1>")),
    )
        .into_response()
}

/// Public page a file's QR code points at.
#[instrument(skip(state), fields(file_id = %id))]
pub async fn view_file(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Ok(id) = Uuid::parse_str(&id) else {
        return not_found_page();
    };

    let svc = FileService::new(&state.db, &*state.store, &state.config.app.public_url);
    match svc.get_by_id(id).await {
        Ok(file) => Html(render_viewer(&file)).into_response(),
        Err(AppError::NotFound(_)) => not_found_page(),
        Err(e) => e.into_response(),
    }
}
