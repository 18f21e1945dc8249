use axum::routing::get;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn api_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/user", user_routes())
        .nest("/files", file_routes(config))
        .nest("/admin", admin_routes())
}

fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::register))
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::logout))
        .routes(routes!(handlers::auth::me))
}

fn file_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let read = OpenApiRouter::new()
        .routes(routes!(handlers::file::list_files))
        .routes(routes!(handlers::file::list_files_by_owner));

    let upload = OpenApiRouter::new()
        .routes(routes!(handlers::file::upload_file))
        .routes(routes!(
            handlers::file::get_file,
            handlers::file::update_file,
            handlers::file::delete_file
        ))
        .layer(handlers::file::upload_body_limit(
            config.storage.max_upload_size,
        ));

    read.merge(upload)
}

fn admin_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::admin::list_users))
}

/// Routes outside `/api`: the QR viewer page and stored objects.
pub fn public_routes() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", get(handlers::health))
        .route(
            &format!("/{}/{{id}}", crate::files::service::VIEWER_ROUTE),
            get(handlers::viewer::view_file),
        )
        .route("/objects/{*key}", get(handlers::objects::get_object))
}
