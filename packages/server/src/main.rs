use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use common::StorageBackend;
use common::storage::ObjectStore;
use common::storage::filesystem::FilesystemObjectStore;
use common::storage::s3::S3ObjectStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

use server::config::AppConfig;
use server::state::AppState;

async fn build_store(config: &AppConfig) -> anyhow::Result<Arc<dyn ObjectStore>> {
    let storage = &config.storage;
    let store: Arc<dyn ObjectStore> = match storage.backend {
        StorageBackend::Filesystem => Arc::new(
            FilesystemObjectStore::new(
                storage.filesystem.path.clone(),
                config.filesystem_public_url(),
                storage.max_upload_size,
            )
            .await
            .context("Failed to initialize filesystem storage")?,
        ),
        StorageBackend::S3 => {
            let s3 = storage
                .s3
                .as_ref()
                .context("storage.backend is \"s3\" but [storage.s3] is missing")?;
            Arc::new(S3ObjectStore::new(s3).context("Failed to initialize S3 storage")?)
        }
    };
    info!(backend = ?storage.backend, "Object storage ready");
    Ok(store)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = server::database::init_db(&config.database)
        .await
        .context("Failed to connect to database")?;
    server::seed::ensure_indexes(&db).await?;
    server::seed::ensure_admin(&db, &config.auth)
        .await
        .context("Failed to bootstrap admin account")?;

    let store = build_store(&config).await?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server.host / server.port")?;

    let state = AppState {
        db,
        config: Arc::new(config),
        store,
    };
    let app = server::build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
