use common::StorageConfig;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Lifetime of a login session (JWT and cookie). Default: 7 days.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: i64,
    /// Mark the session cookie `Secure`. Enable behind HTTPS.
    #[serde(default)]
    pub secure_cookies: bool,
    /// When both are set, an admin account is ensured at startup.
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    #[serde(default = "default_admin_name")]
    pub admin_name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PublicConfig {
    /// Externally reachable base URL of this service, used to build the
    /// viewer links QR codes point at.
    pub public_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub app: PublicConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

fn default_max_connections() -> u32 {
    20
}

fn default_session_ttl_secs() -> i64 {
    7 * 24 * 60 * 60
}

fn default_admin_name() -> String {
    "Administrator".into()
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3001)?
            .set_default("server.cors.allow_origins", vec!["http://localhost:3000"])?
            .set_default("server.cors.max_age", 3600)?
            .set_default("app.public_url", "http://localhost:3001")?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., QRDROP__AUTH__JWT_SECRET)
            .add_source(
                Environment::with_prefix("QRDROP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors.allow_origins")
                    .with_list_parse_key("storage.allowed_content_types")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }

    /// Base URL objects in the filesystem backend are served from.
    pub fn filesystem_public_url(&self) -> String {
        self.storage
            .filesystem
            .public_url
            .clone()
            .unwrap_or_else(|| format!("{}/objects", self.app.public_url.trim_end_matches('/')))
    }
}
