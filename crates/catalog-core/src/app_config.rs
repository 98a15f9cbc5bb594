use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Where the price store keeps its facts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriceBackend {
    /// One JSON object keyed by SKU, rewritten through a temp file.
    #[default]
    JsonFile,
    /// An embedded `redb` database, one row per SKU.
    Redb,
}

impl std::fmt::Display for PriceBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriceBackend::JsonFile => write!(f, "json"),
            PriceBackend::Redb => write!(f, "redb"),
        }
    }
}

/// Runtime configuration, built once at startup and handed to each component.
#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub prices_path: PathBuf,
    pub price_backend: PriceBackend,
    pub categories_path: PathBuf,
    pub default_currency: String,
    pub api_keys: Vec<String>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub price_feed_url: Option<String>,
    pub price_feed_token: Option<String>,
    pub price_feed_timeout_secs: u64,
    pub import_max_bytes: usize,
}

impl AppConfig {
    #[must_use]
    pub fn is_development(&self) -> bool {
        self.env == Environment::Development
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("prices_path", &self.prices_path)
            .field("price_backend", &self.price_backend)
            .field("categories_path", &self.categories_path)
            .field("default_currency", &self.default_currency)
            .field("database_url", &"[redacted]")
            .field("api_keys", &format!("[{} redacted]", self.api_keys.len()))
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("price_feed_url", &self.price_feed_url)
            .field(
                "price_feed_token",
                &self.price_feed_token.as_ref().map(|_| "[redacted]"),
            )
            .field("price_feed_timeout_secs", &self.price_feed_timeout_secs)
            .field("import_max_bytes", &self.import_max_bytes)
            .finish()
    }
}
