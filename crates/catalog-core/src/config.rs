use std::env::VarError;
use std::str::FromStr;

use crate::app_config::{AppConfig, Environment, PriceBackend};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let parse_as = |var: &str, default: &str| -> Result<String, ConfigError> {
        let raw = or_default(var, default);
        if raw.trim().is_empty() {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "value must not be empty".to_string(),
            });
        }
        Ok(raw)
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("CATALOG_ENV", "development"))?;

    let bind_addr = parse_value::<SocketAddr>(
        "CATALOG_BIND_ADDR",
        &or_default("CATALOG_BIND_ADDR", "0.0.0.0:8000"),
    )?;
    let log_level = or_default("CATALOG_LOG_LEVEL", "info");
    let prices_path = PathBuf::from(parse_as(
        "CATALOG_PRICES_PATH",
        "./data/current_prices.json",
    )?);
    let price_backend = parse_price_backend(&or_default("CATALOG_PRICE_BACKEND", "json"))?;
    let categories_path = PathBuf::from(or_default(
        "CATALOG_CATEGORIES_PATH",
        "./config/categories.yaml",
    ));
    let default_currency = parse_as("CATALOG_DEFAULT_CURRENCY", "RUB")?
        .trim()
        .to_uppercase();

    let api_keys = or_default("CATALOG_API_KEYS", "")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect();

    let db_max_connections = parse_value::<u32>(
        "CATALOG_DB_MAX_CONNECTIONS",
        &or_default("CATALOG_DB_MAX_CONNECTIONS", "10"),
    )?;
    let db_min_connections = parse_value::<u32>(
        "CATALOG_DB_MIN_CONNECTIONS",
        &or_default("CATALOG_DB_MIN_CONNECTIONS", "1"),
    )?;
    let db_acquire_timeout_secs = parse_value::<u64>(
        "CATALOG_DB_ACQUIRE_TIMEOUT_SECS",
        &or_default("CATALOG_DB_ACQUIRE_TIMEOUT_SECS", "10"),
    )?;

    let price_feed_url = optional("CATALOG_PRICE_FEED_URL");
    let price_feed_token = optional("CATALOG_PRICE_FEED_TOKEN");
    let price_feed_timeout_secs = parse_value::<u64>(
        "CATALOG_PRICE_FEED_TIMEOUT_SECS",
        &or_default("CATALOG_PRICE_FEED_TIMEOUT_SECS", "30"),
    )?;
    let import_max_bytes = parse_value::<usize>(
        "CATALOG_IMPORT_MAX_BYTES",
        &or_default("CATALOG_IMPORT_MAX_BYTES", "10485760"),
    )?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        prices_path,
        price_backend,
        categories_path,
        default_currency,
        api_keys,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        price_feed_url,
        price_feed_token,
        price_feed_timeout_secs,
        import_max_bytes,
    })
}

fn parse_value<T>(var: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s.trim() {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "CATALOG_ENV".to_string(),
            reason: format!("expected development, test, or production; got '{other}'"),
        }),
    }
}

fn parse_price_backend(s: &str) -> Result<PriceBackend, ConfigError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "json" => Ok(PriceBackend::JsonFile),
        "redb" => Ok(PriceBackend::Redb),
        other => Err(ConfigError::InvalidEnvVar {
            var: "CATALOG_PRICE_BACKEND".to_string(),
            reason: format!("expected json or redb; got '{other}'"),
        }),
    }
}
