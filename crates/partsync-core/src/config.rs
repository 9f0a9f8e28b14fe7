use std::str::FromStr;

use rust_decimal::Decimal;

use crate::app_config::{AppConfig, Environment};
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

/// Log filter directive from `PARTSYNC_LOG_LEVEL`, `info` when unset or blank.
///
/// Needs no other configuration, so commands that never touch the database
/// can still honor it.
#[must_use]
pub fn log_level_from_env() -> String {
    log_level_with(|key| std::env::var(key))
}

fn log_level_with<F>(lookup: F) -> String
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    lookup("PARTSYNC_LOG_LEVEL")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "info".to_string())
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    // Blank values count as unset so `KEY=` in a .env file behaves like no key.
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let parse = |var: &str, default: &str| -> Result<std::net::SocketAddr, ConfigError> {
        parse_value(var, &or_default(var, default))
    };
    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        parse_value(var, &or_default(var, default))
    };
    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        parse_value(var, &or_default(var, default))
    };
    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        parse_value(var, &or_default(var, default))
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("PARTSYNC_ENV", "development"))?;
    let bind_addr = parse("PARTSYNC_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = log_level_with(&lookup);

    let db_max_connections = parse_u32("PARTSYNC_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("PARTSYNC_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("PARTSYNC_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let upload_max_bytes = parse_usize("PARTSYNC_UPLOAD_MAX_BYTES", "52428800")?;
    let sync_on_upload = parse_bool(
        "PARTSYNC_SYNC_ON_UPLOAD",
        &or_default("PARTSYNC_SYNC_ON_UPLOAD", "false"),
    )?;

    let shopify_store_domain = optional("SHOPIFY_STORE_DOMAIN");
    let shopify_admin_token = optional("SHOPIFY_ADMIN_TOKEN");
    match (&shopify_store_domain, &shopify_admin_token) {
        (Some(_), None) => {
            return Err(ConfigError::InvalidEnvVar {
                var: "SHOPIFY_ADMIN_TOKEN".to_string(),
                reason: "required when SHOPIFY_STORE_DOMAIN is set".to_string(),
            })
        }
        (None, Some(_)) => {
            return Err(ConfigError::InvalidEnvVar {
                var: "SHOPIFY_STORE_DOMAIN".to_string(),
                reason: "required when SHOPIFY_ADMIN_TOKEN is set".to_string(),
            })
        }
        _ => {}
    }
    if sync_on_upload && shopify_store_domain.is_none() {
        return Err(ConfigError::InvalidEnvVar {
            var: "PARTSYNC_SYNC_ON_UPLOAD".to_string(),
            reason: "requires SHOPIFY_STORE_DOMAIN and SHOPIFY_ADMIN_TOKEN".to_string(),
        });
    }

    let shopify_api_version = or_default("SHOPIFY_API_VERSION", "2024-07");
    let shopify_timeout_secs = parse_u64("PARTSYNC_SHOPIFY_TIMEOUT_SECS", "30")?;
    let shopify_inter_request_delay_ms =
        parse_u64("PARTSYNC_SHOPIFY_INTER_REQUEST_DELAY_MS", "500")?;
    let shopify_max_retries = parse_u32("PARTSYNC_SHOPIFY_MAX_RETRIES", "3")?;
    let shopify_retry_backoff_base_secs =
        parse_u64("PARTSYNC_SHOPIFY_RETRY_BACKOFF_BASE_SECS", "2")?;
    let shopify_default_price: Decimal = parse_value(
        "PARTSYNC_SHOPIFY_DEFAULT_PRICE",
        &or_default("PARTSYNC_SHOPIFY_DEFAULT_PRICE", "99.99"),
    )?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        upload_max_bytes,
        sync_on_upload,
        shopify_store_domain,
        shopify_admin_token,
        shopify_api_version,
        shopify_timeout_secs,
        shopify_inter_request_delay_ms,
        shopify_max_retries,
        shopify_retry_backoff_base_secs,
        shopify_default_price,
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

fn parse_bool(var: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("expected true or false, got {other:?}"),
        }),
    }
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for anything other than
/// `development`, `test`, or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "PARTSYNC_ENV".to_string(),
            reason: format!("unknown environment {other:?}"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
