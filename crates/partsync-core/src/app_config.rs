use std::net::SocketAddr;

use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq, Eq)]
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

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub upload_max_bytes: usize,
    pub sync_on_upload: bool,
    pub shopify_store_domain: Option<String>,
    pub shopify_admin_token: Option<String>,
    pub shopify_api_version: String,
    pub shopify_timeout_secs: u64,
    pub shopify_inter_request_delay_ms: u64,
    pub shopify_max_retries: u32,
    pub shopify_retry_backoff_base_secs: u64,
    pub shopify_default_price: Decimal,
}

/// Connection and pacing settings for the Shopify Admin API client.
///
/// Only constructed when both the store domain and admin token are present.
#[derive(Clone)]
pub struct ShopifyConfig {
    pub store_domain: String,
    pub admin_token: String,
    pub api_version: String,
    pub timeout_secs: u64,
    pub inter_request_delay_ms: u64,
    pub max_retries: u32,
    pub retry_backoff_base_secs: u64,
    pub default_price: Decimal,
}

impl AppConfig {
    /// Returns the Shopify client settings, or `None` when credentials are not
    /// configured.
    #[must_use]
    pub fn shopify(&self) -> Option<ShopifyConfig> {
        let store_domain = self.shopify_store_domain.clone()?;
        let admin_token = self.shopify_admin_token.clone()?;
        Some(ShopifyConfig {
            store_domain,
            admin_token,
            api_version: self.shopify_api_version.clone(),
            timeout_secs: self.shopify_timeout_secs,
            inter_request_delay_ms: self.shopify_inter_request_delay_ms,
            max_retries: self.shopify_max_retries,
            retry_backoff_base_secs: self.shopify_retry_backoff_base_secs,
            default_price: self.shopify_default_price,
        })
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("upload_max_bytes", &self.upload_max_bytes)
            .field("sync_on_upload", &self.sync_on_upload)
            .field("shopify_store_domain", &self.shopify_store_domain)
            .field(
                "shopify_admin_token",
                &self.shopify_admin_token.as_ref().map(|_| "[redacted]"),
            )
            .field("shopify_api_version", &self.shopify_api_version)
            .field("shopify_timeout_secs", &self.shopify_timeout_secs)
            .field(
                "shopify_inter_request_delay_ms",
                &self.shopify_inter_request_delay_ms,
            )
            .field("shopify_max_retries", &self.shopify_max_retries)
            .field(
                "shopify_retry_backoff_base_secs",
                &self.shopify_retry_backoff_base_secs,
            )
            .field("shopify_default_price", &self.shopify_default_price)
            .finish()
    }
}

impl std::fmt::Debug for ShopifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyConfig")
            .field("store_domain", &self.store_domain)
            .field("admin_token", &"[redacted]")
            .field("api_version", &self.api_version)
            .field("timeout_secs", &self.timeout_secs)
            .field("inter_request_delay_ms", &self.inter_request_delay_ms)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_secs", &self.retry_backoff_base_secs)
            .field("default_price", &self.default_price)
            .finish()
    }
}
