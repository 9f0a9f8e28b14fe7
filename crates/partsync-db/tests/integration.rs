//! Offline tests for partsync-db pool configuration and row mapping.
//! These tests do not require a live database connection.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use chrono::Utc;
use partsync_core::{AppConfig, Environment, FitmentEntry};
use partsync_db::{CatalogItemRow, DbError, FitmentRow, PoolConfig};
use rust_decimal::Decimal;
use serde_json::json;

fn make_app_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        upload_max_bytes: 1024,
        sync_on_upload: false,
        shopify_store_domain: None,
        shopify_admin_token: None,
        shopify_api_version: "2024-07".to_string(),
        shopify_timeout_secs: 30,
        shopify_inter_request_delay_ms: 500,
        shopify_max_retries: 3,
        shopify_retry_backoff_base_secs: 2,
        shopify_default_price: Decimal::new(9999, 2),
    }
}

fn make_row(pricing: serde_json::Value) -> CatalogItemRow {
    CatalogItemRow {
        id: 1,
        sku: "BP-100".to_string(),
        title: "Brake Pad".to_string(),
        vendor: "Stopwell".to_string(),
        short_desc: "Brake Pad".to_string(),
        long_desc: "<p>Low dust.</p>\n".to_string(),
        attributes: json!({ "Material": "Ceramic" }),
        pricing,
        qty_available: 2,
        weight: "2.4".to_string(),
        dimensions: "10x6x3".to_string(),
        category: "1684".to_string(),
        pies_segment: String::new(),
        pies_base: String::new(),
        pies_sub: String::new(),
        images: vec!["https://cdn.example.com/bp-100.jpg".to_string()],
        synced: false,
        shopify_product_id: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let pool_config = PoolConfig::from_app_config(&make_app_config());
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn catalog_row_rebuilds_feed_record() {
    let item = make_row(json!({ "MSRP": "59.99", "JBR": "41.50" }))
        .to_catalog_item()
        .expect("decode row");
    assert_eq!(item.sku, "BP-100");
    assert_eq!(item.price("MSRP"), Some(Decimal::new(5999, 2)));
    assert_eq!(item.price("JBR"), Some(Decimal::new(4150, 2)));
    assert_eq!(item.attributes.get("Material").map(String::as_str), Some("Ceramic"));
    assert_eq!(item.primary_image(), Some("https://cdn.example.com/bp-100.jpg"));
}

#[test]
fn catalog_row_with_malformed_pricing_is_json_error() {
    let err = make_row(json!(["59.99"])).to_catalog_item().unwrap_err();
    assert!(matches!(err, DbError::Json(_)));
}

#[test]
fn fitment_row_converts_to_entry() {
    let row = FitmentRow {
        id: 7,
        part_number: "BP-100".to_string(),
        year_from: "2010".to_string(),
        year_to: "2015".to_string(),
        make_id: "TOYOTA".to_string(),
        model_id: "CAMRY".to_string(),
        part_type_id: Some("1684".to_string()),
        position_id: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    let entry = FitmentEntry::from(row);
    assert_eq!(entry.make, "TOYOTA");
    assert_eq!(entry.model, "CAMRY");
    assert_eq!(entry.part_type.as_deref(), Some("1684"));
    assert!(entry.is_complete());
}
