//! Database operations for `catalog_items`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use partsync_core::CatalogItem;
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::PgPool;

use crate::{DbError, StoreSummary};

pub(crate) const CATALOG_ITEM_COLUMNS: &str = "id, sku, title, vendor, short_desc, long_desc, \
     attributes, pricing, qty_available, weight, dimensions, category, \
     pies_segment, pies_base, pies_sub, images, synced, shopify_product_id, \
     created_at, updated_at";

/// A row from the `catalog_items` table.
///
/// `attributes` and `pricing` are stored as JSONB objects; prices are decimal
/// strings so no precision is lost in the round trip.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CatalogItemRow {
    pub id: i64,
    pub sku: String,
    pub title: String,
    pub vendor: String,
    pub short_desc: String,
    pub long_desc: String,
    pub attributes: Value,
    pub pricing: Value,
    pub qty_available: i32,
    pub weight: String,
    pub dimensions: String,
    pub category: String,
    pub pies_segment: String,
    pub pies_base: String,
    pub pies_sub: String,
    pub images: Vec<String>,
    pub synced: bool,
    /// Admin API GID of the remote product once pushed.
    pub shopify_product_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CatalogItemRow {
    /// Rebuilds the feed record from the stored row.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Json`] if the `attributes` or `pricing` columns do
    /// not hold the expected object shapes.
    pub fn to_catalog_item(&self) -> Result<CatalogItem, DbError> {
        let attributes: BTreeMap<String, String> =
            serde_json::from_value(self.attributes.clone())?;
        let pricing: BTreeMap<String, Decimal> = serde_json::from_value(self.pricing.clone())?;
        Ok(CatalogItem {
            title: self.title.clone(),
            sku: self.sku.clone(),
            vendor: self.vendor.clone(),
            short_desc: self.short_desc.clone(),
            long_desc: self.long_desc.clone(),
            attributes,
            pricing,
            qty_available: self.qty_available,
            weight: self.weight.clone(),
            dimensions: self.dimensions.clone(),
            category: self.category.clone(),
            pies_segment: self.pies_segment.clone(),
            pies_base: self.pies_base.clone(),
            pies_sub: self.pies_sub.clone(),
            images: self.images.clone(),
        })
    }
}

/// Upserts a catalog item keyed by sku.
///
/// Conflicts on `sku` overwrite every feed field and `updated_at`; `synced`
/// and `shopify_product_id` are left as they were.
///
/// Returns the internal `id` of the upserted row.
///
/// # Errors
///
/// Returns [`DbError::InvalidRecord`] for a blank sku, [`DbError::Json`] if the
/// maps cannot be encoded, or [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_catalog_item(pool: &PgPool, item: &CatalogItem) -> Result<i64, DbError> {
    if !item.is_storable() {
        return Err(DbError::InvalidRecord(format!(
            "catalog item '{}' has an empty sku",
            item.title
        )));
    }

    let attributes = serde_json::to_value(&item.attributes)?;
    let pricing = serde_json::to_value(&item.pricing)?;

    let id: i64 = sqlx::query_scalar::<_, i64>(
        "INSERT INTO catalog_items \
             (sku, title, vendor, short_desc, long_desc, attributes, pricing, \
              qty_available, weight, dimensions, category, pies_segment, pies_base, \
              pies_sub, images) \
         VALUES ($1, $2, $3, $4, $5, $6::jsonb, $7::jsonb, \
                 $8, $9, $10, $11, $12, $13, \
                 $14, $15) \
         ON CONFLICT (sku) DO UPDATE SET \
             title         = EXCLUDED.title, \
             vendor        = EXCLUDED.vendor, \
             short_desc    = EXCLUDED.short_desc, \
             long_desc     = EXCLUDED.long_desc, \
             attributes    = EXCLUDED.attributes, \
             pricing       = EXCLUDED.pricing, \
             qty_available = EXCLUDED.qty_available, \
             weight        = EXCLUDED.weight, \
             dimensions    = EXCLUDED.dimensions, \
             category      = EXCLUDED.category, \
             pies_segment  = EXCLUDED.pies_segment, \
             pies_base     = EXCLUDED.pies_base, \
             pies_sub      = EXCLUDED.pies_sub, \
             images        = EXCLUDED.images, \
             updated_at    = NOW() \
         RETURNING id",
    )
    .bind(&item.sku)
    .bind(&item.title)
    .bind(&item.vendor)
    .bind(&item.short_desc)
    .bind(&item.long_desc)
    .bind(attributes)
    .bind(pricing)
    .bind(item.qty_available)
    .bind(&item.weight)
    .bind(&item.dimensions)
    .bind(&item.category)
    .bind(&item.pies_segment)
    .bind(&item.pies_base)
    .bind(&item.pies_sub)
    .bind(&item.images)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Upserts every storable item in order, skipping blank skus.
///
/// # Errors
///
/// Returns the first [`DbError`] from [`upsert_catalog_item`]; items before it
/// stay written.
pub async fn store_catalog_items(
    pool: &PgPool,
    items: &[CatalogItem],
) -> Result<StoreSummary, DbError> {
    let mut summary = StoreSummary::default();
    for item in items {
        if !item.is_storable() {
            tracing::warn!(title = %item.title, "skipping catalog item without sku");
            summary.skipped += 1;
            continue;
        }
        upsert_catalog_item(pool, item).await?;
        summary.written += 1;
    }
    Ok(summary)
}

/// Fetches a single catalog item by sku.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row matches, or [`DbError::Sqlx`] if
/// the query fails.
pub async fn get_catalog_item_by_sku(pool: &PgPool, sku: &str) -> Result<CatalogItemRow, DbError> {
    let query = format!("SELECT {CATALOG_ITEM_COLUMNS} FROM catalog_items WHERE sku = $1");
    sqlx::query_as::<_, CatalogItemRow>(&query)
        .bind(sku)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// Returns items not yet pushed to the storefront, oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_unsynced_catalog_items(
    pool: &PgPool,
    limit: Option<i64>,
) -> Result<Vec<CatalogItemRow>, DbError> {
    let query = format!(
        "SELECT {CATALOG_ITEM_COLUMNS} FROM catalog_items \
         WHERE NOT synced \
         ORDER BY id ASC \
         LIMIT COALESCE($1, 9223372036854775807)"
    );
    let rows = sqlx::query_as::<_, CatalogItemRow>(&query)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Flags a catalog item as pushed and records the remote product id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row has that sku, or [`DbError::Sqlx`]
/// if the update fails.
pub async fn mark_catalog_item_synced(
    pool: &PgPool,
    sku: &str,
    shopify_product_id: &str,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE catalog_items \
         SET synced = TRUE, shopify_product_id = $2, updated_at = NOW() \
         WHERE sku = $1",
    )
    .bind(sku)
    .bind(shopify_product_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
