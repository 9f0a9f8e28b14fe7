//! Batch loops over the Admin API: push catalog items, purge the store.
//!
//! Both loops are sequential, wait on the caller's [`Throttle`] before every
//! call, and record per-item failures instead of aborting.

use std::fmt::Display;
use std::future::Future;

use partsync_core::CatalogItem;

use crate::client::ShopifyAdminClient;
use crate::error::ShopifyError;
use crate::rate_limit::Throttle;

/// Maximum number of listing pages walked by [`purge_all_products`].
pub const MAX_PURGE_PAGES: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncedItem {
    pub sku: String,
    pub product_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncFailure {
    pub sku: String,
    pub error: String,
    /// Set when a storefront product exists for the item despite the failure.
    pub product_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub synced: Vec<SyncedItem>,
    pub failed: Vec<SyncFailure>,
}

impl SyncReport {
    #[must_use]
    pub fn synced_count(&self) -> usize {
        self.synced.len()
    }

    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgeFailure {
    pub product_id: u64,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurgeReport {
    pub deleted: usize,
    pub failed: Vec<PurgeFailure>,
    pub pages: usize,
}

/// Creates one storefront product per item, in order, and hands every
/// product that now exists in the store to `record` before moving on.
///
/// Items without a sku are recorded as failures without calling the API. A
/// product whose variant step failed is passed to `record` as well, then
/// reported as a failure carrying its id. An error from `record` turns the
/// item into a failure.
pub async fn push_catalog_items<F, Fut, E>(
    client: &ShopifyAdminClient,
    items: &[CatalogItem],
    throttle: &mut Throttle,
    mut record: F,
) -> SyncReport
where
    F: FnMut(&SyncedItem) -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: Display,
{
    let mut report = SyncReport::default();
    let total = items.len();

    for (index, item) in items.iter().enumerate() {
        if !item.is_storable() {
            tracing::warn!(title = %item.title, "skipping storefront sync for item without sku");
            report.failed.push(SyncFailure {
                sku: item.sku.clone(),
                error: "item has no sku".to_owned(),
                product_id: None,
            });
            continue;
        }

        throttle.wait().await;
        tracing::info!(sku = %item.sku, position = index + 1, total, "pushing item to storefront");
        let (synced, partial_error) = match client.create_product(item).await {
            Ok(created) => (
                SyncedItem {
                    sku: item.sku.clone(),
                    product_id: created.id,
                },
                None,
            ),
            Err(err) => match &err {
                ShopifyError::VariantsFailed { product_id, .. } => (
                    SyncedItem {
                        sku: item.sku.clone(),
                        product_id: product_id.clone(),
                    },
                    Some(err.to_string()),
                ),
                _ => {
                    tracing::warn!(sku = %item.sku, error = %err, "storefront sync failed");
                    report.failed.push(SyncFailure {
                        sku: item.sku.clone(),
                        error: err.to_string(),
                        product_id: None,
                    });
                    continue;
                }
            },
        };

        match record(&synced).await {
            Ok(()) => match partial_error {
                None => report.synced.push(synced),
                Some(error) => report.failed.push(SyncFailure {
                    sku: synced.sku,
                    error,
                    product_id: Some(synced.product_id),
                }),
            },
            Err(e) => {
                tracing::error!(
                    sku = %synced.sku,
                    product_id = %synced.product_id,
                    error = %e,
                    "failed to record storefront sync"
                );
                report.failed.push(SyncFailure {
                    error: format!("created {} but could not record sync: {e}", synced.product_id),
                    sku: synced.sku,
                    product_id: Some(synced.product_id),
                });
            }
        }
    }

    tracing::info!(
        synced = report.synced_count(),
        failed = report.failed_count(),
        "storefront push complete"
    );
    report
}

/// Deletes every product in the store, following `Link` cursors.
///
/// # Errors
///
/// Returns the listing error if a page cannot be fetched, or
/// [`ShopifyError::PaginationLimit`] after [`MAX_PURGE_PAGES`] pages.
/// Individual delete failures are recorded in the report.
pub async fn purge_all_products(
    client: &ShopifyAdminClient,
    throttle: &mut Throttle,
) -> Result<PurgeReport, ShopifyError> {
    let mut report = PurgeReport::default();
    let mut cursor: Option<String> = None;

    loop {
        if report.pages >= MAX_PURGE_PAGES {
            return Err(ShopifyError::PaginationLimit {
                max_pages: MAX_PURGE_PAGES,
            });
        }
        throttle.wait().await;
        let (products, next) = client.list_products_page(cursor.as_deref()).await?;
        report.pages += 1;
        if products.is_empty() {
            break;
        }
        tracing::info!(page = report.pages, count = products.len(), "deleting product page");

        for product in products {
            throttle.wait().await;
            match client.delete_product(product.id).await {
                Ok(()) => report.deleted += 1,
                Err(err) => {
                    tracing::warn!(product_id = product.id, error = %err, "failed to delete product");
                    report.failed.push(PurgeFailure {
                        product_id: product.id,
                        error: err.to_string(),
                    });
                }
            }
        }

        cursor = next;
        if cursor.is_none() {
            break;
        }
    }

    tracing::info!(
        deleted = report.deleted,
        failed = report.failed.len(),
        "storefront purge complete"
    );
    Ok(report)
}
