//! Outbound storefront endpoints: push unsynced items, purge the store.

use axum::{extract::State, Extension, Json};
use partsync_core::{CatalogItem, ShopifyConfig};
use partsync_shopify::{
    purge_all_products, push_catalog_items, ShopifyAdminClient, ShopifyError, Throttle,
};
use serde::Serialize;
use sqlx::PgPool;
use tokio::sync::Mutex;

use crate::middleware::RequestId;

use super::{map_db_error, map_shopify_error, ApiError, ApiResponse, AppState, ResponseMeta};

/// Admin API client plus the pacing state shared by every outbound call.
///
/// The throttle lock is held for a whole batch, including the read of
/// unsynced rows, so concurrent sync and purge requests run one at a time.
pub struct ShopifySync {
    client: ShopifyAdminClient,
    throttle: Mutex<Throttle>,
}

impl ShopifySync {
    /// # Errors
    ///
    /// Returns [`ShopifyError`] if the client cannot be built from `config`.
    pub fn new(config: &ShopifyConfig) -> Result<Self, ShopifyError> {
        Ok(Self::from_client(
            ShopifyAdminClient::new(config)?,
            config.inter_request_delay_ms,
        ))
    }

    pub fn from_client(client: ShopifyAdminClient, inter_request_delay_ms: u64) -> Self {
        Self {
            client,
            throttle: Mutex::new(Throttle::from_millis(inter_request_delay_ms)),
        }
    }

    /// Pushes `items` under the throttle lock.
    pub(super) async fn push_and_mark(&self, pool: &PgPool, items: &[CatalogItem]) -> PushOutcome {
        let mut throttle = self.throttle.lock().await;
        push_locked(pool, &self.client, &mut throttle, items).await
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub(super) struct SyncFailureItem {
    sku: String,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    product_id: Option<String>,
}

#[derive(Debug, Default)]
pub(super) struct PushOutcome {
    pub(super) synced: usize,
    pub(super) failures: Vec<SyncFailureItem>,
}

#[derive(Debug, Serialize)]
pub(super) struct SyncSummary {
    attempted: usize,
    synced: usize,
    failed: usize,
    failures: Vec<SyncFailureItem>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub(super) struct PurgeFailureItem {
    product_id: u64,
    error: String,
}

#[derive(Debug, Serialize)]
pub(super) struct PurgeSummary {
    deleted: usize,
    failed: usize,
    pages: usize,
    failures: Vec<PurgeFailureItem>,
}

/// Pushes `items`, recording each created product against its stored row
/// before the next item is sent.
async fn push_locked(
    pool: &PgPool,
    client: &ShopifyAdminClient,
    throttle: &mut Throttle,
    items: &[CatalogItem],
) -> PushOutcome {
    let report = push_catalog_items(client, items, throttle, |synced| {
        let sku = synced.sku.clone();
        let product_id = synced.product_id.clone();
        async move { partsync_db::mark_catalog_item_synced(pool, &sku, &product_id).await }
    })
    .await;

    PushOutcome {
        synced: report.synced_count(),
        failures: report
            .failed
            .into_iter()
            .map(|failure| SyncFailureItem {
                sku: failure.sku,
                error: failure.error,
                product_id: failure.product_id,
            })
            .collect(),
    }
}

fn require_shopify<'a>(state: &'a AppState, request_id: &str) -> Result<&'a ShopifySync, ApiError> {
    state.shopify.as_deref().ok_or_else(|| {
        ApiError::new(
            request_id,
            "service_unavailable",
            "Shopify credentials are not configured",
        )
    })
}

pub(super) async fn sync_shopify(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<SyncSummary>>, ApiError> {
    let shopify = require_shopify(&state, &req_id.0)?;
    let mut throttle = shopify.throttle.lock().await;

    let rows = partsync_db::list_unsynced_catalog_items(&state.pool, None)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let items = rows
        .iter()
        .map(partsync_db::CatalogItemRow::to_catalog_item)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    if items.is_empty() {
        tracing::info!("no unsynced catalog items to push");
    }
    let outcome = push_locked(&state.pool, &shopify.client, &mut throttle, &items).await;
    drop(throttle);

    Ok(Json(ApiResponse {
        data: SyncSummary {
            attempted: items.len(),
            synced: outcome.synced,
            failed: outcome.failures.len(),
            failures: outcome.failures,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn delete_all_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<PurgeSummary>>, ApiError> {
    let shopify = require_shopify(&state, &req_id.0)?;

    let report = {
        let mut throttle = shopify.throttle.lock().await;
        purge_all_products(&shopify.client, &mut throttle).await
    }
    .map_err(|e| map_shopify_error(req_id.0.clone(), &e))?;

    let failures: Vec<PurgeFailureItem> = report
        .failed
        .into_iter()
        .map(|failure| PurgeFailureItem {
            product_id: failure.product_id,
            error: failure.error,
        })
        .collect();

    Ok(Json(ApiResponse {
        data: PurgeSummary {
            deleted: report.deleted,
            failed: failures.len(),
            pages: report.pages,
            failures,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
