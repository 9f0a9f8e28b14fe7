//! Shopify command handlers: push unsynced items, purge the store.

use clap::Subcommand;
use partsync_core::{CatalogItem, ShopifyConfig};
use partsync_shopify::{purge_all_products, push_catalog_items, ShopifyAdminClient, Throttle};

/// Sub-commands available under `shopify`.
#[derive(Debug, Subcommand)]
pub enum ShopifyCommands {
    /// Push stored items that have not been synced yet
    Sync {
        /// Maximum number of items to push
        #[arg(long)]
        limit: Option<i64>,
    },
    /// Delete every product in the store
    Purge {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

pub(crate) async fn run_shopify(command: ShopifyCommands) -> anyhow::Result<()> {
    if let ShopifyCommands::Purge { yes: false } = command {
        anyhow::bail!("purge deletes every product in the store; re-run with --yes to confirm");
    }

    let config = partsync_core::load_app_config()?;
    let shopify_config = config.shopify().ok_or_else(|| {
        anyhow::anyhow!(
            "SHOPIFY_STORE_DOMAIN and SHOPIFY_ADMIN_TOKEN must be set"
        )
    })?;

    match command {
        ShopifyCommands::Sync { limit } => {
            let pool = crate::connect(&config).await?;
            let rows = partsync_db::list_unsynced_catalog_items(&pool, limit).await?;
            if rows.is_empty() {
                println!("no unsynced catalog items");
                return Ok(());
            }
            let items = rows
                .iter()
                .map(partsync_db::CatalogItemRow::to_catalog_item)
                .collect::<Result<Vec<_>, _>>()?;
            push_and_mark(&pool, &shopify_config, &items).await
        }
        ShopifyCommands::Purge { .. } => {
            let client = ShopifyAdminClient::new(&shopify_config)?;
            let mut throttle = Throttle::from_millis(shopify_config.inter_request_delay_ms);
            let report = purge_all_products(&client, &mut throttle).await?;
            println!(
                "deleted {} product(s) over {} page(s), {} failed",
                report.deleted,
                report.pages,
                report.failed.len()
            );
            for failure in &report.failed {
                println!("  product {}: {}", failure.product_id, failure.error);
            }
            Ok(())
        }
    }
}

/// Pushes `items`, recording each created product against its stored row
/// before the next item is sent.
///
/// # Errors
///
/// Returns an error if the client cannot be built. Per-item push and
/// bookkeeping failures are printed and skipped.
pub(crate) async fn push_and_mark(
    pool: &sqlx::PgPool,
    shopify_config: &ShopifyConfig,
    items: &[CatalogItem],
) -> anyhow::Result<()> {
    let client = ShopifyAdminClient::new(shopify_config)?;
    let mut throttle = Throttle::from_millis(shopify_config.inter_request_delay_ms);
    let report = push_catalog_items(&client, items, &mut throttle, |synced| {
        let sku = synced.sku.clone();
        let product_id = synced.product_id.clone();
        async move { partsync_db::mark_catalog_item_synced(pool, &sku, &product_id).await }
    })
    .await;

    println!(
        "pushed {} of {} item(s), {} failed",
        report.synced_count(),
        items.len(),
        report.failed_count()
    );
    for failure in &report.failed {
        match &failure.product_id {
            Some(product_id) => println!("  {} ({product_id}): {}", failure.sku, failure.error),
            None => println!("  {}: {}", failure.sku, failure.error),
        }
    }
    Ok(())
}
