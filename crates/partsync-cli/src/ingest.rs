//! Feed ingestion command handlers.
//!
//! Dry runs parse and report without loading configuration or touching the
//! database.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Subcommand;
use partsync_core::{dedup_fitments, CatalogItem};

use crate::shopify::push_and_mark;

/// Sub-commands available under `ingest`.
#[derive(Debug, Subcommand)]
pub enum IngestCommands {
    /// Ingest a PIES product feed
    Pies {
        /// Path to the PIES XML file
        file: PathBuf,
        /// Push the stored items to Shopify after ingesting
        #[arg(long)]
        sync: bool,
        /// Parse and report without writing to the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Ingest an ACES fitment feed
    Aces {
        /// Path to the ACES XML file
        file: PathBuf,
        /// Parse and report without writing to the database
        #[arg(long)]
        dry_run: bool,
    },
}

pub(crate) async fn run_ingest(command: IngestCommands) -> anyhow::Result<()> {
    match command {
        IngestCommands::Pies {
            file,
            sync,
            dry_run,
        } => run_ingest_pies(&file, sync, dry_run).await,
        IngestCommands::Aces { file, dry_run } => run_ingest_aces(&file, dry_run).await,
    }
}

async fn read_feed(file: &Path) -> anyhow::Result<Vec<u8>> {
    tokio::fs::read(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))
}

/// Parses a PIES file, stores its items, and optionally pushes them.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, configuration is
/// invalid, the database is unreachable, or `sync` is set without Shopify
/// credentials. Per-item sync failures are reported, not propagated.
pub(crate) async fn run_ingest_pies(file: &Path, sync: bool, dry_run: bool) -> anyhow::Result<()> {
    let bytes = read_feed(file).await?;
    let items = partsync_feeds::parse_pies(&bytes)
        .with_context(|| format!("failed to parse PIES feed {}", file.display()))?;
    let storable = items.iter().filter(|item| item.is_storable()).count();

    if dry_run {
        println!(
            "dry-run: parsed {} item(s) from {}, {storable} with a sku",
            items.len(),
            file.display()
        );
        return Ok(());
    }

    let config = partsync_core::load_app_config()?;
    let shopify_config = if sync {
        Some(
            config
                .shopify()
                .context("--sync needs SHOPIFY_STORE_DOMAIN and SHOPIFY_ADMIN_TOKEN")?,
        )
    } else {
        None
    };

    let pool = crate::connect(&config).await?;
    let summary = partsync_db::store_catalog_items(&pool, &items).await?;
    println!(
        "parsed {} item(s): stored {}, skipped {}",
        items.len(),
        summary.written,
        summary.skipped
    );

    if let Some(shopify_config) = shopify_config {
        let storable: Vec<CatalogItem> = items.into_iter().filter(CatalogItem::is_storable).collect();
        push_and_mark(&pool, &shopify_config, &storable).await?;
    }
    Ok(())
}

/// Parses an ACES file, dedups its applications, and inserts new fitments.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, has no `App`
/// elements, or the database is unreachable.
pub(crate) async fn run_ingest_aces(file: &Path, dry_run: bool) -> anyhow::Result<()> {
    let bytes = read_feed(file).await?;
    let document = partsync_feeds::parse_aces_document(&bytes)
        .with_context(|| format!("failed to parse ACES feed {}", file.display()))?;
    if document.applications == 0 {
        anyhow::bail!("{} contains no App elements", file.display());
    }

    let applications = document.applications;
    let entries = dedup_fitments(document.entries);

    if dry_run {
        println!(
            "dry-run: {applications} application(s) in {}, {} complete and distinct",
            file.display(),
            entries.len()
        );
        return Ok(());
    }

    let config = partsync_core::load_app_config()?;
    let pool = crate::connect(&config).await?;
    let summary = partsync_db::store_fitments(&pool, &entries).await?;
    println!(
        "{applications} application(s), {} kept: inserted {}, already stored {}",
        entries.len(),
        summary.written,
        summary.skipped
    );
    Ok(())
}
