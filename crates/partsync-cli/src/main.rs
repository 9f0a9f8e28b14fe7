mod ingest;
mod shopify;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::ingest::IngestCommands;
use crate::shopify::ShopifyCommands;

#[derive(Debug, Parser)]
#[command(name = "partsync")]
#[command(about = "PIES/ACES catalog ingestion and Shopify sync")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Parse a feed file and store its records
    Ingest {
        #[command(subcommand)]
        command: IngestCommands,
    },
    /// Push to or purge the Shopify store
    Shopify {
        #[command(subcommand)]
        command: ShopifyCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(partsync_core::log_level_from_env()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Db { command }) => run_db(command).await,
        Some(Commands::Ingest { command }) => ingest::run_ingest(command).await,
        Some(Commands::Shopify { command }) => shopify::run_shopify(command).await,
        None => {
            println!("partsync: no command given; see --help");
            Ok(())
        }
    }
}

async fn run_db(command: DbCommands) -> anyhow::Result<()> {
    let config = partsync_core::load_app_config()?;
    let pool = connect(&config).await?;
    match command {
        DbCommands::Ping => {
            partsync_db::ping(&pool).await?;
            println!("database ok");
        }
        DbCommands::Migrate => {
            let applied = partsync_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
    }
    Ok(())
}

/// Opens a pool sized from `config`.
pub(crate) async fn connect(config: &partsync_core::AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool_config = partsync_db::PoolConfig::from_app_config(config);
    let pool = partsync_db::connect_pool(&config.database_url, pool_config).await?;
    Ok(pool)
}
