//! Outbound sync of catalog items to a Shopify store through the Admin API.

pub mod client;
pub mod error;
pub mod listing;
pub mod pagination;
pub mod rate_limit;
pub mod sync;
pub mod types;

pub use client::ShopifyAdminClient;
pub use error::ShopifyError;
pub use listing::{select_variant_price, VariantPrice};
pub use rate_limit::Throttle;
pub use sync::{
    purge_all_products, push_catalog_items, PurgeFailure, PurgeReport, SyncFailure, SyncReport,
    SyncedItem,
};
pub use types::{CreatedProduct, RemoteProduct};
