use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShopifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by the Admin API (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("GraphQL errors: {0}")]
    GraphQl(String),

    #[error("{operation} rejected: {}", .messages.join("; "))]
    UserErrors {
        operation: &'static str,
        messages: Vec<String>,
    },

    #[error("product {product_id} was created but adding its variant failed: {source}")]
    VariantsFailed {
        product_id: String,
        #[source]
        source: Box<ShopifyError>,
    },

    #[error("{operation} response is missing {field}")]
    MissingField {
        operation: &'static str,
        field: &'static str,
    },

    #[error("pagination limit reached: exceeded {max_pages} pages")]
    PaginationLimit { max_pages: usize },

    #[error("invalid store domain \"{domain}\"")]
    InvalidStoreDomain { domain: String },
}
