use std::time::Duration;

use partsync_core::{CatalogItem, ShopifyConfig};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ShopifyError;
use crate::listing::{description_html, listing_title, product_tags, select_variant_price};
use crate::pagination::extract_next_cursor;
use crate::rate_limit::{is_rate_limited, is_retriable, retry_with_backoff, MAX_DELAY_MS};
use crate::types::{
    CreateMediaInput, CreatedProduct, GraphQlRequest, GraphQlResponse, InventoryItemInput,
    ProductCreateData, ProductCreateVariables, ProductInput, ProductsPage, RemoteProduct,
    UserError, VariantInput, VariantsBulkCreateData, VariantsBulkCreateVariables,
};

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";
const PAGE_LIMIT: u32 = 250;
const DEFAULT_RETRY_AFTER_SECS: u64 = 2;

const PRODUCT_CREATE: &str = r"
mutation productCreate($input: ProductInput!, $media: [CreateMediaInput!]) {
  productCreate(input: $input, media: $media) {
    product { id handle }
    userErrors { field message }
  }
}";

const VARIANTS_BULK_CREATE: &str = r"
mutation productVariantsBulkCreate($productId: ID!, $variants: [ProductVariantsBulkInput!]!) {
  productVariantsBulkCreate(productId: $productId, variants: $variants, strategy: REMOVE_STANDALONE_VARIANT) {
    productVariants { id }
    userErrors { field message }
  }
}";

/// Client for one store's Admin API.
///
/// Every request carries the access token and goes through
/// [`retry_with_backoff`]. Reads retry on 429 and network errors; the
/// product mutations retry on 429 only. Pacing between requests is the
/// caller's concern (see [`crate::Throttle`]).
pub struct ShopifyAdminClient {
    client: Client,
    /// `https://{store}/admin/api/{version}`, no trailing slash.
    base_url: String,
    admin_token: String,
    max_retries: u32,
    backoff_base_secs: u64,
    default_price: Decimal,
}

impl ShopifyAdminClient {
    /// Creates a client for `https://{store_domain}/admin/api/{api_version}`.
    ///
    /// # Errors
    ///
    /// Returns [`ShopifyError::InvalidStoreDomain`] if the domain is blank or
    /// contains a path, or [`ShopifyError::Http`] if the `reqwest::Client`
    /// cannot be constructed.
    pub fn new(config: &ShopifyConfig) -> Result<Self, ShopifyError> {
        let domain = normalize_store_domain(&config.store_domain)?;
        let base_url = format!("https://{domain}/admin/api/{}", config.api_version);
        Self::with_base_url(config, &base_url)
    }

    /// Creates a client against an explicit API base URL (e.g. a mock server).
    ///
    /// # Errors
    ///
    /// Returns [`ShopifyError::Http`] if the `reqwest::Client` cannot be
    /// constructed.
    pub fn with_base_url(config: &ShopifyConfig, base_url: &str) -> Result<Self, ShopifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("partsync/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            admin_token: config.admin_token.clone(),
            max_retries: config.max_retries,
            backoff_base_secs: config.retry_backoff_base_secs,
            default_price: config.default_price,
        })
    }

    /// Creates an active product for `item` with its images, then replaces the
    /// standalone variant with one carrying the sku and price.
    ///
    /// # Errors
    ///
    /// - [`ShopifyError::VariantsFailed`] if the product was created but the
    ///   variant step failed for any reason. The product exists in the store.
    /// - [`ShopifyError::UserErrors`] if `productCreate` reports user errors.
    /// - [`ShopifyError::GraphQl`] for top-level GraphQL errors.
    /// - [`ShopifyError::MissingField`] if the product id is absent.
    /// - Any transport or status error from the request.
    pub async fn create_product(&self, item: &CatalogItem) -> Result<CreatedProduct, ShopifyError> {
        let product_vars = ProductCreateVariables {
            input: ProductInput {
                title: listing_title(item),
                description_html: description_html(item),
                vendor: &item.vendor,
                product_type: &item.category,
                tags: product_tags(item),
                status: "ACTIVE",
            },
            media: item
                .images
                .iter()
                .map(|uri| CreateMediaInput {
                    original_source: uri,
                    media_content_type: "IMAGE",
                })
                .collect(),
        };
        let created: ProductCreateData = self
            .graphql(PRODUCT_CREATE, &product_vars, is_rate_limited)
            .await?;
        let payload = created.product_create.ok_or(ShopifyError::MissingField {
            operation: "productCreate",
            field: "productCreate",
        })?;
        check_user_errors("productCreate", &payload.user_errors)?;
        let product = payload.product.ok_or(ShopifyError::MissingField {
            operation: "productCreate",
            field: "product",
        })?;

        let variant_ids = match self.create_variant(item, &product.id).await {
            Ok(ids) => ids,
            Err(source) => {
                tracing::warn!(
                    sku = %item.sku,
                    product_id = %product.id,
                    error = %source,
                    "product created without its variant"
                );
                return Err(ShopifyError::VariantsFailed {
                    product_id: product.id,
                    source: Box::new(source),
                });
            }
        };

        tracing::info!(sku = %item.sku, product_id = %product.id, "created storefront product");
        Ok(CreatedProduct {
            id: product.id,
            handle: product.handle,
            variant_ids,
        })
    }

    /// Replaces the standalone variant of `product_id` with one carrying the
    /// sku and selected price. Returns the new variant ids.
    async fn create_variant(
        &self,
        item: &CatalogItem,
        product_id: &str,
    ) -> Result<Vec<String>, ShopifyError> {
        let price = select_variant_price(item, self.default_price);
        let variant_vars = VariantsBulkCreateVariables {
            product_id,
            variants: vec![VariantInput {
                price: price.price.to_string(),
                compare_at_price: price.compare_at_price.map(|p| p.to_string()),
                inventory_item: InventoryItemInput {
                    sku: &item.sku,
                    tracked: true,
                },
            }],
        };
        let variants: VariantsBulkCreateData = self
            .graphql(VARIANTS_BULK_CREATE, &variant_vars, is_rate_limited)
            .await?;
        let payload = variants
            .product_variants_bulk_create
            .ok_or(ShopifyError::MissingField {
                operation: "productVariantsBulkCreate",
                field: "productVariantsBulkCreate",
            })?;
        check_user_errors("productVariantsBulkCreate", &payload.user_errors)?;
        Ok(payload
            .product_variants
            .unwrap_or_default()
            .into_iter()
            .map(|variant| variant.id)
            .collect())
    }

    /// Fetches one page of products. Returns the products and the cursor of
    /// the next page, `None` on the last page.
    ///
    /// # Errors
    ///
    /// Returns any transport, status, or deserialization error.
    pub async fn list_products_page(
        &self,
        page_info: Option<&str>,
    ) -> Result<(Vec<RemoteProduct>, Option<String>), ShopifyError> {
        let url = self.products_url(page_info);
        retry_with_backoff(self.max_retries, self.backoff_base_secs, is_retriable, || {
            let url = url.clone();
            async move {
                let response = checked(self.authorized(self.client.get(&url)), &url).await?;
                let link_header = response
                    .headers()
                    .get(reqwest::header::LINK)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_owned);
                let body = response.text().await?;
                let page = serde_json::from_str::<ProductsPage>(&body).map_err(|source| {
                    ShopifyError::Deserialize {
                        context: format!("products page {url}"),
                        source,
                    }
                })?;
                Ok((page.products, extract_next_cursor(link_header.as_deref())))
            }
        })
        .await
    }

    /// Deletes one product by numeric id.
    ///
    /// # Errors
    ///
    /// Returns [`ShopifyError::NotFound`] if the product no longer exists, or
    /// any transport or status error.
    pub async fn delete_product(&self, product_id: u64) -> Result<(), ShopifyError> {
        let url = format!("{}/products/{product_id}.json", self.base_url);
        retry_with_backoff(self.max_retries, self.backoff_base_secs, is_retriable, || {
            let url = url.clone();
            async move {
                checked(self.authorized(self.client.delete(&url)), &url).await?;
                Ok(())
            }
        })
        .await
    }

    async fn graphql<V, T>(
        &self,
        query: &str,
        variables: &V,
        retriable: fn(&ShopifyError) -> bool,
    ) -> Result<T, ShopifyError>
    where
        V: Serialize,
        T: DeserializeOwned,
    {
        let url = format!("{}/graphql.json", self.base_url);
        let request = GraphQlRequest { query, variables };
        let response: GraphQlResponse<T> =
            retry_with_backoff(self.max_retries, self.backoff_base_secs, retriable, || {
                let url = url.clone();
                let request = &request;
                async move {
                    let response =
                        checked(self.authorized(self.client.post(&url)).json(request), &url)
                            .await?;
                    let body = response.text().await?;
                    serde_json::from_str::<GraphQlResponse<T>>(&body).map_err(|source| {
                        ShopifyError::Deserialize {
                            context: "GraphQL response".to_owned(),
                            source,
                        }
                    })
                }
            })
            .await?;

        if !response.errors.is_empty() {
            let messages: Vec<&str> = response.errors.iter().map(|e| e.message.as_str()).collect();
            return Err(ShopifyError::GraphQl(messages.join("; ")));
        }
        response.data.ok_or(ShopifyError::MissingField {
            operation: "graphql",
            field: "data",
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(ACCESS_TOKEN_HEADER, &self.admin_token)
            .header(reqwest::header::ACCEPT, "application/json")
    }

    fn products_url(&self, page_info: Option<&str>) -> String {
        let base = format!("{}/products.json", self.base_url);
        let limit = PAGE_LIMIT.to_string();
        let mut pairs = vec![("limit", limit.as_str())];
        if let Some(cursor) = page_info {
            pairs.push(("page_info", cursor));
        }
        match reqwest::Url::parse_with_params(&base, &pairs) {
            Ok(url) => url.to_string(),
            Err(_) => {
                let query: Vec<String> = pairs.iter().map(|(k, v)| format!("{k}={v}")).collect();
                format!("{base}?{}", query.join("&"))
            }
        }
    }
}

/// Sends `request` and maps non-2xx statuses to typed errors.
async fn checked(request: RequestBuilder, url: &str) -> Result<Response, ShopifyError> {
    let response = request.send().await?;
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after)
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
        return Err(ShopifyError::RateLimited { retry_after_secs });
    }
    if status == StatusCode::NOT_FOUND {
        return Err(ShopifyError::NotFound {
            url: url.to_owned(),
        });
    }
    if !status.is_success() {
        return Err(ShopifyError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_owned(),
        });
    }
    Ok(response)
}

/// Shopify sends fractional seconds (`"2.0"`); round up. Values beyond the
/// backoff cap are clamped to it.
fn parse_retry_after(raw: &str) -> Option<u64> {
    let max_secs = MAX_DELAY_MS / 1000;
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<u64>() {
        return Some(secs.min(max_secs));
    }
    let secs = raw.parse::<f64>().ok().filter(|s| s.is_finite() && *s >= 0.0)?;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Some((secs.ceil() as u64).min(max_secs))
}

fn check_user_errors(operation: &'static str, errors: &[UserError]) -> Result<(), ShopifyError> {
    if errors.is_empty() {
        return Ok(());
    }
    Err(ShopifyError::UserErrors {
        operation,
        messages: errors.iter().map(UserError::describe).collect(),
    })
}

/// Accepts `shop.myshopify.com`, optionally with a scheme or trailing slash.
pub(crate) fn normalize_store_domain(raw: &str) -> Result<String, ShopifyError> {
    let domain = raw
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/');
    if domain.is_empty() || domain.contains(['/', '?', '#']) || domain.contains(char::is_whitespace) {
        return Err(ShopifyError::InvalidStoreDomain {
            domain: raw.to_owned(),
        });
    }
    Ok(domain.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_domain_accepts_scheme_and_trailing_slash() {
        assert_eq!(
            normalize_store_domain("https://parts-demo.myshopify.com/").unwrap(),
            "parts-demo.myshopify.com"
        );
        assert_eq!(
            normalize_store_domain(" parts-demo.myshopify.com ").unwrap(),
            "parts-demo.myshopify.com"
        );
    }

    #[test]
    fn store_domain_rejects_paths_and_blanks() {
        assert!(normalize_store_domain("").is_err());
        assert!(normalize_store_domain("https://").is_err());
        assert!(normalize_store_domain("parts-demo.myshopify.com/admin").is_err());
    }

    #[test]
    fn retry_after_rounds_fractional_seconds_up() {
        assert_eq!(parse_retry_after("2"), Some(2));
        assert_eq!(parse_retry_after("2.0"), Some(2));
        assert_eq!(parse_retry_after("0.5"), Some(1));
        assert_eq!(parse_retry_after("soon"), None);
        assert_eq!(parse_retry_after("-1"), None);
    }

    #[test]
    fn huge_retry_after_is_clamped_to_the_backoff_cap() {
        assert_eq!(parse_retry_after("86400"), Some(60));
        assert_eq!(parse_retry_after("18446744073709551615"), Some(60));
        assert_eq!(parse_retry_after("1e300"), Some(60));
        assert_eq!(parse_retry_after("60"), Some(60));
    }

    #[test]
    fn user_errors_include_field_path() {
        let errors = vec![UserError {
            field: Some(vec!["input".to_owned(), "title".to_owned()]),
            message: "can't be blank".to_owned(),
        }];
        let err = check_user_errors("productCreate", &errors).unwrap_err();
        assert_eq!(err.to_string(), "productCreate rejected: input.title: can't be blank");
    }
}
