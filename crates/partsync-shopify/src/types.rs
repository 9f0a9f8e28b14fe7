//! Wire types for the Admin GraphQL and REST endpoints used by the sync.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct GraphQlRequest<'a, V> {
    pub query: &'a str,
    pub variables: V,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlError {
    pub message: String,
}

/// A mutation-level validation error.
#[derive(Debug, Clone, Deserialize)]
pub struct UserError {
    #[serde(default)]
    pub field: Option<Vec<String>>,
    pub message: String,
}

impl UserError {
    pub(crate) fn describe(&self) -> String {
        match &self.field {
            Some(path) if !path.is_empty() => format!("{}: {}", path.join("."), self.message),
            _ => self.message.clone(),
        }
    }
}

// productCreate

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProductInput<'a> {
    pub title: &'a str,
    pub description_html: String,
    pub vendor: &'a str,
    pub product_type: &'a str,
    pub tags: Vec<&'a str>,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateMediaInput<'a> {
    pub original_source: &'a str,
    pub media_content_type: &'static str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ProductCreateVariables<'a> {
    pub input: ProductInput<'a>,
    pub media: Vec<CreateMediaInput<'a>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProductCreateData {
    pub product_create: Option<ProductCreatePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProductCreatePayload {
    pub product: Option<ProductNode>,
    #[serde(default)]
    pub user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductNode {
    pub id: String,
    #[serde(default)]
    pub handle: Option<String>,
}

// productVariantsBulkCreate

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VariantInput<'a> {
    pub price: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compare_at_price: Option<String>,
    pub inventory_item: InventoryItemInput<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct InventoryItemInput<'a> {
    pub sku: &'a str,
    pub tracked: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VariantsBulkCreateVariables<'a> {
    pub product_id: &'a str,
    pub variants: Vec<VariantInput<'a>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VariantsBulkCreateData {
    pub product_variants_bulk_create: Option<VariantsBulkCreatePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VariantsBulkCreatePayload {
    #[serde(default)]
    pub product_variants: Option<Vec<VariantNode>>,
    #[serde(default)]
    pub user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VariantNode {
    pub id: String,
}

// REST products.json

/// A remote product as returned by `GET /products.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteProduct {
    pub id: u64,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductsPage {
    #[serde(default)]
    pub products: Vec<RemoteProduct>,
}

/// Result of creating one product with its default variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedProduct {
    /// Product GID, e.g. `gid://shopify/Product/123`.
    pub id: String,
    pub handle: Option<String>,
    pub variant_ids: Vec<String>,
}
