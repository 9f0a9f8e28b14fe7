//! Mapping from a [`CatalogItem`] to storefront listing fields.

use partsync_core::CatalogItem;
use quick_xml::escape::escape;
use rust_decimal::Decimal;

/// Price types tried in order for the variant price.
pub const PRICE_PRIORITY: [&str; 5] = ["RET", "MSRP", "LST", "JBR", "MAP"];

const COMPARE_AT_TYPE: &str = "MSRP";
const NO_DESCRIPTION: &str = "<p>No description available.</p>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantPrice {
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
}

/// Picks the variant price from the item's price map.
///
/// Uses the first present type in [`PRICE_PRIORITY`], then any other price
/// (lowest type code first), then `default_price`. MSRP becomes the
/// compare-at price when it is above the chosen price.
#[must_use]
pub fn select_variant_price(item: &CatalogItem, default_price: Decimal) -> VariantPrice {
    let price = PRICE_PRIORITY
        .iter()
        .find_map(|code| item.price(code))
        .or_else(|| item.pricing.values().next().copied())
        .unwrap_or(default_price);
    let compare_at_price = item.price(COMPARE_AT_TYPE).filter(|msrp| *msrp > price);
    VariantPrice {
        price,
        compare_at_price,
    }
}

/// Builds the product `descriptionHtml`.
///
/// `long_desc` is already HTML and is used verbatim; the plain-text fields
/// are escaped.
#[must_use]
pub fn description_html(item: &CatalogItem) -> String {
    let mut html = format!("<p><strong>{}</strong></p>\n", escape(&item.vendor));
    if item.long_desc.trim().is_empty() {
        html.push_str(NO_DESCRIPTION);
        html.push('\n');
    } else {
        html.push_str(&item.long_desc);
    }

    if !item.attributes.is_empty() {
        let attributes = item
            .attributes
            .iter()
            .map(|(id, value)| format!("{}: {}", escape(id), escape(value)))
            .collect::<Vec<_>>()
            .join(", ");
        html.push_str(&format!("<p><b>Attributes:</b> {attributes}</p>\n"));
    }
    if has_dimensions(&item.dimensions) {
        html.push_str(&format!(
            "<p><b>Dimensions:</b> {}</p>\n",
            escape(&item.dimensions)
        ));
    }
    if !item.weight.trim().is_empty() {
        html.push_str(&format!(
            "<p><b>Weight:</b> {}</p>\n",
            escape(&item.weight)
        ));
    }
    html
}

/// `["PIES", vendor, category]`, skipping blanks and duplicates.
#[must_use]
pub fn product_tags(item: &CatalogItem) -> Vec<&str> {
    let mut tags: Vec<&str> = Vec::with_capacity(3);
    for tag in ["PIES", item.vendor.as_str(), item.category.as_str()] {
        let tag = tag.trim();
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

/// Title sent to the storefront; never blank.
#[must_use]
pub fn listing_title(item: &CatalogItem) -> &str {
    if item.title.trim().is_empty() {
        &item.sku
    } else {
        &item.title
    }
}

// "xx" is what an item without any package dimensions carries.
fn has_dimensions(dimensions: &str) -> bool {
    !dimensions.trim().trim_matches('x').is_empty()
}
