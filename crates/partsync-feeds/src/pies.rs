//! PIES item feed extraction.

use std::collections::BTreeMap;
use std::str::FromStr;

use partsync_core::CatalogItem;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::FeedError;
use crate::xml_tree::{parse_document, XmlNode};

pub const ROOT: &str = "PIES";

const UNKNOWN_BRAND: &str = "Unknown Brand";
const UNCATEGORIZED: &str = "Uncategorized";
const DEFAULT_QTY: i32 = 1;

const CODE_TITLE: &str = "TLE";
const CODE_SHORT: &str = "SHO";
const LONG_CODES: [&str; 2] = ["EXT", "DES"];

/// Parses a PIES document into one [`CatalogItem`] per non-empty `Item`.
///
/// Items come out in document order. Items without any part identifier are
/// still returned (with an empty sku); filtering them is the storage layer's
/// job.
///
/// # Errors
///
/// Returns [`FeedError`] when the buffer is not well-formed XML or its root is
/// not `PIES`. No partial result is produced.
pub fn parse_pies(bytes: &[u8]) -> Result<Vec<CatalogItem>, FeedError> {
    let root = parse_document(bytes)?;
    if root.name() != ROOT {
        return Err(FeedError::MissingRoot {
            expected: ROOT,
            found: root.name().to_string(),
        });
    }

    let items: Vec<CatalogItem> = root
        .children_at(&["Items", "Item"])
        .filter(|item| !item.is_empty())
        .map(extract_item)
        .collect();

    tracing::debug!(items = items.len(), "parsed PIES feed");
    Ok(items)
}

fn extract_item(item: &XmlNode) -> CatalogItem {
    let sku = first_text(item, &["PartNumber", "ItemID", "BaseItemID"])
        .unwrap_or_default()
        .to_string();
    let vendor = item.text_of("BrandLabel").unwrap_or(UNKNOWN_BRAND).to_string();

    let descriptions: Vec<(&str, &str)> = item
        .children_at(&["Descriptions", "Description"])
        .filter_map(|desc| Some((desc.text_of("DescriptionCode")?, desc.text()?)))
        .collect();
    let title = resolve_title(&descriptions, &sku);
    let short_desc = descriptions
        .iter()
        .rev()
        .find(|(code, _)| code_is(code, CODE_SHORT))
        .map(|(_, text)| (*text).to_string())
        .unwrap_or_default();
    let long_desc: String = descriptions
        .iter()
        .filter(|(code, _)| LONG_CODES.iter().any(|long| code_is(code, long)))
        .map(|(_, text)| format!("<p>{text}</p>\n"))
        .collect();

    let (dimensions, weight, qty_available) =
        extract_package(item.descend(&["Packages", "Package"]));

    CatalogItem {
        title,
        sku,
        vendor,
        short_desc,
        long_desc,
        attributes: extract_attributes(item),
        pricing: extract_pricing(item),
        qty_available,
        weight,
        dimensions,
        category: first_text(item, &["PartTypeName", "PartTerminologyID"])
            .unwrap_or(UNCATEGORIZED)
            .to_string(),
        pies_segment: owned_text(item, "PIESSegment"),
        pies_base: owned_text(item, "PIESBase"),
        pies_sub: owned_text(item, "PIESSub"),
        images: extract_images(item),
    }
}

fn resolve_title(descriptions: &[(&str, &str)], sku: &str) -> String {
    let coded = |wanted: &str| {
        descriptions
            .iter()
            .find(|(code, _)| code_is(code, wanted))
            .map(|(_, text)| (*text).to_string())
    };
    coded(CODE_TITLE)
        .or_else(|| coded(CODE_SHORT))
        .unwrap_or_else(|| {
            if sku.is_empty() {
                String::new()
            } else {
                format!("Part {sku}")
            }
        })
}

fn extract_attributes(item: &XmlNode) -> BTreeMap<String, String> {
    let mut attributes = BTreeMap::new();
    for attr in item.children_at(&["ProductAttributes", "ProductAttribute"]) {
        let Some(id) = attr.text_of("AttributeID") else {
            continue;
        };
        let value = attr.text().or_else(|| attr.text_of("Value")).unwrap_or_default();
        attributes.insert(id.to_string(), value.to_string());
    }
    attributes
}

fn extract_package(package: Option<&XmlNode>) -> (String, String, i32) {
    let dims = package.and_then(|p| p.child("Dimensions"));
    let axis = |name: &str| {
        dims.and_then(|d| d.text_of(name))
            .unwrap_or_default()
            .to_string()
    };
    let dimensions = format!(
        "{}x{}x{}",
        axis("ShippingLength"),
        axis("ShippingWidth"),
        axis("ShippingHeight")
    );
    let weight = package
        .and_then(|p| p.descend(&["Weights", "Weight"]))
        .and_then(XmlNode::text)
        .unwrap_or_default()
        .to_string();
    let qty = package
        .and_then(|p| p.text_of("QuantityofEaches"))
        .and_then(parse_quantity)
        .unwrap_or(DEFAULT_QTY);
    (dimensions, weight, qty)
}

fn parse_quantity(raw: &str) -> Option<i32> {
    if let Ok(qty) = raw.parse::<i32>() {
        return Some(qty);
    }
    // Some exporters write whole quantities as "12.0".
    let decimal = Decimal::from_str(raw).ok()?;
    if decimal.fract().is_zero() {
        decimal.to_i32()
    } else {
        None
    }
}

fn extract_pricing(item: &XmlNode) -> BTreeMap<String, Decimal> {
    let mut pricing = BTreeMap::new();
    for entry in item.children_at(&["Prices", "Pricing"]) {
        let Some(code) = entry.text_of("PriceType") else {
            continue;
        };
        let Some(amount) = entry.text_of("Price").and_then(parse_price) else {
            continue;
        };
        pricing.insert(code.to_string(), amount);
    }
    pricing
}

fn parse_price(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

fn extract_images(item: &XmlNode) -> Vec<String> {
    item.children_at(&["DigitalAssets", "DigitalFileInformation"])
        .filter_map(|asset| asset.text_of("URI"))
        .filter(|uri| is_absolute_http_uri(uri))
        .map(str::to_string)
        .collect()
}

/// Returns `true` for an `http://` or `https://` URI with a non-empty host.
///
/// Scheme matching ignores ASCII case. Relative paths, bare file names and
/// other schemes are rejected.
#[must_use]
pub fn is_absolute_http_uri(uri: &str) -> bool {
    if uri.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((scheme, rest)) = uri.split_once("://") else {
        return false;
    };
    if !(scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https")) {
        return false;
    }
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host = authority.rsplit('@').next().unwrap_or_default();
    !host.is_empty() && !host.starts_with(':')
}

fn code_is(code: &str, wanted: &str) -> bool {
    code.trim().eq_ignore_ascii_case(wanted)
}

fn first_text<'a>(node: &'a XmlNode, names: &[&str]) -> Option<&'a str> {
    names.iter().find_map(|name| node.text_of(name))
}

fn owned_text(node: &XmlNode, name: &str) -> String {
    node.text_of(name).unwrap_or_default().to_string()
}

#[cfg(test)]
#[path = "pies_test.rs"]
mod tests;
