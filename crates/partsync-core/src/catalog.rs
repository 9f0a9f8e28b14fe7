use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A vendor catalog item flattened from one PIES `Item` element, ready for
/// storage and outbound sync.
///
/// `sku` is the natural key. Records with an empty sku are structurally valid
/// but must be filtered out before storage; see [`CatalogItem::is_storable`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub title: String,
    pub sku: String,
    /// Brand label, `"Unknown Brand"` when the feed carries none.
    pub vendor: String,
    pub short_desc: String,
    /// `<p>`-wrapped extended/detail descriptions in document order.
    pub long_desc: String,
    /// Attribute id to value. Last occurrence of a duplicate id wins.
    pub attributes: BTreeMap<String, String>,
    /// Price type code (e.g. `"MSRP"`, `"MAP"`) to amount.
    pub pricing: BTreeMap<String, Decimal>,
    pub qty_available: i32,
    /// Raw weight text, no unit inference.
    pub weight: String,
    /// `"{length}x{width}x{height}"`, each axis empty when missing.
    pub dimensions: String,
    pub category: String,
    pub pies_segment: String,
    pub pies_base: String,
    pub pies_sub: String,
    /// Absolute HTTP(S) image URIs in document order.
    pub images: Vec<String>,
}

impl CatalogItem {
    /// Returns `true` when the item carries a non-blank sku and can be upserted.
    #[must_use]
    pub fn is_storable(&self) -> bool {
        !self.sku.trim().is_empty()
    }

    /// Returns the first image URI, if any.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Looks up a price by type code, ignoring ASCII case.
    #[must_use]
    pub fn price(&self, price_type: &str) -> Option<Decimal> {
        self.pricing
            .iter()
            .find(|(code, _)| code.eq_ignore_ascii_case(price_type))
            .map(|(_, amount)| *amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_item(sku: &str) -> CatalogItem {
        CatalogItem {
            title: "Ceramic Brake Pad Set".to_string(),
            sku: sku.to_string(),
            vendor: "Stopwell".to_string(),
            short_desc: "Brake Pad".to_string(),
            long_desc: "<p>Low dust ceramic compound.</p>\n".to_string(),
            attributes: BTreeMap::new(),
            pricing: BTreeMap::from([
                ("MSRP".to_string(), Decimal::new(5999, 2)),
                ("JBR".to_string(), Decimal::new(4150, 2)),
            ]),
            qty_available: 1,
            weight: "2.4".to_string(),
            dimensions: "10x6x3".to_string(),
            category: "Brake Pad".to_string(),
            pies_segment: String::new(),
            pies_base: String::new(),
            pies_sub: String::new(),
            images: vec!["https://cdn.example.com/bp-100.jpg".to_string()],
        }
    }

    #[test]
    fn blank_sku_is_not_storable() {
        assert!(make_item("BP-100").is_storable());
        assert!(!make_item("").is_storable());
        assert!(!make_item("   ").is_storable());
    }

    #[test]
    fn price_lookup_ignores_case() {
        let item = make_item("BP-100");
        assert_eq!(item.price("msrp"), Some(Decimal::new(5999, 2)));
        assert_eq!(item.price("MAP"), None);
    }

    #[test]
    fn primary_image_is_first_uri() {
        let item = make_item("BP-100");
        assert_eq!(
            item.primary_image(),
            Some("https://cdn.example.com/bp-100.jpg")
        );
    }

    #[test]
    fn serializes_pricing_as_decimal_strings() {
        let json = serde_json::to_value(make_item("BP-100")).expect("serialize");
        assert_eq!(json["pricing"]["MSRP"], "59.99");
        assert_eq!(json["sku"], "BP-100");
    }
}
