use partsync_core::dedup_fitments;
use partsync_feeds::{parse_aces_document, parse_pies, FeedError};
use rust_decimal::Decimal;

const PIES_LIST: &[u8] = include_bytes!("fixtures/pies_list.xml");
const PIES_SINGLE: &[u8] = include_bytes!("fixtures/pies_single.xml");
const PIES_TRUNCATED: &[u8] = include_bytes!("fixtures/pies_truncated.xml");
const ACES: &[u8] = include_bytes!("fixtures/aces.xml");

#[test]
fn pies_fixture_extracts_every_field() {
    let items = parse_pies(PIES_LIST).expect("parse pies fixture");
    assert_eq!(items.len(), 2);

    let pad = &items[0];
    assert_eq!(pad.sku, "BP-100");
    assert_eq!(pad.title, "Brake Pad");
    assert_eq!(pad.vendor, "Stopwell");
    assert_eq!(pad.short_desc, "Brake Pad");
    assert_eq!(
        pad.long_desc,
        "<p>Low dust ceramic compound.</p>\n<p>Includes shims & hardware.</p>\n"
    );
    assert_eq!(pad.attributes.get("Material").map(String::as_str), Some("Ceramic"));
    assert_eq!(pad.attributes.get("Finish").map(String::as_str), Some("Black"));
    assert_eq!(pad.pricing.len(), 2);
    assert_eq!(pad.price("MSRP"), Some(Decimal::new(5999, 2)));
    assert_eq!(pad.price("JBR"), Some(Decimal::new(4150, 2)));
    assert_eq!(pad.price("MAP"), None);
    assert_eq!(pad.qty_available, 2);
    assert_eq!(pad.dimensions, "10x6x3");
    assert_eq!(pad.weight, "2.4");
    assert_eq!(pad.category, "1684");
    assert_eq!(
        (pad.pies_segment.as_str(), pad.pies_base.as_str(), pad.pies_sub.as_str()),
        ("Brake", "Pad", "Ceramic")
    );
    assert_eq!(pad.images, ["https://cdn.example.com/assets/bp-100.jpg"]);

    let rotor = &items[1];
    assert_eq!(rotor.sku, "RT-220");
    assert_eq!(rotor.title, "Vented Front Rotor");
    assert_eq!(rotor.vendor, "Unknown Brand");
    assert_eq!(rotor.category, "Brake Rotor");
}

#[test]
fn single_item_feed_matches_list_head() {
    let single = parse_pies(PIES_SINGLE).expect("parse single");
    let list = parse_pies(PIES_LIST).expect("parse list");
    assert_eq!(single.len(), 1);
    assert_eq!(single[0], list[0]);
}

#[test]
fn truncated_pies_fails_whole_document() {
    let err = parse_pies(PIES_TRUNCATED).unwrap_err();
    assert!(matches!(err, FeedError::Truncated { .. } | FeedError::Xml(_)));
}

#[test]
fn aces_fixture_drops_incomplete_and_dedups() {
    let doc = parse_aces_document(ACES).expect("parse aces fixture");
    assert_eq!(doc.applications, 4);
    assert_eq!(doc.entries.len(), 3);

    let first = &doc.entries[0];
    assert_eq!(first.part_number, "BP-100");
    assert_eq!((first.year_from.as_str(), first.year_to.as_str()), ("2010", "2015"));
    assert_eq!((first.make.as_str(), first.model.as_str()), ("TOYOTA", "CAMRY"));
    assert_eq!(first.position.as_deref(), Some("1"));

    let unique = dedup_fitments(doc.entries);
    assert_eq!(unique.len(), 2);
    assert_eq!(unique[0].position.as_deref(), Some("1"));
    assert_eq!(unique[1].part_number, "RT-220");
}

#[test]
fn feeds_parse_from_worker_threads() {
    let handles: Vec<_> = (0..4)
        .map(|_| std::thread::spawn(|| parse_pies(PIES_LIST).map(|items| items.len())))
        .collect();
    for handle in handles {
        assert_eq!(handle.join().expect("thread").expect("parse"), 2);
    }
}
