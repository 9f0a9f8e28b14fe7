use super::*;

fn feed(items: &str) -> Vec<u8> {
    format!("<PIES><Items>{items}</Items></PIES>").into_bytes()
}

fn parse_one(item_body: &str) -> CatalogItem {
    let mut items = parse_pies(&feed(&format!("<Item>{item_body}</Item>"))).expect("parse");
    assert_eq!(items.len(), 1);
    items.remove(0)
}

fn descriptions(entries: &[(&str, &str)]) -> String {
    let body: String = entries
        .iter()
        .map(|(code, text)| format!(r#"<Description DescriptionCode="{code}">{text}</Description>"#))
        .collect();
    format!("<PartNumber>BP-100</PartNumber><Descriptions>{body}</Descriptions>")
}

#[test]
fn title_prefers_tle_over_sho() {
    let item = parse_one(&descriptions(&[("SHO", "Brake Pad"), ("TLE", "Ceramic Brake Pad Set")]));
    assert_eq!(item.title, "Ceramic Brake Pad Set");
    assert_eq!(item.short_desc, "Brake Pad");
}

#[test]
fn title_falls_back_to_sho() {
    let item = parse_one(&descriptions(&[("SHO", "Brake Pad")]));
    assert_eq!(item.title, "Brake Pad");
}

#[test]
fn title_falls_back_to_part_number() {
    let item = parse_one(&descriptions(&[("EXT", "Long text only")]));
    assert_eq!(item.title, "Part BP-100");
}

#[test]
fn blank_descriptions_count_as_absent() {
    let item = parse_one(&descriptions(&[("TLE", "   "), ("SHO", "Brake Pad")]));
    assert_eq!(item.title, "Brake Pad");
}

#[test]
fn description_codes_ignore_case_and_padding() {
    let item = parse_one(&descriptions(&[(" tle ", "Rotor Kit")]));
    assert_eq!(item.title, "Rotor Kit");
}

#[test]
fn title_is_empty_when_sku_and_descriptions_missing() {
    let item = parse_one("<BrandLabel>Stopwell</BrandLabel>");
    assert_eq!(item.sku, "");
    assert_eq!(item.title, "");
}

#[test]
fn sku_falls_back_through_identifiers() {
    assert_eq!(parse_one("<ItemID>I-1</ItemID><BaseItemID>B-1</BaseItemID>").sku, "I-1");
    assert_eq!(parse_one("<BaseItemID>B-1</BaseItemID>").sku, "B-1");
    assert_eq!(
        parse_one("<PartNumber>P-1</PartNumber><ItemID>I-1</ItemID>").sku,
        "P-1"
    );
}

#[test]
fn defaults_apply_when_fields_missing() {
    let item = parse_one("<PartNumber>BP-100</PartNumber>");
    assert_eq!(item.vendor, "Unknown Brand");
    assert_eq!(item.category, "Uncategorized");
    assert_eq!(item.qty_available, 1);
    assert_eq!(item.dimensions, "xx");
    assert_eq!(item.weight, "");
    assert!(item.pricing.is_empty());
    assert!(item.attributes.is_empty());
    assert!(item.images.is_empty());
    assert_eq!(item.long_desc, "");
}

#[test]
fn long_desc_wraps_ext_and_des_in_order() {
    let item = parse_one(&descriptions(&[
        ("DES", "First"),
        ("SHO", "Short"),
        ("EXT", "Second &lt;b&gt;"),
    ]));
    assert_eq!(item.long_desc, "<p>First</p>\n<p>Second <b></p>\n");
}

#[test]
fn last_sho_is_short_desc() {
    let item = parse_one(&descriptions(&[("SHO", "One"), ("SHO", "Two")]));
    assert_eq!(item.short_desc, "Two");
    assert_eq!(item.title, "One");
}

#[test]
fn pricing_skips_non_numeric_values() {
    let item = parse_one(
        r#"<PartNumber>BP-100</PartNumber>
        <Prices>
          <Pricing PriceType="MSRP"><Price UOM="PE">59.99</Price></Pricing>
          <Pricing PriceType="MAP"><Price>bogus</Price></Pricing>
          <Pricing PriceType="LST"><Price></Price></Pricing>
        </Prices>"#,
    );
    assert_eq!(
        item.pricing,
        BTreeMap::from([("MSRP".to_string(), Decimal::new(5999, 2))])
    );
}

#[test]
fn pricing_accepts_attribute_and_element_shapes() {
    let item = parse_one(
        r#"<PartNumber>BP-100</PartNumber>
        <Prices>
          <Pricing PriceType="JBR" Price="41.50"/>
          <Pricing><PriceType>RET</PriceType><Price>55</Price></Pricing>
        </Prices>"#,
    );
    assert_eq!(item.price("JBR"), Some(Decimal::new(4150, 2)));
    assert_eq!(item.price("RET"), Some(Decimal::new(55, 0)));
}

#[test]
fn duplicate_price_type_keeps_last() {
    let item = parse_one(
        r#"<PartNumber>BP-100</PartNumber>
        <Prices>
          <Pricing PriceType="MSRP" Price="10.00"/>
          <Pricing PriceType="MSRP" Price="12.00"/>
        </Prices>"#,
    );
    assert_eq!(item.price("MSRP"), Some(Decimal::new(1200, 2)));
}

#[test]
fn attributes_keep_last_duplicate_and_skip_missing_ids() {
    let item = parse_one(
        r#"<PartNumber>BP-100</PartNumber>
        <ProductAttributes>
          <ProductAttribute AttributeID="Material">Steel</ProductAttribute>
          <ProductAttribute AttributeID="Material">Ceramic</ProductAttribute>
          <ProductAttribute AttributeID="Finish" Value="Black"/>
          <ProductAttribute AttributeID="Coated"/>
          <ProductAttribute>orphan</ProductAttribute>
        </ProductAttributes>"#,
    );
    assert_eq!(
        item.attributes,
        BTreeMap::from([
            ("Coated".to_string(), String::new()),
            ("Finish".to_string(), "Black".to_string()),
            ("Material".to_string(), "Ceramic".to_string()),
        ])
    );
}

#[test]
fn package_reads_dimensions_weight_and_quantity() {
    let item = parse_one(
        r#"<PartNumber>BP-100</PartNumber>
        <Packages>
          <Package>
            <QuantityofEaches>4</QuantityofEaches>
            <Dimensions UOM="IN"><ShippingLength>10</ShippingLength><ShippingHeight>3</ShippingHeight></Dimensions>
            <Weights UOM="PG"><Weight>2.4</Weight></Weights>
          </Package>
          <Package><QuantityofEaches>99</QuantityofEaches></Package>
        </Packages>"#,
    );
    assert_eq!(item.qty_available, 4);
    assert_eq!(item.dimensions, "10xx3");
    assert_eq!(item.weight, "2.4");
}

#[test]
fn non_numeric_quantity_defaults_to_one() {
    let qty = |raw: &str| {
        parse_one(&format!(
            "<PartNumber>X</PartNumber><Packages><Package><QuantityofEaches>{raw}</QuantityofEaches></Package></Packages>"
        ))
        .qty_available
    };
    assert_eq!(qty("ten"), 1);
    assert_eq!(qty("2.5"), 1);
    assert_eq!(qty("12.0"), 12);
}

#[test]
fn images_keep_only_absolute_http_uris() {
    let item = parse_one(
        r#"<PartNumber>BP-100</PartNumber>
        <DigitalAssets>
          <DigitalFileInformation><URI>https://cdn.example.com/a.jpg</URI></DigitalFileInformation>
          <DigitalFileInformation><URI>a-side.jpg</URI></DigitalFileInformation>
          <DigitalFileInformation><URI>/images/a.jpg</URI></DigitalFileInformation>
          <DigitalFileInformation><FileName>no-uri.jpg</FileName></DigitalFileInformation>
          <DigitalFileInformation><URI>HTTP://cdn.example.com/b.jpg</URI></DigitalFileInformation>
        </DigitalAssets>"#,
    );
    assert_eq!(
        item.images,
        ["https://cdn.example.com/a.jpg", "HTTP://cdn.example.com/b.jpg"]
    );
}

#[test]
fn absolute_http_uri_checks() {
    assert!(is_absolute_http_uri("https://cdn.example.com/x.jpg"));
    assert!(is_absolute_http_uri("http://cdn.example.com"));
    assert!(is_absolute_http_uri("https://user@cdn.example.com:8443/x"));
    assert!(!is_absolute_http_uri("https:///x.jpg"));
    assert!(!is_absolute_http_uri("https://:443/x.jpg"));
    assert!(!is_absolute_http_uri("ftp://cdn.example.com/x.jpg"));
    assert!(!is_absolute_http_uri("httpx://cdn.example.com"));
    assert!(!is_absolute_http_uri("http://cdn example.com"));
    assert!(!is_absolute_http_uri("x.jpg"));
}

#[test]
fn taxonomy_prefers_part_type_name() {
    let item = parse_one(
        "<PartNumber>X</PartNumber><PartTypeName>Brake Pad</PartTypeName><PartTerminologyID>1684</PartTerminologyID><PIESSegment>Brake</PIESSegment>",
    );
    assert_eq!(item.category, "Brake Pad");
    assert_eq!(item.pies_segment, "Brake");
    assert_eq!(item.pies_base, "");
}

#[test]
fn empty_items_are_skipped_but_empty_sku_is_kept() {
    let items = parse_pies(&feed("<Item/><Item><BrandLabel>Acme</BrandLabel></Item><Item></Item>"))
        .expect("parse");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].vendor, "Acme");
    assert_eq!(items[0].sku, "");
}

#[test]
fn missing_items_block_is_empty_result() {
    let items = parse_pies(b"<PIES><Header><PIESVersion>7.2</PIESVersion></Header></PIES>")
        .expect("parse");
    assert!(items.is_empty());
}

#[test]
fn wrong_root_is_rejected() {
    let err = parse_pies(b"<ACES><App/></ACES>").unwrap_err();
    assert!(matches!(
        err,
        FeedError::MissingRoot { expected: "PIES", ref found } if found == "ACES"
    ));
}

#[test]
fn malformed_buffer_is_an_error() {
    assert!(parse_pies(b"<PIES><Items><Item></Items></PIES>").is_err());
    assert!(parse_pies(b"not xml at all").is_err());
}

#[test]
fn junk_around_the_root_fails_the_whole_feed() {
    let err = parse_pies(
        b"garbage not xml <PIES><Items><Item><PartNumber>A</PartNumber></Item></Items></PIES> trailing junk",
    )
    .unwrap_err();
    assert!(matches!(err, FeedError::TextOutsideRoot));
}

#[test]
fn deeply_nested_item_fails_the_whole_feed() {
    let body = format!("{}{}", "<Note>".repeat(300), "</Note>".repeat(300));
    let err = parse_pies(&feed(&format!("<Item>{body}</Item>"))).unwrap_err();
    assert!(matches!(err, FeedError::TooDeep { .. }));
}
