//! `Link` header cursor extraction for REST list endpoints.
//!
//! ```text
//! <https://shop.myshopify.com/admin/api/2024-07/products.json?limit=250&page_info=PREV>; rel="previous",
//! <https://shop.myshopify.com/admin/api/2024-07/products.json?limit=250&page_info=NEXT>; rel="next"
//! ```

/// Returns the `page_info` cursor of the `rel="next"` link, or `None` on the
/// last page.
#[must_use]
pub fn extract_next_cursor(link_header: Option<&str>) -> Option<String> {
    link_header?
        .split(',')
        .filter_map(parse_link)
        .find(|(_, rel)| rel.split_whitespace().any(|r| r == "next"))
        .and_then(|(target, _)| page_info(target))
}

/// Splits one `<target>; rel="..."` directive into its target and rel value.
fn parse_link(directive: &str) -> Option<(&str, &str)> {
    let mut parts = directive.trim().split(';');
    let target = parts
        .next()?
        .trim()
        .strip_prefix('<')?
        .strip_suffix('>')?;
    let rel = parts.find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("rel")
            .then(|| value.trim().trim_matches('"'))
    })?;
    Some((target, rel))
}

fn page_info(target: &str) -> Option<String> {
    let url = reqwest::Url::parse(target).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "page_info")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://parts-demo.myshopify.com/admin/api/2024-07/products.json";

    #[test]
    fn none_without_header() {
        assert!(extract_next_cursor(None).is_none());
        assert!(extract_next_cursor(Some("")).is_none());
    }

    #[test]
    fn single_next_link() {
        let header = format!(r#"<{BASE}?limit=250&page_info=eyJsYXN0X2lkIjo2fQ>; rel="next""#);
        assert_eq!(
            extract_next_cursor(Some(&header)).as_deref(),
            Some("eyJsYXN0X2lkIjo2fQ")
        );
    }

    #[test]
    fn previous_and_next_links() {
        let header = format!(
            r#"<{BASE}?limit=250&page_info=PREV>; rel="previous",  <{BASE}?page_info=NEXT&limit=250>; rel="next""#
        );
        assert_eq!(extract_next_cursor(Some(&header)).as_deref(), Some("NEXT"));
    }

    #[test]
    fn previous_only_is_last_page() {
        let header = format!(r#"<{BASE}?limit=250&page_info=PREV>; rel="previous""#);
        assert!(extract_next_cursor(Some(&header)).is_none());
    }

    #[test]
    fn next_without_page_info() {
        let header = format!(r#"<{BASE}?limit=250>; rel="next""#);
        assert!(extract_next_cursor(Some(&header)).is_none());
    }

    #[test]
    fn malformed_directive_is_ignored() {
        assert!(extract_next_cursor(Some(r#"not a link; rel="next""#)).is_none());
    }
}
