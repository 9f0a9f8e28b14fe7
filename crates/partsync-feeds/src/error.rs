use thiserror::Error;

/// Terminal failure for a whole feed document. Per-record anomalies never
/// surface here; they are defaulted or dropped by the extractors.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML document ended inside unclosed element <{element}>")]
    Truncated { element: String },

    #[error("XML document has no root element")]
    NoRootElement,

    #[error("XML document has more than one root element (found <{element}> after the root)")]
    MultipleRoots { element: String },

    #[error("XML document has text outside the root element")]
    TextOutsideRoot,

    #[error("XML elements nest deeper than {max} levels")]
    TooDeep { max: usize },

    #[error("expected root element <{expected}>, found <{found}>")]
    MissingRoot {
        expected: &'static str,
        found: String,
    },
}
