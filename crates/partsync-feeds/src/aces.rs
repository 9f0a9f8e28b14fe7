//! ACES fitment (application) feed extraction.

use partsync_core::FitmentEntry;

use crate::error::FeedError;
use crate::xml_tree::{parse_document, XmlNode};

pub const ROOT: &str = "ACES";

/// Result of parsing an ACES document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcesDocument {
    /// Number of `App` elements seen, complete or not.
    pub applications: usize,
    /// Complete applications in document order.
    pub entries: Vec<FitmentEntry>,
}

/// Parses an ACES document, keeping only complete applications.
///
/// # Errors
///
/// See [`parse_aces_document`].
pub fn parse_aces(bytes: &[u8]) -> Result<Vec<FitmentEntry>, FeedError> {
    parse_aces_document(bytes).map(|doc| doc.entries)
}

/// Parses an ACES document and reports how many applications it carried.
///
/// An application missing its part number, make, model or either year bound
/// is dropped without error.
///
/// # Errors
///
/// Returns [`FeedError`] when the buffer is not well-formed XML or its root is
/// not `ACES`.
pub fn parse_aces_document(bytes: &[u8]) -> Result<AcesDocument, FeedError> {
    let root = parse_document(bytes)?;
    if root.name() != ROOT {
        return Err(FeedError::MissingRoot {
            expected: ROOT,
            found: root.name().to_string(),
        });
    }

    let applications = root.children("App").len();
    let entries: Vec<FitmentEntry> = root.children("App").filter_map(extract_app).collect();

    tracing::debug!(
        applications,
        kept = entries.len(),
        "parsed ACES feed"
    );
    Ok(AcesDocument {
        applications,
        entries,
    })
}

fn extract_app(app: &XmlNode) -> Option<FitmentEntry> {
    let years = app.child("Years")?;
    Some(FitmentEntry {
        part_number: app.text_of("Part")?.to_string(),
        make: id_of(app, "Make")?,
        model: id_of(app, "Model")?,
        part_type: id_of(app, "PartType"),
        position: id_of(app, "Position"),
        year_from: years.text_of("from")?.to_string(),
        year_to: years.text_of("to")?.to_string(),
    })
}

fn id_of(app: &XmlNode, name: &str) -> Option<String> {
    app.child(name)
        .and_then(|node| node.text_of("id"))
        .map(str::to_string)
}
