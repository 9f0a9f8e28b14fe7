//! Vendor feed normalization for partsync.
//!
//! Turns raw PIES (item) and ACES (fitment) XML documents into flat
//! [`partsync_core::CatalogItem`] and [`partsync_core::FitmentEntry`] records.
//! Every function here is a pure, synchronous transformation of a byte buffer:
//! no I/O, no environment access, safe to call from any thread.

pub mod aces;
pub mod error;
pub mod pies;
pub mod xml_tree;

pub use aces::{parse_aces, parse_aces_document, AcesDocument};
pub use error::FeedError;
pub use pies::{is_absolute_http_uri, parse_pies};
pub use xml_tree::{parse_document, OneOrMany, XmlNode};
