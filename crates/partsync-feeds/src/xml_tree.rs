//! Attribute-merged XML tree.
//!
//! Vendor feeds put the same datum in an attribute in one file and in a child
//! element in the next (`<Price UOM="PE">59.99</Price>` vs `Price="59.99"`),
//! and any element may occur once or many times depending on the instance
//! document. [`XmlNode`] flattens both differences away: attributes and child
//! elements are stored side by side as named fields, and every field is a
//! [`OneOrMany`], so callers iterate without ever branching on cardinality.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::FeedError;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Deepest element nesting accepted by [`parse_document`]. Real feeds stay
/// under ten levels; the finished tree is dropped recursively.
pub const MAX_DEPTH: usize = 256;

/// A field that occurred once or several times under the same name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// All occurrences in document order.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        match self {
            Self::One(value) => std::slice::from_ref(value),
            Self::Many(values) => values,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.as_slice().first()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    /// Appends an occurrence, promoting `One` to `Many`.
    pub fn push(&mut self, value: T) {
        let previous = std::mem::replace(self, Self::Many(Vec::new()));
        *self = match previous {
            Self::One(first) => Self::Many(vec![first, value]),
            Self::Many(mut values) => {
                values.push(value);
                Self::Many(values)
            }
        };
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(value) => vec![value],
            Self::Many(values) => values,
        }
    }
}

impl<'a, T> IntoIterator for &'a OneOrMany<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One element (or attribute) of a parsed document.
///
/// Attributes become leaf nodes that hold only text. Field names are local
/// names: namespace prefixes are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlNode {
    name: String,
    text: Option<String>,
    fields: Vec<(String, OneOrMany<XmlNode>)>,
}

impl XmlNode {
    fn new(name: String) -> Self {
        Self {
            name,
            text: None,
            fields: Vec::new(),
        }
    }

    fn leaf(name: String, text: &str) -> Self {
        Self {
            name,
            text: non_empty(text),
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Trimmed element text, `None` when blank.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// `true` when the node has no attributes, no children and no text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.fields.is_empty()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&OneOrMany<XmlNode>> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, nodes)| nodes)
    }

    /// Every attribute or child element called `name`, in document order.
    pub fn children(&self, name: &str) -> std::slice::Iter<'_, XmlNode> {
        self.get(name)
            .map_or(&[] as &[XmlNode], OneOrMany::as_slice)
            .iter()
    }

    #[must_use]
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children(name).next()
    }

    /// Text of the first attribute or child element called `name`.
    #[must_use]
    pub fn text_of(&self, name: &str) -> Option<&str> {
        self.child(name).and_then(XmlNode::text)
    }

    /// Follows the first occurrence at each step of `path`.
    #[must_use]
    pub fn descend(&self, path: &[&str]) -> Option<&XmlNode> {
        path.iter().try_fold(self, |node, name| node.child(name))
    }

    /// Every node at the last step of `path`, below the first occurrence of
    /// each container step. `children_at(&["Items", "Item"])` yields all items.
    pub fn children_at(&self, path: &[&str]) -> std::slice::Iter<'_, XmlNode> {
        match path.split_last() {
            Some((leaf, containers)) => match self.descend(containers) {
                Some(container) => container.children(leaf),
                None => [].iter(),
            },
            None => [].iter(),
        }
    }

    fn insert(&mut self, node: XmlNode) {
        if let Some((_, nodes)) = self.fields.iter_mut().find(|(field, _)| *field == node.name) {
            nodes.push(node);
        } else {
            self.fields.push((node.name.clone(), OneOrMany::One(node)));
        }
    }
}

struct OpenElement {
    node: XmlNode,
    text: String,
}

impl OpenElement {
    fn finish(mut self) -> XmlNode {
        self.node.text = non_empty(&self.text);
        self.node
    }
}

/// Parses a complete document into its root [`XmlNode`].
///
/// # Errors
///
/// The whole document fails with a single [`FeedError`] when the bytes are not
/// UTF-8, the XML is malformed, the input ends inside an open element, or the
/// document has no (or more than one) root element, non-whitespace text sits
/// outside the root, or elements nest deeper than [`MAX_DEPTH`].
pub fn parse_document(bytes: &[u8]) -> Result<XmlNode, FeedError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let xml = std::str::from_utf8(bytes)?;

    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<OpenElement> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let node = start_node(&e)?;
                if stack.is_empty() && root.is_some() {
                    return Err(FeedError::MultipleRoots { element: node.name });
                }
                if stack.len() >= MAX_DEPTH {
                    return Err(FeedError::TooDeep { max: MAX_DEPTH });
                }
                stack.push(OpenElement {
                    node,
                    text: String::new(),
                });
            }
            Event::Empty(e) => {
                let node = start_node(&e)?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::End(_) => {
                if let Some(open) = stack.pop() {
                    attach(&mut stack, &mut root, open.finish())?;
                }
            }
            Event::Text(e) => {
                let text = e.unescape().map_err(quick_xml::Error::from)?;
                match stack.last_mut() {
                    Some(open) => open.text.push_str(&text),
                    None if text.trim().is_empty() => {}
                    None => return Err(FeedError::TextOutsideRoot),
                }
            }
            Event::CData(e) => {
                let raw = e.into_inner();
                match stack.last_mut() {
                    Some(open) => open.text.push_str(&String::from_utf8_lossy(&raw)),
                    None => return Err(FeedError::TextOutsideRoot),
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(FeedError::Truncated {
            element: open.node.name.clone(),
        });
    }

    root.ok_or(FeedError::NoRootElement)
}

fn start_node(start: &BytesStart<'_>) -> Result<XmlNode, FeedError> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut node = XmlNode::new(name);

    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = attr.key;
        let is_namespace_decl = key.as_ref() == b"xmlns"
            || key.prefix().is_some_and(|prefix| prefix.as_ref() == b"xmlns");
        if is_namespace_decl {
            continue;
        }
        let attr_name = String::from_utf8_lossy(key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value().map_err(quick_xml::Error::from)?;
        node.insert(XmlNode::leaf(attr_name, &value));
    }

    Ok(node)
}

fn attach(
    stack: &mut [OpenElement],
    root: &mut Option<XmlNode>,
    node: XmlNode,
) -> Result<(), FeedError> {
    match stack.last_mut() {
        Some(parent) => parent.node.insert(node),
        None if root.is_some() => {
            return Err(FeedError::MultipleRoots { element: node.name });
        }
        None => *root = Some(node),
    }
    Ok(())
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
