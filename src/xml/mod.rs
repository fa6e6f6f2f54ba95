//! xml
//!
//! Generic document-tree primitives.
//!
//! The overlay core reads and writes auxiliary metadata through an
//! abstract ordered tree: elements carry a tag, ordered attributes, and
//! ordered children that are either nested elements or text. This module
//! provides that tree plus text parsing and printing; it knows nothing
//! about band metadata itself.
//!
//! # Lookup rules
//!
//! Tag and attribute lookup is case-insensitive, and [`XmlElement::value_of`]
//! searches attributes before child elements, so documents written with
//! either convention read back the same way.
//!
//! # Example
//!
//! ```
//! use rasterpam::xml::XmlElement;
//!
//! let mut entry = XmlElement::new("Entry");
//! entry.set_attr("c1", "255");
//! assert_eq!(entry.value_of("C1"), Some("255"));
//!
//! let doc = rasterpam::xml::parse("<Entry c1=\"255\"/>").unwrap();
//! assert_eq!(doc, entry);
//! ```

mod text;

pub use text::parse;

use thiserror::Error;

/// Errors from XML text parsing.
#[derive(Debug, Error)]
pub enum XmlError {
    /// The document is not well formed.
    #[error("malformed xml: {0}")]
    Malformed(String),

    /// The document contains no root element.
    #[error("document has no root element")]
    NoRootElement,
}

/// One child of an element: a nested element or a run of text.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlChild {
    /// A nested element.
    Element(XmlElement),
    /// Text content.
    Text(String),
}

/// An element node: tag, ordered attributes, ordered children.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    tag: String,
    attrs: Vec<(String, String)>,
    children: Vec<XmlChild>,
}

impl XmlElement {
    /// Create an empty element with the given tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Create an element containing a single text child.
    pub fn with_text(tag: impl Into<String>, text: impl Into<String>) -> Self {
        let mut el = Self::new(tag);
        el.add_text(text);
        el
    }

    /// The element's tag.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Case-insensitive tag comparison.
    pub fn tag_is(&self, tag: &str) -> bool {
        self.tag.eq_ignore_ascii_case(tag)
    }

    /// Look up an attribute value (case-insensitive).
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing an existing one of the same name.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .attrs
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&name))
        {
            Some((_, v)) => *v = value,
            None => self.attrs.push((name, value)),
        }
    }

    /// The element's attributes in document order.
    pub fn attrs(&self) -> &[(String, String)] {
        &self.attrs
    }

    /// Append a child element.
    pub fn add_child(&mut self, child: XmlElement) {
        self.children.push(XmlChild::Element(child));
    }

    /// Append a text child.
    pub fn add_text(&mut self, text: impl Into<String>) {
        self.children.push(XmlChild::Text(text.into()));
    }

    /// The element's children in document order.
    pub fn children(&self) -> &[XmlChild] {
        &self.children
    }

    /// Iterate over child elements only.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|c| match c {
            XmlChild::Element(el) => Some(el),
            XmlChild::Text(_) => None,
        })
    }

    /// First child element with the given tag (case-insensitive).
    pub fn child(&self, tag: &str) -> Option<&XmlElement> {
        self.elements().find(|el| el.tag_is(tag))
    }

    /// First text child, if any.
    pub fn text(&self) -> Option<&str> {
        self.children.iter().find_map(|c| match c {
            XmlChild::Text(t) => Some(t.as_str()),
            XmlChild::Element(_) => None,
        })
    }

    /// Look up a named value: an attribute first, then the text content of
    /// a child element of that name. A present-but-empty element yields
    /// `Some("")`.
    pub fn value_of(&self, name: &str) -> Option<&str> {
        if let Some(v) = self.attr(name) {
            return Some(v);
        }
        self.child(name).map(|el| el.text().unwrap_or(""))
    }

    /// Set a named child element's text, creating the element if absent.
    pub fn set_value(&mut self, tag: &str, text: impl Into<String>) {
        let text = text.into();
        for child in &mut self.children {
            if let XmlChild::Element(el) = child {
                if el.tag_is(tag) {
                    el.children.retain(|c| matches!(c, XmlChild::Element(_)));
                    el.children.insert(0, XmlChild::Text(text));
                    return;
                }
            }
        }
        self.add_child(XmlElement::with_text(tag, text));
    }

    /// Total attribute and child count. Attribute nodes count toward the
    /// document's substance the same way child nodes do.
    pub fn node_count(&self) -> usize {
        self.attrs.len() + self.children.len()
    }
}

impl std::fmt::Display for XmlElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        text::fmt_element(self, f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod lookup {
        use super::*;

        #[test]
        fn attr_is_case_insensitive() {
            let mut el = XmlElement::new("Entry");
            el.set_attr("c1", "10");
            assert_eq!(el.attr("C1"), Some("10"));
            assert_eq!(el.attr("c2"), None);
        }

        #[test]
        fn set_attr_replaces_existing() {
            let mut el = XmlElement::new("Entry");
            el.set_attr("band", "1");
            el.set_attr("Band", "2");
            assert_eq!(el.attrs().len(), 1);
            assert_eq!(el.attr("band"), Some("2"));
        }

        #[test]
        fn value_of_prefers_attribute() {
            let mut el = XmlElement::new("Entry");
            el.set_attr("c1", "10");
            el.add_child(XmlElement::with_text("c1", "20"));
            assert_eq!(el.value_of("c1"), Some("10"));
        }

        #[test]
        fn value_of_falls_back_to_child_element() {
            let mut el = XmlElement::new("Root");
            el.add_child(XmlElement::with_text("Offset", "0.5"));
            assert_eq!(el.value_of("Offset"), Some("0.5"));
            assert_eq!(el.value_of("Scale"), None);
        }

        #[test]
        fn value_of_empty_element_is_empty_string() {
            let mut el = XmlElement::new("Root");
            el.add_child(XmlElement::new("Category"));
            assert_eq!(el.value_of("Category"), Some(""));
        }

        #[test]
        fn child_lookup_is_first_match() {
            let mut el = XmlElement::new("Root");
            el.add_child(XmlElement::with_text("Item", "a"));
            el.add_child(XmlElement::with_text("Item", "b"));
            assert_eq!(el.child("item").and_then(|c| c.text()), Some("a"));
        }
    }

    mod mutation {
        use super::*;

        #[test]
        fn set_value_creates_then_updates() {
            let mut el = XmlElement::new("Root");
            el.set_value("Offset", "1.0");
            el.set_value("Offset", "2.0");
            assert_eq!(el.elements().count(), 1);
            assert_eq!(el.value_of("Offset"), Some("2.0"));
        }

        #[test]
        fn node_count_includes_attributes() {
            let mut el = XmlElement::new("Root");
            assert_eq!(el.node_count(), 0);
            el.set_attr("band", "1");
            el.add_child(XmlElement::new("Description"));
            assert_eq!(el.node_count(), 2);
        }
    }
}
