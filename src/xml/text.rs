//! xml::text
//!
//! Text form of the document tree: a quick-xml event-loop parser and a
//! pretty printer. Not a general-purpose XML stack — namespaces, DTDs,
//! and processing instructions are ignored; this handles the subset the
//! auxiliary-metadata documents use.

use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::{XmlChild, XmlElement, XmlError};

/// Parse an XML document into an element tree.
///
/// Whitespace-only text runs between elements are dropped; other text is
/// trimmed of surrounding whitespace. Comments, declarations, and
/// processing instructions are skipped. Content after the first root
/// element is ignored.
///
/// # Errors
///
/// [`XmlError::Malformed`] for ill-formed markup,
/// [`XmlError::NoRootElement`] when the document holds no element at all.
pub fn parse(text: &str) -> Result<XmlElement, XmlError> {
    let mut reader = Reader::from_str(text);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                stack.push(element_from(e)?);
            }
            Ok(Event::Empty(ref e)) => {
                let el = element_from(e)?;
                attach(&mut stack, &mut root, el);
            }
            Ok(Event::End(_)) => {
                if let Some(el) = stack.pop() {
                    attach(&mut stack, &mut root, el);
                }
            }
            Ok(Event::Text(ref t)) => {
                let content = t
                    .unescape()
                    .map_err(|e| XmlError::Malformed(e.to_string()))?;
                push_text(&mut stack, &content);
            }
            Ok(Event::CData(ref t)) => {
                let content = String::from_utf8_lossy(t);
                push_text(&mut stack, &content);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(XmlError::Malformed(e.to_string())),
        }
    }

    root.ok_or(XmlError::NoRootElement)
}

fn element_from(e: &BytesStart<'_>) -> Result<XmlElement, XmlError> {
    let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut el = XmlElement::new(tag);
    for attr in e.attributes() {
        let attr = attr.map_err(|e| XmlError::Malformed(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| XmlError::Malformed(e.to_string()))?
            .into_owned();
        el.set_attr(key, value);
    }
    Ok(el)
}

fn attach(stack: &mut Vec<XmlElement>, root: &mut Option<XmlElement>, el: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.add_child(el),
        None => {
            if root.is_none() {
                *root = Some(el);
            }
        }
    }
}

fn push_text(stack: &mut [XmlElement], content: &str) {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return;
    }
    if let Some(parent) = stack.last_mut() {
        parent.add_text(trimmed);
    }
}

pub(super) fn fmt_element(
    el: &XmlElement,
    f: &mut std::fmt::Formatter<'_>,
    depth: usize,
) -> std::fmt::Result {
    let indent = "  ".repeat(depth);
    write!(f, "{indent}<{}", el.tag())?;
    for (name, value) in el.attrs() {
        write!(f, " {name}=\"{}\"", escape(value.as_str()))?;
    }

    let children = el.children();
    if children.is_empty() {
        return write!(f, " />");
    }

    let text_only = children.iter().all(|c| matches!(c, XmlChild::Text(_)));
    if text_only {
        write!(f, ">")?;
        for child in children {
            if let XmlChild::Text(t) = child {
                write!(f, "{}", escape(t.as_str()))?;
            }
        }
        return write!(f, "</{}>", el.tag());
    }

    writeln!(f, ">")?;
    for child in children {
        match child {
            XmlChild::Element(nested) => {
                fmt_element(nested, f, depth + 1)?;
                writeln!(f)?;
            }
            XmlChild::Text(t) => {
                writeln!(f, "{}  {}", indent, escape(t.as_str()))?;
            }
        }
    }
    write!(f, "{indent}</{}>", el.tag())
}
