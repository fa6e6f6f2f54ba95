//! raster::color_table
//!
//! Palette value type for palette-indexed bands.
//!
//! The overlay owns a deep copy of whatever table it is given and
//! serializes it as one `Entry` child per palette slot, channels written
//! as `c1..c4` attributes in the 0-255 range.

use serde::{Deserialize, Serialize};

use crate::xml::XmlElement;

const ENTRY_TAG: &str = "Entry";

/// One palette entry. Channel meaning follows the table's interpretation
/// (red/green/blue/alpha for RGB tables).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ColorEntry {
    pub c1: i16,
    pub c2: i16,
    pub c3: i16,
    pub c4: i16,
}

impl ColorEntry {
    pub fn rgba(c1: i16, c2: i16, c3: i16, c4: i16) -> Self {
        Self { c1, c2, c3, c4 }
    }
}

/// An ordered color table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColorTable {
    entries: Vec<ColorEntry>,
}

impl ColorTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at `index`, if present.
    pub fn entry(&self, index: usize) -> Option<&ColorEntry> {
        self.entries.get(index)
    }

    /// All entries in order.
    pub fn entries(&self) -> &[ColorEntry] {
        &self.entries
    }

    /// Set the entry at `index`, zero-filling any gap below it.
    pub fn set_entry(&mut self, index: usize, entry: ColorEntry) {
        if index >= self.entries.len() {
            self.entries.resize(index + 1, ColorEntry::default());
        }
        self.entries[index] = entry;
    }

    /// Append an entry.
    pub fn push(&mut self, entry: ColorEntry) {
        self.entries.push(entry);
    }

    /// Serialize as a `ColorTable` element with one `Entry` child per slot.
    pub fn to_xml(&self) -> XmlElement {
        let mut node = XmlElement::new("ColorTable");
        for entry in &self.entries {
            let mut entry_node = XmlElement::new(ENTRY_TAG);
            entry_node.set_attr("c1", entry.c1.to_string());
            entry_node.set_attr("c2", entry.c2.to_string());
            entry_node.set_attr("c3", entry.c3.to_string());
            entry_node.set_attr("c4", entry.c4.to_string());
            node.add_child(entry_node);
        }
        node
    }

    /// Rebuild a table from a `ColorTable` element.
    ///
    /// `Entry` children are read in document order with indices assigned
    /// sequentially from zero; missing channels default to 0 except `c4`,
    /// which defaults to 255. Unparseable channel text also falls back to
    /// the channel default. Non-`Entry` children are skipped.
    pub fn from_xml(node: &XmlElement) -> Self {
        let mut table = ColorTable::new();
        for entry_node in node.elements().filter(|el| el.tag_is(ENTRY_TAG)) {
            table.push(ColorEntry {
                c1: channel(entry_node, "c1", 0),
                c2: channel(entry_node, "c2", 0),
                c3: channel(entry_node, "c3", 0),
                c4: channel(entry_node, "c4", 255),
            });
        }
        table
    }
}

fn channel(node: &XmlElement, name: &str, default: i16) -> i16 {
    node.value_of(name)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
