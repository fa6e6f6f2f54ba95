//! raster::rat
//!
//! Raster attribute table: per-category attributes for a band's discrete
//! value classes. The overlay stores a deep copy and round-trips it
//! through the table's own XML form (`FieldDefn` column definitions
//! followed by `Row` elements of `F` values).

use serde::{Deserialize, Serialize};

use crate::xml::XmlElement;

/// Serialized tag of an attribute-table subtree.
pub const RAT_TAG: &str = "GDALRasterAttributeTable";

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    Integer,
    Real,
    Text,
}

impl FieldType {
    fn code(self) -> u32 {
        match self {
            Self::Integer => 0,
            Self::Real => 1,
            Self::Text => 2,
        }
    }

    fn from_code(code: u32) -> Self {
        match code {
            1 => Self::Real,
            2 => Self::Text,
            _ => Self::Integer,
        }
    }
}

/// Semantic role of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldUsage {
    Generic,
    PixelCount,
    Name,
    Min,
    Max,
    MinMax,
    Red,
    Green,
    Blue,
    Alpha,
}

impl FieldUsage {
    fn code(self) -> u32 {
        match self {
            Self::Generic => 0,
            Self::PixelCount => 1,
            Self::Name => 2,
            Self::Min => 3,
            Self::Max => 4,
            Self::MinMax => 5,
            Self::Red => 6,
            Self::Green => 7,
            Self::Blue => 8,
            Self::Alpha => 9,
        }
    }

    fn from_code(code: u32) -> Self {
        match code {
            1 => Self::PixelCount,
            2 => Self::Name,
            3 => Self::Min,
            4 => Self::Max,
            5 => Self::MinMax,
            6 => Self::Red,
            7 => Self::Green,
            8 => Self::Blue,
            9 => Self::Alpha,
            _ => Self::Generic,
        }
    }
}

/// Column definition.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub field_type: FieldType,
    pub usage: FieldUsage,
}

/// One cell value, typed per its column.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(i64),
    Real(f64),
    Text(String),
}

impl FieldValue {
    fn default_for(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Integer => Self::Int(0),
            FieldType::Real => Self::Real(0.0),
            FieldType::Text => Self::Text(String::new()),
        }
    }

    fn parse(field_type: FieldType, text: &str) -> Self {
        match field_type {
            FieldType::Integer => Self::Int(text.trim().parse().unwrap_or(0)),
            FieldType::Real => Self::Real(text.trim().parse().unwrap_or(0.0)),
            FieldType::Text => Self::Text(text.to_string()),
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Real(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v}"),
        }
    }
}

/// A raster attribute table: typed columns and rows of values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttributeTable {
    fields: Vec<FieldDef>,
    rows: Vec<Vec<FieldValue>>,
}

impl AttributeTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.fields.len()
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table carries neither rows nor columns.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.rows.is_empty()
    }

    /// Column definitions in order.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Append a column. Existing rows gain a default-valued cell.
    pub fn add_field(&mut self, name: impl Into<String>, field_type: FieldType, usage: FieldUsage) {
        self.fields.push(FieldDef {
            name: name.into(),
            field_type,
            usage,
        });
        for row in &mut self.rows {
            row.push(FieldValue::default_for(field_type));
        }
    }

    /// Append a row. Short rows are padded with column defaults, long
    /// rows truncated to the column count.
    pub fn push_row(&mut self, mut values: Vec<FieldValue>) {
        values.truncate(self.fields.len());
        while values.len() < self.fields.len() {
            let field_type = self.fields[values.len()].field_type;
            values.push(FieldValue::default_for(field_type));
        }
        self.rows.push(values);
    }

    /// Cell value at `(row, column)`.
    pub fn value(&self, row: usize, column: usize) -> Option<&FieldValue> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    /// Serialize the table as a [`RAT_TAG`] element.
    pub fn to_xml(&self) -> XmlElement {
        let mut node = XmlElement::new(RAT_TAG);
        for (index, field) in self.fields.iter().enumerate() {
            let mut defn = XmlElement::new("FieldDefn");
            defn.set_attr("index", index.to_string());
            defn.add_child(XmlElement::with_text("Name", field.name.clone()));
            defn.add_child(XmlElement::with_text("Type", field.field_type.code().to_string()));
            defn.add_child(XmlElement::with_text("Usage", field.usage.code().to_string()));
            node.add_child(defn);
        }
        for (index, row) in self.rows.iter().enumerate() {
            let mut row_node = XmlElement::new("Row");
            row_node.set_attr("index", index.to_string());
            for value in row {
                row_node.add_child(XmlElement::with_text("F", value.to_string()));
            }
            node.add_child(row_node);
        }
        node
    }

    /// Rebuild a table from a [`RAT_TAG`] element.
    ///
    /// Unknown type/usage codes fall back to Integer/Generic; cell text
    /// that fails to parse for its column type falls back to the column
    /// default. Unknown children are skipped.
    pub fn from_xml(node: &XmlElement) -> Self {
        let mut table = AttributeTable::new();
        for defn in node.elements().filter(|el| el.tag_is("FieldDefn")) {
            let field_type = FieldType::from_code(parse_code(defn.value_of("Type")));
            let usage = FieldUsage::from_code(parse_code(defn.value_of("Usage")));
            table.add_field(defn.value_of("Name").unwrap_or("").to_string(), field_type, usage);
        }
        for row_node in node.elements().filter(|el| el.tag_is("Row")) {
            let values = row_node
                .elements()
                .filter(|el| el.tag_is("F"))
                .zip(&table.fields)
                .map(|(cell, field)| FieldValue::parse(field.field_type, cell.text().unwrap_or("")))
                .collect();
            table.push_row(values);
        }
        table
    }
}

fn parse_code(text: Option<&str>) -> u32 {
    text.and_then(|t| t.trim().parse().ok()).unwrap_or(0)
}
