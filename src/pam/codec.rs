//! pam::codec
//!
//! Translation between a band's overlay state and its `PAMRasterBand`
//! document.
//!
//! Serialization writes child elements only for fields that differ from
//! their defaults, so an untouched band produces no document at all.
//! Deserialization is tolerant: unparseable numeric text falls back to
//! field defaults and unknown children are ignored, which keeps old or
//! hand-edited sidecar files readable.
//!
//! # Nodata encoding
//!
//! Floating-point nodata is written as scientific text at 14 significant
//! digits (`nan` for NaN). That text cannot always reproduce the exact
//! bit pattern, so non-integral values - and values the text form fails
//! to round-trip - also carry a `le_hex_equiv` attribute holding the raw
//! little-endian bytes in hex. Readers prefer the hex form when it is
//! exactly 8 bytes and fall back to the text otherwise. Int64/UInt64
//! nodata is plain decimal text, chosen on read by the band's pixel type.

use crate::error::Result;
use crate::pam::band::PamBand;
use crate::pam::histogram;
use crate::pam::record::{BandStats, NoDataValue, PamRecord};
use crate::raster::band::RasterBand;
use crate::raster::color_table::ColorTable;
use crate::raster::metadata::MetadataDomains;
use crate::raster::rat::{AttributeTable, RAT_TAG};
use crate::raster::types::{BandDataType, ColorInterp};
use crate::xml::{XmlChild, XmlElement};

/// Root tag of a per-band overlay document.
pub const BAND_TAG: &str = "PAMRasterBand";

/// Build the overlay document for one band.
///
/// Returns `None` when nothing of substance would be written (at most one
/// attribute or child on the root).
pub(crate) fn serialize_record(
    record: &PamRecord,
    description: &str,
    metadata: &MetadataDomains,
    band_index: i32,
) -> Option<XmlElement> {
    let mut tree = XmlElement::new(BAND_TAG);
    if band_index > 0 {
        tree.set_attr("band", band_index.to_string());
    }

    if !description.is_empty() {
        tree.set_value("Description", description);
    }

    match record.nodata {
        NoDataValue::Unset => {}
        NoDataValue::Double(value) => {
            let text = if value.is_nan() {
                "nan".to_string()
            } else {
                format!("{value:.13E}")
            };
            let mut node = XmlElement::with_text("NoDataValue", text.clone());
            let round_trips = text.parse::<f64>().map_or(false, |parsed| parsed == value);
            if value != value.floor() || !round_trips {
                node.set_attr("le_hex_equiv", hex::encode_upper(value.to_le_bytes()));
            }
            tree.add_child(node);
        }
        NoDataValue::Int64(value) => tree.set_value("NoDataValue", value.to_string()),
        NoDataValue::UInt64(value) => tree.set_value("NoDataValue", value.to_string()),
    }

    if let Some(unit) = &record.unit_type {
        tree.set_value("UnitType", unit.clone());
    }
    if record.offset != 0.0 {
        tree.set_value("Offset", format_double(record.offset));
    }
    if record.scale != 1.0 {
        tree.set_value("Scale", format_double(record.scale));
    }
    if record.color_interp != ColorInterp::Undefined {
        tree.set_value("ColorInterp", record.color_interp.name());
    }

    if let Some(names) = &record.category_names {
        let mut list = XmlElement::new("CategoryNames");
        for name in names {
            list.add_child(XmlElement::with_text("Category", name.clone()));
        }
        tree.add_child(list);
    }

    if let Some(table) = &record.color_table {
        tree.add_child(table.to_xml());
    }

    if let Some((min, max)) = record.min_max {
        tree.set_value("Minimum", format_double(min));
        tree.set_value("Maximum", format_double(max));
    }
    if let Some(stats) = &record.stats {
        tree.set_value("Mean", format_double(stats.mean));
        tree.set_value("StandardDeviation", format_double(stats.std_dev));
    }

    if let Some(entries) = &record.histograms {
        tree.add_child(histogram::list_to_xml(entries));
    }
    if let Some(rat) = &record.default_rat {
        tree.add_child(rat.to_xml());
    }
    for node in metadata.to_xml() {
        tree.add_child(node);
    }

    // A document carrying at most one node has nothing worth persisting.
    if tree.node_count() <= 1 {
        return None;
    }
    Some(tree)
}

/// Apply an overlay document to a band.
///
/// The band is lazily initialized first; field values flow through the
/// overlay setters, so applying a document marks the store dirty the same
/// way direct mutation would. Applying the same document twice leaves the
/// band in the same state.
pub(crate) fn apply<B: RasterBand>(band: &mut PamBand<B>, doc: &XmlElement) -> Result<()> {
    band.ensure_initialized();

    band.metadata.merge_from_xml(doc);
    band.description = doc.value_of("Description").unwrap_or("").to_string();

    if let Some(node) = doc.child("NoDataValue") {
        apply_nodata(band, node);
    }

    let offset = doc.value_of("Offset").map(parse_double);
    let scale = doc.value_of("Scale").map(parse_double);
    if offset.is_some() || scale.is_some() {
        let _ = band.set_offset(offset.unwrap_or(0.0));
        let _ = band.set_scale(scale.unwrap_or(1.0));
    }

    if let Some(unit) = doc.value_of("UnitType") {
        let _ = band.set_unit_type(unit);
    }
    if let Some(name) = doc.value_of("ColorInterp") {
        let _ = band.set_color_interpretation(ColorInterp::from_name(name));
    }

    if let Some(list) = doc.child("CategoryNames") {
        let names = category_names_from(list);
        let _ = band.set_category_names(&names);
    }

    if let Some(table_node) = doc.child("ColorTable") {
        let table = ColorTable::from_xml(table_node);
        let _ = band.set_color_table(Some(&table));
    }

    if let (Some(min), Some(max)) = (doc.value_of("Minimum"), doc.value_of("Maximum")) {
        let pair = (parse_double(min), parse_double(max));
        if let Some(record) = band.record.as_mut() {
            record.min_max = Some(pair);
        }
    }
    if let (Some(mean), Some(std_dev)) =
        (doc.value_of("Mean"), doc.value_of("StandardDeviation"))
    {
        let stats = BandStats {
            mean: parse_double(mean),
            std_dev: parse_double(std_dev),
        };
        if let Some(record) = band.record.as_mut() {
            record.stats = Some(stats);
        }
    }

    if let Some(list) = doc.child(histogram::HISTOGRAMS_TAG) {
        let entries = histogram::list_from_xml(list);
        if let Some(record) = band.record.as_mut() {
            record.histograms = Some(entries);
        }
    }

    if let Some(rat_node) = doc.child(RAT_TAG) {
        let table = AttributeTable::from_xml(rat_node);
        if let Some(record) = band.record.as_mut() {
            record.default_rat = Some(table);
        }
    }

    Ok(())
}

fn apply_nodata<B: RasterBand>(band: &mut PamBand<B>, node: &XmlElement) {
    let text = node.text().unwrap_or("");
    if let Some(hex_text) = node.attr("le_hex_equiv") {
        let exact = hex::decode(hex_text)
            .ok()
            .and_then(|bytes| <[u8; 8]>::try_from(bytes.as_slice()).ok())
            .map(f64::from_le_bytes);
        let value = exact.unwrap_or_else(|| parse_double(text));
        let _ = band.set_nodata_value(value);
        return;
    }
    match band.data_type() {
        BandDataType::Int64 => {
            let _ = band.set_nodata_value_i64(text.trim().parse().unwrap_or(0));
        }
        BandDataType::UInt64 => {
            let _ = band.set_nodata_value_u64(text.trim().parse().unwrap_or(0));
        }
        _ => {
            let _ = band.set_nodata_value(parse_double(text));
        }
    }
}

/// Category entries keep empty text content; entries whose first node is
/// an attribute or a nested element are not plain names and are skipped.
fn category_names_from(list: &XmlElement) -> Vec<String> {
    let mut names = Vec::new();
    for child in list.children() {
        let XmlChild::Element(entry) = child else {
            continue;
        };
        if !entry.tag_is("Category") || !entry.attrs().is_empty() {
            continue;
        }
        if let Some(XmlChild::Element(_)) = entry.children().first() {
            continue;
        }
        names.push(entry.text().unwrap_or("").to_string());
    }
    names
}

/// Shortest text that parses back to exactly the same value.
fn format_double(value: f64) -> String {
    format!("{value:?}")
}

fn parse_double(text: &str) -> f64 {
    text.trim().parse().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pam::store::PamStore;
    use crate::raster::mem::MemoryBand;
    use crate::raster::types::BandDataType;

    fn linked_band(data_type: BandDataType) -> PamBand<MemoryBand> {
        let mut inner = MemoryBand::new(data_type);
        inner.set_band_index(1);
        inner.attach_store(PamStore::shared());
        PamBand::new(inner)
    }

    mod serialize {
        use super::*;

        #[test]
        fn untouched_band_produces_no_document() {
            let mut band = linked_band(BandDataType::UInt8);
            band.ensure_initialized();
            assert!(band.serialize().is_none());
        }

        #[test]
        fn single_field_with_band_attribute_survives() {
            let mut band = linked_band(BandDataType::UInt8);
            band.set_unit_type("m").unwrap();
            let doc = band.serialize().unwrap();
            assert_eq!(doc.attr("band"), Some("1"));
            assert_eq!(doc.value_of("UnitType"), Some("m"));
        }

        #[test]
        fn single_field_without_band_attribute_is_dropped() {
            let mut inner = MemoryBand::new(BandDataType::UInt8);
            inner.attach_store(PamStore::shared());
            let mut band = PamBand::new(inner);
            band.set_unit_type("m").unwrap();
            assert!(band.serialize().is_none());
        }

        #[test]
        fn default_offset_and_scale_are_omitted() {
            let mut band = linked_band(BandDataType::UInt8);
            band.set_offset(0.0).unwrap();
            band.set_scale(1.0).unwrap();
            band.set_description("x");
            let doc = band.serialize().unwrap();
            assert!(doc.child("Offset").is_none());
            assert!(doc.child("Scale").is_none());
        }

        #[test]
        fn integral_nodata_has_no_hex_attribute() {
            let mut band = linked_band(BandDataType::UInt8);
            band.set_nodata_value(255.0).unwrap();
            let doc = band.serialize().unwrap();
            let node = doc.child("NoDataValue").unwrap();
            assert!(node.attr("le_hex_equiv").is_none());
            assert_eq!(parse_double(node.text().unwrap()), 255.0);
        }

        #[test]
        fn fractional_nodata_carries_hex_bits() {
            let value = 3.14159265358979_f64;
            let mut band = linked_band(BandDataType::Float64);
            band.set_nodata_value(value).unwrap();
            let doc = band.serialize().unwrap();
            let node = doc.child("NoDataValue").unwrap();
            let hex_text = node.attr("le_hex_equiv").unwrap();
            assert_eq!(hex::decode(hex_text).unwrap(), value.to_le_bytes());
        }

        #[test]
        fn nan_nodata_uses_the_literal() {
            let mut band = linked_band(BandDataType::Float32);
            band.set_nodata_value(f64::NAN).unwrap();
            let doc = band.serialize().unwrap();
            let node = doc.child("NoDataValue").unwrap();
            assert_eq!(node.text(), Some("nan"));
            assert!(node.attr("le_hex_equiv").is_some());
        }

        #[test]
        fn int64_nodata_is_decimal_text() {
            let mut band = linked_band(BandDataType::Int64);
            band.set_nodata_value_i64(-1234567890123).unwrap();
            let doc = band.serialize().unwrap();
            assert_eq!(doc.value_of("NoDataValue"), Some("-1234567890123"));
        }
    }

    mod deserialize {
        use super::*;
        use crate::pam::record::NoDataValue;

        fn apply_to(band: &mut PamBand<MemoryBand>, xml: &str) {
            let doc = crate::xml::parse(xml).unwrap();
            band.deserialize(&doc).unwrap();
        }

        #[test]
        fn hex_nodata_wins_over_text() {
            let value = 0.1_f64;
            let xml = format!(
                "<PAMRasterBand><NoDataValue le_hex_equiv=\"{}\">9.9E1</NoDataValue></PAMRasterBand>",
                hex::encode_upper(value.to_le_bytes())
            );
            let mut band = linked_band(BandDataType::Float64);
            apply_to(&mut band, &xml);
            assert_eq!(band.nodata_value(), Some(value));
        }

        #[test]
        fn wrong_length_hex_falls_back_to_text() {
            let xml = "<PAMRasterBand>\
                         <NoDataValue le_hex_equiv=\"AABB\">42</NoDataValue>\
                       </PAMRasterBand>";
            let mut band = linked_band(BandDataType::Float64);
            apply_to(&mut band, xml);
            assert_eq!(band.nodata_value(), Some(42.0));
        }

        #[test]
        fn pixel_type_selects_integer_nodata() {
            let xml = "<PAMRasterBand><NoDataValue>-7</NoDataValue></PAMRasterBand>";
            let mut band = linked_band(BandDataType::Int64);
            apply_to(&mut band, xml);
            assert_eq!(band.nodata_value_i64().unwrap(), Some(-7));

            let xml = "<PAMRasterBand><NoDataValue>18446744073709551615</NoDataValue></PAMRasterBand>";
            let mut band = linked_band(BandDataType::UInt64);
            apply_to(&mut band, xml);
            assert_eq!(band.nodata_value_u64().unwrap(), Some(u64::MAX));
        }

        #[test]
        fn lone_scale_resets_offset_to_default() {
            let mut band = linked_band(BandDataType::UInt8);
            band.set_offset(9.0).unwrap();
            apply_to(&mut band, "<PAMRasterBand><Scale>2.5</Scale></PAMRasterBand>");
            assert_eq!(band.offset(), Some(0.0));
            assert_eq!(band.scale(), Some(2.5));
        }

        #[test]
        fn empty_categories_are_preserved() {
            let xml = "<PAMRasterBand><CategoryNames>\
                         <Category/>\
                         <Category>water</Category>\
                         <Category></Category>\
                       </CategoryNames></PAMRasterBand>";
            let mut band = linked_band(BandDataType::UInt8);
            apply_to(&mut band, xml);
            assert_eq!(
                band.category_names().unwrap(),
                &["".to_string(), "water".to_string(), "".to_string()]
            );
        }

        #[test]
        fn stats_pairs_require_both_members() {
            let mut band = linked_band(BandDataType::UInt8);
            apply_to(&mut band, "<PAMRasterBand><Minimum>1</Minimum></PAMRasterBand>");
            assert_eq!(band.min_max(), None);

            apply_to(
                &mut band,
                "<PAMRasterBand><Minimum>1</Minimum><Maximum>9</Maximum></PAMRasterBand>",
            );
            assert_eq!(band.min_max(), Some((1.0, 9.0)));
        }

        #[test]
        fn color_table_forces_palette_interpretation() {
            let xml = "<PAMRasterBand><ColorTable><Entry c1=\"1\"/></ColorTable></PAMRasterBand>";
            let mut band = linked_band(BandDataType::UInt8);
            apply_to(&mut band, xml);
            assert_eq!(band.color_interpretation(), ColorInterp::Palette);
            assert_eq!(band.color_table().unwrap().len(), 1);
        }

        #[test]
        fn is_idempotent() {
            let xml = "<PAMRasterBand band=\"1\">\
                         <Description>dem</Description>\
                         <NoDataValue>-9999</NoDataValue>\
                         <Scale>0.1</Scale>\
                         <Metadata><MDI key=\"K\">v</MDI></Metadata>\
                       </PAMRasterBand>";
            let mut band = linked_band(BandDataType::Int32);
            apply_to(&mut band, xml);
            let first = band.serialize().unwrap();
            apply_to(&mut band, xml);
            let second = band.serialize().unwrap();
            assert_eq!(first, second);
        }

        #[test]
        fn applying_marks_the_store_dirty() {
            let store = PamStore::shared();
            let mut inner = MemoryBand::new(BandDataType::UInt8);
            inner.set_band_index(1);
            inner.attach_store(std::rc::Rc::clone(&store));
            let mut band = PamBand::new(inner);

            apply_to(&mut band, "<PAMRasterBand><UnitType>ft</UnitType></PAMRasterBand>");
            assert!(store.is_dirty());
            assert!(matches!(
                band.record.as_ref().map(|r| r.nodata),
                Some(NoDataValue::Unset)
            ));
        }
    }
}
