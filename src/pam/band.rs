//! pam::band
//!
//! The overlay band.
//!
//! `PamBand` wraps any [`RasterBand`] and layers a mutable, persistable
//! metadata record over it. Every mutator first runs lazy initialization:
//! if the wrapped band's dataset exposes an overlay store, a record is
//! created and linked to it; otherwise the call falls through to the
//! wrapped band's native behavior. Accessors answer from the record
//! whenever one exists and delegate otherwise, so a band whose dataset
//! cannot persist metadata keeps working - it just is not persistent.
//!
//! Mutations propagate a dirty mark to the dataset-level store; an
//! external save pass serializes each band with [`PamBand::serialize`]
//! and clears the flag.
//!
//! # Standalone mode
//!
//! [`PamBand::ensure_initialized_standalone`] creates a record with no
//! parent link for in-memory-only callers that want the accessor
//! convenience without persistence. A standalone record is replaced by a
//! linked one the first time lazy initialization finds a store.

use std::rc::Rc;

use crate::error::{PamError, Result};
use crate::pam::codec;
use crate::pam::histogram::{self, HistogramEntry};
use crate::pam::record::{BandStats, NoDataValue, PamRecord};
use crate::raster::band::{Histogram, HistogramRequest, RasterBand};
use crate::raster::color_table::ColorTable;
use crate::raster::metadata::MetadataDomains;
use crate::raster::rat::AttributeTable;
use crate::raster::types::{BandDataType, ColorInterp};
use crate::xml::XmlElement;

/// Field categories copied by [`PamBand::clone_info`]. Combine with `|`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloneFlags(u32);

impl CloneFlags {
    /// Free-form metadata (default domain).
    pub const METADATA: CloneFlags = CloneFlags(0x1);
    /// Band description.
    pub const DESCRIPTION: CloneFlags = CloneFlags(0x2);
    /// Nodata value, any representation.
    pub const NODATA: CloneFlags = CloneFlags(0x4);
    /// Category names.
    pub const CATEGORY_NAMES: CloneFlags = CloneFlags(0x8);
    /// Offset and scale.
    pub const SCALE_OFFSET: CloneFlags = CloneFlags(0x10);
    /// Unit type.
    pub const UNIT_TYPE: CloneFlags = CloneFlags(0x20);
    /// Color interpretation.
    pub const COLOR_INTERP: CloneFlags = CloneFlags(0x40);
    /// Color table.
    pub const COLOR_TABLE: CloneFlags = CloneFlags(0x80);
    /// Default raster attribute table.
    pub const RAT: CloneFlags = CloneFlags(0x100);
    /// Every category.
    pub const ALL: CloneFlags = CloneFlags(0x1FF);

    /// Whether every bit of `other` is present.
    pub fn contains(self, other: CloneFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for CloneFlags {
    type Output = CloneFlags;

    fn bitor(self, rhs: CloneFlags) -> CloneFlags {
        CloneFlags(self.0 | rhs.0)
    }
}

/// A raster band with a persistent auxiliary-metadata overlay.
pub struct PamBand<B: RasterBand> {
    pub(crate) inner: B,
    pub(crate) description: String,
    pub(crate) metadata: MetadataDomains,
    pub(crate) record: Option<PamRecord>,
}

impl<B: RasterBand> PamBand<B> {
    /// Wrap a band. The overlay record is created lazily on first
    /// mutation or document load.
    pub fn new(inner: B) -> Self {
        let description = inner.description().to_string();
        Self {
            inner,
            description,
            metadata: MetadataDomains::new(),
            record: None,
        }
    }

    /// The wrapped band.
    pub fn inner(&self) -> &B {
        &self.inner
    }

    /// The wrapped band, mutably.
    pub fn inner_mut(&mut self) -> &mut B {
        &mut self.inner
    }

    /// Unwrap, discarding the overlay record.
    pub fn into_inner(self) -> B {
        self.inner
    }

    /// Whether an overlay record currently exists.
    pub fn is_overlay_active(&self) -> bool {
        self.record.is_some()
    }

    /// Make sure a store-linked record exists, if the wrapped band's
    /// dataset supports the overlay.
    ///
    /// No-op when a linked record already exists. When the dataset
    /// exposes no store the record is left as it was - absent, or
    /// standalone - and accessors keep falling back to native behavior.
    /// A leftover standalone record is discarded in favor of the linked
    /// one. Never fails.
    pub fn ensure_initialized(&mut self) {
        if matches!(&self.record, Some(record) if record.is_linked()) {
            return;
        }
        let Some(store) = self.inner.pam_store() else {
            return;
        };
        self.record = Some(PamRecord::new(Some(Rc::downgrade(&store))));
    }

    /// Create an unlinked record for in-memory-only use. Never replaces
    /// an existing record, linked or not.
    pub fn ensure_initialized_standalone(&mut self) {
        if self.record.is_none() {
            self.record = Some(PamRecord::new(None));
        }
    }

    /// Drop the overlay record and everything it owns.
    pub fn clear(&mut self) {
        self.record = None;
    }

    fn mark_dirty(&self) {
        if let Some(record) = &self.record {
            record.mark_parent_dirty();
        }
    }

    /// Build the band's overlay document, or `None` when there is no
    /// record or nothing worth persisting.
    pub fn serialize(&self) -> Option<XmlElement> {
        let record = self.record.as_ref()?;
        codec::serialize_record(
            record,
            &self.description,
            &self.metadata,
            self.inner.band_index(),
        )
    }

    /// Apply an overlay document, initializing the record first.
    pub fn deserialize(&mut self, doc: &XmlElement) -> Result<()> {
        codec::apply(self, doc)
    }

    /// Stored minimum/maximum pair, if both are known.
    pub fn min_max(&self) -> Option<(f64, f64)> {
        self.record.as_ref().and_then(|record| record.min_max)
    }

    /// Store the minimum/maximum pair. Both members are set together.
    pub fn set_min_max(&mut self, min: f64, max: f64) -> Result<()> {
        self.ensure_initialized();
        let Some(record) = self.record.as_mut() else {
            return Err(PamError::Unsupported("set min/max"));
        };
        if record.min_max != Some((min, max)) {
            record.min_max = Some((min, max));
            self.mark_dirty();
        }
        Ok(())
    }

    /// Stored mean/standard-deviation statistics, if both are known.
    pub fn statistics(&self) -> Option<BandStats> {
        self.record.as_ref().and_then(|record| record.stats)
    }

    /// Store the mean/standard-deviation pair. Both members are set
    /// together.
    pub fn set_statistics(&mut self, mean: f64, std_dev: f64) -> Result<()> {
        self.ensure_initialized();
        let Some(record) = self.record.as_mut() else {
            return Err(PamError::Unsupported("set statistics"));
        };
        let stats = BandStats { mean, std_dev };
        if record.stats != Some(stats) {
            record.stats = Some(stats);
            self.mark_dirty();
        }
        Ok(())
    }

    /// Copy the selected field categories from `donor`.
    ///
    /// Categories for which the donor has no meaningful value are
    /// skipped. With `only_if_missing`, value-like categories (nodata,
    /// offset/scale, color interpretation, metadata) are copied when the
    /// acceptor's value is unset or differs from the donor's - nodata
    /// doubles compare NaN-aware - while description, unit type, category
    /// names, color table, and attribute table are only copied when the
    /// acceptor has none at all. Individual copies that fail are skipped
    /// silently; the operation itself never fails.
    pub fn clone_info<D: RasterBand + ?Sized>(
        &mut self,
        donor: &D,
        flags: CloneFlags,
        only_if_missing: bool,
    ) -> Result<()> {
        self.ensure_initialized();

        if flags.contains(CloneFlags::METADATA) {
            if let Some(donor_md) = donor.metadata() {
                let items = donor_md.items("");
                if !items.is_empty()
                    && (!only_if_missing || self.metadata.items("").len() != items.len())
                {
                    let _ = self.set_metadata("", items.to_vec());
                }
            }
        }

        if flags.contains(CloneFlags::DESCRIPTION) && !donor.description().is_empty() {
            if !only_if_missing || self.description().is_empty() {
                self.set_description(donor.description());
            }
        }

        if flags.contains(CloneFlags::NODATA) {
            self.clone_nodata(donor, only_if_missing);
        }

        if flags.contains(CloneFlags::CATEGORY_NAMES) {
            if let Some(names) = donor.category_names() {
                if !only_if_missing || self.category_names().is_none() {
                    let names = names.to_vec();
                    let _ = self.set_category_names(&names);
                }
            }
        }

        if flags.contains(CloneFlags::SCALE_OFFSET) {
            if let Some(offset) = donor.offset() {
                if !only_if_missing || self.offset().unwrap_or(0.0) != offset {
                    let _ = self.set_offset(offset);
                }
            }
            if let Some(scale) = donor.scale() {
                if !only_if_missing || self.scale().unwrap_or(1.0) != scale {
                    let _ = self.set_scale(scale);
                }
            }
        }

        if flags.contains(CloneFlags::UNIT_TYPE) && !donor.unit_type().is_empty() {
            // An acceptor that already names a unit keeps it.
            if !only_if_missing || self.unit_type().is_empty() {
                let _ = self.set_unit_type(donor.unit_type());
            }
        }

        if flags.contains(CloneFlags::COLOR_INTERP) {
            let interp = donor.color_interpretation();
            if interp != ColorInterp::Undefined
                && (!only_if_missing || interp != self.color_interpretation())
            {
                let _ = self.set_color_interpretation(interp);
            }
        }

        if flags.contains(CloneFlags::COLOR_TABLE) {
            if let Some(table) = donor.color_table() {
                if !only_if_missing || self.color_table().is_none() {
                    let table = table.clone();
                    let _ = self.set_color_table(Some(&table));
                }
            }
        }

        if flags.contains(CloneFlags::RAT) {
            if let Some(rat) = donor.default_rat() {
                if (rat.row_count() != 0 || rat.column_count() != 0)
                    && (!only_if_missing || self.default_rat().is_none())
                {
                    let rat = rat.clone();
                    let _ = self.set_default_rat(Some(&rat));
                }
            }
        }

        Ok(())
    }

    fn clone_nodata<D: RasterBand + ?Sized>(&mut self, donor: &D, only_if_missing: bool) {
        match donor.data_type() {
            BandDataType::Int64 => {
                if let Ok(Some(value)) = donor.nodata_value_i64() {
                    let copy = !only_if_missing
                        || !matches!(self.nodata_value_i64(), Ok(Some(existing)) if existing == value);
                    if copy {
                        let _ = self.set_nodata_value_i64(value);
                    }
                }
            }
            BandDataType::UInt64 => {
                if let Ok(Some(value)) = donor.nodata_value_u64() {
                    let copy = !only_if_missing
                        || !matches!(self.nodata_value_u64(), Ok(Some(existing)) if existing == value);
                    if copy {
                        let _ = self.set_nodata_value_u64(value);
                    }
                }
            }
            _ => {
                if let Some(value) = donor.nodata_value() {
                    let copy = !only_if_missing
                        || match self.nodata_value() {
                            Some(existing) => {
                                !((existing.is_nan() && value.is_nan()) || existing == value)
                            }
                            None => true,
                        };
                    if copy {
                        let _ = self.set_nodata_value(value);
                    }
                }
            }
        }
    }
}

impl<B: RasterBand> RasterBand for PamBand<B> {
    fn data_type(&self) -> BandDataType {
        self.inner.data_type()
    }

    fn band_index(&self) -> i32 {
        self.inner.band_index()
    }

    fn pam_store(&self) -> Option<Rc<crate::pam::PamStore>> {
        self.inner.pam_store()
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn set_description(&mut self, description: &str) {
        self.ensure_initialized();
        if self.record.is_some() && description != self.description {
            self.mark_dirty();
        }
        self.description = description.to_string();
    }

    fn metadata(&self) -> Option<&MetadataDomains> {
        Some(&self.metadata)
    }

    fn set_metadata(&mut self, domain: &str, items: Vec<(String, String)>) -> Result<()> {
        self.ensure_initialized();
        self.mark_dirty();
        self.metadata.set_domain(domain, items);
        Ok(())
    }

    fn set_metadata_item(&mut self, domain: &str, key: &str, value: &str) -> Result<()> {
        self.ensure_initialized();
        self.mark_dirty();
        self.metadata.set_item(domain, key, value);
        Ok(())
    }

    fn nodata_value(&self) -> Option<f64> {
        let Some(record) = &self.record else {
            return self.inner.nodata_value();
        };
        match record.nodata {
            NoDataValue::Unset => None,
            NoDataValue::Double(value) => Some(value),
            NoDataValue::Int64(value) => Some(value as f64),
            NoDataValue::UInt64(value) => Some(value as f64),
        }
    }

    fn set_nodata_value(&mut self, value: f64) -> Result<()> {
        self.ensure_initialized();
        if self.record.is_none() {
            return self.inner.set_nodata_value(value);
        }
        if let Some(record) = self.record.as_mut() {
            record.nodata = NoDataValue::Double(value);
        }
        self.mark_dirty();
        Ok(())
    }

    fn nodata_value_i64(&self) -> Result<Option<i64>> {
        let Some(record) = &self.record else {
            return self.inner.nodata_value_i64();
        };
        match self.inner.data_type() {
            BandDataType::UInt64 => Err(PamError::TypeMismatch(
                "nodata_value_u64() should be called instead",
            )),
            BandDataType::Int64 => Ok(match record.nodata {
                NoDataValue::Int64(value) => Some(value),
                _ => None,
            }),
            _ => Err(PamError::TypeMismatch(
                "nodata_value() should be called instead",
            )),
        }
    }

    fn set_nodata_value_i64(&mut self, value: i64) -> Result<()> {
        self.ensure_initialized();
        if self.record.is_none() {
            return self.inner.set_nodata_value_i64(value);
        }
        if let Some(record) = self.record.as_mut() {
            record.nodata = NoDataValue::Int64(value);
        }
        self.mark_dirty();
        Ok(())
    }

    fn nodata_value_u64(&self) -> Result<Option<u64>> {
        let Some(record) = &self.record else {
            return self.inner.nodata_value_u64();
        };
        match self.inner.data_type() {
            BandDataType::Int64 => Err(PamError::TypeMismatch(
                "nodata_value_i64() should be called instead",
            )),
            BandDataType::UInt64 => Ok(match record.nodata {
                NoDataValue::UInt64(value) => Some(value),
                _ => None,
            }),
            _ => Err(PamError::TypeMismatch(
                "nodata_value() should be called instead",
            )),
        }
    }

    fn set_nodata_value_u64(&mut self, value: u64) -> Result<()> {
        self.ensure_initialized();
        if self.record.is_none() {
            return self.inner.set_nodata_value_u64(value);
        }
        if let Some(record) = self.record.as_mut() {
            record.nodata = NoDataValue::UInt64(value);
        }
        self.mark_dirty();
        Ok(())
    }

    fn delete_nodata_value(&mut self) -> Result<()> {
        self.ensure_initialized();
        if self.record.is_none() {
            return self.inner.delete_nodata_value();
        }
        if let Some(record) = self.record.as_mut() {
            record.nodata = NoDataValue::Unset;
        }
        self.mark_dirty();
        Ok(())
    }

    fn offset(&self) -> Option<f64> {
        let Some(record) = &self.record else {
            return self.inner.offset();
        };
        record.offset_set.then_some(record.offset)
    }

    fn set_offset(&mut self, offset: f64) -> Result<()> {
        self.ensure_initialized();
        if self.record.is_none() {
            return self.inner.set_offset(offset);
        }
        let mut changed = false;
        if let Some(record) = self.record.as_mut() {
            if !record.offset_set || record.offset != offset {
                record.offset = offset;
                record.offset_set = true;
                changed = true;
            }
        }
        if changed {
            self.mark_dirty();
        }
        Ok(())
    }

    fn scale(&self) -> Option<f64> {
        let Some(record) = &self.record else {
            return self.inner.scale();
        };
        record.scale_set.then_some(record.scale)
    }

    fn set_scale(&mut self, scale: f64) -> Result<()> {
        self.ensure_initialized();
        if self.record.is_none() {
            return self.inner.set_scale(scale);
        }
        let mut changed = false;
        if let Some(record) = self.record.as_mut() {
            if !record.scale_set || record.scale != scale {
                record.scale = scale;
                record.scale_set = true;
                changed = true;
            }
        }
        if changed {
            self.mark_dirty();
        }
        Ok(())
    }

    fn unit_type(&self) -> &str {
        let Some(record) = &self.record else {
            return self.inner.unit_type();
        };
        record.unit_type.as_deref().unwrap_or("")
    }

    fn set_unit_type(&mut self, unit: &str) -> Result<()> {
        self.ensure_initialized();
        if self.record.is_none() {
            return self.inner.set_unit_type(unit);
        }
        let mut changed = false;
        if let Some(record) = self.record.as_mut() {
            if unit.is_empty() {
                changed = record.unit_type.is_some();
                record.unit_type = None;
            } else {
                changed = record.unit_type.as_deref() != Some(unit);
                record.unit_type = Some(unit.to_string());
            }
        }
        if changed {
            self.mark_dirty();
        }
        Ok(())
    }

    fn category_names(&self) -> Option<&[String]> {
        let Some(record) = &self.record else {
            return self.inner.category_names();
        };
        record.category_names.as_deref()
    }

    fn set_category_names(&mut self, names: &[String]) -> Result<()> {
        self.ensure_initialized();
        if self.record.is_none() {
            return self.inner.set_category_names(names);
        }
        if let Some(record) = self.record.as_mut() {
            record.category_names = if names.is_empty() {
                None
            } else {
                Some(names.to_vec())
            };
        }
        self.mark_dirty();
        Ok(())
    }

    fn color_interpretation(&self) -> ColorInterp {
        match &self.record {
            Some(record) => record.color_interp,
            None => self.inner.color_interpretation(),
        }
    }

    fn set_color_interpretation(&mut self, interp: ColorInterp) -> Result<()> {
        self.ensure_initialized();
        if self.record.is_none() {
            return self.inner.set_color_interpretation(interp);
        }
        self.mark_dirty();
        if let Some(record) = self.record.as_mut() {
            record.color_interp = interp;
        }
        Ok(())
    }

    fn color_table(&self) -> Option<&ColorTable> {
        match &self.record {
            Some(record) => record.color_table.as_ref(),
            None => self.inner.color_table(),
        }
    }

    fn set_color_table(&mut self, table: Option<&ColorTable>) -> Result<()> {
        self.ensure_initialized();
        if self.record.is_none() {
            return self.inner.set_color_table(table);
        }
        if let Some(record) = self.record.as_mut() {
            record.color_table = table.cloned();
            if table.is_some() {
                record.color_interp = ColorInterp::Palette;
            }
        }
        self.mark_dirty();
        Ok(())
    }

    fn default_rat(&self) -> Option<&AttributeTable> {
        match &self.record {
            Some(record) => record.default_rat.as_ref(),
            None => self.inner.default_rat(),
        }
    }

    fn set_default_rat(&mut self, table: Option<&AttributeTable>) -> Result<()> {
        self.ensure_initialized();
        if self.record.is_none() {
            return self.inner.set_default_rat(table);
        }
        self.mark_dirty();
        if let Some(record) = self.record.as_mut() {
            record.default_rat = table.cloned();
        }
        Ok(())
    }

    fn histogram(
        &mut self,
        request: &HistogramRequest,
        progress: Option<&mut dyn FnMut(f64) -> bool>,
    ) -> Result<Vec<u64>> {
        self.ensure_initialized();
        if self.record.is_none() {
            return self.inner.histogram(request, progress);
        }

        if let Some(record) = &self.record {
            if let Some(entries) = &record.histograms {
                if let Some(index) = histogram::find_matching(
                    entries,
                    request.min,
                    request.max,
                    request.buckets,
                    request.include_out_of_range,
                    request.approx_ok,
                ) {
                    if let Ok(counts) = entries[index].decode() {
                        return Ok(counts);
                    }
                    // A damaged cached entry falls through to recomputation.
                }
            }
        }

        let counts = self.inner.histogram(request, progress)?;

        if let Ok(entry) = HistogramEntry::from_counts(
            request.min,
            request.max,
            request.include_out_of_range,
            request.approx_ok,
            &counts,
        ) {
            self.mark_dirty();
            if let Some(record) = self.record.as_mut() {
                record.histograms.get_or_insert_with(Vec::new).push(entry);
            }
        }
        Ok(counts)
    }

    fn default_histogram(
        &mut self,
        force: bool,
        progress: Option<&mut dyn FnMut(f64) -> bool>,
    ) -> Result<Option<Histogram>> {
        if let Some(record) = &self.record {
            if let Some(entry) = record.histograms.as_ref().and_then(|entries| entries.first()) {
                let counts = entry.decode()?;
                return Ok(Some(Histogram {
                    min: entry.min,
                    max: entry.max,
                    counts,
                }));
            }
        }
        self.inner.default_histogram(force, progress)
    }

    fn set_default_histogram(&mut self, min: f64, max: f64, counts: &[u64]) -> Result<()> {
        self.ensure_initialized();
        if self.record.is_none() {
            return self.inner.set_default_histogram(min, max, counts);
        }

        // Replace any histogram for the same range and bucket layout.
        if let Some(record) = self.record.as_mut() {
            if let Some(entries) = record.histograms.as_mut() {
                if let Some(index) =
                    histogram::find_matching(entries, min, max, counts.len(), true, true)
                {
                    entries.remove(index);
                }
            }
        }

        let entry = HistogramEntry::from_counts(min, max, true, false, counts)?;
        self.mark_dirty();
        if let Some(record) = self.record.as_mut() {
            record.histograms.get_or_insert_with(Vec::new).insert(0, entry);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pam::store::PamStore;
    use crate::raster::mem::MemoryBand;

    /// A band whose dataset supports the overlay.
    fn linked_band(data_type: BandDataType) -> (PamBand<MemoryBand>, Rc<PamStore>) {
        let store = PamStore::shared();
        let mut inner = MemoryBand::new(data_type);
        inner.set_band_index(1);
        inner.attach_store(Rc::clone(&store));
        (PamBand::new(inner), store)
    }

    /// A band that cannot persist and has minimal native support.
    struct BareBand;

    impl RasterBand for BareBand {
        fn data_type(&self) -> BandDataType {
            BandDataType::UInt8
        }
    }

    mod initialization {
        use super::*;

        #[test]
        fn lazy_link_on_first_mutation() {
            let (mut band, _store) = linked_band(BandDataType::UInt8);
            assert!(!band.is_overlay_active());
            band.set_unit_type("m").unwrap();
            assert!(band.is_overlay_active());
        }

        #[test]
        fn no_store_leaves_record_absent() {
            let mut band = PamBand::new(MemoryBand::new(BandDataType::UInt8));
            band.ensure_initialized();
            assert!(!band.is_overlay_active());
        }

        #[test]
        fn without_a_store_mutations_go_native() {
            let mut band = PamBand::new(MemoryBand::new(BandDataType::UInt8));
            band.set_nodata_value(7.0).unwrap();
            assert!(!band.is_overlay_active());
            assert_eq!(band.inner().nodata_value(), Some(7.0));
            assert_eq!(band.nodata_value(), Some(7.0));
        }

        #[test]
        fn unsupported_native_fallback_surfaces() {
            let mut band = PamBand::new(BareBand);
            assert!(matches!(
                band.set_nodata_value(7.0),
                Err(PamError::Unsupported(_))
            ));
        }

        #[test]
        fn standalone_record_has_no_persistence() {
            let mut band = PamBand::new(MemoryBand::new(BandDataType::UInt8));
            band.ensure_initialized_standalone();
            assert!(band.is_overlay_active());
            band.set_unit_type("m").unwrap();
            assert_eq!(band.unit_type(), "m");
            // A lone unit on an unnumbered band is below the substance
            // threshold, so nothing serializes.
            assert!(band.serialize().is_none());
        }

        #[test]
        fn standalone_is_replaced_once_a_store_appears() {
            let store = PamStore::shared();
            let mut band = PamBand::new(MemoryBand::new(BandDataType::UInt8));

            band.ensure_initialized_standalone();
            // The standalone record never reaches any store.
            band.set_unit_type("m").unwrap();
            assert!(!store.is_dirty());

            // Once the dataset exposes a store, the next mutation links a
            // fresh record; the standalone one is discarded.
            band.inner_mut().attach_store(Rc::clone(&store));
            band.set_unit_type("ft").unwrap();
            assert!(store.is_dirty());
            assert_eq!(band.unit_type(), "ft");
        }

        #[test]
        fn standalone_never_clobbers_a_linked_record() {
            let (mut band, _store) = linked_band(BandDataType::UInt8);
            band.set_unit_type("m").unwrap();
            band.ensure_initialized_standalone();
            assert_eq!(band.unit_type(), "m");
        }

        #[test]
        fn clear_drops_the_record() {
            let (mut band, _store) = linked_band(BandDataType::UInt8);
            band.set_unit_type("m").unwrap();
            band.clear();
            assert!(!band.is_overlay_active());
            assert_eq!(band.unit_type(), "");
        }
    }

    mod nodata {
        use super::*;

        #[test]
        fn exclusivity_across_representations() {
            let (mut band, _store) = linked_band(BandDataType::Int64);
            band.set_nodata_value(1.5).unwrap();
            band.set_nodata_value_i64(-5).unwrap();

            let record = band.record.as_ref().unwrap();
            assert_eq!(record.nodata, NoDataValue::Int64(-5));
            assert_eq!(band.nodata_value_i64().unwrap(), Some(-5));
        }

        #[test]
        fn double_get_casts_integer_representations() {
            let (mut band, _store) = linked_band(BandDataType::Int64);
            band.set_nodata_value_i64(-5).unwrap();
            assert_eq!(band.nodata_value(), Some(-5.0));
        }

        #[test]
        fn wrong_accessor_for_pixel_type_fails() {
            let (mut band, _store) = linked_band(BandDataType::Float64);
            band.set_nodata_value(1.0).unwrap();
            assert!(matches!(
                band.nodata_value_i64(),
                Err(PamError::TypeMismatch(_))
            ));
            assert!(matches!(
                band.nodata_value_u64(),
                Err(PamError::TypeMismatch(_))
            ));
        }

        #[test]
        fn int64_accessor_on_uint64_band_fails() {
            let (mut band, _store) = linked_band(BandDataType::UInt64);
            band.set_nodata_value_u64(9).unwrap();
            assert!(matches!(
                band.nodata_value_i64(),
                Err(PamError::TypeMismatch(_))
            ));
            assert_eq!(band.nodata_value_u64().unwrap(), Some(9));
        }

        #[test]
        fn wrong_accessor_has_no_side_effects() {
            let (mut band, store) = linked_band(BandDataType::Float64);
            band.set_nodata_value(1.0).unwrap();
            store.clear_dirty();
            let _ = band.nodata_value_i64();
            assert!(!store.is_dirty());
            assert_eq!(band.nodata_value(), Some(1.0));
        }

        #[test]
        fn delete_resets_to_unset() {
            let (mut band, _store) = linked_band(BandDataType::Float64);
            band.set_nodata_value(1.0).unwrap();
            band.delete_nodata_value().unwrap();
            assert_eq!(band.nodata_value(), None);
        }

        #[test]
        fn setting_always_marks_dirty() {
            let (mut band, store) = linked_band(BandDataType::Float64);
            band.set_nodata_value(1.0).unwrap();
            store.clear_dirty();
            band.set_nodata_value(1.0).unwrap();
            assert!(store.is_dirty());
        }
    }

    mod dirty_tracking {
        use super::*;

        #[test]
        fn offset_equality_suppresses_the_mark() {
            let (mut band, store) = linked_band(BandDataType::UInt8);
            band.set_offset(2.0).unwrap();
            assert!(store.is_dirty());
            store.clear_dirty();
            band.set_offset(2.0).unwrap();
            assert!(!store.is_dirty());
            band.set_offset(3.0).unwrap();
            assert!(store.is_dirty());
        }

        #[test]
        fn unit_equality_suppresses_the_mark() {
            let (mut band, store) = linked_band(BandDataType::UInt8);
            band.set_unit_type("m").unwrap();
            store.clear_dirty();
            band.set_unit_type("m").unwrap();
            assert!(!store.is_dirty());
            band.set_unit_type("").unwrap();
            assert!(store.is_dirty());
            assert_eq!(band.unit_type(), "");
        }

        #[test]
        fn description_changes_mark_dirty() {
            let (mut band, store) = linked_band(BandDataType::UInt8);
            band.set_description("dem");
            assert!(store.is_dirty());
            store.clear_dirty();
            band.set_description("dem");
            assert!(!store.is_dirty());
            assert_eq!(band.description(), "dem");
        }

        #[test]
        fn metadata_marks_dirty() {
            let (mut band, store) = linked_band(BandDataType::UInt8);
            band.set_metadata_item("", "AREA_OR_POINT", "Area").unwrap();
            assert!(store.is_dirty());
            assert_eq!(band.metadata().unwrap().item("", "AREA_OR_POINT"), Some("Area"));
        }
    }

    mod palette {
        use super::*;
        use crate::raster::color_table::ColorEntry;

        #[test]
        fn setting_a_table_forces_palette_interpretation() {
            let (mut band, _store) = linked_band(BandDataType::UInt8);
            let mut table = ColorTable::new();
            table.push(ColorEntry::rgba(1, 2, 3, 255));
            band.set_color_table(Some(&table)).unwrap();

            assert_eq!(band.color_interpretation(), ColorInterp::Palette);
            assert_eq!(band.color_table(), Some(&table));
        }

        #[test]
        fn clearing_the_table_keeps_the_interpretation() {
            let (mut band, _store) = linked_band(BandDataType::UInt8);
            let mut table = ColorTable::new();
            table.push(ColorEntry::rgba(1, 2, 3, 255));
            band.set_color_table(Some(&table)).unwrap();
            band.set_color_table(None).unwrap();

            assert!(band.color_table().is_none());
            assert_eq!(band.color_interpretation(), ColorInterp::Palette);
        }

        #[test]
        fn empty_category_list_clears() {
            let (mut band, _store) = linked_band(BandDataType::UInt8);
            band.set_category_names(&["a".into(), "b".into()]).unwrap();
            assert_eq!(band.category_names().map(|names| names.len()), Some(2));
            band.set_category_names(&[]).unwrap();
            assert!(band.category_names().is_none());
        }
    }

    mod histograms {
        use super::*;

        fn counting_band() -> (PamBand<MemoryBand>, Rc<PamStore>) {
            let store = PamStore::shared();
            let mut inner =
                MemoryBand::with_data(BandDataType::UInt8, (0..100).map(f64::from).collect());
            inner.set_band_index(1);
            inner.attach_store(Rc::clone(&store));
            (PamBand::new(inner), store)
        }

        #[test]
        fn computation_result_is_cached() {
            let (mut band, store) = counting_band();
            let request = HistogramRequest::new(0.0, 100.0, 10);
            let counts = band.histogram(&request, None).unwrap();
            assert_eq!(counts, vec![10; 10]);
            assert!(store.is_dirty());

            // Replace the pixels; a cache hit keeps returning the stored
            // counts rather than recomputing.
            band.inner_mut().set_data(vec![0.0; 5]);
            let cached = band.histogram(&request, None).unwrap();
            assert_eq!(cached, counts);
        }

        #[test]
        fn approximate_cache_entries_respect_the_request() {
            let (mut band, _store) = counting_band();
            let mut approx_request = HistogramRequest::new(0.0, 100.0, 10);
            approx_request.approx_ok = true;
            band.histogram(&approx_request, None).unwrap();

            // An exact request must not reuse the approximate entry.
            band.inner_mut().set_data((0..50).map(f64::from).collect());
            let exact = band
                .histogram(&HistogramRequest::new(0.0, 100.0, 10), None)
                .unwrap();
            assert_eq!(exact.iter().sum::<u64>(), 50);
        }

        #[test]
        fn native_failure_is_not_cached() {
            let (mut band, _store) = counting_band();
            let mut cancel = |_: f64| false;
            let result = band.histogram(
                &HistogramRequest::new(0.0, 100.0, 10),
                Some(&mut cancel),
            );
            assert!(matches!(result, Err(PamError::Cancelled)));
            assert!(band.record.as_ref().unwrap().histograms.is_none());
        }

        #[test]
        fn default_histogram_round_trip() {
            let (mut band, _store) = counting_band();
            let counts: Vec<u64> = (0..256).map(|i| i as u64).collect();
            band.set_default_histogram(0.0, 255.0, &counts).unwrap();

            let histogram = band.default_histogram(false, None).unwrap().unwrap();
            assert_eq!(histogram.min, 0.0);
            assert_eq!(histogram.max, 255.0);
            assert_eq!(histogram.counts, counts);
        }

        #[test]
        fn setting_the_default_twice_replaces_it() {
            let (mut band, _store) = counting_band();
            band.set_default_histogram(0.0, 255.0, &[1; 256]).unwrap();
            band.set_default_histogram(0.0, 255.0, &[2; 256]).unwrap();

            let entries = band.record.as_ref().unwrap().histograms.as_ref().unwrap();
            assert_eq!(entries.len(), 1);
            let histogram = band.default_histogram(false, None).unwrap().unwrap();
            assert_eq!(histogram.counts, vec![2; 256]);
        }

        #[test]
        fn the_default_is_prepended() {
            let (mut band, _store) = counting_band();
            band.histogram(&HistogramRequest::new(0.0, 100.0, 10), None)
                .unwrap();
            band.set_default_histogram(0.0, 255.0, &[3; 16]).unwrap();

            let entries = band.record.as_ref().unwrap().histograms.as_ref().unwrap();
            assert_eq!(entries.len(), 2);
            assert_eq!(entries[0].bucket_count, 16);
            assert!(entries[0].include_out_of_range);
            assert!(!entries[0].approximate);
        }

        #[test]
        fn damaged_default_entry_is_a_failure() {
            let (mut band, _store) = counting_band();
            band.set_default_histogram(0.0, 255.0, &[1; 16]).unwrap();
            if let Some(entries) = band
                .record
                .as_mut()
                .and_then(|record| record.histograms.as_mut())
            {
                entries[0].counts = "1".into();
            }
            assert!(band.default_histogram(false, None).is_err());
        }
    }

    mod merging {
        use super::*;
        use crate::raster::color_table::ColorEntry;
        use crate::raster::rat::{FieldType, FieldUsage};

        fn donor() -> PamBand<MemoryBand> {
            let mut inner = MemoryBand::new(BandDataType::UInt8);
            inner.attach_store(PamStore::shared());
            let mut band = PamBand::new(inner);
            band.set_unit_type("ft").unwrap();
            band.set_nodata_value(255.0).unwrap();
            band.set_description("donor");
            band
        }

        #[test]
        fn only_if_missing_preserves_existing_values() {
            let (mut acceptor, _store) = linked_band(BandDataType::UInt8);
            acceptor.set_unit_type("m").unwrap();

            acceptor
                .clone_info(&donor(), CloneFlags::UNIT_TYPE, true)
                .unwrap();
            assert_eq!(acceptor.unit_type(), "m");

            acceptor
                .clone_info(&donor(), CloneFlags::UNIT_TYPE, false)
                .unwrap();
            assert_eq!(acceptor.unit_type(), "ft");
        }

        #[test]
        fn missing_values_are_filled_either_way() {
            let (mut acceptor, _store) = linked_band(BandDataType::UInt8);
            acceptor
                .clone_info(&donor(), CloneFlags::UNIT_TYPE | CloneFlags::NODATA, true)
                .unwrap();
            assert_eq!(acceptor.unit_type(), "ft");
            assert_eq!(acceptor.nodata_value(), Some(255.0));
        }

        #[test]
        fn nan_nodata_compares_equal_for_the_missing_check() {
            let (mut acceptor, store) = linked_band(BandDataType::Float64);
            acceptor.set_nodata_value(f64::NAN).unwrap();
            store.clear_dirty();

            let mut nan_donor = PamBand::new(MemoryBand::new(BandDataType::Float64));
            nan_donor.ensure_initialized_standalone();
            nan_donor.set_nodata_value(f64::NAN).unwrap();

            acceptor
                .clone_info(&nan_donor, CloneFlags::NODATA, true)
                .unwrap();
            // Equal (NaN-aware) value: no copy, no dirty mark.
            assert!(!store.is_dirty());
        }

        #[test]
        fn empty_donor_fields_are_skipped() {
            let (mut acceptor, _store) = linked_band(BandDataType::UInt8);
            acceptor.set_unit_type("m").unwrap();

            let empty_donor = PamBand::new(MemoryBand::new(BandDataType::UInt8));
            acceptor
                .clone_info(&empty_donor, CloneFlags::ALL, false)
                .unwrap();
            assert_eq!(acceptor.unit_type(), "m");
        }

        #[test]
        fn empty_rat_is_not_cloned() {
            let (mut acceptor, _store) = linked_band(BandDataType::UInt8);
            let mut rat_donor = PamBand::new(MemoryBand::new(BandDataType::UInt8));
            rat_donor.ensure_initialized_standalone();
            rat_donor.set_default_rat(Some(&AttributeTable::new())).unwrap();

            acceptor
                .clone_info(&rat_donor, CloneFlags::RAT, false)
                .unwrap();
            assert!(acceptor.default_rat().is_none());
        }

        #[test]
        fn populated_rat_is_cloned() {
            let (mut acceptor, _store) = linked_band(BandDataType::UInt8);
            let mut table = AttributeTable::new();
            table.add_field("Class", FieldType::Text, FieldUsage::Name);

            let mut rat_donor = PamBand::new(MemoryBand::new(BandDataType::UInt8));
            rat_donor.ensure_initialized_standalone();
            rat_donor.set_default_rat(Some(&table)).unwrap();

            acceptor
                .clone_info(&rat_donor, CloneFlags::RAT, false)
                .unwrap();
            assert_eq!(acceptor.default_rat().unwrap().column_count(), 1);
        }

        #[test]
        fn color_table_and_interp_clone_together() {
            let (mut acceptor, _store) = linked_band(BandDataType::UInt8);
            let mut table = ColorTable::new();
            table.push(ColorEntry::rgba(9, 9, 9, 255));

            let mut palette_donor = PamBand::new(MemoryBand::new(BandDataType::UInt8));
            palette_donor.ensure_initialized_standalone();
            palette_donor.set_color_table(Some(&table)).unwrap();

            acceptor
                .clone_info(
                    &palette_donor,
                    CloneFlags::COLOR_TABLE | CloneFlags::COLOR_INTERP,
                    false,
                )
                .unwrap();
            assert_eq!(acceptor.color_table(), Some(&table));
            assert_eq!(acceptor.color_interpretation(), ColorInterp::Palette);
        }

        #[test]
        fn incapable_acceptor_swallows_failures() {
            let mut acceptor = PamBand::new(BareBand);
            let result = acceptor.clone_info(&donor(), CloneFlags::ALL, false);
            assert!(result.is_ok());
        }

        #[test]
        fn metadata_clones_by_item_count() {
            let (mut acceptor, _store) = linked_band(BandDataType::UInt8);
            acceptor.set_metadata_item("", "A", "old").unwrap();

            let mut md_donor = PamBand::new(MemoryBand::new(BandDataType::UInt8));
            md_donor.ensure_initialized_standalone();
            md_donor.set_metadata_item("", "A", "new").unwrap();

            // Same item count: only-if-missing leaves the acceptor alone.
            acceptor
                .clone_info(&md_donor, CloneFlags::METADATA, true)
                .unwrap();
            assert_eq!(acceptor.metadata().unwrap().item("", "A"), Some("old"));

            acceptor
                .clone_info(&md_donor, CloneFlags::METADATA, false)
                .unwrap();
            assert_eq!(acceptor.metadata().unwrap().item("", "A"), Some("new"));
        }
    }

    mod statistics {
        use super::*;

        #[test]
        fn pairs_are_stored_together() {
            let (mut band, store) = linked_band(BandDataType::UInt8);
            band.set_min_max(0.0, 255.0).unwrap();
            band.set_statistics(127.5, 3.25).unwrap();
            assert!(store.is_dirty());
            assert_eq!(band.min_max(), Some((0.0, 255.0)));
            assert_eq!(
                band.statistics(),
                Some(BandStats {
                    mean: 127.5,
                    std_dev: 3.25
                })
            );
        }

        #[test]
        fn without_overlay_support_setting_fails() {
            let mut band = PamBand::new(BareBand);
            assert!(matches!(
                band.set_min_max(0.0, 1.0),
                Err(PamError::Unsupported(_))
            ));
        }
    }
}
