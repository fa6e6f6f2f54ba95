//! pam::record
//!
//! The per-band metadata record.
//!
//! `PamRecord` is a value object: all the overlay fields for one band,
//! plus a weak back-reference to the dataset-level store. It has no
//! behavior beyond storage and dirty propagation; the overlay band owns
//! exactly one (or none, when the overlay is inactive) and applies the
//! accessor contract on top.

use std::rc::Weak;

use serde::{Deserialize, Serialize};

use crate::pam::store::PamStore;
use crate::pam::histogram::HistogramEntry;
use crate::raster::color_table::ColorTable;
use crate::raster::rat::AttributeTable;
use crate::raster::types::ColorInterp;

/// The band's nodata value.
///
/// A nodata value has exactly one representation at a time; setting any
/// variant replaces whatever was there before.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum NoDataValue {
    /// No nodata value set.
    #[default]
    Unset,
    /// Floating-point nodata, the common case.
    Double(f64),
    /// Nodata of an `Int64` band.
    Int64(i64),
    /// Nodata of a `UInt64` band.
    UInt64(u64),
}

impl NoDataValue {
    /// Whether any representation is set.
    pub fn is_set(&self) -> bool {
        !matches!(self, NoDataValue::Unset)
    }
}

/// Mean / standard deviation statistics pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandStats {
    pub mean: f64,
    pub std_dev: f64,
}

/// All overlay fields for one band.
#[derive(Debug, Default)]
pub struct PamRecord {
    parent: Option<Weak<PamStore>>,

    pub(crate) nodata: NoDataValue,
    pub(crate) offset: f64,
    pub(crate) scale: f64,
    pub(crate) offset_set: bool,
    pub(crate) scale_set: bool,
    pub(crate) unit_type: Option<String>,
    pub(crate) color_interp: ColorInterp,
    pub(crate) category_names: Option<Vec<String>>,
    pub(crate) color_table: Option<ColorTable>,
    pub(crate) default_rat: Option<AttributeTable>,
    pub(crate) histograms: Option<Vec<HistogramEntry>>,
    pub(crate) min_max: Option<(f64, f64)>,
    pub(crate) stats: Option<BandStats>,
}

impl PamRecord {
    /// Create a record, linked to a store or standalone.
    pub(crate) fn new(parent: Option<Weak<PamStore>>) -> Self {
        Self {
            parent,
            offset: 0.0,
            scale: 1.0,
            ..Self::default()
        }
    }

    /// Whether the record was created against a dataset-level store.
    /// Standalone records answer accessors but can never persist.
    pub(crate) fn is_linked(&self) -> bool {
        self.parent.is_some()
    }

    /// Propagate a mutation to the parent store's dirty flag. Silent when
    /// standalone or when the store has been torn down.
    pub(crate) fn mark_parent_dirty(&self) {
        if let Some(parent) = &self.parent {
            if let Some(store) = parent.upgrade() {
                store.mark_dirty();
            }
        }
    }
}
