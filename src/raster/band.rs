//! raster::band
//!
//! The band abstraction the overlay sits on.
//!
//! [`RasterBand`] is the full accessor/mutator surface of one raster
//! band. Every method has a default: getters report "nothing here" and
//! setters refuse with [`PamError::Unsupported`]. A storage driver
//! implements the subset its format can honor natively; the overlay band
//! wraps any implementation and answers from its own record when one
//! exists, falling back to the wrapped band per call otherwise.
//!
//! Histogram computation is the one operation that may touch pixel data.
//! It accepts an optional progress callback; a callback returning `false`
//! asks the computation to stop, which must surface as
//! [`PamError::Cancelled`].

use std::rc::Rc;

use crate::error::{PamError, Result};
use crate::pam::PamStore;
use crate::raster::color_table::ColorTable;
use crate::raster::metadata::MetadataDomains;
use crate::raster::rat::AttributeTable;
use crate::raster::types::{BandDataType, ColorInterp};

/// Parameters of a histogram request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramRequest {
    /// Lower bound of the counted range.
    pub min: f64,
    /// Upper bound of the counted range.
    pub max: f64,
    /// Number of buckets.
    pub buckets: usize,
    /// Whether values outside `[min, max]` are counted into the end
    /// buckets instead of being dropped.
    pub include_out_of_range: bool,
    /// Whether an approximate (subsampled) answer is acceptable.
    pub approx_ok: bool,
}

impl HistogramRequest {
    /// Request with both flags off.
    pub fn new(min: f64, max: f64, buckets: usize) -> Self {
        Self {
            min,
            max,
            buckets,
            include_out_of_range: false,
            approx_ok: false,
        }
    }
}

/// A computed or stored histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// Lower bound of the counted range.
    pub min: f64,
    /// Upper bound of the counted range.
    pub max: f64,
    /// Per-bucket counts.
    pub counts: Vec<u64>,
}

impl Histogram {
    /// Number of buckets.
    pub fn bucket_count(&self) -> usize {
        self.counts.len()
    }
}

/// One channel of a raster dataset.
///
/// See the module docs for the fallback contract. `data_type` is the only
/// required method; everything else defaults to "not supported" /
/// "not set".
pub trait RasterBand {
    /// Pixel type of the band.
    fn data_type(&self) -> BandDataType;

    /// 1-based index of the band within its dataset, 0 when unknown.
    fn band_index(&self) -> i32 {
        0
    }

    /// The overlay store of the owning dataset, when that dataset
    /// supports persistent auxiliary metadata. `None` leaves any overlay
    /// wrapper in pass-through mode.
    fn pam_store(&self) -> Option<Rc<PamStore>> {
        None
    }

    /// Band description.
    fn description(&self) -> &str {
        ""
    }

    /// Set the band description.
    fn set_description(&mut self, _description: &str) {}

    /// Free-form multi-domain metadata, if the band carries any.
    fn metadata(&self) -> Option<&MetadataDomains> {
        None
    }

    /// Replace one metadata domain wholesale.
    fn set_metadata(&mut self, _domain: &str, _items: Vec<(String, String)>) -> Result<()> {
        Err(PamError::Unsupported("set metadata"))
    }

    /// Set a single metadata item.
    fn set_metadata_item(&mut self, _domain: &str, _key: &str, _value: &str) -> Result<()> {
        Err(PamError::Unsupported("set metadata item"))
    }

    /// Nodata value as a double. `None` when no nodata value is set.
    fn nodata_value(&self) -> Option<f64> {
        None
    }

    /// Set the nodata value from a double.
    fn set_nodata_value(&mut self, _value: f64) -> Result<()> {
        Err(PamError::Unsupported("set nodata value"))
    }

    /// Nodata value of an `Int64` band.
    fn nodata_value_i64(&self) -> Result<Option<i64>> {
        Ok(None)
    }

    /// Set the nodata value of an `Int64` band.
    fn set_nodata_value_i64(&mut self, _value: i64) -> Result<()> {
        Err(PamError::Unsupported("set int64 nodata value"))
    }

    /// Nodata value of a `UInt64` band.
    fn nodata_value_u64(&self) -> Result<Option<u64>> {
        Ok(None)
    }

    /// Set the nodata value of a `UInt64` band.
    fn set_nodata_value_u64(&mut self, _value: u64) -> Result<()> {
        Err(PamError::Unsupported("set uint64 nodata value"))
    }

    /// Remove any nodata value.
    fn delete_nodata_value(&mut self) -> Result<()> {
        Err(PamError::Unsupported("delete nodata value"))
    }

    /// Value offset. `None` when never explicitly set (callers treat the
    /// default as 0.0).
    fn offset(&self) -> Option<f64> {
        None
    }

    /// Set the value offset.
    fn set_offset(&mut self, _offset: f64) -> Result<()> {
        Err(PamError::Unsupported("set offset"))
    }

    /// Value scale. `None` when never explicitly set (callers treat the
    /// default as 1.0).
    fn scale(&self) -> Option<f64> {
        None
    }

    /// Set the value scale.
    fn set_scale(&mut self, _scale: f64) -> Result<()> {
        Err(PamError::Unsupported("set scale"))
    }

    /// Unit of the band values, empty when unset.
    fn unit_type(&self) -> &str {
        ""
    }

    /// Set the unit; an empty string clears it.
    fn set_unit_type(&mut self, _unit: &str) -> Result<()> {
        Err(PamError::Unsupported("set unit type"))
    }

    /// Category names, `None` when the band has none.
    fn category_names(&self) -> Option<&[String]> {
        None
    }

    /// Replace the category names. An empty slice clears them.
    fn set_category_names(&mut self, _names: &[String]) -> Result<()> {
        Err(PamError::Unsupported("set category names"))
    }

    /// Color interpretation of the band.
    fn color_interpretation(&self) -> ColorInterp {
        ColorInterp::Undefined
    }

    /// Set the color interpretation.
    fn set_color_interpretation(&mut self, _interp: ColorInterp) -> Result<()> {
        Err(PamError::Unsupported("set color interpretation"))
    }

    /// Color table of a palette-indexed band.
    fn color_table(&self) -> Option<&ColorTable> {
        None
    }

    /// Replace the color table; `None` removes it.
    fn set_color_table(&mut self, _table: Option<&ColorTable>) -> Result<()> {
        Err(PamError::Unsupported("set color table"))
    }

    /// Default raster attribute table.
    fn default_rat(&self) -> Option<&AttributeTable> {
        None
    }

    /// Replace the default raster attribute table; `None` removes it.
    fn set_default_rat(&mut self, _table: Option<&AttributeTable>) -> Result<()> {
        Err(PamError::Unsupported("set attribute table"))
    }

    /// Compute (or fetch) a histogram for the requested range and bucket
    /// layout. May perform pixel I/O.
    fn histogram(
        &mut self,
        _request: &HistogramRequest,
        _progress: Option<&mut dyn FnMut(f64) -> bool>,
    ) -> Result<Vec<u64>> {
        Err(PamError::Unsupported("compute histogram"))
    }

    /// The band's default histogram. `Ok(None)` when there is none and
    /// `force` is off.
    fn default_histogram(
        &mut self,
        _force: bool,
        _progress: Option<&mut dyn FnMut(f64) -> bool>,
    ) -> Result<Option<Histogram>> {
        Ok(None)
    }

    /// Install the default histogram.
    fn set_default_histogram(&mut self, _min: f64, _max: f64, _counts: &[u64]) -> Result<()> {
        Err(PamError::Unsupported("set default histogram"))
    }
}
