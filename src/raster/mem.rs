//! raster::mem
//!
//! An in-memory band with a plain `f64` pixel buffer.
//!
//! `MemoryBand` implements the full native surface, so it exercises the
//! overlay's fallback path end to end and serves as the computation
//! delegate for histogram requests. In-memory-only callers
//! that want the overlay's accessor convenience without persistence wrap
//! one of these and call
//! [`ensure_initialized_standalone`](crate::pam::PamBand::ensure_initialized_standalone).

use std::rc::Rc;

use crate::error::{PamError, Result};
use crate::pam::PamStore;
use crate::raster::band::{Histogram, HistogramRequest, RasterBand};
use crate::raster::color_table::ColorTable;
use crate::raster::metadata::MetadataDomains;
use crate::raster::rat::AttributeTable;
use crate::raster::types::{BandDataType, ColorInterp};

/// How often the histogram loop consults the progress callback.
const PROGRESS_STRIDE: usize = 4096;

/// An in-memory raster band.
#[derive(Debug)]
pub struct MemoryBand {
    data_type: BandDataType,
    band_index: i32,
    data: Vec<f64>,
    store: Option<Rc<PamStore>>,

    description: String,
    metadata: MetadataDomains,
    nodata: Option<f64>,
    offset: Option<f64>,
    scale: Option<f64>,
    unit: String,
    color_interp: ColorInterp,
    color_table: Option<ColorTable>,
    category_names: Option<Vec<String>>,
    rat: Option<AttributeTable>,
}

impl Default for MemoryBand {
    fn default() -> Self {
        Self::new(BandDataType::Float64)
    }
}

impl MemoryBand {
    /// Create an empty band of the given pixel type.
    pub fn new(data_type: BandDataType) -> Self {
        Self {
            data_type,
            band_index: 0,
            data: Vec::new(),
            store: None,
            description: String::new(),
            metadata: MetadataDomains::new(),
            nodata: None,
            offset: None,
            scale: None,
            unit: String::new(),
            color_interp: ColorInterp::Undefined,
            color_table: None,
            category_names: None,
            rat: None,
        }
    }

    /// Create a band over existing pixel values.
    pub fn with_data(data_type: BandDataType, data: Vec<f64>) -> Self {
        Self {
            data,
            ..Self::new(data_type)
        }
    }

    /// Set the 1-based band index reported to the overlay.
    pub fn set_band_index(&mut self, index: i32) {
        self.band_index = index;
    }

    /// Attach the band to a dataset-level overlay store. An overlay
    /// wrapper around this band will link its record to `store` on the
    /// next lazy initialization.
    pub fn attach_store(&mut self, store: Rc<PamStore>) {
        self.store = Some(store);
    }

    /// The pixel values.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Replace the pixel values.
    pub fn set_data(&mut self, data: Vec<f64>) {
        self.data = data;
    }

    fn count_buckets(
        &self,
        request: &HistogramRequest,
        mut progress: Option<&mut dyn FnMut(f64) -> bool>,
    ) -> Result<Vec<u64>> {
        if request.buckets == 0 {
            return Err(PamError::InvalidHistogram(
                "histogram request has zero buckets".into(),
            ));
        }
        let mut counts = vec![0u64; request.buckets];
        let width = (request.max - request.min) / request.buckets as f64;
        let total = self.data.len();

        for (done, &value) in self.data.iter().enumerate() {
            if done % PROGRESS_STRIDE == 0 {
                if let Some(cb) = progress.as_mut() {
                    if !cb(done as f64 / total.max(1) as f64) {
                        return Err(PamError::Cancelled);
                    }
                }
            }
            if self.nodata.is_some_and(|nd| value == nd) || value.is_nan() {
                continue;
            }
            let slot = if width > 0.0 {
                ((value - request.min) / width).floor()
            } else {
                0.0
            };
            let slot = if slot < 0.0 {
                if !request.include_out_of_range {
                    continue;
                }
                0
            } else if slot >= request.buckets as f64 {
                if !request.include_out_of_range && value != request.max {
                    continue;
                }
                request.buckets - 1
            } else {
                slot as usize
            };
            counts[slot] += 1;
        }

        if let Some(cb) = progress.as_mut() {
            if !cb(1.0) {
                return Err(PamError::Cancelled);
            }
        }
        Ok(counts)
    }
}

impl RasterBand for MemoryBand {
    fn data_type(&self) -> BandDataType {
        self.data_type
    }

    fn band_index(&self) -> i32 {
        self.band_index
    }

    fn pam_store(&self) -> Option<Rc<PamStore>> {
        self.store.clone()
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn set_description(&mut self, description: &str) {
        self.description = description.to_string();
    }

    fn metadata(&self) -> Option<&MetadataDomains> {
        Some(&self.metadata)
    }

    fn set_metadata(&mut self, domain: &str, items: Vec<(String, String)>) -> Result<()> {
        self.metadata.set_domain(domain, items);
        Ok(())
    }

    fn set_metadata_item(&mut self, domain: &str, key: &str, value: &str) -> Result<()> {
        self.metadata.set_item(domain, key, value);
        Ok(())
    }

    fn nodata_value(&self) -> Option<f64> {
        self.nodata
    }

    fn set_nodata_value(&mut self, value: f64) -> Result<()> {
        self.nodata = Some(value);
        Ok(())
    }

    fn delete_nodata_value(&mut self) -> Result<()> {
        self.nodata = None;
        Ok(())
    }

    fn offset(&self) -> Option<f64> {
        self.offset
    }

    fn set_offset(&mut self, offset: f64) -> Result<()> {
        self.offset = Some(offset);
        Ok(())
    }

    fn scale(&self) -> Option<f64> {
        self.scale
    }

    fn set_scale(&mut self, scale: f64) -> Result<()> {
        self.scale = Some(scale);
        Ok(())
    }

    fn unit_type(&self) -> &str {
        &self.unit
    }

    fn set_unit_type(&mut self, unit: &str) -> Result<()> {
        self.unit = unit.to_string();
        Ok(())
    }

    fn category_names(&self) -> Option<&[String]> {
        self.category_names.as_deref()
    }

    fn set_category_names(&mut self, names: &[String]) -> Result<()> {
        self.category_names = if names.is_empty() {
            None
        } else {
            Some(names.to_vec())
        };
        Ok(())
    }

    fn color_interpretation(&self) -> ColorInterp {
        self.color_interp
    }

    fn set_color_interpretation(&mut self, interp: ColorInterp) -> Result<()> {
        self.color_interp = interp;
        Ok(())
    }

    fn color_table(&self) -> Option<&ColorTable> {
        self.color_table.as_ref()
    }

    fn set_color_table(&mut self, table: Option<&ColorTable>) -> Result<()> {
        self.color_table = table.cloned();
        Ok(())
    }

    fn default_rat(&self) -> Option<&AttributeTable> {
        self.rat.as_ref()
    }

    fn set_default_rat(&mut self, table: Option<&AttributeTable>) -> Result<()> {
        self.rat = table.cloned();
        Ok(())
    }

    fn histogram(
        &mut self,
        request: &HistogramRequest,
        progress: Option<&mut dyn FnMut(f64) -> bool>,
    ) -> Result<Vec<u64>> {
        self.count_buckets(request, progress)
    }

    fn default_histogram(
        &mut self,
        force: bool,
        progress: Option<&mut dyn FnMut(f64) -> bool>,
    ) -> Result<Option<Histogram>> {
        if !force || self.data.is_empty() {
            return Ok(None);
        }
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &value in &self.data {
            if self.nodata.is_some_and(|nd| value == nd) || value.is_nan() {
                continue;
            }
            min = min.min(value);
            max = max.max(value);
        }
        if !min.is_finite() || !max.is_finite() {
            return Ok(None);
        }
        if min == max {
            max = min + 1.0;
        }
        let request = HistogramRequest {
            min,
            max,
            buckets: 256,
            include_out_of_range: true,
            approx_ok: false,
        };
        let counts = self.count_buckets(&request, progress)?;
        Ok(Some(Histogram { min, max, counts }))
    }

    fn set_default_histogram(&mut self, _min: f64, _max: f64, _counts: &[u64]) -> Result<()> {
        // No native storage for histograms; persistence is the overlay's job.
        Err(PamError::Unsupported("set default histogram"))
    }
}
