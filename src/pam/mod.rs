//! pam
//!
//! The persistent auxiliary-metadata overlay.
//!
//! # Modules
//!
//! - [`band`] - [`PamBand`], the overlay wrapper around a raster band
//! - [`record`] - the per-band metadata record and nodata representation
//! - [`store`] - the dataset-level store carrying the dirty flag
//! - [`histogram`] - cached histogram descriptors and their matching rules
//! - `codec` - the `PAMRasterBand` document serializer/deserializer
//!
//! # Architecture
//!
//! A dataset that supports the overlay owns one shared [`PamStore`]. Each
//! of its bands is wrapped in a [`PamBand`], which lazily creates a
//! [`record::PamRecord`] linked to the store by a weak reference. Every
//! mutation marks the store dirty; a save pass external to this crate
//! serializes the bands and clears the flag.
//!
//! # Example
//!
//! ```
//! use rasterpam::pam::{PamBand, PamStore};
//! use rasterpam::raster::band::RasterBand;
//! use rasterpam::raster::mem::MemoryBand;
//! use rasterpam::raster::types::BandDataType;
//!
//! let store = PamStore::shared();
//! let mut inner = MemoryBand::new(BandDataType::UInt8);
//! inner.set_band_index(1);
//! inner.attach_store(store.clone());
//!
//! let mut band = PamBand::new(inner);
//! band.set_nodata_value(255.0).unwrap();
//! band.set_unit_type("m").unwrap();
//! assert!(store.is_dirty());
//!
//! let doc = band.serialize().unwrap();
//! assert_eq!(doc.value_of("UnitType"), Some("m"));
//! ```

pub mod band;
mod codec;
pub mod histogram;
pub mod record;
pub mod store;

// Re-export commonly used types
pub use band::{CloneFlags, PamBand};
pub use codec::BAND_TAG;
pub use histogram::HistogramEntry;
pub use record::{BandStats, NoDataValue, PamRecord};
pub use store::PamStore;
