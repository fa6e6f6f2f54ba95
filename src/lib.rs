//! rasterpam - a persistent auxiliary-metadata (PAM) overlay for raster bands
//!
//! Many raster formats cannot store the metadata people need alongside
//! their pixels: nodata values, scale/offset, units, color tables,
//! category names, statistics, histograms, attribute tables. This crate
//! layers a mutable, persistable record of exactly that over any
//! read-mostly band, without touching the underlying storage.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`xml`] - Generic document-tree primitives (parse, print, lookup)
//! - [`raster`] - The band abstraction and its value types: the
//!   [`raster::band::RasterBand`] trait, color tables, attribute tables,
//!   free-form metadata, and an in-memory band
//! - [`pam`] - The overlay: per-band records, the dataset-level dirty
//!   store, the histogram cache, and the `PAMRasterBand` document codec
//! - [`error`] - Operation-level error taxonomy
//!
//! # Correctness Invariants
//!
//! 1. A band without overlay support keeps working; every operation falls
//!    back to the wrapped band's native behavior
//! 2. A nodata value has exactly one representation at a time
//! 3. Value types are deep-copied on every set; donors are never retained
//! 4. Every mutation reaches the dataset-level dirty flag, and only
//!    mutations do
//! 5. Serialization emits nothing for untouched bands, and what it emits
//!    reads back to an equal record

pub mod error;
pub mod pam;
pub mod raster;
pub mod xml;
