//! error
//!
//! Operation-level error type shared by the overlay band and its
//! collaborators.
//!
//! # Failure classes
//!
//! - [`PamError::Unsupported`] - the native band refused an operation it
//!   does not implement. The overlay swallows this during merges; other
//!   callers may treat it as "this band cannot do that".
//! - [`PamError::TypeMismatch`] - the wrong nodata accessor was called for
//!   the band's pixel type. The operation has no side effects.
//! - [`PamError::InvalidHistogram`] - a stored histogram descriptor is
//!   inconsistent (count string shorter than the bucket count implies, or
//!   bucket count out of bounds).
//! - [`PamError::OutOfMemory`] - the bucket buffer for a decoded histogram
//!   could not be reserved.
//! - [`PamError::Cancelled`] - a progress callback asked the running
//!   computation to stop.
//! - [`PamError::Xml`] - an XML document could not be parsed.
//!
//! None of these abort the process; every operation returns a status for
//! the caller to inspect.

use thiserror::Error;

use crate::xml::XmlError;

/// Errors from overlay operations.
#[derive(Debug, Error)]
pub enum PamError {
    /// The native band does not implement the requested operation.
    #[error("operation not supported by this band: {0}")]
    Unsupported(&'static str),

    /// Wrong nodata accessor for the band's pixel type.
    #[error("{0}")]
    TypeMismatch(&'static str),

    /// A stored histogram descriptor is inconsistent.
    #[error("invalid histogram: {0}")]
    InvalidHistogram(String),

    /// The histogram bucket buffer could not be allocated.
    #[error("cannot allocate memory for {0} histogram buckets")]
    OutOfMemory(usize),

    /// A progress callback requested that the computation stop.
    #[error("operation cancelled by progress callback")]
    Cancelled,

    /// An XML document could not be parsed.
    #[error("xml error: {0}")]
    Xml(#[from] XmlError),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PamError>;
