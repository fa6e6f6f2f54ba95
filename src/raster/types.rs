//! raster::types
//!
//! Plain value types shared by the band abstraction and the overlay.
//!
//! # Types
//!
//! - [`BandDataType`] - a band's pixel type. The overlay only branches on
//!   it to pick the right nodata representation, but the full set is kept
//!   so callers can describe their bands faithfully.
//! - [`ColorInterp`] - color interpretation of a band, with the by-name
//!   round-trip used by the serialized form.

use serde::{Deserialize, Serialize};

/// Pixel type of a raster band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BandDataType {
    UInt8,
    Int8,
    UInt16,
    Int16,
    UInt32,
    Int32,
    UInt64,
    Int64,
    Float32,
    Float64,
}

impl BandDataType {
    /// Size of one pixel in bytes.
    pub fn byte_size(self) -> usize {
        match self {
            Self::UInt8 | Self::Int8 => 1,
            Self::UInt16 | Self::Int16 => 2,
            Self::UInt32 | Self::Int32 | Self::Float32 => 4,
            Self::UInt64 | Self::Int64 | Self::Float64 => 8,
        }
    }

    /// Whether the nodata value for this type is carried as a 64-bit
    /// integer rather than a double.
    pub fn uses_int64_nodata(self) -> bool {
        matches!(self, Self::Int64 | Self::UInt64)
    }
}

/// Color interpretation of a band.
///
/// Serialized by name; unknown names read back as [`ColorInterp::Undefined`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ColorInterp {
    #[default]
    Undefined,
    Gray,
    /// Band values index into a color table.
    Palette,
    Red,
    Green,
    Blue,
    Alpha,
    Hue,
    Saturation,
    Lightness,
    Cyan,
    Magenta,
    Yellow,
    Black,
}

impl ColorInterp {
    const NAMES: [(ColorInterp, &'static str); 14] = [
        (ColorInterp::Undefined, "Undefined"),
        (ColorInterp::Gray, "Gray"),
        (ColorInterp::Palette, "Palette"),
        (ColorInterp::Red, "Red"),
        (ColorInterp::Green, "Green"),
        (ColorInterp::Blue, "Blue"),
        (ColorInterp::Alpha, "Alpha"),
        (ColorInterp::Hue, "Hue"),
        (ColorInterp::Saturation, "Saturation"),
        (ColorInterp::Lightness, "Lightness"),
        (ColorInterp::Cyan, "Cyan"),
        (ColorInterp::Magenta, "Magenta"),
        (ColorInterp::Yellow, "Yellow"),
        (ColorInterp::Black, "Black"),
    ];

    /// The serialized name.
    pub fn name(self) -> &'static str {
        Self::NAMES
            .iter()
            .find(|(interp, _)| *interp == self)
            .map(|(_, name)| *name)
            .unwrap_or("Undefined")
    }

    /// Look up an interpretation by name, case-insensitively. Unknown
    /// names map to [`ColorInterp::Undefined`].
    pub fn from_name(name: &str) -> Self {
        Self::NAMES
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name))
            .map(|(interp, _)| *interp)
            .unwrap_or(ColorInterp::Undefined)
    }
}

impl std::fmt::Display for ColorInterp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
