//! pam::histogram
//!
//! The cached-histogram side of the overlay.
//!
//! Computed histograms are remembered as descriptors keyed by
//! (min, max, bucket count, include-out-of-range). The bucket counts
//! themselves stay in their serialized pipe-separated form and are only
//! parsed - and validated - when a caller actually asks for them, so a
//! damaged entry in a sidecar file costs nothing until it is read.
//!
//! The first entry of a band's list is its implicit default histogram.

use crate::error::{PamError, Result};
use crate::xml::XmlElement;

/// Serialized tag of a band's histogram list.
pub const HISTOGRAMS_TAG: &str = "Histograms";

const HIST_ITEM_TAG: &str = "HistItem";

/// Largest bucket count a descriptor can be built for. Guards the count
/// string's size arithmetic against overflow.
const MAX_ENCODE_BUCKETS: usize = ((i32::MAX - 10) / 12) as usize;

/// Largest bucket count a stored descriptor may claim at decode time.
const MAX_DECODE_BUCKETS: i64 = (i32::MAX / 2) as i64;

/// Tolerant equality for real-valued histogram bounds.
pub(crate) fn real_eq(a: f64, b: f64) -> bool {
    a == b || (a - b).abs() < 1e-10 * b.abs()
}

/// One cached histogram descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramEntry {
    pub min: f64,
    pub max: f64,
    pub bucket_count: i64,
    pub include_out_of_range: bool,
    pub approximate: bool,
    /// Pipe-separated per-bucket counts, validated lazily by
    /// [`HistogramEntry::decode`].
    pub counts: String,
}

impl HistogramEntry {
    /// Build a descriptor from computed counts.
    ///
    /// # Errors
    ///
    /// [`PamError::InvalidHistogram`] when the bucket count is too large
    /// to size the count string safely.
    pub fn from_counts(
        min: f64,
        max: f64,
        include_out_of_range: bool,
        approximate: bool,
        counts: &[u64],
    ) -> Result<Self> {
        if counts.len() > MAX_ENCODE_BUCKETS {
            return Err(PamError::InvalidHistogram(format!(
                "bucket count {} is too large to encode",
                counts.len()
            )));
        }
        let mut text = String::new();
        for (index, count) in counts.iter().enumerate() {
            if index > 0 {
                text.push('|');
            }
            text.push_str(&count.to_string());
        }
        Ok(Self {
            min,
            max,
            bucket_count: counts.len() as i64,
            include_out_of_range,
            approximate,
            counts: text,
        })
    }

    /// Whether this descriptor answers the given request. Bounds compare
    /// with [`real_eq`]; bucket count and the out-of-range flag compare
    /// exactly; an approximate descriptor only matches a caller that
    /// accepts approximate results.
    pub fn matches(
        &self,
        min: f64,
        max: f64,
        buckets: usize,
        include_out_of_range: bool,
        approx_ok: bool,
    ) -> bool {
        real_eq(self.min, min)
            && real_eq(self.max, max)
            && self.bucket_count == buckets as i64
            && self.include_out_of_range == include_out_of_range
            && (approx_ok || !self.approximate)
    }

    /// Parse the stored counts into one value per bucket.
    ///
    /// The count string must be at least `2 * buckets - 1` characters
    /// (the minimum for that many pipe-separated fields). Missing or
    /// garbled fields decode as zero; the bucket count itself must be in
    /// range.
    ///
    /// # Errors
    ///
    /// [`PamError::InvalidHistogram`] on an out-of-range bucket count or
    /// an inconsistent count string, [`PamError::OutOfMemory`] when the
    /// bucket buffer cannot be reserved.
    pub fn decode(&self) -> Result<Vec<u64>> {
        if self.bucket_count <= 0 || self.bucket_count > MAX_DECODE_BUCKETS {
            return Err(PamError::InvalidHistogram(format!(
                "bucket count {} out of range",
                self.bucket_count
            )));
        }
        let buckets = self.bucket_count as usize;
        if self.counts.len() < 2 * buckets - 1 {
            return Err(PamError::InvalidHistogram(
                "count string isn't consistent with the bucket count".into(),
            ));
        }

        let mut values = Vec::new();
        values
            .try_reserve_exact(buckets)
            .map_err(|_| PamError::OutOfMemory(buckets))?;
        let mut fields = self.counts.split('|');
        for _ in 0..buckets {
            values.push(fields.next().map(leading_u64).unwrap_or(0));
        }
        Ok(values)
    }

    /// Serialize as a `HistItem` element.
    pub fn to_xml(&self) -> XmlElement {
        let mut node = XmlElement::new(HIST_ITEM_TAG);
        node.set_value("HistMin", format!("{:?}", self.min));
        node.set_value("HistMax", format!("{:?}", self.max));
        node.set_value("BucketCount", self.bucket_count.to_string());
        node.set_value(
            "IncludeOutOfRange",
            if self.include_out_of_range { "1" } else { "0" },
        );
        node.set_value("Approximate", if self.approximate { "1" } else { "0" });
        node.set_value("HistCounts", self.counts.clone());
        node
    }

    /// Rebuild a descriptor from a `HistItem` element with tolerant
    /// defaults. Nothing is validated here; see [`HistogramEntry::decode`].
    pub fn from_xml(node: &XmlElement) -> Self {
        Self {
            min: parse_f64(node.value_of("HistMin"), 0.0),
            max: parse_f64(node.value_of("HistMax"), 1.0),
            bucket_count: node
                .value_of("BucketCount")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(2),
            include_out_of_range: parse_flag(node.value_of("IncludeOutOfRange")),
            approximate: parse_flag(node.value_of("Approximate")),
            counts: node.value_of("HistCounts").unwrap_or("").to_string(),
        }
    }
}

/// First descriptor in `entries` answering the request, by index.
pub fn find_matching(
    entries: &[HistogramEntry],
    min: f64,
    max: f64,
    buckets: usize,
    include_out_of_range: bool,
    approx_ok: bool,
) -> Option<usize> {
    entries
        .iter()
        .position(|entry| entry.matches(min, max, buckets, include_out_of_range, approx_ok))
}

/// Serialize a histogram list as a [`HISTOGRAMS_TAG`] element.
pub fn list_to_xml(entries: &[HistogramEntry]) -> XmlElement {
    let mut node = XmlElement::new(HISTOGRAMS_TAG);
    for entry in entries {
        node.add_child(entry.to_xml());
    }
    node
}

/// Rebuild a histogram list from a [`HISTOGRAMS_TAG`] element. Children
/// other than `HistItem` are skipped.
pub fn list_from_xml(node: &XmlElement) -> Vec<HistogramEntry> {
    node.elements()
        .filter(|el| el.tag_is(HIST_ITEM_TAG))
        .map(HistogramEntry::from_xml)
        .collect()
}

/// Leading unsigned integer of a field, zero on garbage. Mirrors how the
/// serialized form has always been read back: digits up to the first
/// non-digit, nothing more.
fn leading_u64(field: &str) -> u64 {
    let trimmed = field.trim_start();
    let digits: &str = {
        let end = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        &trimmed[..end]
    };
    digits.parse().unwrap_or(0)
}

fn parse_f64(text: Option<&str>, default: f64) -> f64 {
    text.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

fn parse_flag(text: Option<&str>) -> bool {
    text.and_then(|v| v.trim().parse::<i64>().ok()).unwrap_or(0) != 0
}
