//! Common types used throughout hicstraw

use crate::error::HicError;
use std::fmt;
use std::str::FromStr;

/// A chromosome as declared in the file header.
///
/// Chromosomes are indexed `0..N-1` in declaration order. Many files declare
/// a whole-genome pseudo-chromosome named `All` at index 0; it is kept in the
/// table like any other entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chromosome {
    /// Chromosome name as written in the header
    pub name: String,
    /// Position in the header's declaration order
    pub index: i32,
    /// Length in base pairs
    pub length: i32,
}

/// One nonzero cell of a contact matrix.
///
/// Inside block payloads `bin_x`/`bin_y` are bin indices; records returned
/// from a query carry genomic coordinates (bin index × bin size) instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactRecord {
    /// Column coordinate
    pub bin_x: i32,
    /// Row coordinate
    pub bin_y: i32,
    /// Contact count, possibly normalized
    pub counts: f32,
}

/// Pointer to a contiguous byte range within the file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexEntry {
    /// Absolute file offset
    pub position: i64,
    /// Length in bytes; zero denotes an empty entry
    pub size: i32,
}

impl IndexEntry {
    /// An entry of size zero decodes to nothing without touching the file
    pub fn is_empty(&self) -> bool {
        self.size <= 0
    }
}

/// Axis unit of a zoom level: base-pair or restriction-fragment bins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    /// Base-pair-delimited bins
    Bp,
    /// Fragment-delimited bins
    Frag,
}

impl Unit {
    /// The unit string as stored in the file
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Bp => "BP",
            Unit::Frag => "FRAG",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = HicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BP" => Ok(Unit::Bp),
            "FRAG" => Ok(Unit::Frag),
            other => Err(HicError::BadUnit(other.to_string())),
        }
    }
}

/// Normalization method, matched by exact string equality against the
/// file's normalization-vector index.
///
/// The well-known methods get their own variants; anything else a file may
/// carry (for example `SCALE`) round-trips through [`Normalization::Other`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalization {
    /// Raw counts, no vectors loaded
    None,
    /// Vanilla coverage
    Vc,
    /// Square root of vanilla coverage
    VcSqrt,
    /// Knight-Ruiz balancing
    Kr,
    /// Any other method named in the file
    Other(String),
}

impl Normalization {
    /// The method name as stored in the file
    pub fn as_str(&self) -> &str {
        match self {
            Normalization::None => "NONE",
            Normalization::Vc => "VC",
            Normalization::VcSqrt => "VC_SQRT",
            Normalization::Kr => "KR",
            Normalization::Other(name) => name,
        }
    }

    /// `NONE` skips normalization and vector loading entirely
    pub fn is_none(&self) -> bool {
        matches!(self, Normalization::None)
    }
}

impl fmt::Display for Normalization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Normalization {
    fn from(s: &str) -> Self {
        match s {
            "NONE" => Normalization::None,
            "VC" => Normalization::Vc,
            "VC_SQRT" => Normalization::VcSqrt,
            "KR" => Normalization::Kr,
            other => Normalization::Other(other.to_string()),
        }
    }
}
