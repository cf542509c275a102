//! Error types for hicstraw

use crate::types::Unit;
use thiserror::Error;

/// Result type alias for hicstraw operations
pub type Result<T> = std::result::Result<T, HicError>;

/// Error types that can occur while reading a `.hic` file
#[derive(Debug, Error)]
pub enum HicError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[cfg(feature = "network")]
    #[error("HTTP error {status}: {url}")]
    Http {
        /// HTTP status code
        status: u16,
        /// URL that failed
        url: String,
    },

    /// Network transport error
    #[cfg(feature = "network")]
    #[error("network error: {0}")]
    Network(String),

    /// The file does not start with the `HIC` magic string
    #[error("missing HIC magic string, does not appear to be a .hic file")]
    NotHic,

    /// File format revision older than the oldest supported one
    #[error("version {0} is no longer supported")]
    UnsupportedVersion(i32),

    /// A structure ended before all of its declared fields
    #[error("truncated {what}: wanted {wanted} more bytes, {remaining} left")]
    Truncated {
        /// Which structure was being decoded
        what: &'static str,
        /// Bytes the next field needed
        wanted: usize,
        /// Bytes actually left
        remaining: usize,
    },

    /// A NUL-terminated string held invalid UTF-8
    #[error("invalid UTF-8 in {0}")]
    InvalidString(&'static str),

    /// A file pointer that cannot address any byte range
    #[error("invalid {what} file position: {offset}")]
    InvalidPointer {
        /// Which pointer was bad
        what: &'static str,
        /// The offending offset
        offset: i64,
    },

    /// Block payload carries an unrecognized layout tag
    #[error("unknown block layout type {0}")]
    UnknownBlockType(u8),

    /// Block payload is internally inconsistent
    #[error("malformed block payload: {0}")]
    MalformedBlock(&'static str),

    /// Zoom-level unit string starts with a letter other than `B` or `F`
    #[error("zoom unit not understood (leading byte {0:#04x})")]
    UnknownUnit(u8),

    /// zlib inflation failed
    #[error("inflate failed: {0}")]
    Decompression(String),

    /// The master index has no entry for the requested chromosome pair
    #[error("file has no matrix for chromosome pair {0}")]
    MatrixNotFound(String),

    /// No zoom level matches the requested unit and bin size
    #[error("no {unit} zoom level with bin size {bin_size}")]
    ResolutionNotFound {
        /// Requested unit
        unit: Unit,
        /// Requested bin size
        bin_size: i32,
    },

    /// A region names a chromosome absent from the header
    #[error("chromosome {0} not found in the file")]
    UnknownChromosome(String),

    /// Unit string is neither `BP` nor `FRAG`
    #[error("unit must be one of BP or FRAG, got {0:?}")]
    BadUnit(String),

    /// Region descriptor does not parse as `name` or `name:start:end`
    #[error("invalid region {0:?}")]
    InvalidRegion(String),

    /// Bin size of zero or less
    #[error("bin size must be positive, got {0}")]
    NonPositiveBinSize(i32),
}

/// Coarse classification of an error, independent of the concrete variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller supplied a bad parameter
    User,
    /// The file violates the format
    Format,
    /// The file is valid but lacks the requested data
    NotFound,
    /// Transport failure, local or remote
    Io,
    /// Inflate failure
    Decompression,
}

impl HicError {
    /// Classify this error into one of the coarse [`ErrorKind`]s
    pub fn kind(&self) -> ErrorKind {
        match self {
            HicError::Io(_) => ErrorKind::Io,
            #[cfg(feature = "network")]
            HicError::Http { .. } | HicError::Network(_) => ErrorKind::Io,
            HicError::NotHic
            | HicError::UnsupportedVersion(_)
            | HicError::Truncated { .. }
            | HicError::InvalidString(_)
            | HicError::InvalidPointer { .. }
            | HicError::UnknownBlockType(_)
            | HicError::MalformedBlock(_)
            | HicError::UnknownUnit(_) => ErrorKind::Format,
            HicError::Decompression(_) => ErrorKind::Decompression,
            HicError::MatrixNotFound(_) | HicError::ResolutionNotFound { .. } => {
                ErrorKind::NotFound
            }
            HicError::UnknownChromosome(_)
            | HicError::BadUnit(_)
            | HicError::InvalidRegion(_)
            | HicError::NonPositiveBinSize(_) => ErrorKind::User,
        }
    }
}
