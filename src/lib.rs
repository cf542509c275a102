//! hicstraw: random-access reader for `.hic` contact matrices
//!
//! # Overview
//!
//! `.hic` files store the sparse contact matrices produced by Hi-C
//! experiments, together with normalization vectors and metadata, behind a
//! pointer-driven binary index. This crate follows those pointers for one
//! query at a time: it reads the header, locates the requested
//! chromosome-pair matrix and zoom level through the footer, maps the
//! requested region to the minimum set of compressed blocks, and decodes
//! just those blocks.
//!
//! The same decoding path runs against a local file and an HTTP(S) origin;
//! the remote case turns every range into an HTTP `Range` request and
//! batches index reads to avoid per-field round trips.
//!
//! ## Quick Start
//!
//! ```no_run
//! # fn main() -> hicstraw::Result<()> {
//! // raw counts for an intrachromosomal square at 1 Mb resolution
//! let records = hicstraw::straw(
//!     "NONE",
//!     "https://example.com/inter30.hic",
//!     "1:0:10000000",
//!     "1:0:10000000",
//!     "BP",
//!     1_000_000,
//! )?;
//! for r in &records {
//!     println!("{}\t{}\t{}", r.bin_x, r.bin_y, r.counts);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`io`]: byte sources (local file, HTTP range requests)
//! - [`format`]: decoders for each layer of the container
//! - [`query`]: region parsing, planning and execution
//!
//! Queries are synchronous and single-threaded; open one source per query
//! if you want parallelism. Writing `.hic` files, computing normalization
//! vectors and format revisions older than 6 are out of scope.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod format;
pub mod io;
pub mod query;
pub mod types;

// Re-export commonly used types
pub use error::{ErrorKind, HicError, Result};
pub use format::header::{Header, Metadata};
pub use query::{count, read_metadata, straw};
pub use types::{Chromosome, ContactRecord, IndexEntry, Normalization, Unit};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
