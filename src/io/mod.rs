//! Byte sources: uniform random-access reads over a local file or an
//! HTTP(S) origin.
//!
//! The format decoders only ever ask a source for `(offset, length)` byte
//! ranges, so the identical decoding path runs against both backends. A
//! local file serves ranges with seeks, or from a memory map once the file
//! is large enough to make mapping worthwhile. The HTTP backend issues
//! `Range` requests and lives in [`network`].

use crate::error::Result;
use bytes::Bytes;
use memmap2::Mmap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

#[cfg(feature = "network")]
pub mod network;
#[cfg(feature = "network")]
pub use network::HttpSource;

/// Files at or above this size are memory-mapped instead of seek-read.
pub const MMAP_THRESHOLD: u64 = 50 * 1024 * 1024;

/// Bytes prefetched from offset 0 when a source opens; sized to hold the
/// header of any ordinary file in one read.
pub const BOOTSTRAP_WINDOW: usize = 100 * 1024;

/// A random-access byte source, selected by URL-prefix detection.
///
/// Not safe for concurrent use by multiple queries; callers wanting
/// parallelism open one source per query.
pub enum ByteSource {
    /// Local filesystem path
    Local(LocalSource),

    /// HTTP/HTTPS URL
    #[cfg(feature = "network")]
    Http(HttpSource),
}

impl ByteSource {
    /// Open `fname`, treating anything starting with `http` as a URL.
    pub fn open(fname: &str) -> Result<Self> {
        if fname.starts_with("http") {
            #[cfg(feature = "network")]
            return Ok(ByteSource::Http(HttpSource::open(fname)?));
            #[cfg(not(feature = "network"))]
            return Err(std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                "built without the network feature, cannot open URLs",
            )
            .into());
        }
        Ok(ByteSource::Local(LocalSource::open(Path::new(fname))?))
    }

    /// Total length of the underlying file in bytes.
    pub fn len(&self) -> u64 {
        match self {
            ByteSource::Local(local) => local.len(),
            #[cfg(feature = "network")]
            ByteSource::Http(http) => http.len(),
        }
    }

    /// True when the underlying file is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read up to `length` bytes starting at `offset`.
    ///
    /// Reads past the end of the file are clamped; the decoders report the
    /// shortfall as a truncation with context.
    pub fn read_at(&mut self, offset: u64, length: usize) -> Result<Bytes> {
        match self {
            ByteSource::Local(local) => local.read_at(offset, length),
            #[cfg(feature = "network")]
            ByteSource::Http(http) => http.read_at(offset, length),
        }
    }
}

/// Local file backend: seek-based reads, memory-mapped above
/// [`MMAP_THRESHOLD`].
pub struct LocalSource {
    file: File,
    mmap: Option<Mmap>,
    len: u64,
}

impl LocalSource {
    /// Open a local file and pick the read strategy from its size.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        let mmap = if len >= MMAP_THRESHOLD {
            // SAFETY: the map is read-only and the file is not expected to
            // be truncated while a query runs
            Some(unsafe { Mmap::map(&file)? })
        } else {
            None
        };
        Ok(Self { file, mmap, len })
    }

    /// Total file length in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// True when the file is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read up to `length` bytes at `offset`, clamped to the file end.
    pub fn read_at(&mut self, offset: u64, length: usize) -> Result<Bytes> {
        let available = self.len.saturating_sub(offset);
        let length = length.min(available as usize);
        if length == 0 {
            return Ok(Bytes::new());
        }
        if let Some(mmap) = &self.mmap {
            let start = offset as usize;
            return Ok(Bytes::copy_from_slice(&mmap[start..start + length]));
        }
        let mut buf = vec![0u8; length];
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(&mut buf)?;
        Ok(Bytes::from(buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn local_reads_are_random_access() {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(b"0123456789").unwrap();
        tmp.flush().unwrap();

        let mut src = LocalSource::open(tmp.path()).unwrap();
        assert_eq!(src.len(), 10);
        assert_eq!(&src.read_at(3, 4).unwrap()[..], b"3456");
        assert_eq!(&src.read_at(0, 2).unwrap()[..], b"01");
    }

    #[test]
    fn local_reads_clamp_at_eof() {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(b"abcdef").unwrap();
        tmp.flush().unwrap();

        let mut src = LocalSource::open(tmp.path()).unwrap();
        assert_eq!(&src.read_at(4, 100).unwrap()[..], b"ef");
        assert!(src.read_at(6, 10).unwrap().is_empty());
        assert!(src.read_at(100, 10).unwrap().is_empty());
    }

    #[test]
    fn open_dispatches_on_prefix() {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(b"xyz").unwrap();
        tmp.flush().unwrap();

        let src = ByteSource::open(tmp.path().to_str().unwrap()).unwrap();
        assert!(matches!(src, ByteSource::Local(_)));
        assert_eq!(src.len(), 3);
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(ByteSource::open("/no/such/file.hic").is_err());
    }
}
