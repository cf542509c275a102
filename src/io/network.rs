//! HTTP(S) byte source with range requests.
//!
//! Opening the source performs one bootstrap read of [`BOOTSTRAP_WINDOW`]
//! bytes from offset 0, which both prefetches the header region and
//! discovers the total file length from the `Content-Range` response
//! header. The bootstrap window is kept for the life of the source and
//! serves any subrange without another round trip; other ranges go through
//! a byte-bounded LRU cache so a source reused across queries does not
//! refetch its footer and block index.
//!
//! Transient failures propagate to the caller; there is no retry.

use crate::error::{HicError, Result};
use crate::io::BOOTSTRAP_WINDOW;
use bytes::Bytes;
use lru::LruCache;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::time::Duration;

/// Upper bound on bytes retained by the range cache (bootstrap excluded).
pub const DEFAULT_CACHE_SIZE: usize = 50 * 1024 * 1024;

/// Timeout applied to every request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP(S) backend for [`crate::io::ByteSource`].
pub struct HttpSource {
    client: Client,
    url: String,
    bootstrap: Bytes,
    total: u64,
    cache: ByteBoundedCache,
}

impl HttpSource {
    /// Open a URL: build the client, fetch the bootstrap window and record
    /// the total length.
    pub fn open(url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(concat!("hicstraw/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HicError::Network(e.to_string()))?;

        let (bootstrap, total) = bootstrap_fetch(&client, url)?;
        Ok(Self {
            client,
            url: url.to_string(),
            bootstrap,
            total,
            cache: ByteBoundedCache::new(DEFAULT_CACHE_SIZE),
        })
    }

    /// Total file length as reported by `Content-Range`.
    pub fn len(&self) -> u64 {
        self.total
    }

    /// True when the remote file is empty.
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Read up to `length` bytes at `offset`, clamped to the file end.
    pub fn read_at(&mut self, offset: u64, length: usize) -> Result<Bytes> {
        let available = self.total.saturating_sub(offset);
        let length = length.min(available as usize);
        if length == 0 {
            return Ok(Bytes::new());
        }
        let end = offset + length as u64;

        if end <= self.bootstrap.len() as u64 {
            let start = offset as usize;
            return Ok(self.bootstrap.slice(start..start + length));
        }

        let key = RangeKey { start: offset, end };
        if let Some(data) = self.cache.get(&key) {
            return Ok(data.clone());
        }

        let data = fetch_range(&self.client, &self.url, offset, end)?;
        self.cache.put(key, data.clone());
        Ok(data)
    }
}

/// Fetch the bootstrap window and parse the total length out of
/// `Content-Range`.
fn bootstrap_fetch(client: &Client, url: &str) -> Result<(Bytes, u64)> {
    let response = client
        .get(url)
        .header("Range", format!("bytes=0-{}", BOOTSTRAP_WINDOW - 1))
        .send()
        .map_err(|e| HicError::Network(e.to_string()))?;

    let status = response.status();
    if status != StatusCode::PARTIAL_CONTENT {
        if status.is_success() {
            return Err(HicError::Network(format!(
                "server ignored the Range header (status {}): {}",
                status.as_u16(),
                url
            )));
        }
        return Err(HicError::Http {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    let total = response
        .headers()
        .get("content-range")
        .and_then(|v| v.to_str().ok())
        .and_then(parse_content_range)
        .ok_or_else(|| {
            HicError::Network(format!("missing or unparsable Content-Range from {}", url))
        })?;

    let bytes = response
        .bytes()
        .map_err(|e| HicError::Network(e.to_string()))?;
    Ok((bytes, total))
}

/// One range request; expects 206 and no more bytes than asked for.
fn fetch_range(client: &Client, url: &str, start: u64, end: u64) -> Result<Bytes> {
    let response = client
        .get(url)
        .header("Range", format!("bytes={}-{}", start, end - 1))
        .send()
        .map_err(|e| HicError::Network(e.to_string()))?;

    let status = response.status();
    match status {
        StatusCode::PARTIAL_CONTENT => {}
        StatusCode::OK => {
            return Err(HicError::Network(format!(
                "server ignored the Range header for bytes {}-{}: {}",
                start,
                end - 1,
                url
            )));
        }
        _ => {
            return Err(HicError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
    }

    let bytes = response
        .bytes()
        .map_err(|e| HicError::Network(e.to_string()))?;
    if bytes.len() as u64 > end - start {
        return Err(HicError::Network(format!(
            "server returned {} bytes for a {}-byte range",
            bytes.len(),
            end - start
        )));
    }
    Ok(bytes)
}

/// Parse the total length out of a `Content-Range` value such as
/// `bytes 0-99999/500000000`.
fn parse_content_range(value: &str) -> Option<u64> {
    value.rsplit('/').next()?.trim().parse().ok()
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
struct RangeKey {
    start: u64,
    end: u64,
}

/// LRU cache bounded by the bytes it holds rather than its entry count.
struct ByteBoundedCache {
    cache: LruCache<RangeKey, Bytes>,
    current_size: usize,
    max_size: usize,
}

impl ByteBoundedCache {
    fn new(max_size: usize) -> Self {
        Self {
            cache: LruCache::unbounded(),
            current_size: 0,
            max_size,
        }
    }

    fn get(&mut self, key: &RangeKey) -> Option<&Bytes> {
        self.cache.get(key)
    }

    fn put(&mut self, key: RangeKey, value: Bytes) {
        let value_size = value.len();
        if value_size > self.max_size {
            return;
        }
        if let Some(old) = self.cache.peek(&key) {
            self.current_size = self.current_size.saturating_sub(old.len());
        }
        while self.current_size + value_size > self.max_size && !self.cache.is_empty() {
            if let Some((_, evicted)) = self.cache.pop_lru() {
                self.current_size = self.current_size.saturating_sub(evicted.len());
            }
        }
        self.current_size += value_size;
        self.cache.push(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_content_range_total() {
        assert_eq!(
            parse_content_range("bytes 0-99999/500000000"),
            Some(500_000_000)
        );
        assert_eq!(parse_content_range("bytes 100-199/1024"), Some(1024));
    }

    #[test]
    fn rejects_unknown_total() {
        assert_eq!(parse_content_range("bytes 0-99999/*"), None);
        assert_eq!(parse_content_range("garbage"), None);
    }

    #[test]
    fn cache_evicts_least_recent_range() {
        let mut cache = ByteBoundedCache::new(1024);
        let key = |start: u64| RangeKey {
            start,
            end: start + 512,
        };

        cache.put(key(0), Bytes::from(vec![0u8; 512]));
        cache.put(key(512), Bytes::from(vec![1u8; 512]));
        assert_eq!(cache.current_size, 1024);

        cache.put(key(1024), Bytes::from(vec![2u8; 512]));
        assert_eq!(cache.current_size, 1024);
        assert!(cache.get(&key(0)).is_none());
        assert!(cache.get(&key(512)).is_some());
        assert!(cache.get(&key(1024)).is_some());
    }

    #[test]
    fn cache_skips_oversized_entries() {
        let mut cache = ByteBoundedCache::new(256);
        let key = RangeKey { start: 0, end: 512 };
        cache.put(key, Bytes::from(vec![0u8; 512]));
        assert_eq!(cache.current_size, 0);
        assert!(cache.get(&key).is_none());
    }

    #[test]
    fn cache_replaces_same_key() {
        let mut cache = ByteBoundedCache::new(1024);
        let key = RangeKey { start: 0, end: 512 };
        cache.put(key, Bytes::from(vec![0u8; 512]));
        cache.put(key, Bytes::from(vec![1u8; 256]));
        assert_eq!(cache.current_size, 256);
        assert_eq!(cache.get(&key).unwrap().len(), 256);
    }
}
