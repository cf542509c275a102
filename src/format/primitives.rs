//! Little-endian primitive decoding over an in-memory byte slice.

use crate::error::{HicError, Result};

/// Cursor over a byte slice with typed little-endian reads.
///
/// Every read checks the remaining length and fails with
/// [`HicError::Truncated`] naming the structure being decoded, so callers
/// can distinguish "file is short" from "field is bad".
#[derive(Debug)]
pub struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
    what: &'static str,
}

impl<'a> Decoder<'a> {
    /// Create a cursor over `buf`; `what` names the structure for errors.
    pub fn new(buf: &'a [u8], what: &'static str) -> Self {
        Self { buf, pos: 0, what }
    }

    /// Current offset from the start of the slice
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(HicError::Truncated {
                what: self.what,
                wanted: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Skip `n` bytes
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }

    /// Read one byte
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    /// Read a little-endian `i16`
    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(i16::from_le_bytes(self.take(2)?.try_into().unwrap()))
    }

    /// Read a little-endian `i32`
    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    /// Read a little-endian `i64`
    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    /// Read a little-endian `f32`
    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    /// Read a little-endian `f64`
    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    /// Read a NUL-terminated string, consuming the terminator.
    pub fn read_cstring(&mut self) -> Result<String> {
        let rest = &self.buf[self.pos..];
        let nul = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(HicError::Truncated {
                what: self.what,
                wanted: rest.len() + 1,
                remaining: rest.len(),
            })?;
        let s = std::str::from_utf8(&rest[..nul])
            .map_err(|_| HicError::InvalidString(self.what))?
            .to_string();
        self.pos += nul + 1;
        Ok(s)
    }
}

/// Pre-allocation bound for a declared element count: never more than the
/// remaining bytes could hold at `min_size` bytes per element.
pub(crate) fn clamp_len(declared: i32, remaining: usize, min_size: usize) -> usize {
    (declared.max(0) as usize).min(remaining / min_size.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_hostile_counts() {
        assert_eq!(clamp_len(3, 100, 4), 3);
        assert_eq!(clamp_len(i32::MAX, 100, 4), 25);
        assert_eq!(clamp_len(-1, 100, 4), 0);
    }

    #[test]
    fn reads_fixed_width_values() {
        let mut data = Vec::new();
        data.push(7u8);
        data.extend_from_slice(&(-2i16).to_le_bytes());
        data.extend_from_slice(&123456i32.to_le_bytes());
        data.extend_from_slice(&(-9_000_000_000i64).to_le_bytes());
        data.extend_from_slice(&1.5f32.to_le_bytes());
        data.extend_from_slice(&2.25f64.to_le_bytes());

        let mut dec = Decoder::new(&data, "test");
        assert_eq!(dec.read_u8().unwrap(), 7);
        assert_eq!(dec.read_i16().unwrap(), -2);
        assert_eq!(dec.read_i32().unwrap(), 123456);
        assert_eq!(dec.read_i64().unwrap(), -9_000_000_000);
        assert_eq!(dec.read_f32().unwrap(), 1.5);
        assert_eq!(dec.read_f64().unwrap(), 2.25);
        assert_eq!(dec.remaining(), 0);
    }

    #[test]
    fn reads_cstrings() {
        let data = b"hg19\0chr1\0";
        let mut dec = Decoder::new(data, "test");
        assert_eq!(dec.read_cstring().unwrap(), "hg19");
        assert_eq!(dec.read_cstring().unwrap(), "chr1");
        assert_eq!(dec.position(), data.len());
    }

    #[test]
    fn empty_cstring() {
        let mut dec = Decoder::new(b"\0", "test");
        assert_eq!(dec.read_cstring().unwrap(), "");
    }

    #[test]
    fn truncation_carries_context() {
        let mut dec = Decoder::new(&[1, 2], "zoom header");
        match dec.read_i32() {
            Err(HicError::Truncated {
                what,
                wanted,
                remaining,
            }) => {
                assert_eq!(what, "zoom header");
                assert_eq!(wanted, 4);
                assert_eq!(remaining, 2);
            }
            other => panic!("expected truncation, got {:?}", other),
        }
    }

    #[test]
    fn unterminated_string_is_truncation() {
        let mut dec = Decoder::new(b"abc", "header");
        assert!(matches!(
            dec.read_cstring(),
            Err(HicError::Truncated { .. })
        ));
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let mut dec = Decoder::new(&[0xff, 0xfe, 0x00], "header");
        assert!(matches!(
            dec.read_cstring(),
            Err(HicError::InvalidString("header"))
        ));
    }
}
