//! Normalization vector decoding.

use crate::error::Result;
use crate::format::primitives::{clamp_len, Decoder};

/// Decode a length-prefixed vector of per-bin divisors.
///
/// NaN entries mean "no normalization available for this bin"; division by
/// them propagates NaN into the affected records, which is the defined
/// behavior.
pub fn decode_vector(buf: &[u8]) -> Result<Vec<f64>> {
    let mut dec = Decoder::new(buf, "normalization vector");
    let n_values = dec.read_i32()?;
    let mut values = Vec::with_capacity(clamp_len(n_values, dec.remaining(), 8));
    for _ in 0..n_values {
        values.push(dec.read_f64()?);
    }
    Ok(values)
}
