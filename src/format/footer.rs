//! Footer decoding: master index and normalization-vector index.

use crate::error::{HicError, Result};
use crate::format::primitives::Decoder;
use crate::types::{IndexEntry, Normalization, Unit};

/// What a query needs out of the footer: where the chromosome-pair matrix
/// lives, and where the two normalization vectors live if requested.
#[derive(Debug, Clone)]
pub struct Footer {
    /// Absolute offset of the matrix for the requested pair
    pub matrix_offset: i64,
    /// Normalization vector entry for the lower-indexed chromosome
    pub c1_norm: Option<IndexEntry>,
    /// Normalization vector entry for the higher-indexed chromosome
    pub c2_norm: Option<IndexEntry>,
}

impl Footer {
    /// Decode the footer from `buf`, the bytes spanning `[master, EOF)`.
    ///
    /// `c1 <= c2` are the numeric chromosome indices of the pair. When
    /// `norm` is `NONE` the normalization index is never reached and both
    /// vector entries stay unset. A vector missing for one side is logged
    /// and left unset; the query treats that side as identity.
    pub fn decode(
        buf: &[u8],
        c1: i32,
        c2: i32,
        norm: &Normalization,
        unit: Unit,
        resolution: i32,
    ) -> Result<Footer> {
        let mut dec = Decoder::new(buf, "footer");
        let _n_bytes = dec.read_i32()?;

        let key = format!("{}_{}", c1, c2);
        let n_entries = dec.read_i32()?;
        let mut matrix_offset = None;
        for _ in 0..n_entries {
            let entry_key = dec.read_cstring()?;
            let position = dec.read_i64()?;
            let _size = dec.read_i32()?;
            if matrix_offset.is_none() && entry_key == key {
                matrix_offset = Some(position);
            }
        }
        let matrix_offset = matrix_offset.ok_or(HicError::MatrixNotFound(key))?;

        if norm.is_none() {
            return Ok(Footer {
                matrix_offset,
                c1_norm: None,
                c2_norm: None,
            });
        }

        // two expected-value sections sit between the master index and the
        // normalization index; the second carries a leading type string
        skip_expected_values(&mut dec, false)?;
        skip_expected_values(&mut dec, true)?;

        let n_norm_entries = dec.read_i32()?;
        let mut c1_norm = None;
        let mut c2_norm = None;
        for _ in 0..n_norm_entries {
            let norm_type = dec.read_cstring()?;
            let chr_idx = dec.read_i32()?;
            let entry_unit = dec.read_cstring()?;
            let entry_resolution = dec.read_i32()?;
            let position = dec.read_i64()?;
            let size = dec.read_i32()?;
            if norm_type != norm.as_str()
                || entry_unit != unit.as_str()
                || entry_resolution != resolution
            {
                continue;
            }
            let entry = IndexEntry { position, size };
            if chr_idx == c1 {
                c1_norm = Some(entry);
            }
            if chr_idx == c2 {
                c2_norm = Some(entry);
            }
        }

        if c1_norm.is_none() || c2_norm.is_none() {
            log::warn!(
                "file does not contain {} normalization vectors for one or both \
                 chromosomes at {} {}; missing side(s) treated as identity",
                norm,
                resolution,
                unit
            );
        }

        Ok(Footer {
            matrix_offset,
            c1_norm,
            c2_norm,
        })
    }
}

fn skip_expected_values(dec: &mut Decoder<'_>, with_type: bool) -> Result<()> {
    let n = dec.read_i32()?;
    for _ in 0..n {
        if with_type {
            dec.read_cstring()?;
        }
        dec.read_cstring()?; // unit
        dec.read_i32()?; // bin size
        let n_values = dec.read_i32()?;
        dec.skip(n_values.max(0) as usize * 8)?;
        let n_factors = dec.read_i32()?;
        dec.skip(n_factors.max(0) as usize * 12)?;
    }
    Ok(())
}
