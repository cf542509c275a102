//! Zoom-level selection and block planning for a chromosome-pair matrix.

use crate::error::{HicError, Result};
use crate::format::primitives::{clamp_len, Decoder};
use crate::io::ByteSource;
use crate::types::{IndexEntry, Unit};
use std::collections::{BTreeSet, HashMap};

/// Fixed-width bytes in a zoom record after the unit string: five `i32`
/// (old zoom index, bin size, block bin count, block column count, block
/// count) and four `f32` statistics.
const ZOOM_FIXED_LEN: usize = 9 * 4;

/// Bytes per block-index triple: number (`i32`), position (`i64`), size (`i32`).
const BLOCK_TRIPLE_LEN: usize = 16;

/// The zoom level matching a requested `(unit, bin size)`, with its block
/// index.
#[derive(Debug, Clone)]
pub struct MatrixZoom {
    /// Axis unit of this level
    pub unit: Unit,
    /// Bin width of this level
    pub bin_size: i32,
    /// Bins per block edge
    pub block_bin_count: i32,
    /// Blocks per matrix row
    pub block_column_count: i32,
    /// Block number to byte-range index
    pub blocks: HashMap<i32, IndexEntry>,
}

impl MatrixZoom {
    /// Walk the zoom levels at `matrix_offset` and load the block index of
    /// the one matching `unit` and `bin_size`.
    ///
    /// Levels are framed by a unit string whose width is discovered with a
    /// one-byte probe (`B` for `BP`, `F` for `FRAG`), so each level costs a
    /// probe and a fixed-width read. The matching level additionally reads
    /// its whole block table at once; non-matching levels are skipped
    /// without touching their tables.
    pub fn read(
        source: &mut ByteSource,
        matrix_offset: i64,
        unit: Unit,
        bin_size: i32,
    ) -> Result<MatrixZoom> {
        let mut pos = file_pos(matrix_offset, "matrix")?;
        let head = source.read_at(pos, 12)?;
        let mut dec = Decoder::new(&head, "matrix header");
        let _c1 = dec.read_i32()?;
        let _c2 = dec.read_i32()?;
        let n_resolutions = dec.read_i32()?;
        pos += 12;

        for _ in 0..n_resolutions {
            let probe = source.read_at(pos, 1)?;
            let unit_len = match probe.first() {
                Some(b'B') => 3,
                Some(b'F') => 5,
                Some(&other) => return Err(HicError::UnknownUnit(other)),
                None => {
                    return Err(HicError::Truncated {
                        what: "zoom header",
                        wanted: 1,
                        remaining: 0,
                    })
                }
            };

            let header_len = unit_len + ZOOM_FIXED_LEN;
            let head = source.read_at(pos, header_len)?;
            let mut dec = Decoder::new(&head, "zoom header");
            let zoom_unit = dec.read_cstring()?;
            let _old_zoom_index = dec.read_i32()?;
            dec.skip(16)?; // sum, occupied cells, std dev, 95th percentile
            let zoom_bin_size = dec.read_i32()?;
            let block_bin_count = dec.read_i32()?;
            let block_column_count = dec.read_i32()?;
            let n_blocks = dec.read_i32()?;
            let table_len = n_blocks.max(0) as usize * BLOCK_TRIPLE_LEN;

            if zoom_unit == unit.as_str() && zoom_bin_size == bin_size {
                if block_bin_count <= 0 || block_column_count <= 0 {
                    return Err(HicError::MalformedBlock(
                        "zoom level with non-positive block geometry",
                    ));
                }
                let table = source.read_at(pos + header_len as u64, table_len)?;
                let mut dec = Decoder::new(&table, "block index");
                let mut blocks =
                    HashMap::with_capacity(clamp_len(n_blocks, table.len(), BLOCK_TRIPLE_LEN));
                for _ in 0..n_blocks {
                    let number = dec.read_i32()?;
                    let position = dec.read_i64()?;
                    let size = dec.read_i32()?;
                    blocks.insert(number, IndexEntry { position, size });
                }
                return Ok(MatrixZoom {
                    unit,
                    bin_size,
                    block_bin_count,
                    block_column_count,
                    blocks,
                });
            }

            pos += header_len as u64 + table_len as u64;
        }

        Err(HicError::ResolutionNotFound { unit, bin_size })
    }
}

/// Block numbers whose tiles intersect a bin-coordinate region.
///
/// `region_bins` is `[col_lo, col_hi, row_lo, row_hi]` in bin indices, both
/// edges inclusive. Only the upper triangle is stored on disk, so an
/// intrachromosomal query also selects the blocks of the mirrored rectangle
/// across the diagonal. The set is ordered and deduplicated.
pub fn blocks_for_region(
    region_bins: &[i32; 4],
    block_bin_count: i32,
    block_column_count: i32,
    intra: bool,
) -> BTreeSet<i32> {
    let col1 = region_bins[0] / block_bin_count;
    let col2 = (region_bins[1] + 1) / block_bin_count;
    let row1 = region_bins[2] / block_bin_count;
    let row2 = (region_bins[3] + 1) / block_bin_count;

    let mut blocks = BTreeSet::new();
    for r in row1..=row2 {
        for c in col1..=col2 {
            blocks.insert(r * block_column_count + c);
        }
    }
    if intra {
        // region part overlapping the lower-left triangle
        for r in col1..=col2 {
            for c in row1..=row2 {
                blocks.insert(r * block_column_count + c);
            }
        }
    }
    blocks
}

/// Validate a file pointer read from an index structure.
pub(crate) fn file_pos(offset: i64, what: &'static str) -> Result<u64> {
    u64::try_from(offset).map_err(|_| HicError::InvalidPointer { what, offset })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_block_for_small_region() {
        let blocks = blocks_for_region(&[0, 1, 0, 1], 100, 100, true);
        assert_eq!(blocks.into_iter().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn spans_block_columns_and_rows() {
        // 10 bins per block, 4 block columns; bins 5..15 cross one edge
        let blocks = blocks_for_region(&[5, 15, 5, 15], 10, 4, false);
        assert_eq!(blocks.into_iter().collect::<Vec<_>>(), vec![0, 1, 4, 5]);
    }

    #[test]
    fn intra_adds_mirrored_blocks() {
        // off-diagonal rectangle: cols 0..9, rows 20..29; the +1 on upper
        // edges pulls in the next block column and row
        let straight = blocks_for_region(&[0, 9, 20, 29], 10, 4, false);
        assert_eq!(
            straight.iter().copied().collect::<Vec<_>>(),
            vec![8, 9, 12, 13]
        );
        let mirrored = blocks_for_region(&[0, 9, 20, 29], 10, 4, true);
        assert_eq!(
            mirrored.into_iter().collect::<Vec<_>>(),
            vec![2, 3, 6, 7, 8, 9, 12, 13]
        );
    }

    #[test]
    fn mirror_is_dedup_on_diagonal() {
        let square = blocks_for_region(&[0, 9, 0, 9], 10, 4, true);
        assert_eq!(square.len(), 4);
    }

    #[test]
    fn negative_pointer_is_rejected() {
        assert!(matches!(
            file_pos(-1, "matrix"),
            Err(HicError::InvalidPointer { what: "matrix", .. })
        ));
        assert_eq!(file_pos(42, "matrix").unwrap(), 42);
    }
}
