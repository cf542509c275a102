//! Block inflation and contact-record decoding.
//!
//! Each block is a zlib stream whose inflated payload starts with a record
//! count. Files at revision 6 store plain `(binX, binY, count)` triples;
//! revision 7 and later store offset-relative payloads in one of two
//! layouts, a list of rows or a dense rectangle with sentinel holes.

use crate::error::{HicError, Result};
use crate::format::primitives::Decoder;
use crate::types::ContactRecord;
use flate2::read::ZlibDecoder;
use std::io::Read;

/// Sentinel marking an absent cell in a dense block with short counts.
const SHORT_SENTINEL: i16 = -32768;

/// Observed payloads inflate to at most a few times their compressed size;
/// the buffer still grows past this if a block proves richer.
const INFLATE_SIZE_HINT: usize = 10;

/// Inflate a raw zlib stream into a growable buffer.
pub fn inflate(compressed: &[u8]) -> Result<Vec<u8>> {
    let mut payload = Vec::with_capacity(compressed.len().saturating_mul(INFLATE_SIZE_HINT));
    ZlibDecoder::new(compressed)
        .read_to_end(&mut payload)
        .map_err(|e| HicError::Decompression(e.to_string()))?;
    Ok(payload)
}

/// Decode every contact record in an inflated block payload.
pub fn decode_records(version: i32, payload: &[u8]) -> Result<Vec<ContactRecord>> {
    let mut dec = Decoder::new(payload, "block payload");
    let n_records = dec.read_i32()?;

    if version < 7 {
        let cap = (n_records.max(0) as usize).min(dec.remaining() / 12);
        let mut records = Vec::with_capacity(cap);
        for _ in 0..n_records {
            let bin_x = dec.read_i32()?;
            let bin_y = dec.read_i32()?;
            let counts = dec.read_f32()?;
            records.push(ContactRecord {
                bin_x,
                bin_y,
                counts,
            });
        }
        return Ok(records);
    }

    let bin_x_offset = dec.read_i32()?;
    let bin_y_offset = dec.read_i32()?;
    // zero means 16-bit counts
    let short_counts = dec.read_u8()? == 0;
    let layout = dec.read_u8()?;

    let cap = (n_records.max(0) as usize).min(dec.remaining() / 2);
    let mut records = Vec::with_capacity(cap);

    match layout {
        1 => {
            // wrapping keeps offsets from corrupt files from aborting the
            // process; valid files never get near the edge
            let row_count = dec.read_i16()?;
            for _ in 0..row_count {
                let bin_y = bin_y_offset.wrapping_add(i32::from(dec.read_i16()?));
                let col_count = dec.read_i16()?;
                for _ in 0..col_count {
                    let bin_x = bin_x_offset.wrapping_add(i32::from(dec.read_i16()?));
                    let counts = if short_counts {
                        f32::from(dec.read_i16()?)
                    } else {
                        dec.read_f32()?
                    };
                    records.push(ContactRecord {
                        bin_x,
                        bin_y,
                        counts,
                    });
                }
            }
        }
        2 => {
            let n_points = dec.read_i32()?;
            let width = i32::from(dec.read_i16()?);
            if n_points > 0 && width <= 0 {
                return Err(HicError::MalformedBlock(
                    "dense layout with non-positive width",
                ));
            }
            for i in 0..n_points {
                let row = i / width;
                let col = i - row * width;
                let bin_x = bin_x_offset.wrapping_add(col);
                let bin_y = bin_y_offset.wrapping_add(row);
                if short_counts {
                    let c = dec.read_i16()?;
                    if c != SHORT_SENTINEL {
                        records.push(ContactRecord {
                            bin_x,
                            bin_y,
                            counts: f32::from(c),
                        });
                    }
                } else {
                    let counts = dec.read_f32()?;
                    if !counts.is_nan() {
                        records.push(ContactRecord {
                            bin_x,
                            bin_y,
                            counts,
                        });
                    }
                }
            }
        }
        other => return Err(HicError::UnknownBlockType(other)),
    }

    Ok(records)
}

/// Read only the leading record count of an inflated block payload.
pub fn record_count(payload: &[u8]) -> Result<i32> {
    Decoder::new(payload, "block payload").read_i32()
}
