//! Query planning and execution.
//!
//! A query names a normalization, a file or URL, two chromosome regions, a
//! unit and a bin size. Planning opens the byte source, walks header ->
//! footer -> normalization vectors -> zoom level, and turns the genomic
//! region into a set of block numbers. Execution decodes each selected
//! block and keeps the records that land inside the requested rectangle
//! (or its mirror across the diagonal, for intrachromosomal queries),
//! scaled to genomic coordinates and optionally normalized.
//!
//! All state is per query; nothing is shared or cached at module scope.

use crate::error::{HicError, Result};
use crate::format::block;
use crate::format::footer::Footer;
use crate::format::header::{Header, Metadata};
use crate::format::matrix::{self, MatrixZoom};
use crate::format::norm;
use crate::io::{ByteSource, BOOTSTRAP_WINDOW};
use crate::types::{Chromosome, ContactRecord, IndexEntry, Normalization, Unit};
use std::collections::{BTreeSet, HashMap};

/// Fetch the sparse contact records for a region pair.
///
/// `norm` is matched by equality against the file's normalization index
/// (`"NONE"` skips normalization entirely). `fname` is a filesystem path or
/// a URL beginning with `http`. Each region is `name` or `name:start:end`
/// with non-negative bounds. `unit` is `"BP"` or `"FRAG"`, and `binsize`
/// must be one of the file's zoom levels.
///
/// Returned records carry genomic coordinates (bin index × bin size) with
/// `bin_x` on the lower-indexed chromosome's axis regardless of argument
/// order. Record order is unspecified.
///
/// # Example
///
/// ```no_run
/// # fn main() -> hicstraw::Result<()> {
/// let records = hicstraw::straw("NONE", "inter30.hic", "1", "2", "BP", 1_000_000)?;
/// for r in &records {
///     println!("{}\t{}\t{}", r.bin_x, r.bin_y, r.counts);
/// }
/// # Ok(())
/// # }
/// ```
pub fn straw(
    norm: &str,
    fname: &str,
    chr1loc: &str,
    chr2loc: &str,
    unit: &str,
    binsize: i32,
) -> Result<Vec<ContactRecord>> {
    let plan = QueryPlan::build(norm, fname, chr1loc, chr2loc, unit, binsize)?;
    plan.collect_records()
}

/// Count the records in the blocks a query would read, without decoding
/// their bodies.
///
/// Each selected block is inflated only far enough to read its leading
/// record count, giving an O(blocks) size estimate. Blocks are counted
/// whole, so the estimate matches [`straw`] exactly when the region covers
/// every record of every selected block.
pub fn count(
    norm: &str,
    fname: &str,
    chr1loc: &str,
    chr2loc: &str,
    unit: &str,
    binsize: i32,
) -> Result<i64> {
    let plan = QueryPlan::build(norm, fname, chr1loc, chr2loc, unit, binsize)?;
    plan.count_records()
}

/// Read the file header in full: genome id, attribute dictionary,
/// chromosome table and the available resolutions.
pub fn read_metadata(fname: &str) -> Result<Metadata> {
    let mut source = ByteSource::open(fname)?;
    decode_with_growing_window(&mut source, Metadata::decode)
}

/// Everything execution needs, resolved up front.
struct QueryPlan {
    source: ByteSource,
    version: i32,
    bin_size: i32,
    intra: bool,
    orig_region: [i32; 4],
    normalize: bool,
    c1_norm: Option<Vec<f64>>,
    c2_norm: Option<Vec<f64>>,
    zoom: MatrixZoom,
    block_numbers: BTreeSet<i32>,
}

impl QueryPlan {
    fn build(
        norm: &str,
        fname: &str,
        chr1loc: &str,
        chr2loc: &str,
        unit: &str,
        binsize: i32,
    ) -> Result<QueryPlan> {
        let unit: Unit = unit.parse()?;
        let norm = Normalization::from(norm);
        if binsize <= 0 {
            return Err(HicError::NonPositiveBinSize(binsize));
        }

        let mut source = ByteSource::open(fname)?;
        let header = decode_with_growing_window(&mut source, Header::decode)?;

        let locus1 = parse_locus(chr1loc, &header.chromosomes)?;
        let locus2 = parse_locus(chr2loc, &header.chromosomes)?;

        // the file stores each pair once, keyed by ascending chromosome
        // index; a swapped request swaps the rectangles to match
        let (a, b) = if locus1.chromosome.index > locus2.chromosome.index {
            (locus2, locus1)
        } else {
            (locus1, locus2)
        };
        let c1 = a.chromosome.index;
        let c2 = b.chromosome.index;
        let intra = c1 == c2;
        let orig_region = [a.start, a.end, b.start, b.end];
        let region_bins = [
            a.start / binsize,
            a.end / binsize,
            b.start / binsize,
            b.end / binsize,
        ];

        let master = matrix::file_pos(header.master_offset, "master index")?;
        let footer_len = source.len().saturating_sub(master) as usize;
        let footer_buf = source.read_at(master, footer_len)?;
        let footer = Footer::decode(&footer_buf, c1, c2, &norm, unit, binsize)?;

        let (c1_norm, c2_norm) = if norm.is_none() {
            (None, None)
        } else {
            (
                load_norm_vector(&mut source, footer.c1_norm)?,
                load_norm_vector(&mut source, footer.c2_norm)?,
            )
        };

        let zoom = MatrixZoom::read(&mut source, footer.matrix_offset, unit, binsize)?;
        let block_numbers = matrix::blocks_for_region(
            &region_bins,
            zoom.block_bin_count,
            zoom.block_column_count,
            intra,
        );
        log::debug!(
            "{} x {} at {} {}: {} of {} indexed blocks selected",
            chr1loc,
            chr2loc,
            binsize,
            unit,
            block_numbers.len(),
            zoom.blocks.len()
        );

        Ok(QueryPlan {
            source,
            version: header.version,
            bin_size: binsize,
            intra,
            orig_region,
            normalize: !norm.is_none(),
            c1_norm,
            c2_norm,
            zoom,
            block_numbers,
        })
    }

    fn collect_records(self) -> Result<Vec<ContactRecord>> {
        let QueryPlan {
            mut source,
            version,
            bin_size,
            intra,
            orig_region,
            normalize,
            c1_norm,
            c2_norm,
            zoom,
            block_numbers,
        } = self;

        let mut records = Vec::new();
        for number in block_numbers {
            let Some(entry) = zoom.blocks.get(&number) else {
                continue;
            };
            for raw in read_block(&mut source, version, *entry)? {
                let x = raw.bin_x.saturating_mul(bin_size);
                let y = raw.bin_y.saturating_mul(bin_size);
                let mut counts = raw.counts;
                if normalize {
                    let divisor =
                        norm_factor(&c1_norm, raw.bin_x) * norm_factor(&c2_norm, raw.bin_y);
                    counts = (f64::from(counts) / divisor) as f32;
                }

                let in_region = x >= orig_region[0]
                    && x <= orig_region[1]
                    && y >= orig_region[2]
                    && y <= orig_region[3];
                // the file keeps only the upper triangle; a request that
                // dips below the diagonal finds its records mirrored
                let in_mirror = intra
                    && y >= orig_region[0]
                    && y <= orig_region[1]
                    && x >= orig_region[2]
                    && x <= orig_region[3];
                if in_region || in_mirror {
                    records.push(ContactRecord {
                        bin_x: x,
                        bin_y: y,
                        counts,
                    });
                }
            }
        }
        Ok(records)
    }

    fn count_records(self) -> Result<i64> {
        let QueryPlan {
            mut source,
            zoom,
            block_numbers,
            ..
        } = self;

        let mut total = 0i64;
        for number in block_numbers {
            let Some(entry) = zoom.blocks.get(&number) else {
                continue;
            };
            if entry.is_empty() {
                continue;
            }
            let pos = matrix::file_pos(entry.position, "block")?;
            let compressed = source.read_at(pos, entry.size as usize)?;
            let payload = block::inflate(&compressed)?;
            total += i64::from(block::record_count(&payload)?);
        }
        Ok(total)
    }
}

fn read_block(
    source: &mut ByteSource,
    version: i32,
    entry: IndexEntry,
) -> Result<Vec<ContactRecord>> {
    if entry.is_empty() {
        return Ok(Vec::new());
    }
    let pos = matrix::file_pos(entry.position, "block")?;
    let compressed = source.read_at(pos, entry.size as usize)?;
    let payload = block::inflate(&compressed)?;
    block::decode_records(version, &payload)
}

fn load_norm_vector(
    source: &mut ByteSource,
    entry: Option<IndexEntry>,
) -> Result<Option<Vec<f64>>> {
    let Some(entry) = entry else {
        return Ok(None);
    };
    if entry.is_empty() {
        return Ok(None);
    }
    let pos = matrix::file_pos(entry.position, "normalization vector")?;
    let buf = source.read_at(pos, entry.size as usize)?;
    Ok(Some(norm::decode_vector(&buf)?))
}

/// Per-bin divisor; bins outside the vector (or a missing vector) divide
/// by one.
fn norm_factor(vector: &Option<Vec<f64>>, bin: i32) -> f64 {
    vector
        .as_ref()
        .and_then(|v| v.get(usize::try_from(bin).ok()?))
        .copied()
        .unwrap_or(1.0)
}

/// A parsed region descriptor.
struct Locus {
    chromosome: Chromosome,
    start: i32,
    end: i32,
}

/// Parse `name` or `name:start:end` against the chromosome table.
fn parse_locus(spec: &str, chromosomes: &HashMap<String, Chromosome>) -> Result<Locus> {
    let mut parts = spec.split(':');
    let name = parts.next().unwrap_or_default();
    let chromosome = chromosomes
        .get(name)
        .cloned()
        .ok_or_else(|| HicError::UnknownChromosome(name.to_string()))?;

    let (start, end) = match (parts.next(), parts.next(), parts.next()) {
        (None, _, _) => (0, chromosome.length),
        (Some(start), Some(end), None) => {
            let start = parse_bound(start, spec)?;
            let end = parse_bound(end, spec)?;
            (start, end)
        }
        _ => return Err(HicError::InvalidRegion(spec.to_string())),
    };

    Ok(Locus {
        chromosome,
        start,
        end,
    })
}

fn parse_bound(field: &str, spec: &str) -> Result<i32> {
    let value: i32 = field
        .parse()
        .map_err(|_| HicError::InvalidRegion(spec.to_string()))?;
    if value < 0 {
        return Err(HicError::InvalidRegion(spec.to_string()));
    }
    Ok(value)
}

/// Decode a structure that lives at the start of the file, doubling the
/// read window whenever the decode runs out of bytes. The first window is
/// the bootstrap prefetch, so ordinary headers cost one read.
fn decode_with_growing_window<T>(
    source: &mut ByteSource,
    decode: fn(&[u8]) -> Result<T>,
) -> Result<T> {
    let len = source.len();
    let mut window = BOOTSTRAP_WINDOW.min(len as usize).max(1);
    loop {
        let buf = source.read_at(0, window)?;
        match decode(&buf) {
            Err(HicError::Truncated { .. }) if (window as u64) < len => {
                window = window.saturating_mul(2).min(len as usize);
            }
            other => return other,
        }
    }
}
