//! Header decoding: magic, version, master pointer and chromosome table.

use crate::error::{HicError, Result};
use crate::format::primitives::{clamp_len, Decoder};
use crate::types::Chromosome;
use std::collections::HashMap;

/// Decoded file header.
///
/// Only the fields later stages need are kept; the attribute dictionary is
/// consumed and discarded. Use [`Metadata`] to capture everything.
#[derive(Debug, Clone)]
pub struct Header {
    /// Format revision (6 or newer)
    pub version: i32,
    /// Absolute offset of the footer
    pub master_offset: i64,
    /// Genome assembly identifier
    pub genome_id: String,
    /// Chromosome table keyed by name, indices in declaration order
    pub chromosomes: HashMap<String, Chromosome>,
}

impl Header {
    /// Decode a header from the leading bytes of the file.
    pub fn decode(buf: &[u8]) -> Result<Header> {
        let mut dec = Decoder::new(buf, "header");
        let (version, master_offset, genome_id) = decode_prefix(&mut dec)?;

        let n_attrs = dec.read_i32()?;
        for _ in 0..n_attrs {
            dec.read_cstring()?;
            dec.read_cstring()?;
        }

        let n_chrs = dec.read_i32()?;
        let mut chromosomes = HashMap::with_capacity(clamp_len(n_chrs, dec.remaining(), 5));
        for index in 0..n_chrs {
            let name = dec.read_cstring()?;
            let length = dec.read_i32()?;
            chromosomes.insert(
                name.clone(),
                Chromosome {
                    name,
                    index,
                    length,
                },
            );
        }

        Ok(Header {
            version,
            master_offset,
            genome_id,
            chromosomes,
        })
    }
}

/// Everything the header declares, including the parts a query discards.
#[derive(Debug, Clone)]
pub struct Metadata {
    /// Format revision
    pub version: i32,
    /// Absolute offset of the footer
    pub master_offset: i64,
    /// Genome assembly identifier
    pub genome_id: String,
    /// Attribute dictionary (statistics, software provenance, graphs)
    pub attributes: HashMap<String, String>,
    /// Chromosome table in declaration order
    pub chromosomes: Vec<Chromosome>,
    /// Base-pair-delimited resolutions available in the file
    pub bp_resolutions: Vec<i32>,
    /// Fragment-delimited resolutions available in the file
    pub frag_resolutions: Vec<i32>,
}

impl Metadata {
    /// Decode the full header, including attribute dictionary and the
    /// resolution lists that follow the chromosome table.
    pub fn decode(buf: &[u8]) -> Result<Metadata> {
        let mut dec = Decoder::new(buf, "header");
        let (version, master_offset, genome_id) = decode_prefix(&mut dec)?;

        let n_attrs = dec.read_i32()?;
        let mut attributes = HashMap::with_capacity(clamp_len(n_attrs, dec.remaining(), 2));
        for _ in 0..n_attrs {
            let key = dec.read_cstring()?;
            let value = dec.read_cstring()?;
            attributes.insert(key, value);
        }

        let n_chrs = dec.read_i32()?;
        let mut chromosomes = Vec::with_capacity(clamp_len(n_chrs, dec.remaining(), 5));
        for index in 0..n_chrs {
            let name = dec.read_cstring()?;
            let length = dec.read_i32()?;
            chromosomes.push(Chromosome {
                name,
                index,
                length,
            });
        }

        let bp_resolutions = decode_resolutions(&mut dec)?;
        let frag_resolutions = decode_resolutions(&mut dec)?;

        Ok(Metadata {
            version,
            master_offset,
            genome_id,
            attributes,
            chromosomes,
            bp_resolutions,
            frag_resolutions,
        })
    }
}

/// Magic, version gate and the fixed fields every header starts with.
fn decode_prefix(dec: &mut Decoder<'_>) -> Result<(i32, i64, String)> {
    let magic = dec.read_cstring()?;
    if !magic.starts_with("HIC") {
        return Err(HicError::NotHic);
    }
    let version = dec.read_i32()?;
    if version < 6 {
        return Err(HicError::UnsupportedVersion(version));
    }
    let master_offset = dec.read_i64()?;
    let genome_id = dec.read_cstring()?;
    Ok((version, master_offset, genome_id))
}

fn decode_resolutions(dec: &mut Decoder<'_>) -> Result<Vec<i32>> {
    let n = dec.read_i32()?;
    let mut resolutions = Vec::with_capacity(clamp_len(n, dec.remaining(), 4));
    for _ in 0..n {
        resolutions.push(dec.read_i32()?);
    }
    Ok(resolutions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"HIC\0");
        buf.extend_from_slice(&8i32.to_le_bytes());
        buf.extend_from_slice(&4096i64.to_le_bytes());
        buf.extend_from_slice(b"hg19\0");
        // one attribute pair
        buf.extend_from_slice(&1i32.to_le_bytes());
        buf.extend_from_slice(b"software\0juicer\0");
        // two chromosomes
        buf.extend_from_slice(&2i32.to_le_bytes());
        buf.extend_from_slice(b"All\0");
        buf.extend_from_slice(&1500i32.to_le_bytes());
        buf.extend_from_slice(b"chr1\0");
        buf.extend_from_slice(&1000i32.to_le_bytes());
        // resolutions: BP then FRAG
        buf.extend_from_slice(&2i32.to_le_bytes());
        buf.extend_from_slice(&1_000_000i32.to_le_bytes());
        buf.extend_from_slice(&500_000i32.to_le_bytes());
        buf.extend_from_slice(&0i32.to_le_bytes());
        buf
    }

    #[test]
    fn decodes_header() {
        let header = Header::decode(&sample_header()).unwrap();
        assert_eq!(header.version, 8);
        assert_eq!(header.master_offset, 4096);
        assert_eq!(header.genome_id, "hg19");
        assert_eq!(header.chromosomes.len(), 2);
        let chr1 = &header.chromosomes["chr1"];
        assert_eq!(chr1.index, 1);
        assert_eq!(chr1.length, 1000);
        assert_eq!(header.chromosomes["All"].index, 0);
    }

    #[test]
    fn decodes_metadata() {
        let meta = Metadata::decode(&sample_header()).unwrap();
        assert_eq!(meta.attributes["software"], "juicer");
        assert_eq!(meta.chromosomes[1].name, "chr1");
        assert_eq!(meta.bp_resolutions, vec![1_000_000, 500_000]);
        assert!(meta.frag_resolutions.is_empty());
    }

    #[test]
    fn rejects_wrong_magic() {
        let mut buf = sample_header();
        buf[0] = b'X';
        assert!(matches!(Header::decode(&buf), Err(HicError::NotHic)));
    }

    #[test]
    fn magic_checks_first_three_bytes_only() {
        // some writers extend the magic string; HICx\0 is still accepted
        let mut buf = sample_header();
        buf.splice(3..3, *b"1");
        assert!(Header::decode(&buf).is_ok());
    }

    #[test]
    fn rejects_old_version() {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"HIC\0");
        buf.extend_from_slice(&5i32.to_le_bytes());
        buf.extend_from_slice(&0i64.to_le_bytes());
        buf.extend_from_slice(b"hg19\0");
        assert!(matches!(
            Header::decode(&buf),
            Err(HicError::UnsupportedVersion(5))
        ));
    }

    #[test]
    fn short_header_is_truncation() {
        let buf = sample_header();
        assert!(matches!(
            Header::decode(&buf[..20]),
            Err(HicError::Truncated { .. })
        ));
    }
}
