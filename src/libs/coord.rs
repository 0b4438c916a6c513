//! Total ordering over chromosome labels and positions.
//!
//! Numeric chromosomes come first in numeric order, followed by `X`, `Y` and
//! `MT`/`M`, followed by every other label at a rank derived from the label
//! bytes with XXH3. The fallback rank is seedless, so two runs (or two
//! machines) always agree on the order of the same labels.

use std::cmp::Ordering;
use xxhash_rust::xxh3::xxh3_64;

/// Rank offset for labels that are neither numeric nor sex/mitochondrial.
const UNKNOWN_OFFSET: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChromKey {
    pub group: u8,
    pub rank: u64,
}

/// ```
/// use vcftk::libs::coord::{chrom_key, ChromKey};
///
/// assert_eq!(chrom_key("chr7"), ChromKey { group: 0, rank: 7 });
/// assert_eq!(chrom_key("7"), chrom_key("CHR7"));
/// assert_eq!(chrom_key("chrX"), ChromKey { group: 1, rank: 100 });
/// assert_eq!(chrom_key("chrM"), chrom_key("MT"));
/// assert!(chrom_key("chr22") < chrom_key("chrX"));
/// assert!(chrom_key("chrMT") < chrom_key("chrUn_gl000220"));
/// ```
pub fn chrom_key(chrom: &str) -> ChromKey {
    let upper = chrom.to_ascii_uppercase();
    let label = upper.strip_prefix("CHR").unwrap_or(&upper);

    if let Ok(num) = label.parse::<u64>() {
        return ChromKey {
            group: 0,
            rank: num,
        };
    }

    let rank = match label {
        "X" => 100,
        "Y" => 101,
        "MT" | "M" => 102,
        _ => UNKNOWN_OFFSET + (xxh3_64(label.as_bytes()) >> 1),
    };

    ChromKey { group: 1, rank }
}

/// Full sort key of a record.
pub fn sort_key(chrom: &str, pos: u64) -> (ChromKey, u64) {
    (chrom_key(chrom), pos)
}

pub fn compare_loci(a: (&str, u64), b: (&str, u64)) -> Ordering {
    sort_key(a.0, a.1).cmp(&sort_key(b.0, b.1))
}
