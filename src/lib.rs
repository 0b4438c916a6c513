//! Coordinate sorting and sample-union merging of VCF-like files.
//!
//! * [`libs::coord`] - chromosome/position ordering shared by everything else
//! * [`libs::sort`] - external chunked sort with k-way merge
//! * [`libs::merge`] - multi-file merge with header reconciliation
//! * [`libs::header`] - meta-line dedup and sample-column union

pub mod libs;

pub use libs::io::{reader, writer};
