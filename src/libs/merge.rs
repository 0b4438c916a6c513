//! Merge of several variant files into one coordinate-sorted file.
//!
//! Every input is parsed in full, records are grouped by `(chrom, pos)`
//! across all inputs, and each group is written once with the sample columns
//! of the reconciled header. Inputs are consumed in the order given, so the
//! first file that has a position decides its ID/REF/ALT/QUAL/FILTER/INFO.

use crate::libs::coord::sort_key;
use crate::libs::error::VcfError;
use crate::libs::header::{read_lossy_line, reconcile, Header};
use crate::libs::io::{open_path, reader, StagedOutput};
use crate::libs::record::{MergedRecord, Record};
use anyhow::{Context, Result};
use indexmap::map::Entry;
use indexmap::IndexMap;
use log::{debug, info, warn};
use rayon::prelude::*;
use std::io::BufRead;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct MergeConfig {
    threads: usize,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl MergeConfig {
    #[must_use]
    pub fn new() -> Self {
        MergeConfig { threads: 1 }
    }

    /// Threads used to parse inputs; grouping is always sequential.
    #[must_use]
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub inputs: usize,
    /// Records parsed from all inputs
    pub records_in: u64,
    /// Merged records written
    pub records_out: u64,
    /// Sample columns in the output
    pub samples: usize,
}

/// Header and body of one parsed input.
#[derive(Debug)]
pub struct ParsedInput {
    pub header: Header,
    pub records: Vec<Record>,
}

/// Reads the header and every data record of `path`.
///
/// The body scan ends at the first empty line or the first line that does not
/// parse as a record; what follows is ignored. Invalid UTF-8 in a line is
/// replaced with U+FFFD.
pub fn read_input(path: &Path) -> Result<ParsedInput> {
    let mut reader = open_path(path)?;
    let (header, pending) = Header::read_from(&mut reader)
        .with_context(|| format!("failed to read header of {}", path.display()))?;
    let samples = header.samples();

    let mut records = Vec::new();
    let mut next = pending;
    loop {
        let line = match next.take() {
            Some(line) => line,
            None => {
                match read_lossy_line(&mut reader)
                    .with_context(|| format!("failed to read {}", path.display()))?
                {
                    Some(line) => line,
                    None => break,
                }
            }
        };

        let text = line.trim_end_matches(['\r', '\n']);
        if text.trim().is_empty() {
            debug!("{}: empty line ends the body", path.display());
            break;
        }
        if text.starts_with('#') {
            continue;
        }
        match Record::parse(text, samples) {
            Some(record) => records.push(record),
            None => {
                warn!(
                    "{}: malformed line after {} records ends the body",
                    path.display(),
                    records.len()
                );
                break;
            }
        }
    }

    debug!("{}: {} records", path.display(), records.len());
    Ok(ParsedInput { header, records })
}

/// Aborts before any output exists if an input is missing or the output is
/// already there.
pub fn check_paths(inputs: &[PathBuf], output: &str) -> Result<()> {
    if inputs.is_empty() {
        return Err(VcfError::NoInputs.into());
    }
    if let Some(missing) = inputs.iter().find(|p| !p.exists()) {
        return Err(VcfError::InputNotFound(missing.clone()).into());
    }
    if output != "stdout" && Path::new(output).exists() {
        return Err(VcfError::OutputExists(PathBuf::from(output)).into());
    }
    Ok(())
}

/// Groups records of all inputs by position, in coordinate order.
pub fn group_records(parsed: Vec<ParsedInput>) -> Vec<MergedRecord> {
    let mut groups: IndexMap<(String, u64), MergedRecord> = IndexMap::new();

    for input in parsed {
        for record in input.records {
            match groups.entry((record.chrom.clone(), record.pos)) {
                Entry::Occupied(mut entry) => entry.get_mut().absorb(record),
                Entry::Vacant(entry) => {
                    entry.insert(MergedRecord::new(record));
                }
            }
        }
    }

    let mut merged: Vec<MergedRecord> = groups.into_values().collect();
    // stable: labels with equal keys keep first-seen order
    merged.sort_by_cached_key(|m| sort_key(&m.first.chrom, m.first.pos));
    merged
}

/// Merges `inputs` into `output`, which must not exist yet.
pub fn merge_files(inputs: &[PathBuf], output: &str, config: &MergeConfig) -> Result<MergeStats> {
    check_paths(inputs, output)?;
    info!("Merging {} files into {}", inputs.len(), output);

    let parsed: Vec<ParsedInput> = if config.threads > 1 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .build()?;
        pool.install(|| {
            inputs
                .par_iter()
                .map(|p| read_input(p))
                .collect::<Result<Vec<_>>>()
        })?
    } else {
        inputs
            .iter()
            .map(|p| read_input(p))
            .collect::<Result<Vec<_>>>()?
    };

    let headers: Vec<Header> = parsed.iter().map(|p| p.header.clone()).collect();
    let paths: Vec<&Path> = inputs.iter().map(PathBuf::as_path).collect();
    let header = reconcile(&headers, &paths)?;

    let records_in: u64 = parsed.iter().map(|p| p.records.len() as u64).sum();
    let merged = group_records(parsed);
    debug!(
        "{} positions present in more than one record",
        merged.iter().filter(|m| m.contributors > 1).count()
    );

    let mut out = StagedOutput::create_new(output)?;
    header.write(&mut out)?;
    let sample_order = header.samples();
    for record in &merged {
        record.write(&mut out, sample_order)?;
    }
    out.finish()?;

    let stats = MergeStats {
        inputs: inputs.len(),
        records_in,
        records_out: merged.len() as u64,
        samples: sample_order.len(),
    };
    info!(
        "Merge complete: {} records from {} inputs into {} positions, {} samples",
        stats.records_in, stats.inputs, stats.records_out, stats.samples
    );
    Ok(stats)
}

/// Reads input paths from a list file, one per line.
///
/// Blank lines and lines starting with `#` are ignored.
pub fn read_input_list(list: &str) -> Result<Vec<PathBuf>> {
    if !Path::new(list).exists() {
        return Err(VcfError::InputNotFound(PathBuf::from(list)).into());
    }
    let reader = reader(list)?;
    let mut paths = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        paths.push(PathBuf::from(line));
    }
    Ok(paths)
}
